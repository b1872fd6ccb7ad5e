use crate::rpc::Calculator;
use crate::rpc::proto::{FloatResponse, IntRequest, IntResponse};
use crate::types::ArithmeticOp;
use log::debug;
use tonic::{Request, Response, Status};

/// Stateless integer arithmetic.
///
/// `add`, `sub` and `mult` wrap around on overflow (two's complement, 64 bit).
/// `div` divides as `f32`, so a zero divisor yields an infinity or NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticService;

impl ArithmeticService {
    pub fn new() -> Self {
        ArithmeticService
    }

    pub fn add(&self, a: i64, b: i64) -> i64 {
        a.wrapping_add(b)
    }

    pub fn sub(&self, a: i64, b: i64) -> i64 {
        a.wrapping_sub(b)
    }

    pub fn mult(&self, a: i64, b: i64) -> i64 {
        a.wrapping_mul(b)
    }

    pub fn div(&self, a: i64, b: i64) -> f32 {
        a as f32 / b as f32
    }
}

fn operands(op: ArithmeticOp, request: Request<IntRequest>) -> (i64, i64) {
    let IntRequest { a, b } = request.into_inner();
    debug!("{:?} {} {}", op, a, b);
    (a, b)
}

#[tonic::async_trait]
impl Calculator for ArithmeticService {
    async fn add(&self, request: Request<IntRequest>) -> Result<Response<IntResponse>, Status> {
        let (a, b) = operands(ArithmeticOp::Add, request);
        Ok(Response::new(IntResponse {
            result: self.add(a, b),
        }))
    }

    async fn sub(&self, request: Request<IntRequest>) -> Result<Response<IntResponse>, Status> {
        let (a, b) = operands(ArithmeticOp::Sub, request);
        Ok(Response::new(IntResponse {
            result: self.sub(a, b),
        }))
    }

    async fn mult(&self, request: Request<IntRequest>) -> Result<Response<IntResponse>, Status> {
        let (a, b) = operands(ArithmeticOp::Mult, request);
        Ok(Response::new(IntResponse {
            result: self.mult(a, b),
        }))
    }

    async fn div(&self, request: Request<IntRequest>) -> Result<Response<FloatResponse>, Status> {
        let (a, b) = operands(ArithmeticOp::Div, request);
        Ok(Response::new(FloatResponse {
            result: self.div(a, b),
        }))
    }
}
