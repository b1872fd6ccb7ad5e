//! Protobuf messages and the generated `bank.Bank` and
//! `calculator.Calculator` client and server stubs.

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct LedgerRequest {
    #[prost(int64, tag = "1")]
    pub account_number: i64,
    #[prost(float, tag = "2")]
    pub amount: f32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Empty {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct IntRequest {
    #[prost(int64, tag = "1")]
    pub a: i64,
    #[prost(int64, tag = "2")]
    pub b: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct IntResponse {
    #[prost(int64, tag = "1")]
    pub result: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct FloatResponse {
    #[prost(float, tag = "1")]
    pub result: f32,
}

include!(concat!(env!("OUT_DIR"), "/bank.Bank.rs"));
include!(concat!(env!("OUT_DIR"), "/calculator.Calculator.rs"));
