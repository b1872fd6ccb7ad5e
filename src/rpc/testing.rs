use super::Calculator;
use super::proto::{FloatResponse, IntRequest, IntResponse};
use super::server::{DRAIN_TIMEOUT, serve_incoming};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::{Request, Response, Status};

/// Calculator whose `add` sleeps for `b` milliseconds, then answers `a`.
#[derive(Default)]
pub struct Sleepy {
    pub finished: AtomicUsize,
}

#[tonic::async_trait]
impl Calculator for Sleepy {
    async fn add(&self, request: Request<IntRequest>) -> Result<Response<IntResponse>, Status> {
        let IntRequest { a, b } = request.into_inner();
        sleep(Duration::from_millis(b.max(0) as u64)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(IntResponse { result: a }))
    }

    async fn sub(&self, _request: Request<IntRequest>) -> Result<Response<IntResponse>, Status> {
        Err(Status::unimplemented("sub"))
    }

    async fn mult(&self, _request: Request<IntRequest>) -> Result<Response<IntResponse>, Status> {
        Err(Status::unimplemented("mult"))
    }

    async fn div(&self, _request: Request<IntRequest>) -> Result<Response<FloatResponse>, Status> {
        Err(Status::unimplemented("div"))
    }
}

pub async fn start(
    routes: Routes,
) -> (SocketAddr, CancellationToken, JoinHandle<std::io::Result<()>>) {
    start_with_drain(routes, DRAIN_TIMEOUT).await
}

/// Serves `routes` on an ephemeral localhost port.
pub async fn start_with_drain(
    routes: Routes,
    drain_timeout: Duration,
) -> (SocketAddr, CancellationToken, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = CancellationToken::new();
    let handle = tokio::spawn(serve_incoming(
        routes,
        TcpListenerStream::new(listener),
        token.clone(),
        drain_timeout,
    ));
    (addr, token, handle)
}
