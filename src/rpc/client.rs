use super::proto::bank_client::BankClient;
use super::proto::calculator_client::CalculatorClient;
use super::proto::{IntRequest, LedgerRequest};
use log::debug;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tonic::transport::{Channel, Endpoint};
use tonic::{Response, Status};

/// Client transport settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout for a single connection attempt.
    pub connect_timeout: Duration,
    /// Timeout for one call, request sent to reply received.
    pub rpc_timeout: Duration,
    /// Connection attempts after the first one, while the server is not up yet.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(5),
            rpc_timeout: Duration::from_secs(1),
            max_retries: 10,
            base_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("call failed: {0}")]
    Status(#[from] Status),
}

/// Opens a channel to `addr`, retrying with exponential backoff while the
/// server is not reachable.
pub async fn connect_channel(
    addr: SocketAddr,
    cfg: &ClientConfig,
) -> Result<Channel, ClientError> {
    let endpoint =
        Endpoint::from_shared(format!("http://{addr}"))?.connect_timeout(cfg.connect_timeout);
    let mut backoff = cfg.base_backoff;
    let mut attempt = 0;
    loop {
        match endpoint.connect().await {
            Ok(channel) => return Ok(channel),
            Err(e) if attempt < cfg.max_retries => {
                debug!("connect to {} failed (attempt {}): {}", addr, attempt + 1, e);
            }
            Err(e) => return Err(e.into()),
        }
        attempt += 1;
        sleep(backoff).await;
        backoff = (backoff * 2).min(cfg.max_backoff);
    }
}

/// Awaits one call for at most `limit`.
///
/// Every call is its own HTTP/2 stream, so giving up on one leaves the
/// channel usable. A call that times out may still have been applied by the
/// server.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<Response<T>, Status>>,
) -> Result<T, ClientError> {
    let res = timeout(limit, call)
        .await
        .map_err(|_| ClientError::Timeout(limit))??;
    Ok(res.into_inner())
}

#[derive(Debug, Clone)]
pub struct LedgerClient {
    inner: BankClient<Channel>,
    rpc_timeout: Duration,
}

impl LedgerClient {
    pub fn new(channel: Channel, cfg: &ClientConfig) -> Self {
        LedgerClient {
            inner: BankClient::new(channel),
            rpc_timeout: cfg.rpc_timeout,
        }
    }

    pub async fn connect(addr: SocketAddr, cfg: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(connect_channel(addr, &cfg).await?, &cfg))
    }

    pub async fn deposit(&mut self, account_number: i64, amount: f32) -> Result<(), ClientError> {
        let req = LedgerRequest {
            account_number,
            amount,
        };
        bounded(self.rpc_timeout, self.inner.deposit(req)).await?;
        Ok(())
    }

    pub async fn withdraw(&mut self, account_number: i64, amount: f32) -> Result<(), ClientError> {
        let req = LedgerRequest {
            account_number,
            amount,
        };
        bounded(self.rpc_timeout, self.inner.withdraw(req)).await?;
        Ok(())
    }

    /// `rate` is a percentage.
    pub async fn add_interest(
        &mut self,
        account_number: i64,
        rate: f32,
    ) -> Result<(), ClientError> {
        let req = LedgerRequest {
            account_number,
            amount: rate,
        };
        bounded(self.rpc_timeout, self.inner.add_interest(req)).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ArithmeticClient {
    inner: CalculatorClient<Channel>,
    rpc_timeout: Duration,
}

impl ArithmeticClient {
    pub fn new(channel: Channel, cfg: &ClientConfig) -> Self {
        ArithmeticClient {
            inner: CalculatorClient::new(channel),
            rpc_timeout: cfg.rpc_timeout,
        }
    }

    pub async fn connect(addr: SocketAddr, cfg: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(connect_channel(addr, &cfg).await?, &cfg))
    }

    pub async fn add(&mut self, a: i64, b: i64) -> Result<i64, ClientError> {
        let res = bounded(self.rpc_timeout, self.inner.add(IntRequest { a, b })).await?;
        Ok(res.result)
    }

    pub async fn sub(&mut self, a: i64, b: i64) -> Result<i64, ClientError> {
        let res = bounded(self.rpc_timeout, self.inner.sub(IntRequest { a, b })).await?;
        Ok(res.result)
    }

    pub async fn mult(&mut self, a: i64, b: i64) -> Result<i64, ClientError> {
        let res = bounded(self.rpc_timeout, self.inner.mult(IntRequest { a, b })).await?;
        Ok(res.result)
    }

    pub async fn div(&mut self, a: i64, b: i64) -> Result<f32, ClientError> {
        let res = bounded(self.rpc_timeout, self.inner.div(IntRequest { a, b })).await?;
        Ok(res.result)
    }
}
