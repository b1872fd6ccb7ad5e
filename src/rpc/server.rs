use async_stream::stream;
use log::{debug, error, info, warn};
use std::io::{self, ErrorKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::transport::Server;

/// How long open connections get to finish their calls once serving stops.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause before accepting again when the process is out of descriptors or memory.
const RESOURCE_BACKOFF: Duration = Duration::from_millis(100);

enum AcceptError {
    /// One connection failed before it was handed over.
    Connection,
    /// The process is out of resources; accepting may work again shortly.
    Resource,
    Fatal,
}

fn classify(e: &io::Error) -> AcceptError {
    match e.kind() {
        ErrorKind::ConnectionAborted
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionRefused
        | ErrorKind::Interrupted
        | ErrorKind::WouldBlock
        | ErrorKind::TimedOut => AcceptError::Connection,
        ErrorKind::OutOfMemory => AcceptError::Resource,
        _ if is_resource_exhausted(e) => AcceptError::Resource,
        _ => AcceptError::Fatal,
    }
}

#[cfg(unix)]
fn is_resource_exhausted(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

#[cfg(not(unix))]
fn is_resource_exhausted(_: &io::Error) -> bool {
    false
}

/// Serves `routes` on `listener` until `shutdown` is cancelled or accepting
/// fails for good.
pub async fn serve(
    routes: Routes,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> io::Result<()> {
    serve_incoming(
        routes,
        TcpListenerStream::new(listener),
        shutdown,
        DRAIN_TIMEOUT,
    )
    .await
}

/// Serves `routes` on the connections yielded by `incoming`.
///
/// Transient accept errors are skipped. Any other accept error, the end of
/// `incoming`, or cancelling `shutdown` stops accepting; in-flight calls then
/// get up to `drain_timeout` to finish. A fatal accept error is returned after
/// that drain.
pub async fn serve_incoming<I>(
    routes: Routes,
    incoming: I,
    shutdown: CancellationToken,
    drain_timeout: Duration,
) -> io::Result<()>
where
    I: Stream<Item = io::Result<TcpStream>> + Send + 'static,
{
    let stop = shutdown.child_token();
    let failure = Arc::new(Mutex::new(None));
    let accepted = accept(incoming, stop.clone(), Arc::clone(&failure));

    let signal = stop.clone();
    let server = Server::builder()
        .add_routes(routes)
        .serve_with_incoming_shutdown(Box::pin(accepted), async move {
            signal.cancelled().await;
            info!("stopped accepting, draining open connections");
        });
    tokio::pin!(server);

    let served = tokio::select! {
        res = &mut server => res.map_err(io::Error::other),
        _ = drain_deadline(&stop, drain_timeout) => {
            warn!("connections still open after {:?}, abandoning them", drain_timeout);
            Ok(())
        }
    };
    info!("drained");

    let failed = failure.lock().ok().and_then(|mut slot| slot.take());
    match failed {
        Some(e) => Err(e),
        None => served,
    }
}

async fn drain_deadline(stop: &CancellationToken, limit: Duration) {
    stop.cancelled().await;
    sleep(limit).await;
}

/// Passes accepted connections through, absorbing transient errors. A fatal
/// error is parked in `failure` and ends the stream; either way the stream
/// cancels `stop` when it ends.
fn accept<I>(
    incoming: I,
    stop: CancellationToken,
    failure: Arc<Mutex<Option<io::Error>>>,
) -> impl Stream<Item = io::Result<TcpStream>>
where
    I: Stream<Item = io::Result<TcpStream>> + Send + 'static,
{
    stream! {
        tokio::pin!(incoming);
        while let Some(res) = incoming.next().await {
            match res {
                Ok(conn) => yield Ok::<_, io::Error>(conn),
                Err(e) => match classify(&e) {
                    AcceptError::Connection => debug!("connection failed during accept: {}", e),
                    AcceptError::Resource => {
                        warn!("accept failed: {}, retrying in {:?}", e, RESOURCE_BACKOFF);
                        sleep(RESOURCE_BACKOFF).await;
                    }
                    AcceptError::Fatal => {
                        error!("accept failed: {}", e);
                        if let Ok(mut slot) = failure.lock() {
                            *slot = Some(e);
                        }
                        break;
                    }
                },
            }
        }
        stop.cancel();
    }
}
