use anyhow::{Context, Result};
use bank_rpc::config;
use bank_rpc::rpc::CalculatorServer;
use bank_rpc::services::ArithmeticService;
use bank_rpc::shutdown::{ShutdownCoordinator, ShutdownReason};
use clap::command;
use log::info;
use tokio::net::TcpListener;
use tonic::service::Routes;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command!()
        .about("Calculator RPC server")
        .args(config::port_args())
        .arg(config::drain_timeout_arg())
        .arg(config::debug_arg())
        .get_matches();
    config::init_logging(matches.get_count("debug"));

    let port = config::resolve_port(&matches)?;
    let listener = TcpListener::bind(config::listen_addr(port))
        .await
        .context("failed to listen")?;
    info!("server listening at {}", listener.local_addr()?);

    let routes = Routes::new(CalculatorServer::new(ArithmeticService::new()));
    let coordinator =
        ShutdownCoordinator::new().with_drain_timeout(config::drain_timeout(&matches));
    coordinator.cancel_on_signals();
    match coordinator.serve(routes, listener).await {
        ShutdownReason::Requested => Ok(()),
        ShutdownReason::TransportFailure(e) => Err(e).context("failed to serve"),
    }
}
