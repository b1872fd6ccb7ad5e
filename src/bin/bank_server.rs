use anyhow::{Context, Result};
use bank_rpc::config;
use bank_rpc::rpc::BankServer;
use bank_rpc::services::{LedgerService, UnknownAccountPolicy};
use bank_rpc::shutdown::{ShutdownCoordinator, ShutdownReason};
use bank_rpc::stores::MemAccountStore;
use clap::{Arg, ArgAction, command};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command!()
        .about("Bank ledger RPC server")
        .args(config::port_args())
        .arg(
            Arg::new("accounts")
                .long("accounts")
                .default_value("accounts.json")
                .help("Accounts snapshot loaded at startup"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .default_value("updatedAccounts.json")
                .help("Where the updated accounts are written on shutdown"),
        )
        .arg(
            Arg::new("reject-unknown")
                .long("reject-unknown")
                .action(ArgAction::SetTrue)
                .help("Fail calls on unknown accounts instead of ignoring them"),
        )
        .arg(config::drain_timeout_arg())
        .arg(config::debug_arg())
        .get_matches();
    config::init_logging(matches.get_count("debug"));

    let port = config::resolve_port(&matches)?;
    let accounts_path = matches
        .get_one::<String>("accounts")
        .map(|s| s.as_str())
        .unwrap_or("accounts.json");
    let output_path = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or("updatedAccounts.json");
    let policy = if matches.get_flag("reject-unknown") {
        UnknownAccountPolicy::Reject
    } else {
        UnknownAccountPolicy::Ignore
    };

    let store = Arc::new(
        MemAccountStore::open(accounts_path)
            .with_context(|| format!("cannot load accounts from {}", accounts_path))?,
    );
    info!("loaded {} account(s) from {}", store.len(), accounts_path);
    let output = File::create(output_path)
        .with_context(|| format!("could not create file {}", output_path))?;

    let listener = TcpListener::bind(config::listen_addr(port))
        .await
        .context("failed to listen")?;
    info!("server listening at {}", listener.local_addr()?);
    info!("press ctrl-C to shutdown server and generate {}", output_path);

    let service = LedgerService::new(Arc::clone(&store)).with_policy(policy);
    let routes = Routes::new(BankServer::new(service));
    let coordinator =
        ShutdownCoordinator::new().with_drain_timeout(config::drain_timeout(&matches));
    coordinator.cancel_on_signals();
    let report = coordinator
        .serve_and_persist(
            routes,
            TcpListenerStream::new(listener),
            store.as_ref(),
            BufWriter::new(output),
        )
        .await;
    if report.persisted.is_ok() {
        info!("updated accounts written to {}", output_path);
    }

    match report.reason {
        ShutdownReason::Requested => Ok(()),
        ShutdownReason::TransportFailure(e) => Err(e).context("failed to serve"),
    }
}
