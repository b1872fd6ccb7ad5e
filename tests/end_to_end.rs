use bank_rpc::parse::parse;
use bank_rpc::process::run_ledger;
use bank_rpc::rpc::{
    ArithmeticClient, BankServer, CalculatorServer, ClientConfig, ClientError, LedgerClient,
};
use bank_rpc::services::{ArithmeticService, LedgerService, UnknownAccountPolicy};
use bank_rpc::shutdown::{ShutdownCoordinator, ShutdownReason};
use bank_rpc::stores::{MemAccountStore, snapshot};
use std::fs::File;
use std::io::{BufReader, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::Code;
use tonic::service::Routes;

const ACCOUNTS: &str = r#"[
    {"Name": "alice", "AccountID": 1, "Balance": 100},
    {"Name": "bob", "AccountID": 2, "Balance": 250.5},
    {"Name": "carol", "AccountID": 3, "Balance": -20}
]"#;

struct RunningBank {
    addr: SocketAddr,
    coordinator: ShutdownCoordinator,
    handle: JoinHandle<ShutdownReason>,
    output: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

async fn start_bank(policy: UnknownAccountPolicy) -> RunningBank {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accounts.json");
    let output = dir.path().join("updatedAccounts.json");
    File::create(&input)
        .unwrap()
        .write_all(ACCOUNTS.as_bytes())
        .unwrap();

    let store = Arc::new(MemAccountStore::open(&input).unwrap());
    let sink = File::create(&output).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = LedgerService::new(Arc::clone(&store)).with_policy(policy);
    let routes = Routes::new(BankServer::new(service));
    let coordinator = ShutdownCoordinator::new();
    let handle = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            let report = coordinator
                .serve_and_persist(
                    routes,
                    TcpListenerStream::new(listener),
                    store.as_ref(),
                    sink,
                )
                .await;
            report.persisted.unwrap();
            report.reason
        })
    };
    RunningBank {
        addr,
        coordinator,
        handle,
        output,
        _dir: dir,
    }
}

fn balances(path: &std::path::Path) -> Vec<(i64, f32)> {
    snapshot::read_accounts(BufReader::new(File::open(path).unwrap()))
        .unwrap()
        .iter()
        .map(|a| (a.id(), a.balance()))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_clients_do_not_lose_deposits() {
    let server = start_bank(UnknownAccountPolicy::Ignore).await;
    let clients = 8;
    let per_client = 25;

    let tasks: Vec<_> = (0..clients)
        .map(|_| {
            let addr = server.addr;
            tokio::spawn(async move {
                let mut client = LedgerClient::connect(addr, ClientConfig::default())
                    .await
                    .unwrap();
                for _ in 0..per_client {
                    client.deposit(1, 10.0).await.unwrap();
                }
            })
        })
        .collect();
    for t in tasks {
        t.await.unwrap();
    }

    server.coordinator.trigger();
    assert!(matches!(server.handle.await.unwrap(), ShutdownReason::Requested));
    let expected = 100.0 + 10.0 * (clients * per_client) as f32;
    assert_eq!(
        vec![(1, expected), (2, 250.5), (3, -20.0)],
        balances(&server.output)
    );
}

#[tokio::test]
async fn replayed_input_is_persisted_on_shutdown() {
    let server = start_bank(UnknownAccountPolicy::Ignore).await;
    let mut client = LedgerClient::connect(server.addr, ClientConfig::default())
        .await
        .unwrap();
    let input = "\
deposit 2 49.5
withdraw 3 30
interest 1 10
interest 1 10
deposit 42 1000";
    assert_eq!(5, run_ledger(parse(input.as_bytes()), &mut client).await.unwrap());

    server.coordinator.trigger();
    server.handle.await.unwrap();
    let got = balances(&server.output);
    assert_eq!(3, got.len());
    assert!((got[0].1 - 121.0).abs() < 1e-3);
    assert_eq!((2, 300.0), got[1]);
    assert_eq!((3, -50.0), got[2]);
}

#[tokio::test]
async fn round_trip_without_mutations() {
    let server = start_bank(UnknownAccountPolicy::Ignore).await;
    server.coordinator.trigger();
    server.handle.await.unwrap();
    assert_eq!(
        vec![(1, 100.0), (2, 250.5), (3, -20.0)],
        balances(&server.output)
    );
}

#[tokio::test]
async fn reject_policy_reports_unknown_accounts() {
    let server = start_bank(UnknownAccountPolicy::Reject).await;
    let mut client = LedgerClient::connect(server.addr, ClientConfig::default())
        .await
        .unwrap();
    let err = client.withdraw(42, 1.0).await.expect_err("Unknown account");
    assert!(matches!(err, ClientError::Status(s) if s.code() == Code::NotFound));
    client.withdraw(1, 1.0).await.unwrap();

    server.coordinator.trigger();
    server.handle.await.unwrap();
    assert_eq!(
        vec![(1, 99.0), (2, 250.5), (3, -20.0)],
        balances(&server.output)
    );
}

#[tokio::test]
async fn overflowing_deposit_is_rejected_and_snapshot_reloads() {
    let server = start_bank(UnknownAccountPolicy::Ignore).await;
    let mut client = LedgerClient::connect(server.addr, ClientConfig::default())
        .await
        .unwrap();
    client.deposit(2, f32::MAX).await.unwrap();
    let err = client.deposit(2, f32::MAX).await.expect_err("Balance would overflow");
    assert!(matches!(err, ClientError::Status(s) if s.code() == Code::InvalidArgument));

    server.coordinator.trigger();
    server.handle.await.unwrap();
    let got = balances(&server.output);
    assert_eq!(f32::MAX, got[1].1);
    MemAccountStore::open(&server.output).expect("Snapshot should load again");
}

#[tokio::test]
async fn calculator_serves_all_operations() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let coordinator = ShutdownCoordinator::new();
    let handle = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            let routes = Routes::new(CalculatorServer::new(ArithmeticService::new()));
            coordinator.serve(routes, listener).await
        })
    };

    let mut client = ArithmeticClient::connect(addr, ClientConfig::default())
        .await
        .unwrap();
    assert_eq!(7, client.add(3, 4).await.unwrap());
    assert_eq!(7, client.sub(10, 3).await.unwrap());
    assert_eq!(42, client.mult(6, 7).await.unwrap());
    assert_eq!(2.5, client.div(10, 4).await.unwrap());
    assert!(client.div(0, 0).await.unwrap().is_nan());
    assert_eq!(f32::INFINITY, client.div(3, 0).await.unwrap());
    // The server is still up after dividing by zero.
    assert_eq!(i64::MIN, client.add(i64::MAX, 1).await.unwrap());

    coordinator.trigger();
    assert!(matches!(handle.await.unwrap(), ShutdownReason::Requested));
}
