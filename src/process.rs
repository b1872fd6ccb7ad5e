use crate::rpc::{ArithmeticClient, LedgerClient};
use crate::types::{ArithmeticLine, ArithmeticOp, LedgerLine, LedgerOp};
use anyhow::{Context, Result};
use log::debug;
use std::io::Write;
use tokio_stream::{Stream, StreamExt};

/// Issues one ledger RPC per input line, in order. Stops at the first
/// malformed line or failed call. Returns the number of calls made.
pub async fn run_ledger<S>(lines: S, client: &mut LedgerClient) -> Result<usize>
where
    S: Stream<Item = Result<LedgerLine>>,
{
    tokio::pin!(lines);
    let mut count = 0;
    while let Some(line) = lines.next().await {
        let LedgerLine {
            op,
            account,
            amount,
        } = line?;
        let res = match op {
            LedgerOp::Deposit => client.deposit(account, amount).await,
            LedgerOp::Withdraw => client.withdraw(account, amount).await,
            LedgerOp::Interest => client.add_interest(account, amount).await,
        };
        res.with_context(|| format!("cannot {:?} {} on account {}", op, amount, account))?;
        debug!("{:?} {} on account {} done", op, amount, account);
        count += 1;
    }
    Ok(count)
}

/// Writes a quotient with two decimals. Infinities and NaN are spelled
/// `+Inf`, `-Inf` and `NaN`.
pub fn format_quotient(q: f32) -> String {
    if q.is_nan() {
        "NaN".to_string()
    } else if q == f32::INFINITY {
        "+Inf".to_string()
    } else if q == f32::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:.2}", q)
    }
}

/// Issues one arithmetic RPC per input line, in order, writing each result
/// to `out` on its own line. Quotients go through [`format_quotient`].
pub async fn run_arithmetic<S, W>(
    lines: S,
    client: &mut ArithmeticClient,
    out: &mut W,
) -> Result<usize>
where
    S: Stream<Item = Result<ArithmeticLine>>,
    W: Write,
{
    tokio::pin!(lines);
    let mut count = 0;
    while let Some(line) = lines.next().await {
        let ArithmeticLine { op, a, b } = line?;
        let context = || format!("could not {:?} {} and {}", op, a, b);
        let formatted = match op {
            ArithmeticOp::Add => client.add(a, b).await.with_context(context)?.to_string(),
            ArithmeticOp::Sub => client.sub(a, b).await.with_context(context)?.to_string(),
            ArithmeticOp::Mult => client.mult(a, b).await.with_context(context)?.to_string(),
            ArithmeticOp::Div => format_quotient(client.div(a, b).await.with_context(context)?),
        };
        writeln!(out, "{}", formatted).context("could not write result to output")?;
        count += 1;
    }
    out.flush().context("could not flush output")?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use crate::rpc::{BankServer, CalculatorServer, ClientConfig, serve};
    use crate::services::{ArithmeticService, LedgerService};
    use crate::stores::{AccountStore, MemAccountStore};
    use crate::types::Account;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;
    use tonic::service::Routes;

    fn calculator() -> Routes {
        Routes::new(CalculatorServer::new(ArithmeticService::new()))
    }

    #[test]
    fn quotients_are_formatted() {
        assert_eq!("2.50", format_quotient(2.5));
        assert_eq!("-0.33", format_quotient(-1.0 / 3.0));
        assert_eq!("+Inf", format_quotient(f32::INFINITY));
        assert_eq!("-Inf", format_quotient(f32::NEG_INFINITY));
        assert_eq!("NaN", format_quotient(f32::NAN));
    }

    #[tokio::test]
    async fn ledger_lines_become_calls() {
        let store = Arc::new(
            MemAccountStore::load(vec![Account::with_balance(1, "alice", 100.0)]).unwrap(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let routes = Routes::new(BankServer::new(LedgerService::new(Arc::clone(&store))));
        let server = tokio::spawn(serve(routes, listener, token.clone()));

        let mut client = LedgerClient::connect(addr, ClientConfig::default())
            .await
            .unwrap();
        let input = "deposit 1 50\ninterest 1 10\nwithdraw 1 15\ndeposit 7 1";
        let count = run_ledger(parse(input.as_bytes()), &mut client).await.unwrap();
        assert_eq!(4, count);
        assert!((store.get_account(1).unwrap().balance() - 150.0).abs() < 1e-3);

        token.cancel();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn arithmetic_results_are_written() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let server = tokio::spawn(serve(calculator(), listener, token.clone()));

        let mut client = ArithmeticClient::connect(addr, ClientConfig::default())
            .await
            .unwrap();
        let input = "add 3 4\nsub 10 3\nmult 6 7\ndiv 10 4\ndiv 1 0";
        let mut out = Vec::new();
        let count = run_arithmetic(parse(input.as_bytes()), &mut client, &mut out)
            .await
            .unwrap();
        assert_eq!(5, count);
        assert_eq!("7\n7\n42\n2.50\n+Inf\n", String::from_utf8(out).unwrap());

        token.cancel();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn malformed_line_stops_the_run() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let server = tokio::spawn(serve(calculator(), listener, token.clone()));

        let mut client = ArithmeticClient::connect(addr, ClientConfig::default())
            .await
            .unwrap();
        let mut out = Vec::new();
        run_arithmetic(parse("add 1 2\npow 2 3\nadd 3 4".as_bytes()), &mut client, &mut out)
            .await
            .expect_err("Unknown operation should stop the run");
        assert_eq!("3\n", String::from_utf8(out).unwrap());

        token.cancel();
        server.await.unwrap().unwrap();
    }
}
