use anyhow::{Context, Result};
use bank_rpc::config;
use bank_rpc::parse::parse;
use bank_rpc::process::run_ledger;
use bank_rpc::rpc::LedgerClient;
use clap::{Arg, command};
use log::info;
use std::fs::File;
use std::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command!()
        .about("Replays deposit/withdraw/interest lines against the bank server")
        .args(config::port_args())
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .default_value("input")
                .help("Operations, one `operation account amount` per line"),
        )
        .arg(config::timeout_arg())
        .arg(config::debug_arg())
        .get_matches();
    config::init_logging(matches.get_count("debug"));

    let input_path = matches
        .get_one::<String>("input")
        .map(|s| s.as_str())
        .unwrap_or("input");
    let input = BufReader::new(
        File::open(input_path).with_context(|| format!("could not open file {}", input_path))?,
    );
    let port = config::resolve_port(&matches)?;

    let mut client =
        LedgerClient::connect(config::connect_addr(port), config::client_config(&matches))
            .await
            .context("did not connect")?;
    let count = run_ledger(parse(input), &mut client).await?;
    info!("{} operation(s) sent", count);
    Ok(())
}
