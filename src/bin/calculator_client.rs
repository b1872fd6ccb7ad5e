use anyhow::{Context, Result};
use bank_rpc::config;
use bank_rpc::parse::parse;
use bank_rpc::process::run_arithmetic;
use bank_rpc::rpc::ArithmeticClient;
use clap::{Arg, command};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command!()
        .about("Replays add/sub/mult/div lines against the calculator server")
        .args(config::port_args())
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .default_value("input")
                .help("Operations, one `operation a b` per line"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .default_value("output")
                .help("Results, one per line"),
        )
        .arg(config::timeout_arg())
        .arg(config::debug_arg())
        .get_matches();
    config::init_logging(matches.get_count("debug"));

    let port = config::resolve_port(&matches)?;
    let input_path = matches
        .get_one::<String>("input")
        .map(|s| s.as_str())
        .unwrap_or("input");
    let output_path = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or("output");
    let input = BufReader::new(
        File::open(input_path).with_context(|| format!("could not open file {}", input_path))?,
    );
    let mut output = BufWriter::new(
        File::create(output_path)
            .with_context(|| format!("could not create file {}", output_path))?,
    );

    let mut client =
        ArithmeticClient::connect(config::connect_addr(port), config::client_config(&matches))
            .await
            .context("did not connect")?;
    let count = run_arithmetic(parse(input), &mut client, &mut output).await?;
    info!("{} result(s) written to {}", count, output_path);
    Ok(())
}
