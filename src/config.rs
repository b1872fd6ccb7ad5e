//! Command line and file based configuration shared by the binaries.

use crate::rpc::{ClientConfig, DRAIN_TIMEOUT};
use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction::Count, ArgMatches};
use log::LevelFilter;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PORT_FILE: &str = "port";

/// Parses the port from the first line of a port file.
pub fn parse_port(contents: &str) -> Result<u16> {
    let line = contents
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(anyhow!("port file is empty"))?;
    line.parse::<u16>()
        .with_context(|| format!("invalid port number: {:?}", line))
}

pub fn read_port(path: impl AsRef<Path>) -> Result<u16> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("could not open port file {}", path.display()))?;
    parse_port(&contents)
}

/// Address servers bind to.
pub fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Address clients connect to.
pub fn connect_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

pub fn debug_arg() -> Arg {
    Arg::new("debug")
        .short('d')
        .long("debug")
        .required(false)
        .action(Count)
        .help("Increase log verbosity (-d warn ... -dddd trace)")
}

pub fn port_args() -> [Arg; 2] {
    [
        Arg::new("port-file")
            .long("port-file")
            .default_value(DEFAULT_PORT_FILE)
            .help("File whose first line is the TCP port"),
        Arg::new("port")
            .long("port")
            .short('p')
            .value_parser(clap::value_parser!(u16))
            .help("TCP port, overrides --port-file"),
    ]
}

pub fn timeout_arg() -> Arg {
    Arg::new("timeout-ms")
        .long("timeout-ms")
        .value_parser(clap::value_parser!(u64))
        .default_value("1000")
        .help("Per call timeout in milliseconds")
}

pub fn drain_timeout_arg() -> Arg {
    Arg::new("drain-timeout-ms")
        .long("drain-timeout-ms")
        .value_parser(clap::value_parser!(u64))
        .default_value("5000")
        .help("How long in-flight calls may delay shutdown, in milliseconds")
}

/// Port from `--port`, or else from the first line of `--port-file`.
pub fn resolve_port(matches: &ArgMatches) -> Result<u16> {
    if let Some(port) = matches.get_one::<u16>("port") {
        return Ok(*port);
    }
    let file = matches
        .get_one::<String>("port-file")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_PORT_FILE);
    read_port(file)
}

pub fn client_config(matches: &ArgMatches) -> ClientConfig {
    let mut cfg = ClientConfig::default();
    if let Some(ms) = matches.get_one::<u64>("timeout-ms") {
        cfg = cfg.with_rpc_timeout(Duration::from_millis(*ms));
    }
    cfg
}

pub fn drain_timeout(matches: &ArgMatches) -> Duration {
    matches
        .get_one::<u64>("drain-timeout-ms")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(DRAIN_TIMEOUT)
}

pub fn init_logging(debug: u8) {
    let level = match debug {
        1 => Some(LevelFilter::Warn),
        2 => Some(LevelFilter::Info),
        3 => Some(LevelFilter::Debug),
        4.. => Some(LevelFilter::Trace),
        _ => None,
    };
    let mut logger = env_logger::Builder::new();
    logger.parse_env(env_logger::DEFAULT_FILTER_ENV);
    if let Some(l) = level {
        logger.filter_level(l);
    };
    logger.init();
}
