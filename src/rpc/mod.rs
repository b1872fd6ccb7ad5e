//! gRPC transport for the bank and calculator services.
//!
//! Messages are plain prost structs; the client and server stubs in
//! [`proto`] are generated from them at build time.

pub mod client;
pub mod proto;
pub mod server;
#[cfg(test)]
mod testing;

pub use client::{ArithmeticClient, ClientConfig, ClientError, LedgerClient};
pub use proto::bank_server::{Bank, BankServer};
pub use proto::calculator_server::{Calculator, CalculatorServer};
pub use server::{DRAIN_TIMEOUT, serve, serve_incoming};
