//! Account ledger and arithmetic services over gRPC.
//!
//! The bank server loads accounts from a JSON snapshot, serves deposit,
//! withdraw and interest calls against them, and on shutdown drains
//! in-flight calls and writes the updated snapshot. The calculator server is
//! stateless.

pub mod config;
pub mod parse;
pub mod process;
pub mod rpc;
pub mod services;
pub mod shutdown;
pub mod stores;
pub mod types;
