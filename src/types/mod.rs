pub mod account;
pub mod operation;

pub use account::Account;
pub use operation::{ArithmeticLine, ArithmeticOp, LedgerLine, LedgerOp};
