pub mod arithmetic;
pub mod ledger;

pub use arithmetic::ArithmeticService;
pub use ledger::{LedgerError, LedgerService, UnknownAccountPolicy};
