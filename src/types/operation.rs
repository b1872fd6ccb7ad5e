use serde::de;
use serde::{Deserialize, Deserializer};

#[derive(Eq, PartialEq, Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LedgerOp {
    Deposit,
    Withdraw,
    Interest,
}

#[derive(Eq, PartialEq, Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mult,
    Div,
}

/// `deposit 1 10.5`
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct LedgerLine {
    pub op: LedgerOp,
    pub account: i64,
    /// Interest rate in percent for `interest` lines.
    #[serde(deserialize_with = "de_finite")]
    pub amount: f32,
}

/// `div 10 4`
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct ArithmeticLine {
    pub op: ArithmeticOp,
    pub a: i64,
    pub b: i64,
}

fn de_finite<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom(format!("amount is not finite: {value}")))
    }
}
