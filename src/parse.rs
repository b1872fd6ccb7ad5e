use anyhow::{Result, anyhow};
use async_stream::stream;
use serde::de::DeserializeOwned;
use std::io::Read;
use tokio_stream::Stream;

/// Fields per input line: operation and two operands.
const FIELDS: usize = 3;

/// Reads space separated `operation operand operand` lines.
///
/// Blank lines are skipped. A malformed line is yielded as an error, the
/// caller decides whether to keep going.
pub fn parse<R, T>(input: R) -> impl Stream<Item = Result<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    stream! {
        for record in reader.records() {
            yield match record {
                Ok(r) if r.len() != FIELDS => {
                    let line = r.position().map_or(0, |p| p.line());
                    Err(anyhow!(
                        "invalid input on line {}: expected [operation] [num1] [num2], got {:?}",
                        line,
                        r.iter().collect::<Vec<_>>().join(" ")
                    ))
                }
                Ok(r) => r.deserialize::<T>(None).map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            };
        }
    }
}

/// Collects every line, failing on the first malformed one.
pub async fn parse_all<R, T>(input: R) -> Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    use tokio_stream::StreamExt;

    let s = parse(input);
    tokio::pin!(s);
    let mut out = Vec::new();
    while let Some(v) = s.next().await {
        out.push(v?);
    }
    Ok(out)
}
