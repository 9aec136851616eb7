use std::future::Future;
use std::time::{Duration, Instant};

pub mod generate;
pub mod path;
pub mod staging;

#[cfg(test)]
pub(crate) mod fake;

pub fn us_to_ms(us: u64) -> f64 {
    us as f64 / 1000.
}

/// Awaits `fut`, returning its output along with the wall-clock time it took.
pub async fn timed<F, T>(fut: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let output = fut.await;
    (output, start.elapsed())
}

/// Quotes `s` as a SQL string literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
