//! One single-row `INSERT` per record.

use std::time::{Duration, Instant};

use anyhow::Result;
use database_utils::QueryableConnection;
use hdrhistogram::Histogram;
use tracing::debug;

use super::{table, Scenario};
use crate::benchmark::ScenarioResult;
use crate::utils::generate::RecordGenerator;
use crate::utils::{timed, us_to_ms};

pub async fn run<C>(
    conn: &mut C,
    generator: &mut RecordGenerator,
    records: usize,
) -> Result<ScenarioResult>
where
    C: QueryableConnection,
{
    debug!("Classic insert {records} records");
    let start = Instant::now();
    let mut sql = Duration::ZERO;
    let mut hist = Histogram::<u64>::new(3)?;

    for _ in 0..records {
        let stmt = table::insert_statement(&generator.record());
        let (res, elapsed) = timed(conn.query_drop(&stmt)).await;
        res?;
        sql += elapsed;
        hist.saturating_record(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    debug!(
        "statement latency p50: {:.1} ms\tp90: {:.1} ms\tp99: {:.1} ms\tmax: {:.1} ms",
        us_to_ms(hist.value_at_quantile(0.5)),
        us_to_ms(hist.value_at_quantile(0.9)),
        us_to_ms(hist.value_at_quantile(0.99)),
        us_to_ms(hist.max())
    );

    Ok(ScenarioResult {
        scenario: Scenario::Classic.to_string(),
        records,
        total: start.elapsed(),
        sql,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fake::FakeWarehouse;

    #[tokio::test]
    async fn one_statement_per_record() {
        let mut conn = FakeWarehouse::default();
        table::recreate(&mut conn).await.unwrap();

        let result = run(&mut conn, &mut RecordGenerator::new(1), 7)
            .await
            .unwrap();

        assert_eq!(result.records, 7);
        assert_eq!(conn.count("INSERT"), 7);
        assert_eq!(table::row_count(&mut conn).await.unwrap(), 7);
    }
}
