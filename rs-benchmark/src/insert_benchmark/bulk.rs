//! Multi-row `INSERT ... VALUES` statements.

use std::time::{Duration, Instant};

use anyhow::Result;
use database_utils::QueryableConnection;
use tracing::debug;

use super::{table, Scenario};
use crate::benchmark::ScenarioResult;
use crate::utils::generate::RecordGenerator;
use crate::utils::timed;

/// Most rows sent in a single statement
pub const MAX_ROWS_PER_STATEMENT: usize = 50_000;

pub async fn run<C>(
    conn: &mut C,
    generator: &mut RecordGenerator,
    records: usize,
    max_rows_per_statement: usize,
) -> Result<ScenarioResult>
where
    C: QueryableConnection,
{
    debug!("Insert {records} records with bulk insert");
    let start = Instant::now();
    let data = generator.records(records);

    let mut sql = Duration::ZERO;
    for chunk in data.chunks(max_rows_per_statement.max(1)) {
        let stmt = table::bulk_insert_statement(chunk);
        let (res, elapsed) = timed(conn.query_drop(&stmt)).await;
        res?;
        sql += elapsed;
    }

    Ok(ScenarioResult {
        scenario: Scenario::Bulk.to_string(),
        records,
        total: start.elapsed(),
        sql,
    })
}
