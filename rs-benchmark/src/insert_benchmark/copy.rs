//! A CSV file staged in S3 and loaded with a single `COPY`.

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use database_utils::QueryableConnection;
use tracing::debug;

use super::{table, CopyTarget, Scenario};
use crate::benchmark::ScenarioResult;
use crate::utils::generate::RecordGenerator;
use crate::utils::staging::{self, Stager};
use crate::utils::timed;

pub async fn run<C, S>(
    conn: &mut C,
    stager: &S,
    target: &CopyTarget,
    generator: &mut RecordGenerator,
    records: usize,
) -> Result<ScenarioResult>
where
    C: QueryableConnection,
    S: Stager + ?Sized,
{
    debug!("Insert {records} records with copy insert");
    let start = Instant::now();
    let data = generator.records(records);

    let body = staging::write_csv(&data)?;
    let object = target.path.object_for(Local::now().naive_local());
    stager
        .put(&object, body)
        .await
        .with_context(|| format!("Staging {object}"))?;

    let stmt = table::copy_statement(&object, &target.iam_role);
    let (res, sql) = timed(conn.query_drop(&stmt)).await;
    res?;

    Ok(ScenarioResult {
        scenario: Scenario::Copy.to_string(),
        records,
        total: start.elapsed(),
        sql,
    })
}
