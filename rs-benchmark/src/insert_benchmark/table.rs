//! The temporary table every scenario inserts into, and the statements run against it.

use std::time::Duration;

use anyhow::{bail, Result};
use database_utils::QueryableConnection;
use tracing::{debug, info};

use crate::utils::generate::BenchmarkRecord;
use crate::utils::quote_literal;
use crate::utils::staging::{StagedObject, CSV_DELIMITER};
use crate::utils::timed;

pub const TABLE_NAME: &str = "_rs_benchmarking";
pub const COLUMNS: &str = "my_integer, my_smallint, my_decimal, my_timestamp, my_varchar";

pub fn drop_statement() -> String {
    format!("DROP TABLE {TABLE_NAME}")
}

/// The table only lives as long as the session that created it.
pub fn create_statement() -> String {
    format!(
        "CREATE TEMP TABLE {TABLE_NAME} (
            id BIGINT IDENTITY(0, 1),
            my_integer INTEGER,
            my_smallint SMALLINT,
            my_decimal DECIMAL(8, 2),
            my_timestamp TIMESTAMP,
            my_varchar VARCHAR(100)
        )"
    )
}

pub fn insert_statement(record: &BenchmarkRecord) -> String {
    bulk_insert_statement(std::slice::from_ref(record))
}

/// A single `INSERT` of every record in `records`, which must not be empty.
pub fn bulk_insert_statement(records: &[BenchmarkRecord]) -> String {
    let values = records
        .iter()
        .map(BenchmarkRecord::to_sql_values)
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {TABLE_NAME} ({COLUMNS}) VALUES {values}")
}

pub fn copy_statement(object: &StagedObject, iam_role: &str) -> String {
    format!(
        "COPY {TABLE_NAME} ({COLUMNS})
        FROM {}
        IAM_ROLE {}
        FORMAT AS CSV
        TIMEFORMAT 'YYYY-MM-DD HH:MI:SS'
        DELIMITER '{}'
        IGNOREHEADER AS 1",
        quote_literal(&object.to_string()),
        quote_literal(iam_role),
        CSV_DELIMITER as char,
    )
}

/// Drops the table if it is there and creates it again, empty. Returns the time taken.
pub async fn recreate<C>(conn: &mut C) -> Result<Duration>
where
    C: QueryableConnection,
{
    let (res, drop_time) = timed(conn.query_drop(&drop_statement())).await;
    if let Err(error) = res {
        debug!(%error, "Could not drop table, ignoring");
    }

    let (res, create_time) = timed(conn.query_drop(&create_statement())).await;
    res?;

    let elapsed = drop_time + create_time;
    info!("Create table executed in {:.4} seconds", elapsed.as_secs_f64());
    Ok(elapsed)
}

pub async fn row_count<C>(conn: &mut C) -> Result<u64>
where
    C: QueryableConnection,
{
    let count = conn
        .query_scalar(&format!("SELECT count(*) FROM {TABLE_NAME}"))
        .await?;
    Ok(u64::try_from(count)?)
}

/// Fails unless the table holds exactly `expected` rows.
pub async fn verify_row_count<C>(conn: &mut C, expected: usize) -> Result<()>
where
    C: QueryableConnection,
{
    let count = row_count(conn).await?;
    if count != expected as u64 {
        bail!("Expected {expected} rows in {TABLE_NAME} but found {count}");
    }
    Ok(())
}
