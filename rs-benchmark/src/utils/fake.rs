//! In-memory stand-ins for a warehouse and S3, which track how many rows the benchmark table
//! holds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use database_utils::{DatabaseError, QueryableConnection};

use super::staging::{StagedObject, Stager, StagingError};

type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;

fn error(query: &str, got: &str) -> DatabaseError {
    DatabaseError::UnexpectedResult {
        query: query.to_owned(),
        got: got.to_owned(),
    }
}

#[derive(Default, Clone)]
pub(crate) struct FakeStager {
    objects: Objects,
}

#[async_trait]
impl Stager for FakeStager {
    async fn put(&self, object: &StagedObject, body: Vec<u8>) -> Result<(), StagingError> {
        self.objects
            .lock()
            .unwrap()
            .insert(object.to_string(), body);
        Ok(())
    }
}

/// Understands just enough SQL to follow the benchmark table through a run.
#[derive(Default)]
pub(crate) struct FakeWarehouse {
    /// Every statement sent to the warehouse, in order
    pub statements: Vec<String>,
    /// Rows in the benchmark table, or `None` if it doesn't exist
    rows: Option<usize>,
    objects: Objects,
}

impl FakeWarehouse {
    /// A warehouse that can `COPY` from whatever `stager` staged.
    pub fn reading_from(stager: &FakeStager) -> Self {
        Self {
            objects: stager.objects.clone(),
            ..Default::default()
        }
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.statements
            .iter()
            .filter(|s| s.trim_start().to_ascii_uppercase().starts_with(prefix))
            .count()
    }

    fn rows_mut(&mut self, query: &str) -> Result<&mut usize, DatabaseError> {
        self.rows
            .as_mut()
            .ok_or_else(|| error(query, "relation does not exist"))
    }
}

#[async_trait]
impl QueryableConnection for FakeWarehouse {
    async fn query_drop(&mut self, query: &str) -> Result<(), DatabaseError> {
        self.statements.push(query.to_owned());
        let normalized = query.trim_start().to_ascii_uppercase();

        if normalized.starts_with("DROP TABLE") {
            self.rows
                .take()
                .ok_or_else(|| error(query, "relation does not exist"))?;
        } else if normalized.starts_with("CREATE TEMP TABLE") {
            self.rows = Some(0);
        } else if normalized.starts_with("INSERT INTO") {
            let values = normalized
                .split_once("VALUES")
                .ok_or_else(|| error(query, "syntax error"))?
                .1;
            // Generated values never contain parentheses
            *self.rows_mut(query)? += values.matches('(').count();
        } else if normalized.starts_with("COPY") {
            let from = query
                .split_once("FROM '")
                .and_then(|(_, rest)| rest.split_once('\''))
                .ok_or_else(|| error(query, "syntax error"))?
                .0;
            let lines = self
                .objects
                .lock()
                .unwrap()
                .get(from)
                .map(|body| body.iter().filter(|b| **b == b'\n').count())
                .ok_or_else(|| error(query, "object does not exist"))?;
            // Skip the header
            *self.rows_mut(query)? += lines.saturating_sub(1);
        } else {
            return Err(error(query, "unsupported statement"));
        }

        Ok(())
    }

    async fn query_scalar(&mut self, query: &str) -> Result<i64, DatabaseError> {
        self.statements.push(query.to_owned());
        if !query.to_ascii_uppercase().contains("COUNT(*)") {
            return Err(error(query, "unsupported statement"));
        }
        Ok(*self.rows_mut(query)? as i64)
    }
}
