use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::SimpleQueryMessage;

use crate::error::DatabaseError;

/// A connection to the warehouse. The background task driving the connection finishes once this
/// is dropped or [closed](Self::close).
pub struct DatabaseConnection {
    client: tokio_postgres::Client,
    connection_handle: JoinHandle<Result<(), DatabaseError>>,
}

impl DatabaseConnection {
    pub(crate) fn new(
        client: tokio_postgres::Client,
        connection_handle: JoinHandle<Result<(), DatabaseError>>,
    ) -> Self {
        Self {
            client,
            connection_handle,
        }
    }

    /// Closes the connection and waits for the background task to wind down.
    pub async fn close(self) -> Result<(), DatabaseError> {
        let Self {
            client,
            connection_handle,
        } = self;
        // Dropping the client terminates the connection, which lets the task finish on its own
        drop(client);
        connection_handle.await?
    }
}

/// The queries the benchmarks need to run against a database. Every statement is sent with the
/// simple query protocol, so each one is committed on its own.
#[async_trait]
pub trait QueryableConnection: Send {
    /// Executes a statement (or several, separated by `;`) and discards any results.
    async fn query_drop(&mut self, query: &str) -> Result<(), DatabaseError>;

    /// Executes a query which returns a single integer, such as `SELECT count(*)`.
    async fn query_scalar(&mut self, query: &str) -> Result<i64, DatabaseError>;
}

#[async_trait]
impl QueryableConnection for DatabaseConnection {
    async fn query_drop(&mut self, query: &str) -> Result<(), DatabaseError> {
        self.client.batch_execute(query).await?;
        Ok(())
    }

    async fn query_scalar(&mut self, query: &str) -> Result<i64, DatabaseError> {
        let messages = self.client.simple_query(query).await?;
        let value = messages.iter().find_map(|m| match m {
            SimpleQueryMessage::Row(row) => Some(row.get(0).map(str::to_owned)),
            _ => None,
        });

        match value {
            Some(Some(v)) => v.trim().parse().map_err(|_| DatabaseError::UnexpectedResult {
                query: query.to_owned(),
                got: v,
            }),
            Some(None) => Err(DatabaseError::UnexpectedResult {
                query: query.to_owned(),
                got: "NULL".to_owned(),
            }),
            None => Err(DatabaseError::UnexpectedResult {
                query: query.to_owned(),
                got: "no rows".to_owned(),
            }),
        }
    }
}
