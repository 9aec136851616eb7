//! Connecting to the warehouse under test.
//!
//! [`ConnectionParameters`] is meant to be flattened into a benchmark's command line options. A
//! [`DatabaseConnection`] is built from it with [`ConnectionParameters::connect`]; benchmarks run
//! their statements through the [`QueryableConnection`] trait so they can be exercised without a
//! live database.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use tokio_postgres as pgsql;
use tokio_postgres::config::SslMode;
use tracing::debug;

mod connection;
pub mod error;
mod redacted;

pub use connection::{DatabaseConnection, QueryableConnection};
pub use error::DatabaseError;
pub use redacted::RedactedString;

/// Default port of a Redshift cluster
pub const DEFAULT_PORT: u16 = 5439;

const APPLICATION_NAME: &str = "rs-benchmark";

/// Environment variable the password is read from when none was configured
pub const PASSWORD_ENV: &str = "DB_PASSWORD";

#[derive(Debug, Clone, Args, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParameters {
    /// Server name
    #[arg(short = 'h', long)]
    pub db_host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    #[serde(default = "default_port")]
    pub db_port: u16,

    /// Database name
    #[arg(short = 'D', long)]
    pub db_name: String,

    /// User name
    #[arg(short = 'u', long)]
    pub db_user: String,

    /// Password for `db_user`. Prompted for interactively if not set.
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    #[serde(skip)]
    pub db_password: Option<RedactedString>,

    /// Seconds to wait for the connection to be established.
    #[arg(long, default_value = "30")]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl ConnectionParameters {
    /// Returns the configured password. Parameters loaded from a file carry no password, so
    /// [`PASSWORD_ENV`] is checked next, and only then is the user prompted on the terminal.
    /// The resolved password is remembered for later connections.
    pub fn resolve_password(&mut self) -> Result<RedactedString, DatabaseError> {
        if let Some(password) = &self.db_password {
            return Ok(password.clone());
        }

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            debug!("Using password from {PASSWORD_ENV}");
            let password = RedactedString::from(password);
            self.db_password = Some(password.clone());
            return Ok(password);
        }

        let password: RedactedString = dialoguer::Password::new()
            .with_prompt("Type your password (or set DB_PASSWORD env variable)")
            .allow_empty_password(true)
            .interact()
            .map_err(|e| DatabaseError::PasswordPrompt(e.to_string()))?
            .into();
        self.db_password = Some(password.clone());
        Ok(password)
    }

    /// Builds the driver configuration. TLS is always required.
    pub fn config(&self, password: &RedactedString) -> pgsql::Config {
        let mut config = pgsql::Config::new();
        config
            .host(&self.db_host)
            .port(self.db_port)
            .dbname(&self.db_name)
            .user(&self.db_user)
            .password(password.as_bytes())
            .ssl_mode(SslMode::Require)
            .application_name(APPLICATION_NAME)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs));
        config
    }

    /// Create a new [`DatabaseConnection`] to the configured database
    pub async fn connect(&mut self) -> Result<DatabaseConnection, DatabaseError> {
        debug!(
            "Connect to {}@{}:{}/{}",
            self.db_user, self.db_host, self.db_port, self.db_name
        );
        let password = self.resolve_password()?;
        let config = self.config(&password);

        let connector = native_tls::TlsConnector::builder().build()?;
        let tls = postgres_native_tls::MakeTlsConnector::new(connector);
        let (client, connection) = config.connect(tls).await?;
        let connection_handle = tokio::spawn(async move { connection.await.map_err(Into::into) });

        Ok(DatabaseConnection::new(client, connection_handle))
    }
}
