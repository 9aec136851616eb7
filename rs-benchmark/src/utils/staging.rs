//! Staging CSV files in S3 for `COPY` to load from.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::generate::BenchmarkRecord;

/// Directory, under the staging path, that staged files are written to
pub const STAGING_DIR: &str = "_rs_benchmark";
const STAGED_FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H:%M:%S";
pub const CSV_DELIMITER: u8 = b';';
pub const CSV_HEADER: [&str; 5] = [
    "my_integer",
    "my_smallint",
    "my_decimal",
    "my_timestamp",
    "my_varchar",
];

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Invalid staging path '{0}', expected s3://<bucket>[/<prefix>]")]
    InvalidPath(String),

    #[error("Error writing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Error writing CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to upload {object}: {message}")]
    Upload { object: String, message: String },
}

/// An `s3://bucket/prefix` location that staged files are written beneath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StagingPath {
    pub bucket: String,
    pub prefix: String,
}

impl FromStr for StagingPath {
    type Err = StagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("s3://")
            .ok_or_else(|| StagingError::InvalidPath(s.to_owned()))?;
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(StagingError::InvalidPath(s.to_owned()));
        }

        Ok(Self {
            bucket: bucket.to_owned(),
            prefix: prefix.trim_matches('/').to_owned(),
        })
    }
}

impl TryFrom<String> for StagingPath {
    type Error = StagingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StagingPath> for String {
    fn from(path: StagingPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for StagingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.prefix)
        }
    }
}

impl StagingPath {
    /// The object a file staged at `now` is written to:
    /// `<prefix>/_rs_benchmark/<YYYYmmdd-HH:MM:SS>.csv`.
    pub fn object_for(&self, now: NaiveDateTime) -> StagedObject {
        let file_name = format!("{}.csv", now.format(STAGED_FILE_TIMESTAMP_FORMAT));
        let key = if self.prefix.is_empty() {
            format!("{STAGING_DIR}/{file_name}")
        } else {
            format!("{}/{STAGING_DIR}/{file_name}", self.prefix)
        };

        StagedObject {
            bucket: self.bucket.clone(),
            key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for StagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Encodes `records` as `;`-delimited CSV with a header row.
pub fn write_csv(records: &[BenchmarkRecord]) -> Result<Vec<u8>, StagingError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(record.to_csv_fields())?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Somewhere staged files can be written to.
#[async_trait]
pub trait Stager: Send + Sync {
    async fn put(&self, object: &StagedObject, body: Vec<u8>) -> Result<(), StagingError>;
}

/// Stages files in S3, with credentials from the default AWS provider chain.
pub struct S3Stager {
    client: aws_sdk_s3::Client,
}

impl S3Stager {
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }
}

#[async_trait]
impl Stager for S3Stager {
    async fn put(&self, object: &StagedObject, body: Vec<u8>) -> Result<(), StagingError> {
        debug!(%object, bytes = body.len(), "Uploading staged file");
        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .content_type("text/csv")
            .body(body.into())
            .send()
            .await
            .map_err(|e| StagingError::Upload {
                object: object.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}
