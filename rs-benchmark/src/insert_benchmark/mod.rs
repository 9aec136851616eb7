//! Compares ways of inserting the same generated records into a temporary table.
//!
//! The scenarios run one after the other on a single connection, always in the order bulk, copy,
//! classic, and draw their records from one seeded generator. Before each scenario the table is
//! recreated, and afterwards its row count is checked against the number of records the
//! scenario claims to have inserted.

use std::collections::HashMap;
use std::fmt;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{ArgAction, Args, ValueEnum};
use database_utils::{ConnectionParameters, QueryableConnection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::benchmark::{BenchmarkControl, BenchmarkResults};
use crate::reporting;
use crate::utils::generate::RecordGenerator;
use crate::utils::staging::{S3Stager, Stager, StagingPath};

mod bulk;
mod classic;
mod copy;
pub mod table;

pub use bulk::MAX_ROWS_PER_STATEMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    All,
    Classic,
    Bulk,
    Copy,
}

impl Scenario {
    /// The scenarios to run, in the order they run in.
    pub fn expand(self) -> Vec<Scenario> {
        match self {
            Self::All => vec![Self::Bulk, Self::Copy, Self::Classic],
            s => vec![s],
        }
    }

    pub fn includes(self, other: Scenario) -> bool {
        self.expand().contains(&other)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Classic => "Classic",
            Self::Bulk => "Bulk",
            Self::Copy => "Copy",
        })
    }
}

/// Where the copy scenario stages its file, and the role Redshift assumes to read it.
#[derive(Debug, Clone)]
pub struct CopyTarget {
    pub path: StagingPath,
    pub iam_role: String,
}

#[derive(Args, Clone, Debug, Serialize, Deserialize)]
pub struct InsertBenchmark {
    #[command(flatten)]
    pub connection: ConnectionParameters,

    /// When testing copy scenario: the s3 path to use
    #[arg(short = 'c', long)]
    #[serde(default)]
    pub copy_s3_path: Option<StagingPath>,

    /// When testing copy scenario: the iam role to use
    #[arg(short = 'i', long)]
    #[serde(default)]
    pub copy_iam_role: Option<String>,

    /// Number of records to insert
    #[arg(short = 'n', long, default_value = "10")]
    #[serde(default = "default_nbr_of_records")]
    pub nbr_of_records: usize,

    /// Which scenario(s) to execute
    #[arg(short = 's', long, value_enum, ignore_case = true, default_value = "all")]
    #[serde(default = "default_scenario")]
    pub scenario: Scenario,

    /// Most records the classic scenario inserts, as it issues one statement per record
    #[arg(long, default_value = "100")]
    #[serde(default = "default_classic_max_records")]
    pub classic_max_records: usize,

    /// Seed for the random record generator
    #[arg(long, default_value = "1")]
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Debug logging
    #[arg(short = 'd', long)]
    #[serde(default)]
    pub debug: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[serde(skip)]
    help: Option<bool>,
}

fn default_nbr_of_records() -> usize {
    10
}

fn default_scenario() -> Scenario {
    Scenario::All
}

fn default_classic_max_records() -> usize {
    100
}

fn default_seed() -> u64 {
    1
}

impl InsertBenchmark {
    /// Where to stage files for the copy scenario, if it is going to run.
    pub fn copy_target(&self) -> Result<Option<CopyTarget>> {
        if !self.scenario.includes(Scenario::Copy) {
            return Ok(None);
        }

        match (&self.copy_s3_path, &self.copy_iam_role) {
            (Some(path), Some(iam_role)) => Ok(Some(CopyTarget {
                path: path.clone(),
                iam_role: iam_role.clone(),
            })),
            _ => bail!("--copy-s3-path and --copy-iam-role are required for the copy scenario"),
        }
    }

    /// The number of records the classic scenario inserts, and whether that was capped.
    pub fn classic_records(&self) -> (usize, bool) {
        if self.nbr_of_records > self.classic_max_records {
            (self.classic_max_records, true)
        } else {
            (self.nbr_of_records, false)
        }
    }

    /// Runs every selected scenario over `conn`.
    pub async fn run<C, S>(&self, conn: &mut C, stager: Option<&S>) -> Result<BenchmarkResults>
    where
        C: QueryableConnection,
        S: Stager + ?Sized,
    {
        let copy_target = self.copy_target()?;
        let mut generator = RecordGenerator::new(self.seed);
        let mut results = BenchmarkResults::new();

        for scenario in self.scenario.expand() {
            let records = match scenario {
                Scenario::Classic => {
                    let (records, capped) = self.classic_records();
                    if capped {
                        reporting::warning(format!(
                            "For classic inserts, max nbr of records is {records}, using that \
                             then."
                        ));
                    }
                    records
                }
                _ => self.nbr_of_records,
            };

            table::recreate(conn).await?;
            let result = match scenario {
                Scenario::Bulk => {
                    bulk::run(conn, &mut generator, records, MAX_ROWS_PER_STATEMENT).await?
                }
                Scenario::Copy => {
                    let target = copy_target
                        .as_ref()
                        .context("copy scenario selected without a copy target")?;
                    let stager = stager.context("copy scenario selected without a stager")?;
                    copy::run(conn, stager, target, &mut generator, records).await?
                }
                Scenario::Classic => classic::run(conn, &mut generator, records).await?,
                Scenario::All => unreachable!("expand never yields All"),
            };

            table::verify_row_count(conn, result.records)
                .await
                .with_context(|| format!("{scenario} insert"))?;
            reporting::print_scenario(&result);
            results.push(result);
        }

        Ok(results)
    }
}

#[async_trait]
impl BenchmarkControl for InsertBenchmark {
    fn validate(&self) -> Result<()> {
        if self.nbr_of_records == 0 {
            bail!("--nbr-of-records must be at least 1");
        }
        if self.scenario.includes(Scenario::Classic) && self.classic_max_records == 0 {
            bail!("--classic-max-records must be at least 1");
        }
        self.copy_target()?;
        Ok(())
    }

    async fn benchmark(&self) -> Result<BenchmarkResults> {
        let stager = match self.copy_target()? {
            Some(target) => {
                info!(path = %target.path, "Staging copy files in S3");
                Some(S3Stager::from_env().await)
            }
            None => None,
        };

        let mut connection = self.connection.clone();
        let mut conn = connection
            .connect()
            .await
            .context("Unable to connect to Redshift")?;

        let results = self.run(&mut conn, stager.as_ref()).await;

        if let Err(error) = conn.close().await {
            debug!(%error, "Error closing connection");
        } else {
            debug!("Connection closed");
        }

        results
    }

    fn labels(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert("db_host".into(), self.connection.db_host.clone());
        labels.insert("db_name".into(), self.connection.db_name.clone());
        labels.insert("nbr_of_records".into(), self.nbr_of_records.to_string());
        labels.insert(
            "scenario".into(),
            self.scenario.to_string().to_ascii_lowercase(),
        );
        labels.insert("seed".into(), self.seed.to_string());
        labels
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;
    use crate::benchmark::Benchmark;
    use crate::utils::fake::{FakeStager, FakeWarehouse};

    #[derive(Parser)]
    struct TestRunner {
        #[command(subcommand)]
        benchmark: Benchmark,
    }

    fn parse(args: &[&str]) -> Result<InsertBenchmark, clap::Error> {
        let args = ["test", "insert"].into_iter().chain(args.iter().copied());
        TestRunner::try_parse_from(args).map(|r| match r.benchmark {
            Benchmark::Insert(b) => b,
        })
    }

    const CONNECTION: [&str; 6] = ["-h", "cluster", "-D", "dev", "-u", "admin"];

    fn insert(extra: &[&str]) -> InsertBenchmark {
        let args = CONNECTION.iter().chain(extra).copied().collect::<Vec<_>>();
        parse(&args).unwrap()
    }

    #[test]
    fn defaults() {
        let b = insert(&[]);
        assert_eq!(b.nbr_of_records, 10);
        assert_eq!(b.scenario, Scenario::All);
        assert_eq!(b.classic_max_records, 100);
        assert_eq!(b.seed, 1);
        assert!(!b.debug);
        assert_eq!(b.connection.db_port, 5439);
    }

    #[test]
    fn short_flags() {
        let b = insert(&[
            "-n",
            "500",
            "-s",
            "BULK",
            "-c",
            "s3://bucket/prefix",
            "-i",
            "arn:aws:iam::1:role/r",
            "-d",
            "-p",
            "5440",
        ]);
        assert_eq!(b.nbr_of_records, 500);
        assert_eq!(b.scenario, Scenario::Bulk);
        assert_eq!(b.copy_s3_path.unwrap().bucket, "bucket");
        assert_eq!(b.copy_iam_role.as_deref(), Some("arn:aws:iam::1:role/r"));
        assert!(b.debug);
        assert_eq!(b.connection.db_port, 5440);
    }

    #[test]
    fn rejects_missing_required() {
        assert!(parse(&["-D", "dev", "-u", "admin"]).is_err());
        assert!(parse(&["-h", "cluster", "-u", "admin"]).is_err());
        assert!(parse(&["-h", "cluster", "-D", "dev"]).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let mut args = CONNECTION.to_vec();
        args.extend(["-s", "upsert"]);
        assert!(parse(&args).is_err());

        let mut args = CONNECTION.to_vec();
        args.extend(["-c", "bucket/prefix"]);
        assert!(parse(&args).is_err());

        let mut args = CONNECTION.to_vec();
        args.extend(["-n", "-5"]);
        assert!(parse(&args).is_err());
    }

    #[test]
    fn copy_needs_path_and_role() {
        assert!(insert(&[]).validate().is_err());
        assert!(insert(&["-s", "copy", "-c", "s3://bucket"]).validate().is_err());
        assert!(insert(&["-s", "copy", "-i", "role"]).validate().is_err());
        insert(&["-s", "copy", "-c", "s3://bucket", "-i", "role"])
            .validate()
            .unwrap();
        insert(&["-s", "bulk"]).validate().unwrap();
        insert(&["-s", "classic"]).validate().unwrap();
    }

    #[test]
    fn zero_records_is_invalid() {
        assert!(insert(&["-s", "bulk", "-n", "0"]).validate().is_err());
    }

    #[test]
    fn scenario_order() {
        assert_eq!(
            Scenario::All.expand(),
            vec![Scenario::Bulk, Scenario::Copy, Scenario::Classic]
        );
        assert_eq!(Scenario::Copy.expand(), vec![Scenario::Copy]);
        assert!(Scenario::All.includes(Scenario::Copy));
        assert!(!Scenario::Bulk.includes(Scenario::Copy));
    }

    #[tokio::test]
    async fn every_scenario_inserts_exactly_the_requested_records() {
        let b = insert(&["-n", "42", "-c", "s3://bucket/prefix", "-i", "role"]);
        let stager = FakeStager::default();
        let mut conn = FakeWarehouse::reading_from(&stager);

        let results = b.run(&mut conn, Some(&stager)).await.unwrap();

        let scenarios = results
            .iter()
            .map(|r| r.scenario.as_str())
            .collect::<Vec<_>>();
        assert_eq!(scenarios, ["Bulk", "Copy", "Classic"]);
        for result in results.iter() {
            assert_eq!(result.records, 42);
            assert!(result.sql <= result.total);
            assert!(result.total >= Duration::ZERO);
        }
        assert_eq!(conn.count("CREATE TEMP TABLE"), 3);
        assert_eq!(conn.count("COPY"), 1);
    }

    #[tokio::test]
    async fn classic_is_capped() {
        let b = insert(&["-s", "classic", "-n", "150", "--classic-max-records", "20"]);
        assert_eq!(b.classic_records(), (20, true));
        let mut conn = FakeWarehouse::default();

        let results = b.run(&mut conn, None::<&FakeStager>).await.unwrap();

        assert_eq!(results.get("Classic").unwrap().records, 20);
        assert_eq!(conn.count("INSERT"), 20);
    }

    #[tokio::test]
    async fn only_selected_scenario_runs() {
        let b = insert(&["-s", "bulk", "-n", "5"]);
        let mut conn = FakeWarehouse::default();

        let results = b.run(&mut conn, None::<&FakeStager>).await.unwrap();

        assert_eq!(results.results.len(), 1);
        assert_eq!(results.get("Bulk").unwrap().records, 5);
        assert_eq!(conn.count("COPY"), 0);
    }

    #[test]
    fn yaml_benchmark_file() {
        let yaml = r#"
insert:
  connection:
    db_host: cluster
    db_name: dev
    db_user: admin
  nbr_of_records: 1000
  scenario: bulk
"#;
        let benchmark = Benchmark::from_yaml(yaml).unwrap();
        let Benchmark::Insert(b) = benchmark;
        assert_eq!(b.connection.db_port, 5439);
        assert_eq!(b.nbr_of_records, 1000);
        assert_eq!(b.scenario, Scenario::Bulk);
        assert_eq!(b.seed, 1);
        assert!(b.connection.db_password.is_none());
    }
}
