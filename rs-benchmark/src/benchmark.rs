//! Abstractions and data types required for the definition and execution of
//! an abstract benchmark.
//!
//! Each benchmark implements `BenchmarkControl`, an async trait that includes
//! the set of functions required to execute the benchmark in `BenchmarkRunner`.
//! Every benchmark should be a variant of the `Benchmark` enum, which handles
//! dynamically dispatching `BenchmarkControl`'s functions to variants.
//!
//! Each new benchmark implemented should:
//!     - Create a type that implements `BenchmarkControl`,
//!     - Add the type as a variant of `Benchmark`.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::insert_benchmark::InsertBenchmark;

#[allow(clippy::large_enum_variant)]
#[enum_dispatch(BenchmarkControl)]
#[derive(clap::Subcommand, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    /// Time bulk, copy and classic inserts into a temporary table
    #[command(disable_help_flag = true)]
    Insert(InsertBenchmark),
}

impl Benchmark {
    pub fn name_label(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
        }
    }

    /// Whether the benchmark asked for debug logging on its own command line.
    pub fn debug_logging(&self) -> bool {
        match self {
            Self::Insert(b) => b.debug,
        }
    }

    /// Reads a benchmark file, where the benchmark is a single-key map such as `insert: {...}`.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml_ng::Error> {
        let deserializer = serde_yaml_ng::Deserializer::from_str(yaml);
        serde_yaml_ng::with::singleton_map::deserialize(deserializer)
    }

    /// Writes the benchmark in the shape [`Benchmark::from_yaml`] reads back.
    pub fn to_yaml_writer<W>(&self, writer: W) -> Result<(), serde_yaml_ng::Error>
    where
        W: std::io::Write,
    {
        serde_yaml_ng::to_writer(writer, &BenchmarkFile(self))
    }
}

#[derive(Serialize)]
struct BenchmarkFile<'a>(#[serde(with = "serde_yaml_ng::with::singleton_map")] &'a Benchmark);

/// The set of control functions needed to execute the benchmark in
/// the `BenchmarkRunner`.
#[async_trait]
#[enum_dispatch]
pub trait BenchmarkControl {
    /// Checks that the parameters make sense together, before anything is run.
    fn validate(&self) -> Result<()>;

    /// Perform actual benchmarking, returning the timings of every scenario that ran.
    async fn benchmark(&self) -> Result<BenchmarkResults>;

    /// Labels describing this benchmark run.
    fn labels(&self) -> HashMap<String, String>;
}

/// The timings of a single insertion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    /// Number of records the scenario inserted.
    pub records: usize,
    /// Wall-clock time for the whole scenario, including generating the data.
    pub total: Duration,
    /// Time spent executing SQL statements.
    pub sql: Duration,
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} insert for {} records: {:.3}s of which {:.3}s in sql",
            self.scenario,
            self.records,
            self.total.as_secs_f64(),
            self.sql.as_secs_f64()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub results: Vec<ScenarioResult>,
}

impl BenchmarkResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    pub fn get(&self, scenario: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.scenario == scenario)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter()
    }
}
