//! Benchmarks comparing ways of inserting records into a Redshift cluster.
//!
//! Every benchmark implements [`BenchmarkControl`](benchmark::BenchmarkControl) and is a variant of
//! the [`Benchmark`](benchmark::Benchmark) enum, which is also the set of subcommands accepted by
//! the `rs-benchmark` binary. Benchmarks talk to the database through
//! [`QueryableConnection`](database_utils::QueryableConnection), which keeps the scenarios
//! independent of a live cluster.
//!
//! The `insert` benchmark runs up to three scenarios, each against a freshly created temporary
//! table:
//!
//! - `bulk`: multi-row `INSERT ... VALUES` statements,
//! - `copy`: a CSV file staged in S3 and loaded with `COPY`,
//! - `classic`: one single-row `INSERT` per record.
//!
//! ```bash
//! DB_PASSWORD=... rs-benchmark insert -h my-cluster.redshift.amazonaws.com -D dev -u admin \
//!     -n 1000 -s bulk
//! ```

pub mod benchmark;
pub mod insert_benchmark;
pub mod reporting;
pub mod utils;
