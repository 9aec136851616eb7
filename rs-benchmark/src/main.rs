use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueHint};
use rs_benchmark::benchmark::{Benchmark, BenchmarkControl};
use rs_benchmark::reporting;
use rs_benchmark::utils::path::benchmark_path;
use tracing::{info, warn};

/// Time different ways of inserting records into Redshift
#[derive(Parser)]
#[command(name = "rs-benchmark", subcommand_negates_reqs = true)]
struct BenchmarkRunner {
    #[command(flatten)]
    tracing: benchmark_tracing::Options,

    #[command(subcommand)]
    benchmark_cmd: Option<Benchmark>,

    /// Pass in the benchmark parameters as a YAML formatted file. This overwrites any benchmark
    /// subcommand passed in. Files bundled with the benchmarks can be referenced by name.
    #[arg(long, value_hint = ValueHint::AnyPath, required = true)]
    benchmark: Option<PathBuf>,

    /// The number of times we should run the benchmark.
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    iterations: u32,

    /// Instead of running the benchmark, write its parameters to this file, to be run later
    /// with `--benchmark`.
    #[arg(long, value_hint = ValueHint::AnyPath)]
    only_to_spec: Option<PathBuf>,

    /// A file to append the benchmark results to, creates the file if it has not yet been
    /// created.
    #[arg(long, value_hint = ValueHint::FilePath)]
    results_file: Option<PathBuf>,
}

impl BenchmarkRunner {
    fn benchmark_cmd(&self) -> anyhow::Result<Benchmark> {
        match (&self.benchmark, &self.benchmark_cmd) {
            (Some(f), _) => {
                let path = benchmark_path(f)?;
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Reading benchmark file {}", path.display()))?;
                Benchmark::from_yaml(&contents)
                    .with_context(|| format!("Parsing benchmark file {}", path.display()))
            }
            (None, Some(cmd)) => Ok(cmd.clone()),
            (None, None) => {
                anyhow::bail!("Either a benchmark subcommand or --benchmark is required")
            }
        }
    }

    async fn run(mut self) -> anyhow::Result<()> {
        let benchmark_cmd = self.benchmark_cmd()?;
        if benchmark_cmd.debug_logging() {
            self.tracing.enable_debug();
        }
        let _guard = self.tracing.init("rs-benchmark")?;

        if self.benchmark.is_some() && self.benchmark_cmd.is_some() {
            warn!("A benchmark subcommand was provided but will be overwritten by --benchmark");
        }

        benchmark_cmd.validate()?;

        if let Some(f) = &self.only_to_spec {
            let f = std::fs::File::create(f)?;
            benchmark_cmd.to_yaml_writer(f)?;
            return Ok(());
        }

        info!(
            benchmark = benchmark_cmd.name_label(),
            labels = ?benchmark_cmd.labels(),
            "Running benchmark"
        );
        for i in 0..self.iterations {
            if self.iterations > 1 {
                println!("Iteration: {} ---------------------------", i + 1);
            }
            let results = benchmark_cmd.benchmark().await?;

            reporting::print_summary(&results);
            if let Some(f) = &self.results_file {
                reporting::append_results(f, &benchmark_cmd, &results)?;
            }
        }

        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    BenchmarkRunner::parse().run().await
}
