//! Printing benchmark results, and keeping them around in a results file.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use console::style;
use serde::Serialize;

use crate::benchmark::{Benchmark, BenchmarkResults, ScenarioResult};

pub fn print_scenario(result: &ScenarioResult) {
    println!("{}", style(result).bold());
}

/// Prints `msg` so it stands out from the rest of the output.
pub fn warning(msg: impl Display) {
    println!("{}", style(msg).white().on_red());
}

pub fn print_summary(results: &BenchmarkResults) {
    println!("Benchmark Results -----------------------");
    for result in results.iter() {
        let per_record = if result.records > 0 {
            result.total.as_secs_f64() * 1000.0 / result.records as f64
        } else {
            0.0
        };
        println!("\t{result} ({per_record:.3} ms/record)");
    }
}

/// One entry of a results file.
#[derive(Serialize)]
struct ResultsEntry<'a> {
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    benchmark: &'a Benchmark,
    results: &'a BenchmarkResults,
}

/// Appends the benchmark parameters and `results` to `path` as a YAML document, creating the file
/// if it does not exist yet.
pub fn append_results(
    path: &Path,
    benchmark: &Benchmark,
    results: &BenchmarkResults,
) -> anyhow::Result<()> {
    let entry = ResultsEntry { benchmark, results };
    let yaml = serde_yaml_ng::to_string(&entry)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Opening results file {}", path.display()))?;
    writeln!(file, "---")?;
    file.write_all(yaml.as_bytes())?;
    Ok(())
}
