use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::sinks::{DataSink, JsonlSink};
use booleval::config::RuntimeConfig;
use booleval::evaluator::Evaluator;
use booleval::records::parse_record;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter expression, e.g. `kind foo and (size gt 1 or name neq bar)`
    #[arg(short, long, env = "BOOLEVAL_EXPR")]
    pub expr: Option<String>,

    /// Filter configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input JSON Lines file (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file for matching records (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Match keywords regardless of case
    #[arg(long)]
    pub case_insensitive: bool,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Records evaluated per parallel batch (default: 4096)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub read: u64,
    pub matched: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Accept,
    Reject,
    Skip,
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p == Path::new("-"))
}

pub fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match input {
        Some(path) if !is_stdio(input) => {
            tracing::info!("Source: {:?}", path);
            let file = File::open(path)
                .with_context(|| format!("CLI: Failed to open input {:?}", path))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => {
            tracing::info!("Source: stdin");
            Ok(Box::new(std::io::stdin().lock()))
        }
    }
}

pub fn init_sink(output: Option<&Path>) -> Result<Box<dyn DataSink>> {
    match output {
        Some(path) if !is_stdio(output) => {
            tracing::info!("Sink: jsonl -> {:?}", path);
            let sink = JsonlSink::new(path)
                .with_context(|| format!("CLI: Failed to create output {:?}", path))?;
            Ok(Box::new(sink))
        }
        _ => {
            tracing::info!("Sink: jsonl -> stdout");
            Ok(Box::new(JsonlSink::stdout()?))
        }
    }
}

/// Compile the configured expression; unlike the library, an invalid one is fatal here.
pub fn build_evaluator(runtime: &RuntimeConfig) -> Result<Evaluator> {
    let mut evaluator = Evaluator::with_options(runtime.options);
    if !evaluator.build_expression_tree(&runtime.expression) {
        let reason = evaluator
            .last_error()
            .map(ToString::to_string)
            .unwrap_or_default();
        anyhow::bail!(
            "Filter: Invalid expression {:?}: {}",
            runtime.expression,
            reason
        );
    }

    match evaluator.tree().root() {
        Some(root) => tracing::info!("Filter: {}", root),
        None => tracing::info!("Filter: empty, passing all records"),
    }
    Ok(evaluator)
}

fn decide(evaluator: &Evaluator, line: &str) -> Decision {
    match parse_record(line) {
        None => Decision::Skip,
        Some(fields) if evaluator.evaluate(&fields) => Decision::Accept,
        Some(_) => Decision::Reject,
    }
}

fn flush_batch(
    evaluator: &Evaluator,
    batch: &mut Vec<(usize, String)>,
    sink: &mut dyn DataSink,
    stats: &mut FilterStats,
) -> Result<()> {
    let decisions: Vec<Decision> = batch
        .par_iter()
        .map(|(_, line)| decide(evaluator, line))
        .collect();

    for ((line_no, line), decision) in batch.iter().zip(decisions) {
        stats.read += 1;
        match decision {
            Decision::Accept => {
                sink.add_record(line)
                    .with_context(|| format!("Pipeline: Failed writing line {}", line_no))?;
                stats.matched += 1;
            }
            Decision::Reject => {}
            Decision::Skip => {
                tracing::warn!("Pipeline: Skipping line {}: not a JSON object", line_no);
                stats.skipped += 1;
            }
        }
    }

    batch.clear();
    Ok(())
}

/// Filter JSON Lines records from `reader` into `sink`, preserving input order.
pub fn process_records<R: BufRead>(
    evaluator: &Evaluator,
    reader: R,
    sink: &mut dyn DataSink,
    batch_size: usize,
) -> Result<FilterStats> {
    let batch_size = batch_size.max(1);
    let mut stats = FilterStats::default();
    let mut batch = Vec::with_capacity(batch_size);

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Pipeline: Failed reading line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        batch.push((line_no, line));
        if batch.len() >= batch_size {
            flush_batch(evaluator, &mut batch, sink, &mut stats)?;
        }
    }

    flush_batch(evaluator, &mut batch, sink, &mut stats)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use std::io::Cursor;

    const RECORDS: &str = r#"{"kind":"foo","size":1}
{"kind":"bar","size":5}

{"kind":"foo","size":3.5}
not json
{"kind":"baz"}
"#;

    fn runtime(expression: &str) -> RuntimeConfig {
        RuntimeConfig {
            expression: expression.to_string(),
            ..RuntimeConfig::default()
        }
    }

    fn run(expression: &str, batch_size: usize) -> (MemorySink, FilterStats) {
        let evaluator = build_evaluator(&runtime(expression)).unwrap();
        let mut sink = MemorySink::default();
        let stats =
            process_records(&evaluator, Cursor::new(RECORDS), &mut sink, batch_size).unwrap();
        (sink, stats)
    }

    #[test]
    fn test_filters_records_in_order() {
        let (sink, stats) = run("kind foo or size gt 4", 2);
        assert_eq!(
            sink.records,
            vec![
                r#"{"kind":"foo","size":1}"#,
                r#"{"kind":"bar","size":5}"#,
                r#"{"kind":"foo","size":3.5}"#,
            ]
        );
        assert_eq!(
            stats,
            FilterStats {
                read: 5,
                matched: 3,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_empty_expression_passes_every_object() {
        let (sink, stats) = run("", 4096);
        assert_eq!(sink.records.len(), 4);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_missing_field_rejects() {
        let (sink, _) = run("size geq 1", 1);
        assert_eq!(sink.records.len(), 3);
        assert!(sink.records.iter().all(|r| r.contains("size")));
    }

    #[test]
    fn test_invalid_expression_is_an_error() {
        let err = build_evaluator(&runtime("(kind foo")).unwrap_err();
        assert!(err.to_string().contains("Invalid expression"));
    }
}
