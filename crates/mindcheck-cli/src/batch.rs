//! Batch command: JSON-lines in, Parquet audit file out.

use std::path::Path;

use anyhow::Context;
use mindcheck_core::FusedResult;
use mindcheck_pipeline::{Assessor, BatchStats, parse_jsonl, run_batch};

use crate::display;

pub async fn run_batch_file(
    assessor: &Assessor,
    input: &Path,
    output: &Path,
    concurrency: usize,
) -> anyhow::Result<BatchStats> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let lines = parse_jsonl(&text);
    eprintln!("  Read {} requests from {}", lines.len(), input.display());

    let (outcomes, stats) = run_batch(assessor, lines, concurrency).await;

    let results: Vec<FusedResult> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok().cloned())
        .collect();
    if results.is_empty() {
        eprintln!("  Nothing to export");
    } else {
        let rows = mindcheck_store::export_results(output, &results)
            .with_context(|| format!("writing {}", output.display()))?;
        eprintln!("  Wrote {rows} results to {}", output.display());
    }

    display::print_batch_summary(&outcomes, &stats);
    Ok(stats)
}
