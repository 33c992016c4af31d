//! Batch runs over JSON-lines input.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use mindcheck_core::FusedResult;
use serde_json::Value;
use tracing::{info, warn};

use crate::assessor::Assessor;

/// One input line's outcome. `line` is 1-based.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub line: usize,
    pub result: Result<FusedResult, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub total: usize,
    pub assessed: usize,
    pub rejected: usize,
    pub degraded: usize,
    pub elapsed_secs: f64,
}

impl BatchStats {
    pub fn from_outcomes(outcomes: &[BatchOutcome], elapsed_secs: f64) -> Self {
        let mut stats = Self {
            total: outcomes.len(),
            elapsed_secs,
            ..Default::default()
        };
        for outcome in outcomes {
            match &outcome.result {
                Ok(r) => {
                    stats.assessed += 1;
                    if r.narrative_degraded {
                        stats.degraded += 1;
                    }
                }
                Err(_) => stats.rejected += 1,
            }
        }
        stats
    }
}

/// Parse JSON-lines text. Blank lines are skipped; unparsable lines are
/// kept as errors so they show up in the outcomes.
pub fn parse_jsonl(input: &str) -> Vec<(usize, Result<Value, String>)> {
    input
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            let parsed = serde_json::from_str(l).map_err(|e| format!("invalid JSON: {e}"));
            (i + 1, parsed)
        })
        .collect()
}

/// Assess every parsed line with at most `concurrency` requests in flight.
/// Outcomes come back in input order.
pub async fn run_batch(
    assessor: &Assessor,
    lines: Vec<(usize, Result<Value, String>)>,
    concurrency: usize,
) -> (Vec<BatchOutcome>, BatchStats) {
    let start = Instant::now();
    let total = lines.len();
    info!(total, concurrency, deployment = %assessor.deployment().kind, "starting batch");

    let mut outcomes: Vec<BatchOutcome> = stream::iter(lines)
        .map(|(line, parsed)| async move {
            let result = match parsed {
                Ok(raw) => assessor.assess(&raw).await.map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(line, error = %e, "batch line failed");
            }
            BatchOutcome { line, result }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    outcomes.sort_by_key(|o| o.line);

    let stats = BatchStats::from_outcomes(&outcomes, start.elapsed().as_secs_f64());
    info!(
        assessed = stats.assessed,
        rejected = stats.rejected,
        degraded = stats.degraded,
        "batch complete"
    );
    (outcomes, stats)
}
