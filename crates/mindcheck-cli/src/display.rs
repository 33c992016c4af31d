//! Terminal rendering of assessment results.

use std::fmt::Write;

use chrono::SecondsFormat;
use mindcheck_core::FusedResult;
use mindcheck_pipeline::{BatchOutcome, BatchStats};

const WRAP: usize = 88;

/// Print one result as a vertical card.
pub fn print_result_card(result: &FusedResult) {
    print!("{}", format_result_card(result));
}

pub fn format_result_card(r: &FusedResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} assessment ===", r.deployment);
    if let Some(id) = &r.identifier {
        let _ = writeln!(out, "{id}");
    }
    out.push('\n');

    let _ = writeln!(out, "Estimate");
    row(&mut out, "prediction", &r.label);
    row(&mut out, "model_probability", &format!("{:.4}", r.model_probability));
    out.push('\n');

    let _ = writeln!(out, "Reported");
    row(
        &mut out,
        "reported_probability",
        &format!("{:.2}%", r.reported_probability),
    );
    row(&mut out, "probability_source", r.probability_source.as_str());
    row(
        &mut out,
        "narrative_degraded",
        if r.narrative_degraded { "yes" } else { "no" },
    );
    row(
        &mut out,
        "assessed_at",
        &r.assessed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    out.push('\n');

    let _ = writeln!(out, "Narrative");
    for line in wrap(&r.narrative_text, WRAP) {
        let _ = writeln!(out, "  {line}");
    }
    out.push('\n');
    out
}

/// One line per failed batch line, then the totals.
pub fn print_batch_summary(outcomes: &[BatchOutcome], stats: &BatchStats) {
    for outcome in outcomes {
        if let Err(e) = &outcome.result {
            eprintln!("  line {:<6} {e}", outcome.line);
        }
    }
    println!("Batch");
    println!("  {:<26} {}", "total", stats.total);
    println!("  {:<26} {}", "assessed", stats.assessed);
    println!("  {:<26} {}", "rejected", stats.rejected);
    println!("  {:<26} {}", "narrative_degraded", stats.degraded);
    println!("  {:<26} {:.1}s", "elapsed", stats.elapsed_secs);
}

fn row(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "  {name:<26} {value}");
}

/// Greedy word wrap; keeps existing line breaks.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for para in text.lines() {
        let mut current = String::new();
        for word in para.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mindcheck_core::{DeploymentKind, ProbabilitySource};

    fn result() -> FusedResult {
        FusedResult {
            deployment: DeploymentKind::Essay,
            label: "Unassessed".into(),
            model_probability: 0.5,
            reported_probability: 83.5,
            probability_source: ProbabilitySource::Narrative,
            narrative_text: "Summary line.\nDepression Probability: 83.5%".into(),
            narrative_degraded: false,
            identifier: Some("u-1".into()),
            assessed_at: Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn card_sections() {
        let card = format_result_card(&result());
        assert!(card.starts_with("=== essay assessment ===\nu-1\n"));
        assert!(card.contains("  reported_probability       83.50%\n"));
        assert!(card.contains("  probability_source         narrative\n"));
        assert!(card.contains("  assessed_at                2026-05-04T09:30:00Z\n"));
        assert!(card.contains("  Depression Probability: 83.5%\n"));
    }

    #[test]
    fn wrap_respects_width_and_breaks() {
        let lines = wrap("aaa bbb ccc\nddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc", "ddd"]);
    }

    #[test]
    fn wrap_keeps_blank_lines() {
        assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
    }
}
