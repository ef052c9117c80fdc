//! @ai:module:intent Human-readable console summaries for batches, verdicts and metric comparisons
//! @ai:module:layer presentation
//! @ai:module:public_api render_batch_summary, render_verification_result, render_comparison, print_*
//! @ai:module:stateless true

use crate::gateway::{MetricComparison, MetricKey, VerificationOutcome, VerificationStatus};
use crate::metrics::{BatchSummary, InstanceFailure};
use std::fmt::Write as FmtWrite;

/// Errors listed by the verification printer before truncating.
pub const MAX_PRINTED_ERRORS: usize = 10;

/// @ai:intent Render the end-of-batch summary
/// @ai:effects pure
pub fn render_batch_summary(summary: &BatchSummary, failures: &[InstanceFailure]) -> String {
    let mut output = String::new();

    writeln!(output).unwrap();
    writeln!(output, "=== Batch Summary ===").unwrap();
    if !summary.timestamp.is_empty() {
        writeln!(output, "Started: {}", summary.timestamp).unwrap();
    }
    writeln!(output, "Solved: {}/{}", summary.solved, summary.discovered).unwrap();

    if !failures.is_empty() {
        writeln!(output, "Failed: {}", failures.len()).unwrap();
        for failure in failures {
            writeln!(output, "  - {} [{}]: {}", failure.instance, failure.stage, failure.message).unwrap();
        }
    }

    if let Some(cost) = summary.mean_total_cost {
        writeln!(output, "Mean total cost: {:.2}", cost).unwrap();
    }
    if let Some(time) = summary.mean_solve_time {
        writeln!(output, "Mean solve time: {:.3}s", time).unwrap();
    }
    if let Some(verified) = summary.verified {
        writeln!(
            output,
            "Verified remotely: {}/{} ({:.1}%)",
            verified.count,
            summary.solved,
            verified.fraction * 100.0
        )
        .unwrap();
    }

    output
}

fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}

/// @ai:intent Render a remote verification verdict
/// @ai:effects pure
pub fn render_verification_result(outcome: &VerificationOutcome) -> String {
    let mut output = String::new();

    writeln!(output, "=== Verification Result ===").unwrap();

    match outcome.status() {
        VerificationStatus::Feasible(metrics) => {
            writeln!(output, "Verdict: FEASIBLE").unwrap();
            writeln!(output, "Metrics:").unwrap();
            for key in MetricKey::ALL {
                writeln!(output, "  {}: {}", key.label(), format_metric(metrics.get(key))).unwrap();
            }
            if let Some(total) = metrics.total_cost() {
                writeln!(output, "  Total cost: {:.2}", total).unwrap();
            }
        }
        VerificationStatus::FeasibleWithoutMetrics => {
            writeln!(output, "Verdict: FEASIBLE").unwrap();
            writeln!(output, "Solution is feasible but metrics are unavailable").unwrap();
        }
        VerificationStatus::Infeasible => {
            writeln!(output, "Verdict: INFEASIBLE").unwrap();
        }
    }

    if !outcome.errors.is_empty() {
        writeln!(output, "Errors ({}):", outcome.errors.len()).unwrap();
        for error in outcome.errors.iter().take(MAX_PRINTED_ERRORS) {
            writeln!(output, "  - {}", error).unwrap();
        }
        if outcome.errors.len() > MAX_PRINTED_ERRORS {
            writeln!(output, "  ... and {} more", outcome.errors.len() - MAX_PRINTED_ERRORS).unwrap();
        }
    }

    output
}

/// @ai:intent Render a local-vs-remote metric table
/// @ai:effects pure
pub fn render_comparison(comparisons: &[MetricComparison]) -> String {
    let mut output = String::new();

    writeln!(output, "=== Local vs Remote ===").unwrap();
    if comparisons.is_empty() {
        writeln!(output, "No comparable metrics reported").unwrap();
        return output;
    }

    writeln!(output, "{:<18} {:>12} {:>12} {:>10}", "Metric", "Local", "Remote", "Match").unwrap();
    for c in comparisons {
        writeln!(
            output,
            "{:<18} {:>12.2} {:>12.2} {:>10}",
            c.metric.label(),
            c.local,
            c.remote,
            if c.matches() { "yes" } else { "NO" }
        )
        .unwrap();
    }

    output
}

/// @ai:effects io
pub fn print_batch_summary(summary: &BatchSummary, failures: &[InstanceFailure]) {
    print!("{}", render_batch_summary(summary, failures));
}

/// @ai:effects io
pub fn print_verification_result(outcome: &VerificationOutcome) {
    print!("{}", render_verification_result(outcome));
}

/// @ai:effects io
pub fn print_comparison(comparisons: &[MetricComparison]) {
    print!("{}", render_comparison(comparisons));
}
