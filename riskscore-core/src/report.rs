//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs
//! - Labels come from the single classifier (`level`, `fac`, `status`)

use crate::aggregates::{LevelCount, PortfolioSummary};
use crate::record::ControlRecord;
use crate::status::StatusReport;
use crate::ScoredRisk;
use serde::Serialize;
use std::cmp::Ordering;

/// Sort scored risks deterministically
pub fn sort_scored_risks(mut risks: Vec<ScoredRisk>) -> Vec<ScoredRisk> {
    risks.sort_by(|a, b| {
        // 1. Residual risk descending
        b.scores
            .residual_risk
            .partial_cmp(&a.scores.residual_risk)
            .unwrap_or(Ordering::Equal)
            // 2. Inherent risk descending
            .then_with(|| b.scores.inherent_risk.cmp(&a.scores.inherent_risk))
            // 3. Name ascending
            .then_with(|| a.record.name.cmp(&b.record.name))
            // 4. Id ascending (None last)
            .then_with(|| match (&a.record.id, &b.record.id) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
    risks
}

/// Render scored risks as a text table
pub fn render_risks_text(risks: &[ScoredRisk]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<30} {:<9} {:<12} {:<5} {:<13} {:<9} {:<12} {}\n",
        "RISK", "INHERENT", "LEVEL", "FAC", "FAC LEVEL", "RESIDUAL", "LEVEL", "DEADLINE"
    ));

    for risk in risks {
        let scores = &risk.scores;
        let deadline = scores.max_implementation_date_iso();
        output.push_str(&format!(
            "{:<30} {:<9} {:<12} {:<5.1} {:<13} {:<9.2} {:<12} {}\n",
            truncate_or_pad(&risk.record.name, 30),
            scores.inherent_risk,
            scores.inherent_level().label(),
            scores.fac,
            scores.fac_level().label(),
            scores.residual_risk,
            scores.residual_level().label(),
            if deadline.is_empty() { "-" } else { deadline.as_str() },
        ));
    }

    output
}

/// Render one scored risk with its full breakdown
pub fn render_risk_detail(risk: &ScoredRisk) -> String {
    let scores = &risk.scores;
    let deadline = scores.max_implementation_date_iso();
    let mut output = String::new();

    output.push_str(&format!("Risk: {}\n", risk.record.name));
    output.push_str(&format!(
        "  Inherent:  {} ({}, tier {})\n",
        scores.inherent_risk,
        scores.inherent_level().label(),
        scores.inherent_level().tier()
    ));
    output.push_str(&format!(
        "  FAC:       {:.1} ({})\n",
        scores.fac,
        scores.fac_level().label()
    ));
    output.push_str(&format!(
        "  Residual:  {:.2} ({}, tier {})\n",
        scores.residual_risk,
        scores.residual_level().label(),
        scores.residual_level().tier()
    ));
    output.push_str(&format!(
        "  Deadline:  {}\n",
        if deadline.is_empty() { "none (monitor only)" } else { deadline.as_str() }
    ));
    output.push_str(&format!("  Response:  {}\n", scores.suggested_response));
    output.push_str(&format!(
        "  Action:    {}\n",
        if scores.requires_action { "required" } else { "not required" }
    ));

    output
}

/// Render a control status line
pub fn render_control_text(control: &ControlRecord, status: &StatusReport) -> String {
    let detail = match (status.days_overdue(), status.days_remaining) {
        (Some(late), _) => format!(" ({} day(s) late)", late),
        (None, Some(days)) => format!(" ({} day(s) remaining)", days),
        (None, None) => String::new(),
    };
    format!(
        "{} [{}] {}{}\n",
        control.name,
        status.status,
        status.display.label(),
        detail
    )
}

fn render_level_counts(title: &str, counts: &[LevelCount], output: &mut String) {
    output.push_str(&format!("{}\n", title));
    for entry in counts.iter().filter(|c| c.count > 0) {
        output.push_str(&format!(
            "  {:<12} {:>5}\n",
            entry.level.label(),
            entry.count
        ));
    }
}

/// Render a portfolio summary as text
pub fn render_summary_text(summary: &PortfolioSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Risks: {} (LGPD: {}, requiring action: {})\n",
        summary.total_risks, summary.lgpd_related, summary.requiring_action
    ));
    render_level_counts("Inherent levels:", &summary.inherent_by_level, &mut output);
    render_level_counts("Residual levels:", &summary.residual_by_level, &mut output);

    if !summary.matrix.is_empty() {
        output.push_str("Matrix (P x I):\n");
        for cell in &summary.matrix {
            output.push_str(&format!(
                "  {}x{} = {:<3} bucket {:<3} {:<12} {:>5}\n",
                cell.probability,
                cell.impact,
                u32::from(cell.probability) * u32::from(cell.impact),
                cell.bucket,
                cell.level.label(),
                cell.count
            ));
        }
    }

    let controls = &summary.controls;
    output.push_str(&format!(
        "Controls: {} (implemented {}, pending {}, on-time {}, near-due {}, overdue {})\n",
        controls.total(),
        controls.implemented,
        controls.pending,
        controls.on_time,
        controls.near_due,
        controls.overdue
    ));
    for overdue in &summary.overdue_controls {
        output.push_str(&format!(
            "  {:<30} {} day(s) late\n",
            truncate_or_pad(&overdue.name, 30),
            overdue.days_overdue
        ));
    }

    output
}

/// Render any serializable value as JSON output
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Truncate or pad string to fixed width (in characters)
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
