//! Portfolio aggregates for dashboard and matrix views
//!
//! Global invariants enforced:
//! - Aggregates are strictly derived from primitive record fields (stored
//!   derived values are recomputed, never trusted)
//! - Classification and status come from `level` and `status` only
//! - Deterministic ordering

use crate::level::{bucket_value, classify_inherent, RiskLevel};
use crate::record::{ControlRecord, RiskRecord};
use crate::scoring::compute_risk_values;
use crate::status::{compute_control_status, StatusDisplay};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of risks at a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCount {
    pub level: RiskLevel,
    pub tier: u8,
    pub count: usize,
}

/// One populated cell of the probability x impact matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub probability: u8,
    pub impact: u8,
    pub bucket: u32,
    pub level: RiskLevel,
    pub count: usize,
}

/// Control counts per displayed status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlStatusCounts {
    pub implemented: usize,
    pub pending: usize,
    pub on_time: usize,
    pub near_due: usize,
    pub overdue: usize,
}

impl ControlStatusCounts {
    pub fn total(&self) -> usize {
        self.implemented + self.pending + self.on_time + self.near_due + self.overdue
    }

    fn record(&mut self, display: StatusDisplay) {
        match display {
            StatusDisplay::Implemented => self.implemented += 1,
            StatusDisplay::Pending => self.pending += 1,
            StatusDisplay::OnTime => self.on_time += 1,
            StatusDisplay::NearDue => self.near_due += 1,
            StatusDisplay::Overdue => self.overdue += 1,
        }
    }
}

/// An overdue control and how late it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueControl {
    pub risk_id: String,
    pub name: String,
    pub days_overdue: i64,
}

/// Portfolio-wide summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_risks: usize,
    pub lgpd_related: usize,
    pub requiring_action: usize,
    pub inherent_by_level: Vec<LevelCount>,
    pub residual_by_level: Vec<LevelCount>,
    pub matrix: Vec<MatrixCell>,
    pub controls: ControlStatusCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overdue_controls: Vec<OverdueControl>,
}

/// Count levels in tier order, including empty levels
fn level_counts(levels: impl Iterator<Item = RiskLevel>) -> Vec<LevelCount> {
    let mut counts: BTreeMap<RiskLevel, usize> = RiskLevel::ALL.iter().map(|l| (*l, 0)).collect();
    for level in levels {
        *counts.entry(level).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(level, count)| LevelCount {
            level,
            tier: level.tier(),
            count,
        })
        .collect()
}

/// Compute matrix cells (only populated cells, sorted by probability then impact)
pub fn compute_matrix(risks: &[RiskRecord]) -> Vec<MatrixCell> {
    let mut cells: BTreeMap<(u8, u8), usize> = BTreeMap::new();
    for risk in risks {
        *cells.entry((risk.probability, risk.impact)).or_insert(0) += 1;
    }

    cells
        .into_iter()
        .map(|((probability, impact), count)| {
            let inherent = u32::from(probability) * u32::from(impact);
            MatrixCell {
                probability,
                impact,
                bucket: bucket_value(inherent),
                level: classify_inherent(inherent),
                count,
            }
        })
        .collect()
}

/// Count controls by displayed status as of `today`
pub fn compute_control_counts(controls: &[ControlRecord], today: NaiveDate) -> ControlStatusCounts {
    let mut counts = ControlStatusCounts::default();
    for control in controls {
        counts.record(compute_control_status(&control.status_input(), today).display);
    }
    counts
}

/// Overdue controls, most late first (ties by risk id, then name)
pub fn compute_overdue_controls(controls: &[ControlRecord], today: NaiveDate) -> Vec<OverdueControl> {
    let mut overdue: Vec<OverdueControl> = controls
        .iter()
        .filter_map(|control| {
            let report = compute_control_status(&control.status_input(), today);
            report.days_overdue().map(|days_overdue| OverdueControl {
                risk_id: control.risk_id.clone(),
                name: control.name.clone(),
                days_overdue,
            })
        })
        .collect();

    overdue.sort_by(|a, b| {
        b.days_overdue
            .cmp(&a.days_overdue)
            .then_with(|| a.risk_id.cmp(&b.risk_id))
            .then_with(|| a.name.cmp(&b.name))
    });
    overdue
}

/// Summarize a portfolio of risks and controls as of `today`
pub fn summarize(risks: &[RiskRecord], controls: &[ControlRecord], today: NaiveDate) -> PortfolioSummary {
    let scores: Vec<_> = risks
        .iter()
        .map(|risk| compute_risk_values(&risk.score_input()))
        .collect();

    PortfolioSummary {
        total_risks: risks.len(),
        lgpd_related: risks.iter().filter(|r| r.is_lgpd_related).count(),
        requiring_action: scores.iter().filter(|s| s.requires_action).count(),
        inherent_by_level: level_counts(scores.iter().map(|s| s.inherent_level())),
        residual_by_level: level_counts(scores.iter().map(|s| s.residual_level())),
        matrix: compute_matrix(risks),
        controls: compute_control_counts(controls, today),
        overdue_controls: compute_overdue_controls(controls, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(probability: u8, impact: u8, controls_exist: bool, lgpd: bool) -> RiskRecord {
        RiskRecord {
            name: format!("risco {}x{}", probability, impact),
            probability,
            impact,
            controls_exist,
            is_control_effective: controls_exist,
            is_control_adequate: controls_exist,
            is_control_proportional: controls_exist,
            is_lgpd_related: lgpd,
            // Stored derived values are deliberately stale
            inherent_risk: 1,
            fac: 0.2,
            residual_risk: 0.0,
            ..RiskRecord::default()
        }
    }

    fn control(risk_id: &str, name: &str, planned_end: &str, implemented: bool) -> ControlRecord {
        ControlRecord {
            risk_id: risk_id.to_string(),
            name: name.to_string(),
            planned_end_date: planned_end.to_string(),
            implemented,
            ..ControlRecord::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn count_of(counts: &[LevelCount], level: RiskLevel) -> usize {
        counts.iter().find(|c| c.level == level).map(|c| c.count).unwrap_or(0)
    }

    #[test]
    fn test_summary_recomputes_from_primitives() {
        let risks = vec![
            risk(5, 5, false, true),  // 25 -> residual 25 Crítico
            risk(4, 5, true, false),  // 20 -> fac 0.4 -> 8.0 Médio
            risk(1, 2, false, false), // 2 -> residual 2 Muito Baixo, no action
        ];
        let summary = summarize(&risks, &[], today());

        assert_eq!(summary.total_risks, 3);
        assert_eq!(summary.lgpd_related, 1);
        assert_eq!(summary.requiring_action, 2);
        assert_eq!(count_of(&summary.inherent_by_level, RiskLevel::Critical), 2);
        assert_eq!(count_of(&summary.residual_by_level, RiskLevel::Critical), 1);
        assert_eq!(count_of(&summary.residual_by_level, RiskLevel::Medium), 1);
        assert_eq!(count_of(&summary.residual_by_level, RiskLevel::VeryLow), 1);
        assert_eq!(summary.inherent_by_level.len(), 6);
    }

    #[test]
    fn test_matrix_cells_sorted_and_bucketed() {
        let risks = vec![risk(3, 4, false, false), risk(1, 1, false, false), risk(3, 4, true, false)];
        let matrix = compute_matrix(&risks);
        assert_eq!(matrix.len(), 2);
        assert_eq!((matrix[0].probability, matrix[0].impact), (1, 1));
        assert_eq!(matrix[0].bucket, 3);
        assert_eq!(matrix[1].count, 2);
        assert_eq!(matrix[1].bucket, 15);
        assert_eq!(matrix[1].level, RiskLevel::High);
    }

    #[test]
    fn test_control_counts_and_overdue_ordering() {
        let controls = vec![
            control("r1", "Backup", "2024-05-31", false),   // 1 day late
            control("r2", "MFA", "2024-05-01", false),      // 31 days late
            control("r1", "Treinamento", "2024-06-20", false), // near-due
            control("r3", "Criptografia", "2024-12-01", false), // on-time
            control("r3", "Política", "", false),           // pending
            control("r4", "Firewall", "2024-01-01", true),  // implemented
        ];
        let counts = compute_control_counts(&controls, today());
        assert_eq!(counts.overdue, 2);
        assert_eq!(counts.near_due, 1);
        assert_eq!(counts.on_time, 1);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.implemented, 1);
        assert_eq!(counts.total(), 6);

        let overdue = compute_overdue_controls(&controls, today());
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].name, "MFA");
        assert_eq!(overdue[0].days_overdue, 31);
        assert_eq!(overdue[1].days_overdue, 1);
    }

    #[test]
    fn test_summary_is_deterministic() {
        let risks = vec![risk(2, 3, true, false), risk(5, 4, false, true)];
        let controls = vec![control("r1", "Backup", "2024-05-31", false)];
        let a = serde_json::to_string(&summarize(&risks, &controls, today())).unwrap();
        let b = serde_json::to_string(&summarize(&risks, &controls, today())).unwrap();
        assert_eq!(a, b);
    }
}
