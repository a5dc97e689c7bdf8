//! riskscore core library - risk & control scoring and compliance rules

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Every calculator is a pure function of its inputs
// - No global mutable state
// - No randomness, clocks, threads, or async ("today" is always an argument)
// - One implementation per threshold table and per status rule
// - Validation is fail-fast in a fixed, documented rule order
// - Identical input yields identical output

pub mod aggregates;
pub mod config;
pub mod dates;
pub mod fac;
pub mod level;
pub mod record;
pub mod report;
pub mod scoring;
pub mod status;
pub mod validate;

pub use fac::{compute_fac, ControlFlags, FacLevel};
pub use level::{bucket_value, classify_inherent, classify_residual, RiskLevel};
pub use record::{ControlRecord, History, HistoryEntry, RiskRecord};
pub use scoring::{compute_risk_values, RiskScoreInput, RiskScores, SuggestedResponse};
pub use status::{compute_control_status, ControlStatus, StatusReport};
pub use validate::{validate_control, validate_risk, validate_risk_inputs, Violation};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Caller-level choices that do not affect scoring thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Response used when an actionable risk has none
    pub default_response: SuggestedResponse,
    /// Clear control attributes that carry no meaning under the gating rules
    pub normalize_control_flags: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            default_response: SuggestedResponse::default(),
            normalize_control_flags: true,
        }
    }
}

/// A risk with every derived field set by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRisk {
    pub record: RiskRecord,
    pub scores: RiskScores,
}

/// A control with its engine-derived status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedControl {
    pub record: ControlRecord,
    pub status: StatusReport,
}

/// Recompute and merge all derived risk fields
///
/// Server-action path: derived values on `candidate` are ignored and
/// overwritten. Never fails.
pub fn score_risk(candidate: &RiskRecord, options: &EngineOptions) -> ScoredRisk {
    let scores =
        scoring::compute_risk_values_with_default(&candidate.score_input(), options.default_response);

    let mut record = candidate.clone();
    if options.normalize_control_flags {
        let flags = record.control_flags();
        if flags.has_stale_attributes() {
            tracing::debug!(risk_id = ?record.id, "clearing gated control attributes");
            record.set_control_flags(flags.normalized());
        }
    }

    record.inherent_risk = scores.inherent_risk;
    record.fac = scores.fac;
    record.residual_risk = scores.residual_risk;
    record.max_implementation_date = scores.max_implementation_date_iso();
    record.suggested_response = Some(scores.suggested_response);

    ScoredRisk { record, scores }
}

/// Validate a submitted risk, then return it with authoritative derived fields
///
/// Form-submission path: the candidate is checked exactly as the client sent
/// it, so a tampered derived field is rejected instead of silently fixed.
/// On rejection nothing is returned for persistence.
pub fn submit_risk(candidate: &RiskRecord, options: &EngineOptions) -> Result<ScoredRisk, Violation> {
    validate_risk(candidate)?;
    Ok(score_risk(candidate, options))
}

/// Check a candidate's primitive inputs, then score it
///
/// Preview path for callers that read candidates from outside the engine:
/// out-of-domain inputs (probability 9, a malformed date) are rejected
/// before any derived field is computed. Stored derived fields are not
/// checked since they are overwritten.
pub fn score_candidate(candidate: &RiskRecord, options: &EngineOptions) -> Result<ScoredRisk, Violation> {
    validate_risk_inputs(candidate)?;
    Ok(score_risk(candidate, options))
}

/// Compute a control's status as of `today`
pub fn evaluate_control(control: &ControlRecord, today: NaiveDate) -> StatusReport {
    compute_control_status(&control.status_input(), today)
}

/// Validate a submitted control, then return it with the engine-derived status
pub fn submit_control(candidate: &ControlRecord, today: NaiveDate) -> Result<EvaluatedControl, Violation> {
    validate_control(candidate, today)?;

    let status = evaluate_control(candidate, today);
    let mut record = candidate.clone();
    record.status = Some(status.status);

    Ok(EvaluatedControl { record, status })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> RiskRecord {
        RiskRecord {
            name: "Fraude em pagamentos".to_string(),
            identification_date: "2024-03-15".to_string(),
            probability: 4,
            impact: 5,
            controls_exist: true,
            is_control_effective: true,
            is_control_adequate: true,
            ..RiskRecord::default()
        }
    }

    #[test]
    fn test_score_risk_fills_derived_fields() {
        let scored = score_risk(&candidate(), &EngineOptions::default());
        assert_eq!(scored.record.inherent_risk, 20);
        assert_eq!(scored.record.fac, 0.6);
        assert_eq!(scored.record.residual_risk, 12.0);
        assert_eq!(scored.record.max_implementation_date, "2025-03-15");
        assert_eq!(scored.record.suggested_response, Some(SuggestedResponse::Mitigar));
        assert_eq!(scored.scores.residual_level(), RiskLevel::High);
    }

    #[test]
    fn test_score_risk_ignores_tampered_values() {
        let mut tampered = candidate();
        tampered.inherent_risk = 2;
        tampered.fac = 0.2;
        tampered.residual_risk = 0.4;
        tampered.max_implementation_date = "2099-01-01".to_string();
        let scored = score_risk(&tampered, &EngineOptions::default());
        assert_eq!(scored.record, score_risk(&candidate(), &EngineOptions::default()).record);
    }

    #[test]
    fn test_submit_risk_rejects_tampering() {
        let mut tampered = score_risk(&candidate(), &EngineOptions::default()).record;
        tampered.inherent_risk = 12;
        let err = submit_risk(&tampered, &EngineOptions::default()).unwrap_err();
        assert_eq!(err.field, "inherentRisk");
    }

    #[test]
    fn test_submit_risk_accepts_consistent_record() {
        let record = score_risk(&candidate(), &EngineOptions::default()).record;
        let scored = submit_risk(&record, &EngineOptions::default()).unwrap();
        assert_eq!(scored.record, record);
    }

    #[test]
    fn test_score_candidate_rejects_out_of_domain_inputs() {
        let mut bad = candidate();
        bad.probability = 9;
        let err = score_candidate(&bad, &EngineOptions::default()).unwrap_err();
        assert_eq!(err.field, "probability");
        assert_eq!(err.to_string(), "probability: A probabilidade deve estar entre 1 e 5");
    }

    #[test]
    fn test_score_candidate_accepts_fresh_candidate() {
        let scored = score_candidate(&candidate(), &EngineOptions::default()).unwrap();
        assert_eq!(scored.record.inherent_risk, 20);
        assert!(scored.scores.inherent_risk <= 25);
        assert_eq!(scored, score_risk(&candidate(), &EngineOptions::default()));
    }

    #[test]
    fn test_normalization_is_optional() {
        let mut stale = candidate();
        stale.is_control_effective = false;

        let scored = score_risk(&stale, &EngineOptions::default());
        assert!(!scored.record.is_control_adequate);
        assert_eq!(scored.record.fac, 1.0);

        let keep = EngineOptions {
            normalize_control_flags: false,
            ..EngineOptions::default()
        };
        let scored = score_risk(&stale, &keep);
        assert!(scored.record.is_control_adequate);
        assert_eq!(scored.record.fac, 1.0);
    }

    #[test]
    fn test_submit_control_sets_status() {
        let control = ControlRecord {
            name: "Revisão de acessos".to_string(),
            planned_end_date: "2024-06-15".to_string(),
            ..ControlRecord::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let evaluated = submit_control(&control, today).unwrap();
        assert_eq!(evaluated.record.status, Some(ControlStatus::NearDue));
        assert_eq!(evaluated.status.days_remaining, Some(14));
    }
}
