//! Consistency rules for risk and control records
//!
//! Every record is checked against an explicit ordered list of named rules.
//! Evaluation stops at the first violation, so callers receive exactly one
//! field-scoped message per submission.
//!
//! Global invariants enforced:
//! - Rule order is fixed: input shape, then cross-field, then derived-field consistency
//! - Derived fields are recomputed with the same calculators used for scoring
//! - Rules are pure and individually testable

use crate::dates::{is_empty_or_iso_date, parse_iso_date};
use crate::fac::{compute_fac, is_valid_fac, FAC_MAX};
use crate::record::{ControlRecord, RiskRecord};
use crate::scoring::compute_inherent_risk;
use crate::status::compute_control_status;
use chrono::NaiveDate;
use serde::Serialize;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

/// Absolute slack allowed between `residual_risk` and `inherent_risk * fac`
pub const RESIDUAL_TOLERANCE: f64 = 0.1;

const FLOAT_SLACK: f64 = 1e-9;

/// Rule identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    RiskNameLength,
    RiskDescriptionLength,
    ProbabilityRange,
    ImpactRange,
    IdentificationDateFormat,
    MaxImplementationDateFormat,
    FacDomain,
    ResidualRiskDomain,
    InherentRiskIdentity,
    ResidualRiskConsistency,
    FacNoControls,
    FacIneffectiveControls,
    FacConsistency,
    ControlNameLength,
    ControlDescriptionLength,
    PlannedStartDateFormat,
    PlannedEndDateFormat,
    ActualEndDateFormat,
    ImplementedRequiresActualEnd,
    PlannedWindowOrder,
    ActualEndAfterStart,
    StatusConsistency,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::RiskNameLength => "risk-name-length",
            RuleId::RiskDescriptionLength => "risk-description-length",
            RuleId::ProbabilityRange => "probability-range",
            RuleId::ImpactRange => "impact-range",
            RuleId::IdentificationDateFormat => "identification-date-format",
            RuleId::MaxImplementationDateFormat => "max-implementation-date-format",
            RuleId::FacDomain => "fac-domain",
            RuleId::ResidualRiskDomain => "residual-risk-domain",
            RuleId::InherentRiskIdentity => "inherent-risk-identity",
            RuleId::ResidualRiskConsistency => "residual-risk-consistency",
            RuleId::FacNoControls => "fac-no-controls",
            RuleId::FacIneffectiveControls => "fac-ineffective-controls",
            RuleId::FacConsistency => "fac-consistency",
            RuleId::ControlNameLength => "control-name-length",
            RuleId::ControlDescriptionLength => "control-description-length",
            RuleId::PlannedStartDateFormat => "planned-start-date-format",
            RuleId::PlannedEndDateFormat => "planned-end-date-format",
            RuleId::ActualEndDateFormat => "actual-end-date-format",
            RuleId::ImplementedRequiresActualEnd => "implemented-requires-actual-end",
            RuleId::PlannedWindowOrder => "planned-window-order",
            RuleId::ActualEndAfterStart => "actual-end-after-start",
            RuleId::StatusConsistency => "status-consistency",
        }
    }

    /// Record field the rule is scoped to
    pub fn field(&self) -> &'static str {
        match self {
            RuleId::RiskNameLength | RuleId::ControlNameLength => "name",
            RuleId::RiskDescriptionLength | RuleId::ControlDescriptionLength => "description",
            RuleId::ProbabilityRange => "probability",
            RuleId::ImpactRange => "impact",
            RuleId::IdentificationDateFormat => "identificationDate",
            RuleId::MaxImplementationDateFormat => "maxImplementationDate",
            RuleId::FacDomain
            | RuleId::FacNoControls
            | RuleId::FacIneffectiveControls
            | RuleId::FacConsistency => "fac",
            RuleId::ResidualRiskDomain | RuleId::ResidualRiskConsistency => "residualRisk",
            RuleId::InherentRiskIdentity => "inherentRisk",
            RuleId::PlannedStartDateFormat => "plannedStartDate",
            RuleId::PlannedEndDateFormat | RuleId::PlannedWindowOrder => "plannedEndDate",
            RuleId::ActualEndDateFormat
            | RuleId::ImplementedRequiresActualEnd
            | RuleId::ActualEndAfterStart => "actualEndDate",
            RuleId::StatusConsistency => "status",
        }
    }

    /// True when the rule inspects a field the engine derives
    pub fn targets_derived_field(&self) -> bool {
        matches!(
            self,
            RuleId::MaxImplementationDateFormat
                | RuleId::FacDomain
                | RuleId::ResidualRiskDomain
                | RuleId::InherentRiskIdentity
                | RuleId::ResidualRiskConsistency
                | RuleId::FacNoControls
                | RuleId::FacIneffectiveControls
                | RuleId::FacConsistency
                | RuleId::StatusConsistency
        )
    }

    pub fn kind(&self) -> ViolationKind {
        match self {
            RuleId::InherentRiskIdentity
            | RuleId::ResidualRiskConsistency
            | RuleId::FacNoControls
            | RuleId::FacIneffectiveControls
            | RuleId::FacConsistency
            | RuleId::StatusConsistency => ViolationKind::Consistency,
            RuleId::ImplementedRequiresActualEnd
            | RuleId::PlannedWindowOrder
            | RuleId::ActualEndAfterStart => ViolationKind::CrossField,
            _ => ViolationKind::InputShape,
        }
    }
}

/// Violation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Missing, malformed or out-of-range primitive field
    InputShape,
    /// Primitive fields that contradict each other
    CrossField,
    /// Derived field disagrees with the engine's recomputation
    Consistency,
}

/// A rejected record: the first rule that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{field}: {message}")]
pub struct Violation {
    pub rule: RuleId,
    pub kind: ViolationKind,
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(rule: RuleId, message: impl Into<String>) -> Self {
        Violation {
            rule,
            kind: rule.kind(),
            field: rule.field(),
            message: message.into(),
        }
    }
}

/// Outcome of a single rule
pub type RuleResult = Result<(), Violation>;

/// A named risk rule
pub struct RiskRule {
    pub id: RuleId,
    pub check: fn(&RiskRecord) -> RuleResult,
}

/// A named control rule (status depends on the evaluation day)
pub struct ControlRule {
    pub id: RuleId,
    pub check: fn(&ControlRecord, NaiveDate) -> RuleResult,
}

/// Risk rules in evaluation order
pub const RISK_RULES: &[RiskRule] = &[
    RiskRule { id: RuleId::RiskNameLength, check: check_risk_name },
    RiskRule { id: RuleId::RiskDescriptionLength, check: check_risk_description },
    RiskRule { id: RuleId::ProbabilityRange, check: check_probability },
    RiskRule { id: RuleId::ImpactRange, check: check_impact },
    RiskRule { id: RuleId::IdentificationDateFormat, check: check_identification_date },
    RiskRule { id: RuleId::MaxImplementationDateFormat, check: check_max_implementation_date },
    RiskRule { id: RuleId::FacDomain, check: check_fac_domain },
    RiskRule { id: RuleId::ResidualRiskDomain, check: check_residual_domain },
    RiskRule { id: RuleId::InherentRiskIdentity, check: check_inherent_identity },
    RiskRule { id: RuleId::ResidualRiskConsistency, check: check_residual_consistency },
    RiskRule { id: RuleId::FacNoControls, check: check_fac_no_controls },
    RiskRule { id: RuleId::FacIneffectiveControls, check: check_fac_ineffective_controls },
    RiskRule { id: RuleId::FacConsistency, check: check_fac_consistency },
];

/// Control rules in evaluation order
pub const CONTROL_RULES: &[ControlRule] = &[
    ControlRule { id: RuleId::ControlNameLength, check: check_control_name },
    ControlRule { id: RuleId::ControlDescriptionLength, check: check_control_description },
    ControlRule { id: RuleId::PlannedStartDateFormat, check: check_planned_start_date },
    ControlRule { id: RuleId::PlannedEndDateFormat, check: check_planned_end_date },
    ControlRule { id: RuleId::ActualEndDateFormat, check: check_actual_end_date },
    ControlRule { id: RuleId::ImplementedRequiresActualEnd, check: check_implemented_has_end },
    ControlRule { id: RuleId::PlannedWindowOrder, check: check_planned_window },
    ControlRule { id: RuleId::ActualEndAfterStart, check: check_actual_end_after_start },
    ControlRule { id: RuleId::StatusConsistency, check: check_status },
];

/// Validate a candidate risk exactly as submitted
pub fn validate_risk(record: &RiskRecord) -> RuleResult {
    for rule in RISK_RULES {
        if let Err(violation) = (rule.check)(record) {
            tracing::debug!(
                rule = rule.id.as_str(),
                field = violation.field,
                "risk record rejected"
            );
            return Err(violation);
        }
    }
    Ok(())
}

/// Validate only the primitive inputs of a candidate risk
///
/// Runs the input-shape rules that do not look at derived fields, in the
/// same order as `validate_risk`. Used before scoring a candidate whose
/// derived fields will be overwritten anyway.
pub fn validate_risk_inputs(record: &RiskRecord) -> RuleResult {
    let input_rules = RISK_RULES.iter().filter(|rule| {
        rule.id.kind() == ViolationKind::InputShape && !rule.id.targets_derived_field()
    });
    for rule in input_rules {
        if let Err(violation) = (rule.check)(record) {
            tracing::debug!(
                rule = rule.id.as_str(),
                field = violation.field,
                "risk inputs rejected"
            );
            return Err(violation);
        }
    }
    Ok(())
}

/// Validate a candidate control exactly as submitted, as of `today`
pub fn validate_control(record: &ControlRecord, today: NaiveDate) -> RuleResult {
    for rule in CONTROL_RULES {
        if let Err(violation) = (rule.check)(record, today) {
            tracing::debug!(
                rule = rule.id.as_str(),
                field = violation.field,
                "control record rejected"
            );
            return Err(violation);
        }
    }
    Ok(())
}

fn ensure(condition: bool, rule: RuleId, message: impl FnOnce() -> String) -> RuleResult {
    if condition {
        Ok(())
    } else {
        Err(Violation::new(rule, message()))
    }
}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn name_in_bounds(name: &str) -> bool {
    (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&char_len(name))
}

fn name_message() -> String {
    format!(
        "O nome deve ter entre {} e {} caracteres",
        NAME_MIN_CHARS, NAME_MAX_CHARS
    )
}

fn description_message() -> String {
    format!(
        "A descrição deve ter no máximo {} caracteres",
        DESCRIPTION_MAX_CHARS
    )
}

fn date_message(label: &str) -> String {
    format!("{} inválida (use o formato AAAA-MM-DD)", label)
}

// Risk rules

fn check_risk_name(risk: &RiskRecord) -> RuleResult {
    ensure(name_in_bounds(&risk.name), RuleId::RiskNameLength, name_message)
}

fn check_risk_description(risk: &RiskRecord) -> RuleResult {
    ensure(
        char_len(&risk.description) <= DESCRIPTION_MAX_CHARS,
        RuleId::RiskDescriptionLength,
        description_message,
    )
}

fn check_probability(risk: &RiskRecord) -> RuleResult {
    ensure((1..=5).contains(&risk.probability), RuleId::ProbabilityRange, || {
        "A probabilidade deve estar entre 1 e 5".to_string()
    })
}

fn check_impact(risk: &RiskRecord) -> RuleResult {
    ensure((1..=5).contains(&risk.impact), RuleId::ImpactRange, || {
        "O impacto deve estar entre 1 e 5".to_string()
    })
}

fn check_identification_date(risk: &RiskRecord) -> RuleResult {
    ensure(
        is_empty_or_iso_date(&risk.identification_date),
        RuleId::IdentificationDateFormat,
        || date_message("Data de identificação"),
    )
}

fn check_max_implementation_date(risk: &RiskRecord) -> RuleResult {
    ensure(
        is_empty_or_iso_date(&risk.max_implementation_date),
        RuleId::MaxImplementationDateFormat,
        || date_message("Data máxima de implementação"),
    )
}

fn check_fac_domain(risk: &RiskRecord) -> RuleResult {
    ensure(is_valid_fac(risk.fac), RuleId::FacDomain, || {
        "O FAC deve estar entre 0.2 e 1.0, em passos de 0.1".to_string()
    })
}

fn check_residual_domain(risk: &RiskRecord) -> RuleResult {
    ensure(
        (0.0..=25.0).contains(&risk.residual_risk),
        RuleId::ResidualRiskDomain,
        || "O risco residual deve estar entre 0 e 25".to_string(),
    )
}

fn check_inherent_identity(risk: &RiskRecord) -> RuleResult {
    let expected = compute_inherent_risk(risk.probability, risk.impact);
    ensure(risk.inherent_risk == expected, RuleId::InherentRiskIdentity, || {
        format!(
            "O risco inerente deve ser igual a probabilidade × impacto ({})",
            expected
        )
    })
}

fn check_residual_consistency(risk: &RiskRecord) -> RuleResult {
    let expected = f64::from(risk.inherent_risk) * risk.fac;
    ensure(
        (risk.residual_risk - expected).abs() <= RESIDUAL_TOLERANCE + FLOAT_SLACK,
        RuleId::ResidualRiskConsistency,
        || {
            format!(
                "O risco residual deve ser igual a risco inerente × FAC ({:.2})",
                expected
            )
        },
    )
}

fn check_fac_no_controls(risk: &RiskRecord) -> RuleResult {
    ensure(
        risk.controls_exist || risk.fac == FAC_MAX,
        RuleId::FacNoControls,
        || "O FAC deve ser 1.0 quando não existem controles".to_string(),
    )
}

fn check_fac_ineffective_controls(risk: &RiskRecord) -> RuleResult {
    ensure(
        !risk.controls_exist || risk.is_control_effective || risk.fac == FAC_MAX,
        RuleId::FacIneffectiveControls,
        || "O FAC deve ser 1.0 quando os controles não são eficazes".to_string(),
    )
}

fn check_fac_consistency(risk: &RiskRecord) -> RuleResult {
    let expected = compute_fac(&risk.control_flags());
    ensure(
        (risk.fac - expected).abs() <= FLOAT_SLACK,
        RuleId::FacConsistency,
        || {
            format!(
                "O FAC não corresponde à avaliação dos controles (esperado {:.1})",
                expected
            )
        },
    )
}

// Control rules

fn check_control_name(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    ensure(name_in_bounds(&control.name), RuleId::ControlNameLength, name_message)
}

fn check_control_description(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    ensure(
        char_len(&control.description) <= DESCRIPTION_MAX_CHARS,
        RuleId::ControlDescriptionLength,
        description_message,
    )
}

fn check_planned_start_date(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    ensure(
        is_empty_or_iso_date(&control.planned_start_date),
        RuleId::PlannedStartDateFormat,
        || date_message("Data de início prevista"),
    )
}

fn check_planned_end_date(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    ensure(
        is_empty_or_iso_date(&control.planned_end_date),
        RuleId::PlannedEndDateFormat,
        || date_message("Data de término prevista"),
    )
}

fn check_actual_end_date(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    ensure(
        is_empty_or_iso_date(&control.actual_end_date),
        RuleId::ActualEndDateFormat,
        || date_message("Data de conclusão"),
    )
}

fn check_implemented_has_end(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    ensure(
        !control.implemented || !control.actual_end_date.trim().is_empty(),
        RuleId::ImplementedRequiresActualEnd,
        || "A data de conclusão é obrigatória para controles implementados".to_string(),
    )
}

fn check_planned_window(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    let ordered = match (
        parse_iso_date(&control.planned_start_date),
        parse_iso_date(&control.planned_end_date),
    ) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    };
    ensure(ordered, RuleId::PlannedWindowOrder, || {
        "A data de término prevista deve ser igual ou posterior à data de início".to_string()
    })
}

fn check_actual_end_after_start(control: &ControlRecord, _today: NaiveDate) -> RuleResult {
    let ordered = match (
        parse_iso_date(&control.planned_start_date),
        parse_iso_date(&control.actual_end_date),
    ) {
        (Some(start), Some(actual)) => start <= actual,
        _ => true,
    };
    ensure(ordered, RuleId::ActualEndAfterStart, || {
        "A data de conclusão deve ser igual ou posterior à data de início prevista".to_string()
    })
}

fn check_status(control: &ControlRecord, today: NaiveDate) -> RuleResult {
    let Some(submitted) = control.status else {
        return Ok(());
    };
    let expected = compute_control_status(&control.status_input(), today).status;
    ensure(submitted == expected, RuleId::StatusConsistency, || {
        format!("O status deve ser '{}' para as datas informadas", expected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ControlStatus;

    fn valid_risk() -> RiskRecord {
        RiskRecord {
            process_id: "proc-1".to_string(),
            name: "Acesso indevido a dados pessoais".to_string(),
            identification_date: "2024-03-15".to_string(),
            probability: 4,
            impact: 5,
            inherent_risk: 20,
            controls_exist: true,
            is_control_effective: true,
            is_control_adequate: true,
            fac: 0.6,
            residual_risk: 12.0,
            max_implementation_date: "2025-03-15".to_string(),
            ..RiskRecord::default()
        }
    }

    fn valid_control() -> ControlRecord {
        ControlRecord {
            risk_id: "risk-1".to_string(),
            name: "Revisão trimestral de acessos".to_string(),
            planned_start_date: "2024-01-10".to_string(),
            planned_end_date: "2024-12-20".to_string(),
            ..ControlRecord::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_valid_records_pass() {
        assert_eq!(validate_risk(&valid_risk()), Ok(()));
        assert_eq!(validate_control(&valid_control(), today()), Ok(()));
    }

    #[test]
    fn test_inputs_check_ignores_derived_fields() {
        // Fresh candidate: derived fields left at their zero defaults
        let candidate = RiskRecord {
            name: "Fraude em pagamentos".to_string(),
            identification_date: "2024-03-15".to_string(),
            probability: 3,
            impact: 2,
            ..RiskRecord::default()
        };
        assert_eq!(validate_risk_inputs(&candidate), Ok(()));
        assert!(validate_risk(&candidate).is_err());
    }

    #[test]
    fn test_inputs_check_rejects_out_of_range_probability() {
        let mut risk = valid_risk();
        risk.probability = 9;
        let err = validate_risk_inputs(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::ProbabilityRange);
        assert_eq!(err.field, "probability");
        assert_eq!(err.kind, ViolationKind::InputShape);

        let mut risk = valid_risk();
        risk.impact = 0;
        assert_eq!(validate_risk_inputs(&risk).unwrap_err().rule, RuleId::ImpactRange);

        let mut risk = valid_risk();
        risk.identification_date = "15/03/2024".to_string();
        assert_eq!(
            validate_risk_inputs(&risk).unwrap_err().rule,
            RuleId::IdentificationDateFormat
        );
    }

    #[test]
    fn test_inherent_mismatch_scoped_to_inherent_risk() {
        let mut risk = valid_risk();
        risk.inherent_risk = 16;
        risk.residual_risk = 9.6;
        let err = validate_risk(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::InherentRiskIdentity);
        assert_eq!(err.field, "inherentRisk");
        assert_eq!(err.kind, ViolationKind::Consistency);
    }

    #[test]
    fn test_no_controls_requires_unit_fac() {
        let mut risk = valid_risk();
        risk.controls_exist = false;
        risk.is_control_effective = false;
        risk.is_control_adequate = false;
        risk.fac = 0.4;
        risk.residual_risk = 8.0;
        let err = validate_risk(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::FacNoControls);
        assert_eq!(err.field, "fac");
    }

    #[test]
    fn test_ineffective_controls_require_unit_fac() {
        let mut risk = valid_risk();
        risk.is_control_effective = false;
        let err = validate_risk(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::FacIneffectiveControls);
    }

    #[test]
    fn test_stale_flags_are_not_a_violation() {
        let mut risk = valid_risk();
        risk.is_control_effective = false;
        risk.fac = 1.0;
        risk.residual_risk = 20.0;
        assert_eq!(validate_risk(&risk), Ok(()));
    }

    #[test]
    fn test_fac_must_match_flags() {
        let mut risk = valid_risk();
        risk.fac = 0.2;
        risk.residual_risk = 4.0;
        let err = validate_risk(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::FacConsistency);
    }

    #[test]
    fn test_residual_tolerance() {
        let mut risk = valid_risk();
        risk.residual_risk = 12.1;
        assert_eq!(validate_risk(&risk), Ok(()));
        risk.residual_risk = 12.2;
        assert_eq!(
            validate_risk(&risk).unwrap_err().rule,
            RuleId::ResidualRiskConsistency
        );
    }

    #[test]
    fn test_first_violation_wins() {
        let mut risk = valid_risk();
        risk.name = "x".to_string();
        risk.probability = 9;
        risk.inherent_risk = 1;
        let err = validate_risk(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::RiskNameLength);
        assert_eq!(err.to_string(), "name: O nome deve ter entre 3 e 200 caracteres");
    }

    #[test]
    fn test_shape_rules_run_before_consistency() {
        let mut risk = valid_risk();
        risk.probability = 0;
        let err = validate_risk(&risk).unwrap_err();
        assert_eq!(err.rule, RuleId::ProbabilityRange);
        assert_eq!(err.kind, ViolationKind::InputShape);

        let mut risk = valid_risk();
        risk.fac = 0.45;
        assert_eq!(validate_risk(&risk).unwrap_err().rule, RuleId::FacDomain);
    }

    #[test]
    fn test_rule_order_is_documented_order() {
        let ids: Vec<&str> = RISK_RULES.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"risk-name-length"));
        let identity = ids.iter().position(|id| *id == "inherent-risk-identity").unwrap();
        let residual = ids.iter().position(|id| *id == "residual-risk-consistency").unwrap();
        let gating = ids.iter().position(|id| *id == "fac-no-controls").unwrap();
        assert!(identity < residual && residual < gating);
        assert_eq!(CONTROL_RULES.last().unwrap().id, RuleId::StatusConsistency);
    }

    #[test]
    fn test_each_rule_is_callable_in_isolation() {
        let risk = valid_risk();
        for rule in RISK_RULES {
            assert_eq!((rule.check)(&risk), Ok(()), "{}", rule.id.as_str());
        }
        let control = valid_control();
        for rule in CONTROL_RULES {
            assert_eq!((rule.check)(&control, today()), Ok(()), "{}", rule.id.as_str());
        }
    }

    #[test]
    fn test_implemented_control_needs_actual_end() {
        let mut control = valid_control();
        control.implemented = true;
        let err = validate_control(&control, today()).unwrap_err();
        assert_eq!(err.rule, RuleId::ImplementedRequiresActualEnd);
        assert_eq!(err.field, "actualEndDate");

        control.actual_end_date = "2024-05-30".to_string();
        assert_eq!(validate_control(&control, today()), Ok(()));
    }

    #[test]
    fn test_control_date_ordering() {
        let mut control = valid_control();
        control.planned_end_date = "2024-01-01".to_string();
        assert_eq!(
            validate_control(&control, today()).unwrap_err().rule,
            RuleId::PlannedWindowOrder
        );

        let mut control = valid_control();
        control.actual_end_date = "2023-12-31".to_string();
        assert_eq!(
            validate_control(&control, today()).unwrap_err().rule,
            RuleId::ActualEndAfterStart
        );
    }

    #[test]
    fn test_control_date_format() {
        let mut control = valid_control();
        control.planned_end_date = "20/12/2024".to_string();
        let err = validate_control(&control, today()).unwrap_err();
        assert_eq!(err.rule, RuleId::PlannedEndDateFormat);
        assert_eq!(err.field, "plannedEndDate");
    }

    #[test]
    fn test_tampered_status_rejected() {
        let mut control = valid_control();
        control.status = Some(ControlStatus::Overdue);
        let err = validate_control(&control, today()).unwrap_err();
        assert_eq!(err.rule, RuleId::StatusConsistency);
        assert_eq!(err.kind, ViolationKind::Consistency);

        control.status = Some(ControlStatus::OnTime);
        assert_eq!(validate_control(&control, today()), Ok(()));
    }

    #[test]
    fn test_violation_serializes_for_callers() {
        let violation = Violation::new(RuleId::FacNoControls, "msg");
        let value = serde_json::to_value(&violation).unwrap();
        assert_eq!(value["rule"], "fac-no-controls");
        assert_eq!(value["kind"], "consistency");
        assert_eq!(value["field"], "fac");
    }
}
