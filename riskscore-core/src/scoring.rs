//! Risk scoring: inherent risk, residual risk, remediation deadline
//!
//! Global invariants enforced:
//! - inherent_risk == probability * impact
//! - residual_risk == round(inherent_risk * fac, 2)
//! - Scoring is total: malformed dates degrade to an empty deadline
//! - No I/O, no clock, no shared state

use crate::dates::{add_months, format_iso_date, parse_iso_date};
use crate::fac::{compute_fac, ControlFlags, FacLevel};
use crate::level::{classify_inherent, classify_residual, round_to, RiskLevel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Residual risk at or above which remediation is due within 6 months.
///
/// Kept separate from `level::RESIDUAL_CRITICAL_ABOVE` (15.0): the two
/// thresholds are defined independently and must not be unified without
/// product-owner sign-off.
pub const DEADLINE_CRITICAL_MIN: f64 = 15.1;
/// Residual risk at or above which remediation is due within 12 months
pub const DEADLINE_HIGH_MIN: f64 = 8.0;
/// Residual risk at or above which remediation is due within 36 months
pub const DEADLINE_MODERATE_MIN: f64 = 4.0;

/// Response to a risk, from a fixed vocabulary
///
/// Deserialization accepts the same spellings as `FromStr` (case-insensitive,
/// surrounding whitespace ignored), so records and config agree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SuggestedResponse {
    /// Accept and monitor; the only response allowed when no action is required
    Aceitar,
    #[default]
    Mitigar,
    Transferir,
    Evitar,
}

impl SuggestedResponse {
    pub const ALL: [SuggestedResponse; 4] = [
        SuggestedResponse::Aceitar,
        SuggestedResponse::Mitigar,
        SuggestedResponse::Transferir,
        SuggestedResponse::Evitar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedResponse::Aceitar => "Aceitar",
            SuggestedResponse::Mitigar => "Mitigar",
            SuggestedResponse::Transferir => "Transferir",
            SuggestedResponse::Evitar => "Evitar",
        }
    }
}

impl fmt::Display for SuggestedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestedResponse {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuggestedResponse::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown response '{}' (expected one of Aceitar, Mitigar, Transferir, Evitar)",
                    s
                )
            })
    }
}

impl TryFrom<String> for SuggestedResponse {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Remediation band derived from residual risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationBand {
    SixMonths,
    TwelveMonths,
    ThirtySixMonths,
    MonitorOnly,
}

impl RemediationBand {
    /// Assign the remediation band for a residual score
    pub fn for_residual(residual_risk: f64) -> RemediationBand {
        if residual_risk >= DEADLINE_CRITICAL_MIN {
            RemediationBand::SixMonths
        } else if residual_risk >= DEADLINE_HIGH_MIN {
            RemediationBand::TwelveMonths
        } else if residual_risk >= DEADLINE_MODERATE_MIN {
            RemediationBand::ThirtySixMonths
        } else {
            RemediationBand::MonitorOnly
        }
    }

    /// Months allowed for remediation (0 when monitor-only)
    pub fn months(&self) -> u32 {
        match self {
            RemediationBand::SixMonths => 6,
            RemediationBand::TwelveMonths => 12,
            RemediationBand::ThirtySixMonths => 36,
            RemediationBand::MonitorOnly => 0,
        }
    }

    pub fn requires_action(&self) -> bool {
        *self != RemediationBand::MonitorOnly
    }
}

/// Primitive inputs to risk scoring
#[derive(Debug, Clone, Default)]
pub struct RiskScoreInput {
    pub probability: u8,
    pub impact: u8,
    pub controls: ControlFlags,
    /// `YYYY-MM-DD` or empty
    pub identification_date: String,
    /// Response currently on the record, if any
    pub current_response: Option<SuggestedResponse>,
}

/// Authoritative derived fields of a risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScores {
    pub inherent_risk: u32,
    pub fac: f64,
    pub residual_risk: f64,
    pub remediation: RemediationBand,
    pub requires_action: bool,
    #[serde(with = "optional_iso_date")]
    pub max_implementation_date: Option<NaiveDate>,
    pub suggested_response: SuggestedResponse,
}

impl RiskScores {
    pub fn inherent_level(&self) -> RiskLevel {
        classify_inherent(self.inherent_risk)
    }

    pub fn residual_level(&self) -> RiskLevel {
        classify_residual(self.residual_risk)
    }

    pub fn fac_level(&self) -> FacLevel {
        FacLevel::from_fac(self.fac)
    }

    /// Deadline as stored on the record (`YYYY-MM-DD` or empty)
    pub fn max_implementation_date_iso(&self) -> String {
        self.max_implementation_date
            .map(format_iso_date)
            .unwrap_or_default()
    }
}

/// Inherent risk (probability x impact)
pub fn compute_inherent_risk(probability: u8, impact: u8) -> u32 {
    u32::from(probability) * u32::from(impact)
}

/// Residual risk, rounded to 2 decimals
pub fn compute_residual_risk(inherent_risk: u32, fac: f64) -> f64 {
    round_to(f64::from(inherent_risk) * fac, 2)
}

/// Remediation deadline for a residual score and identification date
///
/// Returns `None` for monitor-only risks and for empty or malformed dates.
pub fn compute_deadline(residual_risk: f64, identification_date: &str) -> Option<NaiveDate> {
    let band = RemediationBand::for_residual(residual_risk);
    if !band.requires_action() {
        return None;
    }
    let identified = parse_iso_date(identification_date)?;
    add_months(identified, band.months())
}

/// Compute all derived risk fields
///
/// Uses `SuggestedResponse::default()` when the caller supplies none.
pub fn compute_risk_values(input: &RiskScoreInput) -> RiskScores {
    compute_risk_values_with_default(input, SuggestedResponse::default())
}

/// Compute all derived risk fields with a caller-chosen default response
pub fn compute_risk_values_with_default(
    input: &RiskScoreInput,
    default_response: SuggestedResponse,
) -> RiskScores {
    let inherent_risk = compute_inherent_risk(input.probability, input.impact);
    let fac = compute_fac(&input.controls);
    let residual_risk = compute_residual_risk(inherent_risk, fac);

    let remediation = RemediationBand::for_residual(residual_risk);
    let requires_action = remediation.requires_action();
    let max_implementation_date = compute_deadline(residual_risk, &input.identification_date);

    let suggested_response = if requires_action {
        input.current_response.unwrap_or(default_response)
    } else {
        SuggestedResponse::Aceitar
    };

    RiskScores {
        inherent_risk,
        fac,
        residual_risk,
        remediation,
        requires_action,
        max_implementation_date,
        suggested_response,
    }
}

/// Serialize `Option<NaiveDate>` as `YYYY-MM-DD` or the empty string
mod optional_iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&crate::dates::format_iso_date(*date)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        crate::dates::parse_iso_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
    }
}
