//! Risk level classification
//!
//! Global invariants enforced:
//! - One classifier for every consumer (scoring, validation, aggregation, reports)
//! - Inherent thresholds are inclusive lower bounds on the integer grid
//! - Residual thresholds are exclusive lower bounds applied after rounding to 1 decimal

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level shared by the inherent and residual scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "N/A")]
    NotApplicable,
    #[serde(rename = "Muito Baixo")]
    VeryLow,
    #[serde(rename = "Baixo")]
    Low,
    #[serde(rename = "Médio")]
    Medium,
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Crítico")]
    Critical,
}

impl RiskLevel {
    /// All levels in ascending tier order
    pub const ALL: [RiskLevel; 6] = [
        RiskLevel::NotApplicable,
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::NotApplicable => "N/A",
            RiskLevel::VeryLow => "Muito Baixo",
            RiskLevel::Low => "Baixo",
            RiskLevel::Medium => "Médio",
            RiskLevel::High => "Alto",
            RiskLevel::Critical => "Crítico",
        }
    }

    /// Severity tier (0-5) used for sorting and aggregation
    pub fn tier(&self) -> u8 {
        match self {
            RiskLevel::NotApplicable => 0,
            RiskLevel::VeryLow => 1,
            RiskLevel::Low => 2,
            RiskLevel::Medium => 3,
            RiskLevel::High => 4,
            RiskLevel::Critical => 5,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inherent scale: inclusive lower bounds
pub const INHERENT_CRITICAL_MIN: u32 = 16;
pub const INHERENT_HIGH_MIN: u32 = 11;
pub const INHERENT_MEDIUM_MIN: u32 = 8;
pub const INHERENT_LOW_MIN: u32 = 4;

/// Residual scale: exclusive lower bounds (after rounding to 1 decimal)
pub const RESIDUAL_CRITICAL_ABOVE: f64 = 15.0;
pub const RESIDUAL_HIGH_ABOVE: f64 = 10.0;
pub const RESIDUAL_MEDIUM_ABOVE: f64 = 7.0;
pub const RESIDUAL_LOW_ABOVE: f64 = 3.0;

/// Classify an inherent score (probability x impact)
pub fn classify_inherent(score: u32) -> RiskLevel {
    if score == 0 {
        RiskLevel::NotApplicable
    } else if score >= INHERENT_CRITICAL_MIN {
        RiskLevel::Critical
    } else if score >= INHERENT_HIGH_MIN {
        RiskLevel::High
    } else if score >= INHERENT_MEDIUM_MIN {
        RiskLevel::Medium
    } else if score >= INHERENT_LOW_MIN {
        RiskLevel::Low
    } else {
        RiskLevel::VeryLow
    }
}

/// Classify a residual score (inherent x FAC)
///
/// The score is rounded to one decimal place first, so 15.04 lands in
/// "Alto" together with 15.0. Scores outside the domain (negative, NaN)
/// are not classifiable.
pub fn classify_residual(score: f64) -> RiskLevel {
    if score.is_nan() || score < 0.0 {
        return RiskLevel::NotApplicable;
    }

    let rounded = round_to(score, 1);
    if rounded > RESIDUAL_CRITICAL_ABOVE {
        RiskLevel::Critical
    } else if rounded > RESIDUAL_HIGH_ABOVE {
        RiskLevel::High
    } else if rounded > RESIDUAL_MEDIUM_ABOVE {
        RiskLevel::Medium
    } else if rounded > RESIDUAL_LOW_ABOVE {
        RiskLevel::Low
    } else {
        RiskLevel::VeryLow
    }
}

/// Snap an inherent score to its canonical matrix value
///
/// Canonical values are the upper edge of each inherent band:
/// 0, 3, 7, 10, 15, 25. Presentation aid for matrix/aggregate views only.
pub fn bucket_value(score: u32) -> u32 {
    match classify_inherent(score) {
        RiskLevel::NotApplicable => 0,
        RiskLevel::VeryLow => INHERENT_LOW_MIN - 1,
        RiskLevel::Low => INHERENT_MEDIUM_MIN - 1,
        RiskLevel::Medium => INHERENT_HIGH_MIN - 1,
        RiskLevel::High => INHERENT_CRITICAL_MIN - 1,
        RiskLevel::Critical => 25,
    }
}

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
