//! Control adequacy factor (FAC)
//!
//! Global invariants enforced:
//! - `controls_exist == false` or `is_effective == false` yields exactly 1.0
//! - Output is one of 0.2, 0.4, 0.6, 0.8, 1.0
//! - Enabling any quality flag never increases the factor

use crate::level::round_to;
use serde::{Deserialize, Serialize};

pub const FAC_MIN: f64 = 0.2;
pub const FAC_MAX: f64 = 1.0;

/// Reduction credited for an effective control, and for each quality attribute
const REDUCTION_STEP: f64 = 0.2;

/// Quality attributes of the controls mitigating a risk
///
/// The four `is_*` flags only mean something when `controls_exist` is true;
/// adequacy, proportionality and reasonableness additionally require
/// `is_effective`. Stale values are ignored, not trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFlags {
    pub controls_exist: bool,
    pub is_effective: bool,
    pub is_adequate: bool,
    pub is_proportional: bool,
    pub is_reasonable: bool,
}

impl ControlFlags {
    /// Copy with the gated attributes cleared where they carry no meaning
    pub fn normalized(&self) -> ControlFlags {
        if !self.controls_exist {
            return ControlFlags::default();
        }
        if !self.is_effective {
            return ControlFlags {
                controls_exist: true,
                ..ControlFlags::default()
            };
        }
        *self
    }

    /// True when some gated attribute is set but ignored by the calculator
    pub fn has_stale_attributes(&self) -> bool {
        self.normalized() != *self
    }
}

/// Display classification of a FAC value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacLevel {
    #[serde(rename = "Forte")]
    Strong,
    #[serde(rename = "Satisfatório")]
    Satisfactory,
    #[serde(rename = "Mediano")]
    Moderate,
    #[serde(rename = "Fraco")]
    Weak,
    #[serde(rename = "Ineficaz")]
    Ineffective,
}

impl FacLevel {
    /// Derive the label from the numeric factor (the number is authoritative)
    pub fn from_fac(fac: f64) -> FacLevel {
        let rounded = round_to(fac, 1);
        if rounded <= 0.2 {
            FacLevel::Strong
        } else if rounded <= 0.4 {
            FacLevel::Satisfactory
        } else if rounded <= 0.6 {
            FacLevel::Moderate
        } else if rounded <= 0.8 {
            FacLevel::Weak
        } else {
            FacLevel::Ineffective
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FacLevel::Strong => "Forte",
            FacLevel::Satisfactory => "Satisfatório",
            FacLevel::Moderate => "Mediano",
            FacLevel::Weak => "Fraco",
            FacLevel::Ineffective => "Ineficaz",
        }
    }
}

/// Compute the control adequacy factor
///
/// Formula (effective controls only):
/// FAC = round(1.0 - (0.2 + 0.2 * #{adequate, proportional, reasonable}), 1)
/// clamped to [0.2, 1.0]
pub fn compute_fac(flags: &ControlFlags) -> f64 {
    if !flags.controls_exist || !flags.is_effective {
        return FAC_MAX;
    }

    let mut reduction = REDUCTION_STEP;
    for attribute in [flags.is_adequate, flags.is_proportional, flags.is_reasonable] {
        if attribute {
            reduction += REDUCTION_STEP;
        }
    }

    round_to(1.0 - reduction, 1).clamp(FAC_MIN, FAC_MAX)
}

/// True when `value` is a FAC the calculator can produce
pub fn is_valid_fac(value: f64) -> bool {
    if !(FAC_MIN - 1e-9..=FAC_MAX + 1e-9).contains(&value) {
        return false;
    }
    (value - round_to(value, 1)).abs() < 1e-9
}
