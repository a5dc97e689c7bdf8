//! Risk and control records as exchanged with callers
//!
//! Records hold primitive fields only. Derived fields (`inherent_risk`,
//! `fac`, `residual_risk`, `max_implementation_date`, `suggested_response`,
//! `status`) may arrive from an untrusted client and are never trusted.

use crate::fac::ControlFlags;
use crate::scoring::{RiskScoreInput, SuggestedResponse};
use crate::status::{ControlStatus, StatusInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub justification: String,
    pub changes: String,
}

/// Append-only audit log
///
/// Entries can be appended and read; there is no way to edit or remove one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }
}

/// A risk owned by a process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub process_id: String,
    pub name: String,
    pub description: String,
    pub identification_date: String,
    pub probability: u8,
    pub impact: u8,
    pub inherent_risk: u32,
    pub controls_exist: bool,
    pub is_control_effective: bool,
    pub is_control_proportional: bool,
    pub is_control_reasonable: bool,
    pub is_control_adequate: bool,
    pub fac: f64,
    pub residual_risk: f64,
    pub max_implementation_date: String,
    pub suggested_response: Option<SuggestedResponse>,
    pub is_lgpd_related: bool,
    pub history: History,
}

impl RiskRecord {
    pub fn control_flags(&self) -> ControlFlags {
        ControlFlags {
            controls_exist: self.controls_exist,
            is_effective: self.is_control_effective,
            is_adequate: self.is_control_adequate,
            is_proportional: self.is_control_proportional,
            is_reasonable: self.is_control_reasonable,
        }
    }

    pub fn set_control_flags(&mut self, flags: ControlFlags) {
        self.controls_exist = flags.controls_exist;
        self.is_control_effective = flags.is_effective;
        self.is_control_adequate = flags.is_adequate;
        self.is_control_proportional = flags.is_proportional;
        self.is_control_reasonable = flags.is_reasonable;
    }

    /// Primitive scoring inputs (derived fields ignored)
    pub fn score_input(&self) -> RiskScoreInput {
        RiskScoreInput {
            probability: self.probability,
            impact: self.impact,
            controls: self.control_flags(),
            identification_date: self.identification_date.clone(),
            current_response: self.suggested_response,
        }
    }
}

/// A control mitigating a risk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub risk_id: String,
    pub name: String,
    pub description: String,
    pub planned_start_date: String,
    pub planned_end_date: String,
    pub actual_end_date: String,
    pub implemented: bool,
    /// Client-supplied status; `None` when the caller leaves it to the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ControlStatus>,
    pub history: History,
}

impl ControlRecord {
    pub fn status_input(&self) -> StatusInput<'_> {
        StatusInput {
            implemented: self.implemented,
            planned_end_date: &self.planned_end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(actor: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            actor: actor.to_string(),
            justification: "revisão anual".to_string(),
            changes: "probabilidade 3 -> 4".to_string(),
        }
    }

    #[test]
    fn test_history_is_append_only_and_ordered() {
        let mut history = History::new();
        assert!(history.is_empty());
        history.append(entry("ana"));
        history.append(entry("bruno"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].actor, "ana");
        assert_eq!(history.last().unwrap().actor, "bruno");
    }

    #[test]
    fn test_risk_record_camel_case_json() {
        let json = r#"{
            "processId": "p-1",
            "name": "Vazamento de dados",
            "probability": 4,
            "impact": 5,
            "controlsExist": true,
            "isControlEffective": true,
            "isControlAdequate": true,
            "suggestedResponse": "Mitigar",
            "isLgpdRelated": true,
            "history": [{
                "timestamp": "2024-05-01T12:00:00Z",
                "actor": "ana",
                "justification": "criação",
                "changes": "registro criado"
            }]
        }"#;
        let record: RiskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.probability, 4);
        assert!(record.is_lgpd_related);
        assert_eq!(record.fac, 0.0);
        assert_eq!(record.suggested_response, Some(SuggestedResponse::Mitigar));
        assert_eq!(record.history.len(), 1);

        let flags = record.control_flags();
        assert!(flags.controls_exist && flags.is_effective && flags.is_adequate);
        assert!(!flags.is_proportional);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["isControlEffective"], true);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_record_response_spelling_matches_config() {
        let record: RiskRecord =
            serde_json::from_str(r#"{"name": "Fraude", "suggestedResponse": "transferir"}"#).unwrap();
        assert_eq!(record.suggested_response, Some(SuggestedResponse::Transferir));

        let record: RiskRecord =
            serde_json::from_str(r#"{"name": "Fraude", "suggestedResponse": null}"#).unwrap();
        assert_eq!(record.suggested_response, None);

        let bad = serde_json::from_str::<RiskRecord>(r#"{"suggestedResponse": "Ignorar"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_control_record_status_is_optional() {
        let json = r#"{"name": "Backup diário", "plannedEndDate": "2024-07-01"}"#;
        let control: ControlRecord = serde_json::from_str(json).unwrap();
        assert_eq!(control.status, None);
        assert!(!control.implemented);

        let json = r#"{"name": "Backup diário", "plannedEndDate": "2024-07-01", "status": "near-due"}"#;
        let control: ControlRecord = serde_json::from_str(json).unwrap();
        assert_eq!(control.status, Some(ControlStatus::NearDue));
        assert_eq!(control.status_input().planned_end_date, "2024-07-01");
    }
}
