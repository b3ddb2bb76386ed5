use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ActiveJob, Parameter, RunState};

/// Every backend payload nests under a top-level `app` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEnvelope<T> {
    pub app: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: StatusSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: RunState,
    #[serde(default)]
    pub active_jobs: Vec<ActiveJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsBody {
    pub params: Vec<Parameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBody {
    pub data: Vec<Vec<f64>>,
}

/// Slow-changing resource endpoints rendered as lists or trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Devices,
    Collections,
    Jobs,
    Services,
    Settings,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Devices,
        ResourceKind::Collections,
        ResourceKind::Jobs,
        ResourceKind::Services,
        ResourceKind::Settings,
    ];

    /// Key under `app` carrying the payload.
    pub fn envelope_key(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Collections => "collections",
            Self::Jobs => "jobs",
            Self::Services => "services",
            Self::Settings => "settings",
        }
    }

    pub fn path(self) -> String {
        format!("/api/{}", self.envelope_key())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Devices => "Devices",
            Self::Collections => "Collections",
            Self::Jobs => "Jobs",
            Self::Services => "Services",
            Self::Settings => "Settings",
        }
    }
}

/// Control commands posted to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Start(BTreeMap<String, Value>),
    Stop,
    Pause,
}

impl ControlCommand {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Start(_) => "/api/start",
            Self::Stop => "/api/stop",
            Self::Pause => "/api/pause",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
        }
    }
}

pub fn collection_data_path(collection: &str, offset: usize) -> String {
    format!("/api/collections/{collection}/data/offset/{offset}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_status_envelope_with_tuple_jobs() {
        let raw = r#"{"app":{"status":{"state":"Running","active_jobs":[["calibration",42.5]]}}}"#;
        let envelope: AppEnvelope<StatusBody> = serde_json::from_str(raw).expect("decode");
        let status = envelope.app.status;
        assert_eq!(status.state, RunState::Running);
        assert_eq!(status.active_jobs.len(), 1);
        assert_eq!(status.active_jobs[0].name, "calibration");
        assert_eq!(status.active_jobs[0].percent, 42.5);
    }

    #[test]
    fn status_without_jobs_defaults_to_empty_list() {
        let raw = r#"{"app":{"status":{"state":"halted"}}}"#;
        let envelope: AppEnvelope<StatusBody> = serde_json::from_str(raw).expect("decode");
        assert!(envelope.app.status.active_jobs.is_empty());
    }

    #[test]
    fn unknown_state_label_is_preserved() {
        let raw = r#"{"state":"Calibrating"}"#;
        let status: StatusSnapshot = serde_json::from_str(raw).expect("decode");
        assert_eq!(status.state, RunState::Unknown("calibrating".to_string()));
        assert_eq!(status.state.to_string(), "calibrating");
    }

    #[test]
    fn job_percent_is_clamped() {
        let raw = r#"[["overshoot",140.0],["negative",-3.0]]"#;
        let jobs: Vec<ActiveJob> = serde_json::from_str(raw).expect("decode");
        assert_eq!(jobs[0].percent, 100.0);
        assert_eq!(jobs[1].percent, 0.0);
    }

    #[test]
    fn decodes_parameter_with_optional_hints() {
        let raw = r#"{"app":{"params":[
            {"name":"bias","label":"Bias voltage","type":"float","value":-5.0,"unit":"V","prec":2},
            {"name":"operator","label":"Operator","type":"text","value":"Monty"}
        ]}}"#;
        let envelope: AppEnvelope<ParamsBody> = serde_json::from_str(raw).expect("decode");
        let params = envelope.app.params;
        assert_eq!(params[0].label_with_unit(), "Bias voltage [V]");
        assert_eq!(params[0].initial_text(), "-5.00");
        assert_eq!(params[1].kind, crate::domain::ParamKind::Text);
        assert_eq!(params[1].initial_text(), "Monty");
    }

    #[test]
    fn control_command_paths() {
        assert_eq!(ControlCommand::Start(BTreeMap::new()).path(), "/api/start");
        assert_eq!(ControlCommand::Stop.path(), "/api/stop");
        assert_eq!(ControlCommand::Pause.path(), "/api/pause");
        assert_eq!(
            collection_data_path("climate", 120),
            "/api/collections/climate/data/offset/120"
        );
    }
}
