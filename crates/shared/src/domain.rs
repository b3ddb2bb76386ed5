use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle label of the current measurement run, as reported by the backend.
///
/// Labels outside the known set are kept verbatim so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunState {
    #[default]
    Undefined,
    Halted,
    Configure,
    Running,
    Paused,
    Stopping,
    Unknown(String),
}

impl RunState {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "undefined" => Self::Undefined,
            "halted" => Self::Halted,
            "configure" => Self::Configure,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "stopping" => Self::Stopping,
            _ => Self::Unknown(label),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Undefined => "undefined",
            Self::Halted => "halted",
            Self::Configure => "configure",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Unknown(label) => label,
        }
    }

    /// Running or paused: a run exists that can be stopped or paused.
    pub fn is_active_run(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl From<String> for RunState {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<RunState> for String {
    fn from(value: RunState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Green,
    Orange,
    Red,
    #[default]
    #[serde(alias = "gray")]
    Grey,
}

impl StatusColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Grey => "grey",
        }
    }
}

impl FromStr for StatusColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "orange" => Ok(Self::Orange),
            "red" => Ok(Self::Red),
            "grey" | "gray" => Ok(Self::Grey),
            other => Err(format!("unsupported status color '{other}'")),
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background job reported with the run status. The wire form is `["name", percent]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct ActiveJob {
    pub name: String,
    pub percent: f64,
}

impl ActiveJob {
    pub fn new(name: impl Into<String>, percent: f64) -> Self {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        Self {
            name: name.into(),
            percent,
        }
    }
}

impl From<(String, f64)> for ActiveJob {
    fn from((name, percent): (String, f64)) -> Self {
        Self::new(name, percent)
    }
}

impl From<ActiveJob> for (String, f64) {
    fn from(value: ActiveJob) -> Self {
        (value.name, value.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamKind {
    Int,
    Float,
    Text,
    Other(String),
}

impl From<String> for ParamKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "float" => Self::Float,
            "text" | "str" => Self::Text,
            _ => Self::Other(value),
        }
    }
}

impl From<ParamKind> for String {
    fn from(value: ParamKind) -> Self {
        match value {
            ParamKind::Int => "int".to_string(),
            ParamKind::Float => "float".to_string(),
            ParamKind::Text => "text".to_string(),
            ParamKind::Other(label) => label,
        }
    }
}

/// Run parameter exposed by the backend for editing before a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prec: Option<u32>,
}

impl Parameter {
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Label with the unit appended as ` [unit]`.
    pub fn label_with_unit(&self) -> String {
        match self.unit.as_deref() {
            Some(unit) if !unit.is_empty() => format!("{} [{unit}]", self.display_label()),
            _ => self.display_label().to_string(),
        }
    }

    /// Text shown in the input before the user edits it.
    pub fn initial_text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            Value::Number(number) => match (&self.kind, self.prec, number.as_f64()) {
                (ParamKind::Float, Some(prec), Some(value)) => {
                    format!("{value:.prec$}", prec = prec as usize)
                }
                // Integer fields may still arrive as `10.0`.
                (ParamKind::Int, _, Some(value)) if number.is_f64() && value.fract() == 0.0 => {
                    format!("{value:.0}")
                }
                _ => number.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// One collection record: a UNIX timestamp in seconds followed by the metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub values: Vec<f64>,
}

impl Sample {
    pub fn from_record(record: &[f64]) -> Option<Self> {
        let (timestamp, values) = record.split_first()?;
        Some(Self {
            timestamp: *timestamp,
            values: values.to_vec(),
        })
    }
}
