//! Plain-text rendering shared by the subcommands.

use chrono::{DateTime, SecondsFormat};
use client_core::{params::ParamEntry, RunStateViewModel};
use shared::domain::Sample;

pub fn state_line(view_model: &RunStateViewModel) -> String {
    format!(
        "state: {} ({})",
        view_model.state(),
        view_model.status_color()
    )
}

pub fn param_line(entry: &ParamEntry) -> String {
    format!("{} = {}", entry.param.label_with_unit(), entry.draft)
}

/// UNIX seconds as RFC 3339 UTC; the raw number when out of range.
pub fn timestamp(seconds: f64) -> String {
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| seconds.to_string())
}

pub fn sample_line(sample: &Sample) -> String {
    let mut line = timestamp(sample.timestamp);
    for value in &sample.values {
        line.push('\t');
        line.push_str(&value.to_string());
    }
    line
}

pub fn indented(lines: &[(usize, String)]) -> Vec<String> {
    lines
        .iter()
        .map(|(depth, text)| format!("{}{text}", "  ".repeat(*depth)))
        .collect()
}

/// Parses a `--set name=value` argument.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::ParameterForm;
    use serde_json::json;
    use shared::{
        domain::{ParamKind, Parameter, RunState},
        protocol::StatusSnapshot,
    };

    #[test]
    fn state_line_names_color() {
        let mut vm = RunStateViewModel::default();
        vm.apply_status(StatusSnapshot {
            state: RunState::Paused,
            active_jobs: Vec::new(),
        });
        assert_eq!(state_line(&vm), "state: paused (orange)");
    }

    #[test]
    fn param_line_uses_unit_and_precision() {
        let form = ParameterForm::new(vec![Parameter {
            name: "voltage".into(),
            label: "Voltage".into(),
            kind: ParamKind::Float,
            value: json!(-5),
            unit: Some("V".into()),
            min: None,
            max: None,
            prec: Some(2),
        }]);
        assert_eq!(param_line(&form.entries()[0]), "Voltage [V] = -5.00");
    }

    #[test]
    fn samples_render_iso_timestamps() {
        let sample = Sample {
            timestamp: 1_700_000_000.5,
            values: vec![21.5, 40.0],
        };
        assert_eq!(sample_line(&sample), "2023-11-14T22:13:20.500Z\t21.5\t40");
    }

    #[test]
    fn tree_lines_indent_by_depth() {
        let lines = vec![(0, "table:".to_string()), (1, "enabled: true".to_string())];
        assert_eq!(indented(&lines), vec!["table:", "  enabled: true"]);
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("label=a=b"),
            Ok(("label".to_string(), "a=b".to_string()))
        );
        assert_eq!(
            parse_assignment("count="),
            Ok(("count".to_string(), String::new()))
        );
        assert!(parse_assignment("=4").is_err());
        assert!(parse_assignment("count").is_err());
    }
}
