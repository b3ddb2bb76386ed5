//! Parameter inputs as rendered by a front end, and their conversion into a start submission.

use std::collections::BTreeMap;

use serde_json::{Number, Value};
use shared::{
    domain::{ParamKind, Parameter},
    error::ParamError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    pub param: Parameter,
    pub draft: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterForm {
    entries: Vec<ParamEntry>,
}

impl ParameterForm {
    pub fn new(params: Vec<Parameter>) -> Self {
        let mut form = Self::default();
        form.replace(params);
        form
    }

    /// Replaces the whole list; drafts are reset to the server values.
    pub fn replace(&mut self, params: Vec<Parameter>) {
        self.entries = params
            .into_iter()
            .map(|param| ParamEntry {
                draft: param.initial_text(),
                param,
            })
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ParamEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ParamEntry] {
        &mut self.entries
    }

    pub fn draft(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.param.name == name)
            .map(|entry| entry.draft.as_str())
    }

    pub fn set_draft(&mut self, name: &str, value: impl Into<String>) -> Result<(), ParamError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.param.name == name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        entry.draft = value.into();
        Ok(())
    }

    /// Name to value mapping posted with a start command.
    pub fn submission(&self) -> Result<BTreeMap<String, Value>, ParamError> {
        self.entries
            .iter()
            .map(|entry| Ok((entry.param.name.clone(), coerce(&entry.param, &entry.draft)?)))
            .collect()
    }
}

fn coerce(param: &Parameter, draft: &str) -> Result<Value, ParamError> {
    match param.kind {
        ParamKind::Int => {
            let trimmed = draft.trim();
            let value = match trimmed.parse::<i64>() {
                Ok(value) => value,
                Err(_) => integral_float(trimmed).ok_or_else(|| ParamError::NotAnInteger {
                    name: param.name.clone(),
                    input: draft.to_string(),
                })?,
            };
            check_range(param, value as f64)?;
            Ok(Value::from(value))
        }
        ParamKind::Float => {
            let not_a_number = || ParamError::NotANumber {
                name: param.name.clone(),
                input: draft.to_string(),
            };
            let value: f64 = draft.trim().parse().map_err(|_| not_a_number())?;
            let number = Number::from_f64(value).ok_or_else(not_a_number)?;
            check_range(param, value)?;
            Ok(Value::Number(number))
        }
        ParamKind::Text | ParamKind::Other(_) => Ok(Value::String(draft.to_string())),
    }
}

/// `"10.0"` reads as 10; anything with a fractional part does not.
fn integral_float(input: &str) -> Option<i64> {
    let value: f64 = input.parse().ok()?;
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn check_range(param: &Parameter, value: f64) -> Result<(), ParamError> {
    if let Some(min) = param.min {
        if value < min {
            return Err(ParamError::BelowMinimum {
                name: param.name.clone(),
                min,
                value,
            });
        }
    }
    if let Some(max) = param.max {
        if value > max {
            return Err(ParamError::AboveMaximum {
                name: param.name.clone(),
                max,
                value,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param(name: &str, kind: &str, value: Value) -> Parameter {
        serde_json::from_value(json!({
            "name": name,
            "label": name,
            "type": kind,
            "value": value,
        }))
        .expect("parameter")
    }

    fn sample_form() -> ParameterForm {
        ParameterForm::new(vec![
            param("cycles", "int", json!(10)),
            param("bias", "float", json!(-5.5)),
            param("operator", "text", json!("Monty")),
        ])
    }

    #[test]
    fn untouched_form_submits_server_values() {
        let submission = sample_form().submission().expect("submission");
        assert_eq!(submission["cycles"], json!(10));
        assert_eq!(submission["bias"], json!(-5.5));
        assert_eq!(submission["operator"], json!("Monty"));
    }

    #[test]
    fn submitted_values_match_rendered_inputs() {
        let mut form = sample_form();
        form.set_draft("cycles", "12").expect("cycles");
        form.set_draft("bias", " 2.25 ").expect("bias");
        form.set_draft("operator", "  John ").expect("operator");

        let submission = form.submission().expect("submission");
        assert_eq!(submission["cycles"], json!(12));
        assert_eq!(submission["bias"], json!(2.25));
        // Text is sent exactly as typed.
        assert_eq!(submission["operator"], json!("  John "));
    }

    #[test]
    fn int_field_rejects_fractional_input() {
        let mut form = sample_form();
        form.set_draft("cycles", "1.5").expect("cycles");
        assert_eq!(
            form.submission().expect_err("must fail"),
            ParamError::NotAnInteger {
                name: "cycles".to_string(),
                input: "1.5".to_string(),
            }
        );
    }

    #[test]
    fn int_field_accepts_integral_float_from_server() {
        let mut form = ParameterForm::new(vec![param("cycles", "int", json!(10.0))]);
        assert_eq!(form.draft("cycles"), Some("10"));
        assert_eq!(form.submission().expect("submission")["cycles"], json!(10));

        form.set_draft("cycles", "12.0").expect("cycles");
        assert_eq!(form.submission().expect("submission")["cycles"], json!(12));

        form.set_draft("cycles", "12.5").expect("cycles");
        assert!(matches!(
            form.submission(),
            Err(ParamError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn float_field_rejects_text_and_non_finite() {
        let mut form = sample_form();
        form.set_draft("bias", "five").expect("bias");
        assert!(matches!(
            form.submission(),
            Err(ParamError::NotANumber { .. })
        ));

        form.set_draft("bias", "inf").expect("bias");
        assert!(matches!(
            form.submission(),
            Err(ParamError::NotANumber { .. })
        ));
    }

    #[test]
    fn range_hints_are_enforced() {
        let mut limited = param("temperature", "float", json!(20.0));
        limited.min = Some(-40.0);
        limited.max = Some(80.0);
        let mut form = ParameterForm::new(vec![limited]);

        form.set_draft("temperature", "81").expect("draft");
        assert!(matches!(
            form.submission(),
            Err(ParamError::AboveMaximum { .. })
        ));
        form.set_draft("temperature", "-41").expect("draft");
        assert!(matches!(
            form.submission(),
            Err(ParamError::BelowMinimum { .. })
        ));
        form.set_draft("temperature", "80").expect("draft");
        form.submission().expect("boundary accepted");
    }

    #[test]
    fn replace_resets_drafts() {
        let mut form = sample_form();
        form.set_draft("cycles", "99").expect("cycles");
        form.replace(vec![param("cycles", "int", json!(3))]);
        assert_eq!(form.draft("cycles"), Some("3"));
        assert_eq!(form.draft("bias"), None);
    }

    #[test]
    fn unknown_parameter_draft_is_rejected() {
        let mut form = sample_form();
        assert_eq!(
            form.set_draft("missing", "1"),
            Err(ParamError::Unknown("missing".to_string()))
        );
    }
}
