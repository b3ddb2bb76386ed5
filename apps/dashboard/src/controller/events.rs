//! Backend to UI events and error modeling for the dashboard controller.

use client_core::{ClientError, PollEvent};

pub enum UiEvent {
    Info(String),
    Poll(PollEvent),
    CommandFinished {
        command: &'static str,
        outcome: Result<(), UiError>,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    /// The view model does not allow the command in the current state.
    Refused,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Command,
    Parameters,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("not available while") {
            UiErrorCategory::Refused
        } else if lower.contains("invalid")
            || lower.contains("malformed")
            || lower.contains("expects")
            || lower.contains("must be")
            || lower.contains("unknown parameter")
        {
            UiErrorCategory::Validation
        } else if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("unreachable")
            || lower.contains("disconnected")
            || lower.contains("http ")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Transport { .. } | ClientError::HttpStatus { .. } => {
                UiErrorCategory::Transport
            }
            ClientError::InvalidUrl { .. }
            | ClientError::Decode { .. }
            | ClientError::Params(_) => UiErrorCategory::Validation,
            ClientError::Unavailable { .. } => UiErrorCategory::Refused,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
