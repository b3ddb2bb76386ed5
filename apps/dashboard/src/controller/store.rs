//! Dashboard store: all UI state, mutated only on the UI thread by applying events and actions.
//!
//! Panels read from the store and report actions; nothing else writes to it.

use std::collections::BTreeMap;

use client_core::{
    ClientError, ClientSettings, CollectionSet, ControlKind, EngageGate, ParameterForm, PollEvent,
    ResourceList, RunStateViewModel, SettingsTree, StatusPalette,
};
use shared::protocol::{ControlCommand, ResourceKind};

use crate::controller::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No status poll has completed yet.
    Connecting,
    Connected,
    Lost(String),
}

/// Password prompt shown before engaging when a password is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagePrompt {
    pub input: String,
    pub rejected: bool,
}

pub struct DashboardStore {
    pub view_model: RunStateViewModel,
    pub form: ParameterForm,
    pub resources: BTreeMap<ResourceKind, ResourceList>,
    pub settings: SettingsTree,
    pub collections: CollectionSet,
    pub connection: ConnectionState,
    pub command_in_flight: Option<&'static str>,
    pub engage_prompt: Option<EngagePrompt>,
    pub status: String,
    pub last_error: Option<UiError>,
    gate: EngageGate,
}

impl DashboardStore {
    pub fn new(settings: &ClientSettings) -> Self {
        Self {
            view_model: RunStateViewModel::new(StatusPalette {
                running: settings.running_color,
            }),
            form: ParameterForm::default(),
            resources: BTreeMap::new(),
            settings: SettingsTree::default(),
            collections: CollectionSet::new(settings.chart_retention),
            connection: ConnectionState::Connecting,
            command_in_flight: None,
            engage_prompt: None,
            status: String::new(),
            last_error: None,
            gate: EngageGate::new(settings.engage_password.clone()),
        }
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Poll(event) => self.apply_poll(event),
            UiEvent::CommandFinished { command, outcome } => {
                self.command_in_flight = None;
                match outcome {
                    Ok(()) => self.status = format!("{command} accepted"),
                    Err(err) => self.report(err),
                }
            }
            UiEvent::Error(err) => self.report(err),
        }
    }

    fn apply_poll(&mut self, event: PollEvent) {
        match event {
            PollEvent::Status(snapshot) => {
                self.connection = ConnectionState::Connected;
                self.view_model.apply_status(snapshot);
            }
            PollEvent::Params(params) => self.form.replace(params),
            PollEvent::ConnectionLost(reason) => {
                self.connection = ConnectionState::Lost(reason);
            }
            PollEvent::ConnectionRestored => self.connection = ConnectionState::Connected,
            PollEvent::Resource { kind, payload } => match kind {
                ResourceKind::Settings => self.settings = SettingsTree::from_value(&payload),
                _ => {
                    let list = ResourceList::from_value(&payload);
                    if kind == ResourceKind::Collections {
                        self.collections.sync_names(&list.names());
                    }
                    self.resources.insert(kind, list);
                }
            },
            PollEvent::CollectionChunk {
                collection,
                offset,
                samples,
            } => match self.collections.get_mut(&collection) {
                Some(series) => {
                    series.append_chunk(offset, samples);
                }
                None => tracing::debug!(collection = %collection, "chunk for unlisted collection"),
            },
        }
    }

    fn report(&mut self, err: UiError) {
        tracing::warn!(category = ?err.category(), context = ?err.context(), "{}", err.message());
        self.status = err.message().to_string();
        self.last_error = Some(err);
    }

    pub fn lost_reason(&self) -> Option<&str> {
        match &self.connection {
            ConnectionState::Lost(reason) => Some(reason),
            ConnectionState::Connecting | ConnectionState::Connected => None,
        }
    }

    /// Main content is hidden while the backend is unreachable.
    pub fn main_content_visible(&self) -> bool {
        self.lost_reason().is_none()
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceList> {
        self.resources.get(&kind)
    }

    /// Button state: the view model rule, further blocked while a command is in flight.
    pub fn control_enabled(&self, kind: ControlKind) -> bool {
        self.command_in_flight.is_none() && self.view_model.is_enabled(kind)
    }

    /// Engage/Disengage click. Opens the password prompt instead when one is required.
    pub fn toggle_engage(&mut self) {
        if self.gate.requires_prompt(self.view_model.engaged()) {
            self.engage_prompt = Some(EngagePrompt::default());
            return;
        }
        let engaged = self.view_model.toggle_engaged();
        tracing::info!(engaged, "engage toggled");
    }

    pub fn submit_engage_password(&mut self) {
        let Some(prompt) = self.engage_prompt.as_mut() else {
            return;
        };
        if self.gate.accepts(&prompt.input) {
            self.engage_prompt = None;
            self.view_model.set_engaged(true);
            tracing::info!("engaged after password prompt");
        } else {
            prompt.input.clear();
            prompt.rejected = true;
        }
    }

    pub fn cancel_engage_prompt(&mut self) {
        self.engage_prompt = None;
    }

    /// Builds the command for a control click and marks it in flight.
    ///
    /// The caller queues the returned command; on failure to queue it must call
    /// [`Self::abandon_command`].
    pub fn prepare_command(&mut self, kind: ControlKind) -> Option<ControlCommand> {
        if self.command_in_flight.is_some() {
            return None;
        }
        if let Err(err) = self.view_model.ensure_enabled(kind) {
            self.report(UiError::from_client_error(UiErrorContext::Command, &err));
            return None;
        }
        let command = match kind {
            ControlKind::Start => match self.form.submission() {
                Ok(values) => ControlCommand::Start(values),
                Err(err) => {
                    self.report(UiError::from_client_error(
                        UiErrorContext::Parameters,
                        &ClientError::from(err),
                    ));
                    return None;
                }
            },
            ControlKind::Stop => ControlCommand::Stop,
            ControlKind::Pause => ControlCommand::Pause,
        };
        self.command_in_flight = Some(command.name());
        self.status = format!("Sending {}...", command.name());
        self.last_error = None;
        Some(command)
    }

    pub fn abandon_command(&mut self) {
        self.command_in_flight = None;
    }
}

#[cfg(test)]
#[path = "../tests/store_tests.rs"]
mod tests;
