//! Run-state view model: the client's belief about the backend run plus the local engage latch.
//!
//! The backend is the only authority on run state. Every polled label is accepted as-is and the
//! view model never moves the state on its own; it only derives what the controls may do.

use shared::{
    domain::{ActiveJob, RunState, StatusColor},
    protocol::{ControlCommand, StatusSnapshot},
};

use crate::error::{ClientError, ClientResult};

/// Colors shown for each run state. Only `running` is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPalette {
    pub running: StatusColor,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            running: StatusColor::Green,
        }
    }
}

impl StatusPalette {
    pub fn color_for(&self, state: &RunState) -> StatusColor {
        match state {
            RunState::Halted => StatusColor::Green,
            RunState::Configure => StatusColor::Orange,
            RunState::Running => self.running,
            RunState::Paused => StatusColor::Orange,
            RunState::Stopping => StatusColor::Orange,
            RunState::Undefined | RunState::Unknown(_) => StatusColor::Grey,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Start,
    Stop,
    Pause,
}

impl ControlKind {
    pub fn of(command: &ControlCommand) -> Self {
        match command {
            ControlCommand::Start(_) => Self::Start,
            ControlCommand::Stop => Self::Stop,
            ControlCommand::Pause => Self::Pause,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunStateViewModel {
    state: RunState,
    engaged: bool,
    active_jobs: Vec<ActiveJob>,
    palette: StatusPalette,
}

impl RunStateViewModel {
    pub fn new(palette: StatusPalette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn engaged(&self) -> bool {
        self.engaged
    }

    pub fn active_jobs(&self) -> &[ActiveJob] {
        &self.active_jobs
    }

    /// Replaces state and jobs with the latest poll. Engaged is left alone.
    pub fn apply_status(&mut self, snapshot: StatusSnapshot) {
        if snapshot.state != self.state {
            tracing::debug!(from = %self.state, to = %snapshot.state, "run state changed");
        }
        self.state = snapshot.state;
        self.active_jobs = snapshot.active_jobs;
    }

    pub fn toggle_engaged(&mut self) -> bool {
        self.engaged = !self.engaged;
        self.engaged
    }

    pub fn set_engaged(&mut self, engaged: bool) {
        self.engaged = engaged;
    }

    pub fn status_color(&self) -> StatusColor {
        self.palette.color_for(&self.state)
    }

    pub fn start_enabled(&self) -> bool {
        self.engaged && self.state == RunState::Halted
    }

    pub fn stop_enabled(&self) -> bool {
        self.engaged && self.state.is_active_run()
    }

    pub fn pause_enabled(&self) -> bool {
        self.engaged && self.state.is_active_run()
    }

    pub fn pause_label(&self) -> &'static str {
        if self.state == RunState::Paused {
            "Continue"
        } else {
            "Pause"
        }
    }

    pub fn engage_label(&self) -> &'static str {
        if self.engaged {
            "Disengage"
        } else {
            "Engage"
        }
    }

    pub fn params_editable(&self) -> bool {
        self.state == RunState::Halted
    }

    pub fn is_enabled(&self, kind: ControlKind) -> bool {
        match kind {
            ControlKind::Start => self.start_enabled(),
            ControlKind::Stop => self.stop_enabled(),
            ControlKind::Pause => self.pause_enabled(),
        }
    }

    /// Fails with [`ClientError::Unavailable`] when the control is disabled.
    pub fn ensure_enabled(&self, kind: ControlKind) -> ClientResult<()> {
        if self.is_enabled(kind) {
            return Ok(());
        }
        Err(ClientError::Unavailable {
            command: kind.name(),
            state: self.state.to_string(),
            hint: if self.engaged { "" } else { " (controls are disengaged)" },
        })
    }
}

/// Optional cosmetic password prompt in front of the Engage action.
#[derive(Debug, Clone, Default)]
pub struct EngageGate {
    password: Option<String>,
}

impl EngageGate {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
        }
    }

    /// Disengaging never prompts.
    pub fn requires_prompt(&self, currently_engaged: bool) -> bool {
        !currently_engaged && self.password.is_some()
    }

    pub fn accepts(&self, input: &str) -> bool {
        match &self.password {
            Some(password) => password == input,
            None => true,
        }
    }
}
