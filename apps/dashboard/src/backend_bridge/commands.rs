//! Backend commands queued from UI to backend worker.

use shared::protocol::ControlCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Posts a control command that the store already cleared against the view model.
    Control(ControlCommand),
    RefreshParams,
    RefreshResources,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Control(command) => command.name(),
            Self::RefreshParams => "refresh_params",
            Self::RefreshResources => "refresh_resources",
        }
    }
}
