//! Backend worker: owns the tokio runtime, the pollers and the HTTP client.

use std::{io, sync::Arc, thread};

use client_core::{ClientSettings, CometApi, HttpCometApi, PollEvent, Poller, PollerConfig};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use shared::protocol::ResourceKind;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
};

pub fn launch(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("comet-backend".to_string())
        .spawn(move || run_worker(settings, cmd_rx, ui_tx))
}

fn startup_failure(ui_tx: &Sender<UiEvent>, message: String) {
    tracing::error!("{message}");
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
        UiErrorContext::BackendStartup,
        message,
    )));
}

fn run_worker(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            startup_failure(&ui_tx, format!("failed to build backend runtime: {err}"));
            return;
        }
    };
    let api: Arc<dyn CometApi> = match HttpCometApi::from_settings(&settings) {
        Ok(api) => Arc::new(api),
        Err(err) => {
            startup_failure(&ui_tx, format!("backend client setup failed: {err}"));
            return;
        }
    };

    runtime.block_on(async move {
        let mut poller = Poller::spawn(Arc::clone(&api), PollerConfig::from(&settings));
        let forwarder = tokio::spawn(forward_poll_events(poller.subscribe(), ui_tx.clone()));
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Polling {}",
            settings.server_url
        )));

        // Blocks this thread only; poller and command tasks run on the runtime workers.
        while let Ok(cmd) = cmd_rx.recv() {
            let api = Arc::clone(&api);
            let ui_tx = ui_tx.clone();
            tokio::spawn(async move { handle_command(api.as_ref(), cmd, &ui_tx).await });
        }

        tracing::info!("ui command channel closed; stopping backend worker");
        forwarder.abort();
        drop(poller);
    });
}

async fn handle_command(api: &dyn CometApi, cmd: BackendCommand, ui_tx: &Sender<UiEvent>) {
    match cmd {
        BackendCommand::Control(command) => {
            let outcome = api
                .send_command(&command)
                .await
                .map_err(|err| {
                    tracing::warn!(command = command.name(), error = %err, "control command failed");
                    UiError::from_client_error(UiErrorContext::Command, &err)
                });
            // Waits for room: this event is what re-enables the controls.
            if ui_tx
                .send(UiEvent::CommandFinished {
                    command: command.name(),
                    outcome,
                })
                .is_err()
            {
                tracing::debug!(command = command.name(), "ui gone before command finished");
            }
        }
        BackendCommand::RefreshParams => match api.params().await {
            Ok(params) => {
                let _ = ui_tx.try_send(UiEvent::Poll(PollEvent::Params(params)));
            }
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client_error(
                    UiErrorContext::Parameters,
                    &err,
                )));
            }
        },
        BackendCommand::RefreshResources => {
            for kind in ResourceKind::ALL {
                match api.resource(kind).await {
                    Ok(payload) => {
                        let _ = ui_tx.try_send(UiEvent::Poll(PollEvent::Resource { kind, payload }));
                    }
                    Err(err) => {
                        tracing::debug!(resource = kind.envelope_key(), error = %err, "manual refresh failed")
                    }
                }
            }
        }
    }
}

/// Relays poller events to the UI queue until either side goes away.
async fn forward_poll_events(mut events: broadcast::Receiver<PollEvent>, ui_tx: Sender<UiEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match ui_tx.try_send(UiEvent::Poll(event)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!("ui event queue full; dropping poll event")
                }
                Err(TrySendError::Disconnected(_)) => break,
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "ui forwarder lagged behind the poller")
            }
            Err(RecvError::Closed) => break,
        }
    }
}
