use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    load_settings, resources::job_panel_lines, send_gated, ClientSettings, CometApi, ControlKind,
    EngageGate, HttpCometApi, ParameterForm, PollEvent, Poller, PollerConfig, RunStateViewModel,
    StatusPalette,
};
use shared::protocol::{ControlCommand, ResourceKind};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "comet", about = "Command-line client for a COMET measurement backend")]
struct Cli {
    /// TOML settings file; `comet.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    status_interval_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current run state and active jobs.
    Status,
    Params,
    /// Follow run state changes until interrupted.
    Watch,
    Start {
        /// Overrides a parameter draft before submission.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = render::parse_assignment)]
        set: Vec<(String, String)>,
        #[command(flatten)]
        engage: EngageArgs,
    },
    Stop {
        #[command(flatten)]
        engage: EngageArgs,
    },
    /// Pauses a running measurement or continues a paused one.
    Pause {
        #[command(flatten)]
        engage: EngageArgs,
    },
    Devices,
    Collections,
    Jobs,
    Services,
    Settings,
    /// Records of a collection starting at a record offset.
    Data {
        collection: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

#[derive(Args, Debug)]
struct EngageArgs {
    /// Engage the controls for this invocation.
    #[arg(long)]
    engaged: bool,
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let api = HttpCometApi::from_settings(&settings)?;
    info!(server_url = %api.base_url(), "using backend");

    match cli.command {
        Command::Status => print_status(&api, &settings).await?,
        Command::Params => {
            let form = ParameterForm::new(api.params().await?);
            for entry in form.entries() {
                println!("{}", render::param_line(entry));
            }
        }
        Command::Watch => watch(Arc::new(api), &settings).await?,
        Command::Start { set, engage } => {
            run_control(&api, &settings, &engage, ControlKind::Start, &set).await?
        }
        Command::Stop { engage } => {
            run_control(&api, &settings, &engage, ControlKind::Stop, &[]).await?
        }
        Command::Pause { engage } => {
            run_control(&api, &settings, &engage, ControlKind::Pause, &[]).await?
        }
        Command::Devices => print_list(&api, ResourceKind::Devices).await?,
        Command::Collections => print_list(&api, ResourceKind::Collections).await?,
        Command::Jobs => print_list(&api, ResourceKind::Jobs).await?,
        Command::Services => print_list(&api, ResourceKind::Services).await?,
        Command::Settings => {
            let tree = api.settings_tree().await?;
            for line in render::indented(&tree.flatten()) {
                println!("{line}");
            }
        }
        Command::Data { collection, offset } => {
            for sample in api.collection_data(&collection, offset).await? {
                println!("{}", render::sample_line(&sample));
            }
        }
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<ClientSettings> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = &cli.server_url {
        settings.server_url = server_url.clone();
    }
    if let Some(interval) = cli.status_interval_ms {
        settings.status_interval_ms = interval;
    }
    settings.validate()?;
    Ok(settings)
}

fn view_model_for(settings: &ClientSettings) -> RunStateViewModel {
    RunStateViewModel::new(StatusPalette {
        running: settings.running_color,
    })
}

async fn print_status(api: &HttpCometApi, settings: &ClientSettings) -> Result<()> {
    let mut view_model = view_model_for(settings);
    view_model.apply_status(api.status().await?);
    println!("{}", render::state_line(&view_model));
    for line in job_panel_lines(view_model.active_jobs()) {
        println!("{line}");
    }
    Ok(())
}

async fn print_list(api: &HttpCometApi, kind: ResourceKind) -> Result<()> {
    let list = api.resource_list(kind).await?;
    if list.is_empty() {
        println!("no {}", kind.envelope_key());
    }
    for item in &list.items {
        println!("{item}");
    }
    Ok(())
}

async fn run_control(
    api: &HttpCometApi,
    settings: &ClientSettings,
    engage: &EngageArgs,
    kind: ControlKind,
    overrides: &[(String, String)],
) -> Result<()> {
    let mut view_model = view_model_for(settings);
    view_model.apply_status(api.status().await?);

    if engage.engaged {
        let gate = EngageGate::new(settings.engage_password.clone());
        if gate.requires_prompt(view_model.engaged())
            && !gate.accepts(engage.password.as_deref().unwrap_or_default())
        {
            bail!("engage password rejected");
        }
        view_model.set_engaged(true);
    }
    if let Err(err) = view_model.ensure_enabled(kind) {
        warn!(command = kind.name(), error = %err, "command refused");
        return Err(err.into());
    }

    let command = match kind {
        ControlKind::Start => {
            let mut form = ParameterForm::new(api.params().await?);
            for (name, value) in overrides {
                form.set_draft(name, value.as_str())?;
            }
            ControlCommand::Start(form.submission()?)
        }
        ControlKind::Stop => ControlCommand::Stop,
        ControlKind::Pause => ControlCommand::Pause,
    };
    let label = match kind {
        ControlKind::Pause => view_model.pause_label(),
        other => other.name(),
    };
    send_gated(api, &view_model, command)
        .await
        .with_context(|| format!("{label} failed"))?;
    println!("{label} sent while {}", view_model.state());
    Ok(())
}

async fn watch(api: Arc<dyn CometApi>, settings: &ClientSettings) -> Result<()> {
    let mut poller = Poller::spawn(api, PollerConfig::status_only(settings.status_interval()));
    let mut events = poller.subscribe();
    let mut view_model = view_model_for(settings);
    let mut jobs: Vec<String> = Vec::new();
    let mut first = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(PollEvent::Status(snapshot)) => {
                    let changed = first || snapshot.state != *view_model.state();
                    first = false;
                    view_model.apply_status(snapshot);
                    if changed {
                        println!("{} {}", now(), render::state_line(&view_model));
                    }
                    let lines = job_panel_lines(view_model.active_jobs());
                    if lines != jobs {
                        for line in &lines {
                            println!("  {line}");
                        }
                        jobs = lines;
                    }
                }
                Ok(PollEvent::ConnectionLost(reason)) => {
                    println!("{} connection lost: {reason}", now());
                }
                Ok(PollEvent::ConnectionRestored) => {
                    println!("{} connection restored", now());
                    first = true;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "watch fell behind the poller"),
                Err(RecvError::Closed) => break,
            }
        }
    }
    info!("watch stopped");
    Ok(())
}

fn now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
