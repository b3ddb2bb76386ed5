use std::time::Duration;

use client_core::ClientSettings;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::protocol::ResourceKind;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::UiEvent, orchestration::dispatch_backend_command, store::DashboardStore,
    },
    ui::{
        panels::{self, PanelAction},
        theme,
    },
};

const LIST_KINDS: [ResourceKind; 4] = [
    ResourceKind::Devices,
    ResourceKind::Collections,
    ResourceKind::Jobs,
    ResourceKind::Services,
];

pub struct DashboardApp {
    store: DashboardStore,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    style_applied: bool,
}

impl DashboardApp {
    pub fn new(
        settings: &ClientSettings,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        Self {
            store: DashboardStore::new(settings),
            cmd_tx,
            ui_rx,
            style_applied: false,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.store.apply(event);
        }
    }

    fn queue(&mut self, cmd: BackendCommand) -> bool {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.store.status)
    }

    fn handle(&mut self, action: PanelAction) {
        match action {
            PanelAction::ToggleEngage => self.store.toggle_engage(),
            PanelAction::SubmitPassword => self.store.submit_engage_password(),
            PanelAction::CancelPassword => self.store.cancel_engage_prompt(),
            PanelAction::Control(kind) => {
                if let Some(command) = self.store.prepare_command(kind) {
                    if !self.queue(BackendCommand::Control(command)) {
                        self.store.abandon_command();
                    }
                }
            }
            PanelAction::RefreshParams => {
                self.queue(BackendCommand::RefreshParams);
            }
            PanelAction::RefreshResources => {
                self.queue(BackendCommand::RefreshResources);
            }
        }
    }

    fn show_side_lists(&self, ctx: &egui::Context, actions: &mut Vec<PanelAction>) {
        egui::SidePanel::right("resource_lists")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Backend").strong());
                    if ui.small_button("Refresh").clicked() {
                        actions.push(PanelAction::RefreshResources);
                    }
                });
                egui::ScrollArea::vertical()
                    .id_salt("resource_lists_scroll")
                    .show(ui, |ui| {
                        for kind in LIST_KINDS {
                            panels::resource_section(ui, kind, self.store.resource(kind));
                        }
                        panels::settings_section(ui, &self.store.settings);
                    });
            });
    }

    fn show_main_content(&mut self, ctx: &egui::Context, actions: &mut Vec<PanelAction>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("main_content_scroll")
                .show(ui, |ui| {
                    panels::job_panel(ui, &self.store.view_model);
                    ui.separator();

                    if self.store.collections.is_empty() {
                        ui.weak("No collections.");
                    }
                    for series in self.store.collections.iter() {
                        panels::chart(ui, series);
                        ui.add_space(6.0);
                    }
                    ui.separator();

                    let editable = self.store.view_model.params_editable();
                    panels::params_panel(ui, &mut self.store.form, editable, actions);
                });
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.style_applied {
            theme::apply_style(ctx);
            self.style_applied = true;
        }
        self.process_ui_events();

        let mut actions = Vec::new();
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            panels::header(ui, &self.store, &mut actions);
        });
        egui::TopBottomPanel::bottom("status_line").show(ctx, |ui| {
            ui.small(egui::RichText::new(&self.store.status).weak());
        });

        if self.store.main_content_visible() {
            self.show_side_lists(ctx, &mut actions);
            self.show_main_content(ctx, &mut actions);
        } else {
            let reason = self.store.lost_reason().unwrap_or_default();
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::connection_banner(ui, reason);
            });
        }

        if let Some(prompt) = self.store.engage_prompt.as_mut() {
            panels::engage_prompt(ctx, prompt, &mut actions);
        }

        for action in actions {
            self.handle(action);
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
