//! Panel renderers. They read the store and return the actions the user took.

use chrono::DateTime;
use client_core::{
    collections::CollectionSeries,
    resources::{format_job, SettingsNode, NO_ACTIVE_JOBS},
    ControlKind, ParameterForm, ResourceList, RunStateViewModel, SettingsTree,
};
use eframe::egui;
use shared::protocol::ResourceKind;

use crate::{
    controller::store::{DashboardStore, EngagePrompt},
    ui::theme,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ToggleEngage,
    Control(ControlKind),
    SubmitPassword,
    CancelPassword,
    RefreshParams,
    RefreshResources,
}

fn tag(ui: &mut egui::Ui, text: &str, fill: egui::Color32) {
    egui::Frame::NONE
        .fill(fill)
        .corner_radius(egui::CornerRadius::same(4))
        .inner_margin(egui::Margin::symmetric(8, 2))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE).strong());
        });
}

pub fn header(ui: &mut egui::Ui, store: &DashboardStore, actions: &mut Vec<PanelAction>) {
    let view_model = &store.view_model;
    ui.horizontal(|ui| {
        ui.heading("COMET");
        tag(
            ui,
            &view_model.state().to_string(),
            theme::status_fill(view_model.status_color()),
        );
        ui.separator();
        control_bar(ui, store, actions);
    });
}

fn control_bar(ui: &mut egui::Ui, store: &DashboardStore, actions: &mut Vec<PanelAction>) {
    let view_model: &RunStateViewModel = &store.view_model;
    if ui.button(view_model.engage_label()).clicked() {
        actions.push(PanelAction::ToggleEngage);
    }
    for (kind, label) in [
        (ControlKind::Start, "Start"),
        (ControlKind::Stop, "Stop"),
        (ControlKind::Pause, view_model.pause_label()),
    ] {
        if ui
            .add_enabled(store.control_enabled(kind), egui::Button::new(label))
            .clicked()
        {
            actions.push(PanelAction::Control(kind));
        }
    }
    if let Some(command) = store.command_in_flight {
        ui.spinner();
        ui.weak(format!("{command} pending"));
    }
}

pub fn connection_banner(ui: &mut egui::Ui, reason: &str) {
    egui::Frame::NONE
        .fill(theme::banner_fill())
        .corner_radius(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new("Connection to the COMET backend lost")
                    .color(egui::Color32::WHITE)
                    .strong()
                    .size(18.0),
            );
            ui.label(egui::RichText::new(reason).color(egui::Color32::WHITE));
            ui.label(egui::RichText::new("Retrying...").color(egui::Color32::LIGHT_GRAY));
        });
}

pub fn job_panel(ui: &mut egui::Ui, view_model: &RunStateViewModel) {
    ui.label(egui::RichText::new("Active jobs").strong());
    let jobs = view_model.active_jobs();
    if jobs.is_empty() {
        ui.weak(NO_ACTIVE_JOBS);
        return;
    }
    for job in jobs {
        ui.add(
            egui::ProgressBar::new((job.percent / 100.0) as f32)
                .text(format_job(job)),
        );
    }
}

pub fn params_panel(
    ui: &mut egui::Ui,
    form: &mut ParameterForm,
    editable: bool,
    actions: &mut Vec<PanelAction>,
) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Parameters").strong());
        if ui.small_button("Reload").clicked() {
            actions.push(PanelAction::RefreshParams);
        }
    });
    if form.is_empty() {
        ui.weak("No parameters.");
        return;
    }
    egui::Grid::new("params_grid")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for entry in form.entries_mut() {
                ui.label(entry.param.label_with_unit());
                ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut entry.draft).desired_width(180.0),
                );
                ui.end_row();
            }
        });
}

/// Time and value ranges of a series, widened when degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub t_min: f64,
    pub t_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl ChartBounds {
    pub fn of(series: &CollectionSeries) -> Option<Self> {
        let first = series.samples().next()?;
        let mut bounds = Self {
            t_min: first.timestamp,
            t_max: first.timestamp,
            v_min: f64::INFINITY,
            v_max: f64::NEG_INFINITY,
        };
        for sample in series.samples() {
            bounds.t_min = bounds.t_min.min(sample.timestamp);
            bounds.t_max = bounds.t_max.max(sample.timestamp);
            for value in sample.values.iter().filter(|v| v.is_finite()) {
                bounds.v_min = bounds.v_min.min(*value);
                bounds.v_max = bounds.v_max.max(*value);
            }
        }
        if !bounds.v_min.is_finite() {
            bounds.v_min = 0.0;
            bounds.v_max = 1.0;
        } else if bounds.v_min == bounds.v_max {
            bounds.v_min -= 1.0;
            bounds.v_max += 1.0;
        }
        Some(bounds)
    }

    /// Position in `rect`; a single timestamp lands in the middle.
    pub fn project(&self, rect: egui::Rect, timestamp: f64, value: f64) -> egui::Pos2 {
        let x = if self.t_max > self.t_min {
            (timestamp - self.t_min) / (self.t_max - self.t_min)
        } else {
            0.5
        };
        let y = (value - self.v_min) / (self.v_max - self.v_min);
        egui::pos2(
            rect.left() + x as f32 * rect.width(),
            rect.bottom() - y as f32 * rect.height(),
        )
    }
}

fn clock(timestamp: f64) -> String {
    DateTime::from_timestamp(timestamp.floor() as i64, 0)
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn chart(ui: &mut egui::Ui, series: &CollectionSeries) {
    ui.label(egui::RichText::new(series.name()).strong());
    let (response, painter) = ui.allocate_painter(
        egui::vec2(ui.available_width(), theme::CHART_HEIGHT),
        egui::Sense::hover(),
    );
    let frame = response.rect;
    painter.rect_filled(frame, egui::CornerRadius::same(4), ui.visuals().extreme_bg_color);

    let Some(bounds) = ChartBounds::of(series) else {
        painter.text(
            frame.center(),
            egui::Align2::CENTER_CENTER,
            "No data yet",
            egui::FontId::proportional(13.0),
            ui.visuals().weak_text_color(),
        );
        return;
    };
    let plot = frame.shrink(12.0);
    for metric in 0..series.metric_count() {
        let color = theme::series_color(metric);
        let points: Vec<egui::Pos2> = series
            .samples()
            .filter_map(|sample| {
                let value = *sample.values.get(metric)?;
                value
                    .is_finite()
                    .then(|| bounds.project(plot, sample.timestamp, value))
            })
            .collect();
        if let [single] = points[..] {
            painter.circle_filled(single, 2.5, color);
        } else if points.len() > 1 {
            painter.add(egui::Shape::line(points, egui::Stroke::new(1.5, color)));
        }
    }

    let text_color = ui.visuals().text_color();
    let font = egui::FontId::monospace(10.0);
    painter.text(
        frame.left_top() + egui::vec2(4.0, 2.0),
        egui::Align2::LEFT_TOP,
        format!("{:.3}", bounds.v_max),
        font.clone(),
        text_color,
    );
    painter.text(
        frame.left_bottom() + egui::vec2(4.0, -2.0),
        egui::Align2::LEFT_BOTTOM,
        format!("{:.3}  {}", bounds.v_min, clock(bounds.t_min)),
        font.clone(),
        text_color,
    );
    painter.text(
        frame.right_bottom() + egui::vec2(-4.0, -2.0),
        egui::Align2::RIGHT_BOTTOM,
        clock(bounds.t_max),
        font,
        text_color,
    );
}

pub fn resource_section(
    ui: &mut egui::Ui,
    kind: ResourceKind,
    list: Option<&ResourceList>,
) {
    egui::CollapsingHeader::new(kind.title())
        .default_open(true)
        .show(ui, |ui| {
            let Some(list) = list.filter(|list| !list.is_empty()) else {
                ui.weak("Nothing reported.");
                return;
            };
            for item in &list.items {
                ui.horizontal(|ui| {
                    if kind == ResourceKind::Devices {
                        tag(ui, "OK", theme::status_fill(shared::domain::StatusColor::Green));
                    }
                    ui.label(item.to_string());
                });
            }
        });
}

pub fn settings_section(ui: &mut egui::Ui, tree: &SettingsTree) {
    egui::CollapsingHeader::new(ResourceKind::Settings.title())
        .default_open(false)
        .show(ui, |ui| {
            if tree.is_empty() {
                ui.weak("Nothing reported.");
                return;
            }
            settings_nodes(ui, &tree.nodes, "settings");
        });
}

fn settings_nodes(ui: &mut egui::Ui, nodes: &[SettingsNode], parent: &str) {
    for node in nodes {
        match node {
            SettingsNode::Leaf { key, value } => {
                ui.label(format!("{key}: {value}"));
            }
            SettingsNode::Branch { key, children } => {
                let path = format!("{parent}.{key}");
                egui::CollapsingHeader::new(key.as_str())
                    .id_salt(&path)
                    .show(ui, |ui| settings_nodes(ui, children, &path));
            }
        }
    }
}

pub fn engage_prompt(
    ctx: &egui::Context,
    prompt: &mut EngagePrompt,
    actions: &mut Vec<PanelAction>,
) {
    egui::Window::new("Engage controls")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label("Password");
            let response = ui.add(egui::TextEdit::singleline(&mut prompt.input).password(true));
            response.request_focus();
            if prompt.rejected {
                ui.colored_label(
                    theme::status_fill(shared::domain::StatusColor::Red),
                    "Wrong password",
                );
            }
            let submitted =
                response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
            ui.horizontal(|ui| {
                if ui.button("Engage").clicked() || submitted {
                    actions.push(PanelAction::SubmitPassword);
                }
                if ui.button("Cancel").clicked() {
                    actions.push(PanelAction::CancelPassword);
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::Sample;

    fn series(samples: &[(f64, &[f64])]) -> CollectionSeries {
        let mut series = CollectionSeries::new("climate", None);
        series.append_chunk(
            0,
            samples
                .iter()
                .map(|(timestamp, values)| Sample {
                    timestamp: *timestamp,
                    values: values.to_vec(),
                })
                .collect(),
        );
        series
    }

    #[test]
    fn empty_series_has_no_bounds() {
        assert_eq!(ChartBounds::of(&series(&[])), None);
    }

    #[test]
    fn flat_series_is_widened() {
        let bounds = ChartBounds::of(&series(&[(10.0, &[5.0]), (20.0, &[5.0])])).expect("bounds");
        assert_eq!((bounds.v_min, bounds.v_max), (4.0, 6.0));
        assert_eq!((bounds.t_min, bounds.t_max), (10.0, 20.0));
    }

    #[test]
    fn projection_maps_corners() {
        let bounds = ChartBounds::of(&series(&[(0.0, &[0.0, 1.0]), (10.0, &[2.0])])).expect("bounds");
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 50.0));
        assert_eq!(bounds.project(rect, 0.0, 0.0), egui::pos2(0.0, 50.0));
        assert_eq!(bounds.project(rect, 10.0, 2.0), egui::pos2(100.0, 0.0));
    }

    #[test]
    fn single_timestamp_is_centered() {
        let bounds = ChartBounds::of(&series(&[(3.0, &[1.0, 3.0])])).expect("bounds");
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 50.0));
        assert_eq!(bounds.project(rect, 3.0, 1.0).x, 50.0);
    }
}
