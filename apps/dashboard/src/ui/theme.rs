use eframe::egui;
use shared::domain::StatusColor;

pub const CHART_HEIGHT: f32 = 150.0;

pub fn status_fill(color: StatusColor) -> egui::Color32 {
    match color {
        StatusColor::Green => egui::Color32::from_rgb(46, 160, 67),
        StatusColor::Orange => egui::Color32::from_rgb(219, 140, 30),
        StatusColor::Red => egui::Color32::from_rgb(207, 34, 46),
        StatusColor::Grey => egui::Color32::from_rgb(110, 118, 129),
    }
}

/// Line color for the `index`-th metric of a chart.
pub fn series_color(index: usize) -> egui::Color32 {
    const PALETTE: [egui::Color32; 6] = [
        egui::Color32::from_rgb(88, 166, 255),
        egui::Color32::from_rgb(255, 123, 114),
        egui::Color32::from_rgb(126, 231, 135),
        egui::Color32::from_rgb(210, 168, 255),
        egui::Color32::from_rgb(255, 166, 87),
        egui::Color32::from_rgb(121, 192, 255),
    ];
    PALETTE[index % PALETTE.len()]
}

pub fn banner_fill() -> egui::Color32 {
    egui::Color32::from_rgb(130, 30, 38)
}

pub fn apply_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::dark();
    style.visuals.widgets.inactive.bg_stroke =
        egui::Stroke::new(1.0, style.visuals.widgets.noninteractive.bg_stroke.color);
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    ctx.set_style(style);
}
