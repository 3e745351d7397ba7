//! egui HUD overlay: camera state, the current draped footprint, and the
//! stacked-plot band controls.

use geoplot::bounds::GeoBounds;
use geoplot::stack::StackedLayout;

pub fn draw_hud(ctx: &egui::Context, lat_deg: f64, lon_deg: f64, h_m: f64, bounds: GeoBounds) {
    egui::Window::new("Viewer")
        .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("Camera: {:.5}°, {:.5}°", lat_deg, lon_deg));
            ui.label(format!("Altitude: {:.0} m", h_m));
            ui.separator();
            ui.label("Draped footprint");
            ui.label(format!(
                "Lat: {:.4}° .. {:.4}°",
                bounds.min_lat, bounds.max_lat
            ));
            ui.label(format!(
                "Lon: {:.4}° .. {:.4}°",
                bounds.min_lon, bounds.max_lon
            ));
            ui.label(format!(
                "Buffer: {:.0}%",
                crate::footprint::FOOTPRINT_BUFFER * 100.0
            ));
        });
}

/// Per-band toggles. Changes go through the layout's own mutation API, so
/// visibility flips take effect on the next relayout just like any other
/// cell change.
pub fn draw_band_panel(ctx: &egui::Context, layout: &mut StackedLayout<String>) {
    egui::Window::new("Plot Bands")
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            let ids = layout.sorted_ids();
            let mut dirty = false;

            for id in ids {
                let Some(cell) = layout.cell(&id) else { continue };
                let mut visible = cell.is_visible();

                if ui.checkbox(&mut visible, id.as_str()).changed() {
                    layout.set_visible(&id, visible);
                    dirty = true;
                }
            }

            if dirty {
                layout.relayout();
            }
        });
}
