use eframe::egui::{self, Align2, Color32, CornerRadius, FontId, Rect, Sense, Ui, vec2};

use crate::color::{estimate_color, estimate_range};
use crate::data::series::{ESTIMATE_RANGE, MapCell};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// State tile grid (choropleth)
// ---------------------------------------------------------------------------

const GRID_COLS: usize = 12;
const GRID_ROWS: usize = 8;
const GAP: f32 = 3.0;

/// (state code, row, column) of every tile.
const TILE_GRID: [(&str, usize, usize); 52] = [
    ("AK", 0, 0), ("ME", 0, 11),
    ("VT", 1, 10), ("NH", 1, 11),
    ("WA", 2, 1), ("ID", 2, 2), ("MT", 2, 3), ("ND", 2, 4), ("MN", 2, 5), ("IL", 2, 6),
    ("WI", 2, 7), ("MI", 2, 8), ("NY", 2, 9), ("RI", 2, 10), ("MA", 2, 11),
    ("OR", 3, 1), ("NV", 3, 2), ("WY", 3, 3), ("SD", 3, 4), ("IA", 3, 5), ("IN", 3, 6),
    ("OH", 3, 7), ("PA", 3, 8), ("NJ", 3, 9), ("CT", 3, 10),
    ("CA", 4, 1), ("UT", 4, 2), ("CO", 4, 3), ("NE", 4, 4), ("MO", 4, 5), ("KY", 4, 6),
    ("WV", 4, 7), ("VA", 4, 8), ("MD", 4, 9), ("DE", 4, 10),
    ("AZ", 5, 2), ("NM", 5, 3), ("KS", 5, 4), ("AR", 5, 5), ("TN", 5, 6), ("NC", 5, 7),
    ("SC", 5, 8), ("DC", 5, 9),
    ("OK", 6, 4), ("LA", 6, 5), ("MS", 6, 6), ("AL", 6, 7), ("GA", 6, 8),
    ("HI", 7, 0), ("TX", 7, 4), ("FL", 7, 9), ("PR", 7, 11),
];

fn tooltip(code: &str, cell: Option<&MapCell>) -> String {
    match cell {
        Some(cell) => {
            let estimate = cell
                .estimate
                .map(|e| format!("{e:.1}%"))
                .unwrap_or_else(|| "no estimate".into());
            let sample = cell
                .sample_size
                .map(|n| format!("\nSample size: {n}"))
                .unwrap_or_default();
            format!("{} ({code})\nEstimate: {estimate}{sample}", cell.area)
        }
        None => format!("{code}\nNo data"),
    }
}

/// Render the state choropleth as an equal-area tile grid.
pub fn choropleth(ui: &mut Ui, state: &AppState) {
    if state.map.is_empty() {
        ui.label("No state data available for this selection.");
        return;
    }

    let range = estimate_range(state.map.iter().map(|c| c.estimate)).unwrap_or(ESTIMATE_RANGE);
    let tile = ((ui.available_width() - GAP * GRID_COLS as f32) / GRID_COLS as f32).clamp(18.0, 52.0);
    let step = tile + GAP;
    let (rect, _) = ui.allocate_exact_size(
        vec2(step * GRID_COLS as f32, step * GRID_ROWS as f32),
        Sense::hover(),
    );
    let painter = ui.painter_at(rect);

    for (code, row, col) in TILE_GRID {
        let tile_rect = Rect::from_min_size(
            rect.min + vec2(col as f32 * step, row as f32 * step),
            vec2(tile, tile),
        );
        let cell = state.map.iter().find(|c| c.state == code);
        let fill = estimate_color(cell.and_then(|c| c.estimate), range);

        painter.rect_filled(tile_rect, CornerRadius::same(3), fill);
        painter.text(
            tile_rect.center(),
            Align2::CENTER_CENTER,
            code,
            FontId::proportional(tile * 0.32),
            Color32::WHITE,
        );
        ui.interact(tile_rect, ui.id().with(("map_tile", code)), Sense::hover())
            .on_hover_text(tooltip(code, cell));
    }

    legend(ui, range);
}

/// Horizontal colour bar with the scale's end values.
fn legend(ui: &mut Ui, range: (f64, f64)) {
    const STEPS: usize = 24;
    ui.add_space(6.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{:.1}%", range.0));
        let (rect, _) = ui.allocate_exact_size(vec2(240.0, 14.0), Sense::hover());
        let painter = ui.painter_at(rect);
        let w = rect.width() / STEPS as f32;
        for i in 0..STEPS {
            let t = i as f64 / (STEPS - 1) as f64;
            let value = range.0 + t * (range.1 - range.0);
            let r = Rect::from_min_size(rect.min + vec2(i as f32 * w, 0.0), vec2(w + 0.5, rect.height()));
            painter.rect_filled(r, CornerRadius::ZERO, estimate_color(Some(value), range));
        }
        ui.label(format!("{:.1}%", range.1));
    });
    ui.label(egui::RichText::new("Estimate (%)").small());
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tile_grid_has_unique_codes_and_positions() {
        let codes: HashSet<&str> = TILE_GRID.iter().map(|t| t.0).collect();
        let cells: HashSet<(usize, usize)> = TILE_GRID.iter().map(|t| (t.1, t.2)).collect();
        assert_eq!(codes.len(), TILE_GRID.len());
        assert_eq!(cells.len(), TILE_GRID.len());
        assert!(TILE_GRID.iter().all(|t| t.1 < GRID_ROWS && t.2 < GRID_COLS));
    }

    #[test]
    fn tooltip_reports_missing_values() {
        let cell = MapCell {
            state: "TX".into(),
            area: "Texas".into(),
            estimate: Some(91.24),
            sample_size: None,
        };
        assert_eq!(tooltip("TX", Some(&cell)), "Texas (TX)\nEstimate: 91.2%");
        assert_eq!(tooltip("WY", None), "WY\nNo data");
    }
}
