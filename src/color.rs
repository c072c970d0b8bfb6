use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::NATIONAL_AREA;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Sequential scale for the choropleth
// ---------------------------------------------------------------------------

/// Colour for a coverage estimate: red at low coverage through yellow to
/// teal at full coverage, grey when there is no estimate.
pub fn estimate_color(estimate: Option<f64>, range: (f64, f64)) -> Color32 {
    let Some(value) = estimate else {
        return Color32::from_gray(90);
    };
    let (lo, hi) = range;
    let t = if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0) as f32
    } else {
        1.0
    };
    hsl_to_color32(Hsl::new(t * 180.0, 0.65, 0.45))
}

/// Smallest and largest estimate present, used to stretch the scale.
pub fn estimate_range(values: impl IntoIterator<Item = Option<f64>>) -> Option<(f64, f64)> {
    values.into_iter().flatten().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ---------------------------------------------------------------------------
// Color mapping: series label → Color32
// ---------------------------------------------------------------------------

/// Maps series labels (areas, cohorts) to distinct colours.  The national
/// series always gets the same colour so it reads the same across charts.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().filter(|l| *l != NATIONAL_AREA).collect();
        let palette = generate_palette(labels.len());
        let mut mapping: BTreeMap<String, Color32> = labels
            .into_iter()
            .zip(palette)
            .map(|(label, c)| (label.to_string(), c))
            .collect();
        mapping.insert(NATIONAL_AREA.to_string(), Color32::from_rgb(31, 119, 180));

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a series label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(3);
        assert_eq!(colors.len(), 3);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn national_series_has_a_fixed_colour() {
        let a = ColorMap::new(["United States", "Texas"]);
        let b = ColorMap::new(["Alabama", "United States"]);
        assert_eq!(a.color_for("United States"), b.color_for("United States"));
        assert_eq!(a.color_for("Nowhere"), Color32::GRAY);
    }

    #[test]
    fn estimate_scale_ends_differ_and_missing_is_grey() {
        let range = (50.0, 100.0);
        assert_ne!(estimate_color(Some(50.0), range), estimate_color(Some(100.0), range));
        assert_eq!(estimate_color(None, range), Color32::from_gray(90));
        assert_eq!(estimate_range([Some(70.0), None, Some(95.5)]), Some((70.0, 95.5)));
        assert_eq!(estimate_range([None]), None);
    }
}
