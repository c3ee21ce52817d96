//! Magnitude legend control.

use std::fmt::Write as _;

use serde::Serialize;

use crate::style::{Color, color_for_magnitude};

/// Lower bounds of the legend buckets.
pub const GRADES: [u8; 6] = [0, 1, 2, 3, 4, 5];

/// Corner a control is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    BottomRight,
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

/// Static color key for the magnitude buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub position: Position,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// Build the legend from [`GRADES`].
    ///
    /// Each swatch uses the color of `lower + 1`, which is the next bucket
    /// up from the one the label names.
    #[must_use]
    pub fn magnitude_scale() -> Self {
        let entries = GRADES
            .iter()
            .enumerate()
            .map(|(i, &lower)| {
                let label = match GRADES.get(i + 1) {
                    Some(upper) => format!("{lower}\u{2013}{upper}"),
                    None => format!("{lower}+"),
                };
                LegendEntry {
                    label,
                    color: color_for_magnitude(f64::from(lower) + 1.0),
                }
            })
            .collect();

        Self {
            position: Position::BottomRight,
            entries,
        }
    }

    /// Render as the inner HTML of a Leaflet `info legend` div.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                html,
                "<i style=\"background:{}\">&nbsp;&nbsp;&nbsp;&nbsp;</i> <span style=\"color: gray\">{}</span><br>",
                entry.color, entry.label
            );
        }
        html
    }
}
