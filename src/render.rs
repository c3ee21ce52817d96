//! Output formatters for the composed map.
//!
//! The map document is the JSON hand-off to the renderer. The HTML page
//! embeds it and drives Leaflet; the human format is a terminal summary.

use std::io::{self, Write};

use serde::Serialize;

use crate::layers::PointLayer;
use crate::legend::{Legend, LegendEntry, Position};
use crate::map::{LayerControl, Map, MapView, NamedTileLayer};
use crate::models::PlateBoundaries;
use crate::plates::{LineStyle, PLATE_STYLE};

// ANSI codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const ICON_QUAKE: &str = "🌍";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Self-contained Leaflet page (default)
    #[default]
    Html,
    /// Map document as JSON
    Json,
    /// Terminal summary with color swatches
    Human,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "human" => Ok(Self::Human),
            _ => Err(format!("unknown format: {s} (expected: html, json, human)")),
        }
    }
}

/// Serializable snapshot of a [`Map`].
#[derive(Debug, Serialize)]
pub struct MapDocument<'a> {
    pub base_layers: &'a [NamedTileLayer],
    pub overlays: OverlayDocument<'a>,
    pub view: &'a MapView,
    pub layer_control: &'a LayerControl,
    pub legend: LegendDocument<'a>,
}

#[derive(Debug, Serialize)]
pub struct OverlayDocument<'a> {
    #[serde(rename = "Earthquakes")]
    pub earthquakes: &'a PointLayer,
    #[serde(rename = "TectonicPlates")]
    pub tectonic_plates: PlateOverlayDocument,
}

/// Plate overlay as it stands right now.
///
/// `data` is set once the boundaries have loaded. Until then the page
/// may fetch them from `source`.
#[derive(Debug, Serialize)]
pub struct PlateOverlayDocument {
    pub style: LineStyle,
    pub data: Option<PlateBoundaries>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LegendDocument<'a> {
    pub position: Position,
    pub entries: &'a [LegendEntry],
    pub html: String,
}

impl<'a> MapDocument<'a> {
    /// Snapshot `map`; `plates_source` is where a page can fetch boundaries
    /// that have not loaded yet.
    #[must_use]
    pub fn new(map: &'a Map, plates_source: Option<&str>) -> Self {
        let loaded = map.overlays().tectonic_plates.snapshot();
        let style = loaded.as_ref().map_or(PLATE_STYLE, |layer| layer.style);

        Self {
            base_layers: map.base_layers(),
            overlays: OverlayDocument {
                earthquakes: &map.overlays().earthquakes,
                tectonic_plates: PlateOverlayDocument {
                    style,
                    data: loaded.map(|layer| layer.boundaries.clone()),
                    source: plates_source.map(str::to_string),
                },
            },
            view: map.view(),
            layer_control: map.layer_control(),
            legend: LegendDocument {
                position: map.legend().position,
                entries: &map.legend().entries,
                html: map.legend().to_html(),
            },
        }
    }
}

/// Render the Leaflet page for a map document.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn render_page(doc: &MapDocument<'_>) -> serde_json::Result<String> {
    // No raw '<' may reach the <script> element: it could close it or open a comment.
    let json = serde_json::to_string(doc)?.replace('<', "\\u003c");
    Ok(PAGE_TEMPLATE.replace("__MAP_DOCUMENT__", &json))
}

/// Write the map in the specified format.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_map<W: Write>(
    writer: &mut W,
    map: &Map,
    format: Format,
    plates_source: Option<&str>,
) -> io::Result<()> {
    let doc = MapDocument::new(map, plates_source);
    match format {
        Format::Html => {
            let page = render_page(&doc).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writer.write_all(page.as_bytes())
        }
        Format::Json => write_json(writer, &doc),
        Format::Human => write_human(writer, map),
    }
}

/// Write the legend in the specified format.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_legend<W: Write>(writer: &mut W, legend: &Legend, format: Format) -> io::Result<()> {
    match format {
        Format::Html => writer.write_all(legend.to_html().as_bytes()),
        Format::Json => write_json(writer, legend),
        Format::Human => write_legend_human(writer, legend),
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Map summary: layers, view and legend.
fn write_human<W: Write>(writer: &mut W, map: &Map) -> io::Result<()> {
    let view = map.view();
    writeln!(writer, "{ICON_QUAKE} {BOLD}quakemap{RESET}")?;
    writeln!(
        writer,
        "{DIM}center {:.2}, {:.2} │ zoom {}{RESET}",
        view.center.lat, view.center.lng, view.zoom
    )?;

    writeln!(writer, "{BOLD}Base layers{RESET}")?;
    for base in map.base_layers() {
        let marker = if base.name == view.base_layer { "●" } else { "○" };
        writeln!(writer, "  {marker} {:<10} {DIM}{}{RESET}", base.name, base.layer.id)?;
    }

    writeln!(writer, "{BOLD}Overlays{RESET}")?;
    for name in &map.layer_control().overlays {
        let marker = if view.overlays.contains(name) { "☑" } else { "☐" };
        let detail = match name.as_str() {
            crate::map::EARTHQUAKES => format!("{} events", map.overlays().earthquakes.len()),
            _ => {
                let group = &map.overlays().tectonic_plates;
                if group.is_empty() {
                    "empty".to_string()
                } else {
                    let count = group.snapshot().map_or(0, |l| l.boundaries.features.len());
                    format!("{count} boundaries")
                }
            }
        };
        writeln!(writer, "  {marker} {name:<14} {DIM}{detail}{RESET}")?;
    }

    write_legend_human(writer, map.legend())
}

/// Legend rows with truecolor swatches.
fn write_legend_human<W: Write>(writer: &mut W, legend: &Legend) -> io::Result<()> {
    writeln!(writer, "{BOLD}Magnitude{RESET}")?;
    for entry in &legend.entries {
        let (r, g, b) = entry.color.rgb();
        writeln!(
            writer,
            "  \x1b[38;2;{r};{g};{b}m████{RESET} {:<4} {DIM}{}{RESET}",
            entry.label, entry.color
        )?;
    }
    Ok(())
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>quakemap | Earthquakes and Plate Boundaries</title>

    <!-- Leaflet -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        html, body, #map { height: 100%; margin: 0; padding: 0; }

        .info {
            padding: 6px 8px;
            font: 14px/16px Arial, Helvetica, sans-serif;
            background: rgba(255, 255, 255, 0.85);
            box-shadow: 0 0 15px rgba(0, 0, 0, 0.2);
            border-radius: 5px;
        }

        .legend { line-height: 18px; color: #555; }
        .legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.9; }
    </style>
</head>
<body>
    <div id="map"></div>

    <script type="application/json" id="map-document">__MAP_DOCUMENT__</script>
    <script>
    (function () {
        var doc = JSON.parse(document.getElementById('map-document').textContent);

        var baseMaps = {};
        doc.base_layers.forEach(function (base) {
            baseMaps[base.name] = L.tileLayer(base.layer.url_template, {
                attribution: base.layer.attribution,
                maxZoom: base.layer.max_zoom,
                id: base.layer.id,
                accessToken: base.layer.access_token
            });
        });

        var earthquakes = L.layerGroup(doc.overlays.Earthquakes.markers.map(function (m) {
            return L.circle([m.position.lat, m.position.lng], m.style).bindPopup(m.popup);
        }));
        var tectonicPlates = L.layerGroup();

        var overlayMaps = {};
        overlayMaps.Earthquakes = earthquakes;
        overlayMaps.TectonicPlates = tectonicPlates;

        var active = [baseMaps[doc.view.base_layer]].concat(
            doc.view.overlays.map(function (name) { return overlayMaps[name]; })
        );

        var map = L.map('map', {
            center: [doc.view.center.lat, doc.view.center.lng],
            zoom: doc.view.zoom,
            layers: active
        });

        var plates = doc.overlays.TectonicPlates;
        function addPlates(data) {
            L.geoJson(data, plates.style).addTo(tectonicPlates);
        }
        if (plates.data) {
            addPlates(plates.data);
        } else if (plates.source) {
            fetch(plates.source)
                .then(function (r) { return r.json(); })
                .then(addPlates);
        }

        L.control.layers(baseMaps, overlayMaps, {
            collapsed: doc.layer_control.collapsed
        }).addTo(map);

        var legend = L.control({ position: doc.legend.position });
        legend.onAdd = function () {
            var div = L.DomUtil.create('div', 'info legend');
            div.innerHTML = doc.legend.html;
            return div;
        };
        legend.addTo(map);
    })();
    </script>
</body>
</html>
"##;
