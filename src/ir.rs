use crate::data::Datum;
use crate::palette::Color;
use serde::{Serialize, Serializer};

// =============================================================================
// Chart payloads
// =============================================================================

/// Everything the browser needs to draw one chart.
/// Serializes as a plotly figure: `{ "data": [...], "layout": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    #[serde(rename = "data")]
    pub series: Vec<Series>,
    #[serde(rename = "layout")]
    pub axes: AxisConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesKind {
    #[serde(rename = "scatter")]
    Points,
    #[serde(rename = "bar")]
    Bars,
}

/// A single trace within a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    pub x: Vec<Datum>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<Datum>>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Series {
    pub fn color(&self) -> Option<Color> {
        self.marker.as_ref().map(|m| m.color)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: Color,
    pub size: f64,
    pub line: MarkerLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLine {
    pub width: f64,
    pub color: &'static str,
}

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisConfig {
    #[serde(rename = "xaxis")]
    pub x: Axis,
    #[serde(rename = "yaxis")]
    pub y: Axis,
    pub margin: Margin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendPosition>,
    #[serde(rename = "hovermode")]
    pub hover: HoverMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    #[serde(serialize_with = "serialize_title")]
    pub title: String,
}

impl Axis {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

fn serialize_title<S: Serializer>(title: &str, serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Title<'a> {
        text: &'a str,
    }
    Title { text: title }.serialize(serializer)
}

/// Plot margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub b: u32,
    pub t: u32,
    pub r: u32,
}

impl Default for Margin {
    fn default() -> Self {
        Self { l: 40, b: 40, t: 10, r: 10 }
    }
}

/// Legend anchor in normalized plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverMode {
    Closest,
}
