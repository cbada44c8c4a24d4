// Static PNG/SVG export of chart payloads

use crate::ir::{ChartPayload, Series, SeriesKind};
use crate::palette::{Color as PaletteColor, DEFAULT_COLORWAY};
use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(anyhow!("unsupported export type '{}', expected png or svg", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (1..=MAX_DIMENSION).contains(&self.width) && (1..=MAX_DIMENSION).contains(&self.height),
            "Image size {}x{} out of range (1..={} per side)",
            self.width,
            self.height,
            MAX_DIMENSION
        );
        Ok(())
    }
}

/// Render a chart payload to image bytes in the requested format.
pub fn render(payload: &ChartPayload, options: &ExportOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let (width, height) = (options.width, options.height);

    match options.format {
        OutputFormat::Png => render_png(payload, width, height),
        OutputFormat::Svg => render_svg(payload, width, height).map(String::into_bytes),
    }
}

fn render_png(payload: &ChartPayload, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(&root, payload)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(&buffer, width, height, image::ColorType::Rgb8)
        .context("Failed to encode PNG")?;

    Ok(png_bytes)
}

fn render_svg(payload: &ChartPayload, width: u32, height: u32) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw(&root, payload)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

fn draw<DB>(root: &DrawingArea<DB, Shift>, payload: &ChartPayload) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if payload.series.iter().all(Series::is_empty) {
        anyhow::bail!("Cannot render a chart with no data points");
    }

    root.fill(&WHITE).context("Failed to fill background")?;

    if payload.series.iter().any(|s| s.kind == SeriesKind::Bars) {
        draw_bars(root, payload)
    } else {
        draw_points(root, payload)
    }
}

fn draw_points<DB>(root: &DrawingArea<DB, Shift>, payload: &ChartPayload) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut layers = Vec::with_capacity(payload.series.len());
    for series in &payload.series {
        let points = series
            .x
            .iter()
            .zip(&series.y)
            .map(|(x, &y)| {
                x.as_f64()
                    .map(|x| (x, y))
                    .ok_or_else(|| anyhow!("Non-numeric x value '{}' in series '{}'", x, series.name))
            })
            .collect::<Result<Vec<(f64, f64)>>>()?;
        layers.push(points);
    }

    let x_range = padded_range(layers.iter().flatten().map(|p| p.0));
    let y_range = padded_range(layers.iter().flatten().map(|p| p.1));

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(payload.axes.x.title.as_str())
        .y_desc(payload.axes.y.title.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    for (idx, (series, points)) in payload.series.iter().zip(layers).enumerate() {
        let color = series_color(series, idx);
        // Marker sizes are diameters
        let radius = series.marker.as_ref().map(|m| m.size / 2.0).unwrap_or(3.0) as i32;

        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, radius, color.filled())))
            .context("Failed to draw point series")?
            .label(series.name.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    draw_legend(&mut chart)
}

fn draw_bars<DB>(root: &DrawingArea<DB, Shift>, payload: &ChartPayload) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // Category slots in first-appearance order across all series
    let mut categories: Vec<String> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for label in payload.series.iter().flat_map(|s| s.x.iter()).map(|d| d.to_string()) {
        if !slots.contains_key(&label) {
            slots.insert(label.clone(), categories.len());
            categories.push(label);
        }
    }

    let y_values = payload.series.iter().flat_map(|s| s.y.iter().copied());
    // Bars always grow from zero
    let y_range = padded_range(y_values.chain(std::iter::once(0.0)));
    let x_range = 0.0..(categories.len() as f64);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    let label_for = |x: &f64| {
        let idx = x.floor() as usize;
        categories.get(idx).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&label_for)
        .x_desc(payload.axes.x.title.as_str())
        .y_desc(payload.axes.y.title.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    let bar_width = 0.8;
    for (idx, series) in payload.series.iter().enumerate() {
        let color = series_color(series, idx).mix(series.opacity.unwrap_or(1.0));
        let bars = series.x.iter().zip(&series.y).map(|(x, &y)| {
            let center = slots[&x.to_string()] as f64 + 0.5;
            Rectangle::new(
                [(center - bar_width / 2.0, 0.0), (center + bar_width / 2.0, y)],
                color.filled(),
            )
        });

        chart
            .draw_series(bars)
            .context("Failed to draw bar series")?
            .label(series.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    draw_legend(&mut chart)
}

fn draw_legend<'a, DB>(chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;
    Ok(())
}

fn series_color(series: &Series, idx: usize) -> RGBColor {
    let color: PaletteColor = series
        .color()
        .unwrap_or(DEFAULT_COLORWAY[idx % DEFAULT_COLORWAY.len()]);
    RGBColor(color.r, color.g, color.b)
}

/// Data extent with 5% padding, or +/-1 around a single value.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        0.0..1.0
    } else if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{build_bar, build_scatter};
    use crate::data::{Field, Record};
    use crate::palette::CategoryColorTable;

    fn rows() -> Vec<Record> {
        vec![
            Record {
                total_bill: 10.0,
                tip: 1.0,
                sex: "Male".to_string(),
                smoker: "No".to_string(),
                day: "Sun".to_string(),
                time: "Dinner".to_string(),
                size: 2,
            },
            Record {
                total_bill: 20.0,
                tip: 2.0,
                sex: "Female".to_string(),
                smoker: "Yes".to_string(),
                day: "Sat".to_string(),
                time: "Lunch".to_string(),
                size: 3,
            },
        ]
    }

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([5.0].into_iter()), 4.0..6.0);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        let r = padded_range([0.0, 10.0].into_iter());
        assert!(r.start < 0.0 && r.end > 10.0);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("svg".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert!("gif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
    }

    #[test]
    fn test_render_scatter_png() {
        let payload = build_scatter(&rows(), Field::Sex, &CategoryColorTable::tips_default()).unwrap();
        let bytes = render(&payload, &ExportOptions::default()).unwrap();
        assert!(is_valid_png(&bytes));
    }

    #[test]
    fn test_render_bar_svg() {
        let payload = build_bar(&rows(), Field::Day, Field::Sex);
        let options = ExportOptions {
            format: OutputFormat::Svg,
            ..ExportOptions::default()
        };
        let svg = String::from_utf8(render(&payload, &options).unwrap()).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_render_empty_payload() {
        let payload = build_bar(&[], Field::Day, Field::Sex);
        assert!(render(&payload, &ExportOptions::default()).is_err());
    }

    #[test]
    fn test_render_rejects_bad_size() {
        let payload = build_bar(&rows(), Field::Day, Field::Sex);
        let options = ExportOptions {
            width: 0,
            ..ExportOptions::default()
        };
        assert!(render(&payload, &options).is_err());
    }
}
