use crate::data::{capitalize, Dataset, Datum, Field, Record};
use crate::error::Result;
use crate::ir::{
    Axis, AxisConfig, ChartPayload, HoverMode, LegendPosition, Margin, Marker, MarkerLine, Series, SeriesKind,
};
use crate::palette::CategoryColorTable;
use crate::transform::group_by;
use std::sync::Arc;

pub const SCATTER_X_TITLE: &str = "Total Bill";
pub const SCATTER_Y_TITLE: &str = "Tip";
pub const BAR_Y_TITLE: &str = "US$";
pub const BAR_OPACITY: f64 = 0.7;
pub const MARKER_SIZE: f64 = 10.0;

/// One point series per distinct value of `hue`, tip against total bill.
pub fn build_scatter(rows: &[Record], hue: Field, palettes: &CategoryColorTable) -> Result<ChartPayload> {
    let groups = group_by(rows, hue)?;
    let palette_len = if groups.is_empty() { 0 } else { palettes.colors_for(hue)?.len() };
    if groups.len() > palette_len {
        tracing::debug!(
            field = %hue,
            groups = groups.len(),
            colors = palette_len,
            "palette shorter than category count, cycling colors"
        );
    }

    let series = groups
        .iter()
        .enumerate()
        .map(|(idx, group)| {
            let color = palettes.color_for_group(hue, idx)?;
            Ok(Series {
                kind: SeriesKind::Points,
                mode: Some("markers"),
                x: group.rows.iter().map(|r| Datum::Number(r.total_bill)).collect(),
                y: group.rows.iter().map(|r| r.tip).collect(),
                text: None,
                name: group.key.to_string(),
                marker: Some(Marker {
                    color,
                    size: MARKER_SIZE,
                    line: MarkerLine { width: 0.5, color: "white" },
                }),
                opacity: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChartPayload {
        series,
        axes: AxisConfig {
            x: Axis::titled(SCATTER_X_TITLE),
            y: Axis::titled(SCATTER_Y_TITLE),
            margin: Margin::default(),
            legend: None,
            hover: HoverMode::Closest,
        },
    })
}

/// Two overlaid bar series ("Tip" and "Total Bill"), one bar pair per row.
///
/// Rows are not aggregated per x category: every row contributes its own bar,
/// so same-category bars overlap.
pub fn build_bar(rows: &[Record], x_field: Field, text_field: Field) -> ChartPayload {
    let x: Vec<Datum> = rows.iter().map(|r| r.value(x_field)).collect();
    let text: Vec<Datum> = rows.iter().map(|r| r.value(text_field)).collect();

    let bar = |name: &str, y: Vec<f64>| Series {
        kind: SeriesKind::Bars,
        mode: None,
        x: x.clone(),
        y,
        text: Some(text.clone()),
        name: name.to_string(),
        marker: None,
        opacity: Some(BAR_OPACITY),
    };

    let series = vec![
        bar("Tip", rows.iter().map(|r| r.tip).collect()),
        bar("Total Bill", rows.iter().map(|r| r.total_bill).collect()),
    ];

    ChartPayload {
        series,
        axes: AxisConfig {
            x: Axis::titled(capitalize(x_field.name())),
            y: Axis::titled(BAR_Y_TITLE),
            margin: Margin::default(),
            legend: Some(LegendPosition { x: 0.0, y: 1.0 }),
            hover: HoverMode::Closest,
        },
    }
}

/// Chart builders bound to one dataset and palette table.
///
/// Field names arrive as raw strings from the UI and are validated here.
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    dataset: Dataset,
    palettes: Arc<CategoryColorTable>,
}

impl ChartBuilder {
    pub fn new(dataset: Dataset, palettes: Arc<CategoryColorTable>) -> Self {
        Self { dataset, palettes }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn palettes(&self) -> &CategoryColorTable {
        &self.palettes
    }

    pub fn scatter(&self, hue_field: &str) -> Result<ChartPayload> {
        self.scatter_by(Field::parse(hue_field)?)
    }

    pub fn scatter_by(&self, hue: Field) -> Result<ChartPayload> {
        build_scatter(self.dataset.records(), hue, &self.palettes)
    }

    pub fn bar(&self, x_field: &str, text_field: &str) -> Result<ChartPayload> {
        let x = Field::parse(x_field)?;
        let text = Field::parse(text_field)?;
        Ok(self.bar_by(x, text))
    }

    pub fn bar_by(&self, x: Field, text: Field) -> ChartPayload {
        build_bar(self.dataset.records(), x, text)
    }
}
