// Startup assembly: dataset, palettes and the pre-rendered table

use crate::chart::ChartBuilder;
use crate::controller::{ControlId, Controller};
use crate::data::{Dataset, Field};
use crate::error::Result;
use crate::palette::CategoryColorTable;
use crate::table::{render_table, Grid};
use std::sync::Arc;

/// Process-wide, read-only dashboard state shared by every session.
#[derive(Debug, Clone)]
pub struct Dashboard {
    title: String,
    builder: ChartBuilder,
    table: Grid,
}

impl Dashboard {
    /// Validate palettes against every field the hue dropdown offers, then render the table.
    pub fn start(
        title: impl Into<String>,
        dataset: Dataset,
        palettes: CategoryColorTable,
        table_rows: i64,
    ) -> Result<Self> {
        palettes.ensure_registered(ControlId::HueScatter.options())?;

        for (field, distinct, colors) in palettes.short_palettes(&dataset) {
            tracing::warn!(
                field = %field,
                distinct,
                colors,
                "palette has fewer colors than categories, colors will repeat"
            );
        }

        let table = render_table(dataset.records(), table_rows);
        tracing::info!(rows = dataset.len(), table_rows = table.rows.len(), "dashboard ready");

        Ok(Self {
            title: title.into(),
            builder: ChartBuilder::new(dataset, Arc::new(palettes)),
            table,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn table(&self) -> &Grid {
        &self.table
    }

    pub fn dataset(&self) -> &Dataset {
        self.builder.dataset()
    }

    pub fn charts(&self) -> &ChartBuilder {
        &self.builder
    }

    /// Fresh controller holding the default selection for a new UI session.
    pub fn new_session(&self) -> Result<Controller> {
        Controller::new(self.builder.clone())
    }

    pub fn columns(&self) -> &'static [Field] {
        self.dataset().columns()
    }
}
