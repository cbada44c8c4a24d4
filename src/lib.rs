// Library exports for tipsdash

pub mod chart;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod graph;
pub mod page;
pub mod palette;
pub mod parser;
pub mod server;
pub mod table;

// Chart payload model and grouping
pub mod ir;
pub mod transform;

pub use chart::ChartBuilder;
pub use config::Config;
pub use controller::{ChartId, ChartUpdate, ControlId, Controller, SelectionState};
pub use dashboard::Dashboard;
pub use data::{Dataset, Field, Record};
pub use error::{DashError, Result};
pub use graph::{ExportOptions, OutputFormat};
pub use ir::ChartPayload;
pub use palette::{CategoryColorTable, Color};
