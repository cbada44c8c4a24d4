use crate::data::{Dataset, Field};
use crate::error::{DashError, Result};
use crate::palette::CategoryColorTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Runtime settings, layered as defaults -> optional config file -> `TIPSDASH_*` environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// CSV or JSON dataset; the bundled copy is used when unset.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    #[serde(default = "default_table_rows")]
    pub table_rows: i64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Palette overrides: field name -> list of `#rrggbb` colors.
    #[serde(default)]
    pub palettes: BTreeMap<String, Vec<String>>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 2000 }
fn default_table_rows() -> i64 { crate::table::DEFAULT_MAX_ROWS }
fn default_title() -> String { "Tips Dashboard".to_string() }
fn default_max_sessions() -> usize { 1024 }

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_path: None,
            table_rows: default_table_rows(),
            title: default_title(),
            max_sessions: default_max_sessions(),
            palettes: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Config::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("TIPSDASH").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DashError::Configuration(format!("invalid listen address {}:{}: {}", self.host, self.port, e)))
    }

    pub fn load_dataset(&self) -> Result<Dataset> {
        match &self.data_path {
            Some(path) => Dataset::from_path(path),
            None => Dataset::bundled(),
        }
    }

    /// Default palettes with this config's overrides applied.
    pub fn palette_table(&self) -> Result<CategoryColorTable> {
        let mut table = CategoryColorTable::tips_default();
        for (name, colors) in &self.palettes {
            let field = Field::parse(name)
                .map_err(|_| DashError::Configuration(format!("palette for unknown field '{}'", name)))?;
            let colors = colors
                .iter()
                .map(|c| c.parse())
                .collect::<Result<Vec<_>>>()?;
            table.register(field, colors)?;
        }
        Ok(table)
    }
}
