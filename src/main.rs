use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use tipsdash::server::{self, AppState};
use tipsdash::{ChartPayload, Config, Dashboard, ExportOptions, OutputFormat};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tipsdash")]
#[command(about = "Interactive dashboard over the restaurant tips dataset", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "TIPSDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the dashboard page and JSON API (default)
    Serve(ServeArgs),
    /// Print a chart payload as JSON
    Figure(ChartArgs),
    /// Render a chart to PNG or SVG on stdout
    Export {
        #[command(flatten)]
        chart: ChartArgs,

        #[arg(long = "type", default_value = "png")]
        format: OutputFormat,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    #[command(flatten)]
    source: SourceArgs,
}

/// Dataset and palette overrides shared by every subcommand
#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// CSV or JSON dataset replacing the bundled tips data
    #[arg(long)]
    data: Option<PathBuf>,

    /// Palette override, e.g. 'day=#ff8800,#ddff00,#3de800,#00c9ed' (repeatable)
    #[arg(long = "palette")]
    palettes: Vec<String>,
}

#[derive(Args, Debug)]
struct ChartArgs {
    #[arg(value_enum)]
    chart: ChartKind,

    /// Scatter hue field
    #[arg(long, default_value = "sex")]
    hue: String,

    /// Bar x field
    #[arg(long, default_value = "sex")]
    x: String,

    /// Bar text field
    #[arg(long, default_value = "sex")]
    text: String,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    Scatter,
    Bar,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so figure/export output stays clean
    let filter = if cli.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            if let Some(host) = args.host {
                config.host = host;
            }
            if let Some(port) = args.port {
                config.port = port;
            }
            let dashboard = start_dashboard(&mut config, &args.source)?;
            let addr = config.socket_addr()?;
            server::serve(addr, AppState::new(dashboard, config.max_sessions)).await?;
        }
        Commands::Figure(args) => {
            let dashboard = start_dashboard(&mut config, &args.source)?;
            let payload = build_chart(&dashboard, &args)?;
            let json = serde_json::to_string_pretty(&payload).context("Failed to serialize figure")?;
            write_stdout(format!("{}\n", json).as_bytes())?;
        }
        Commands::Export {
            chart,
            format,
            width,
            height,
        } => {
            let dashboard = start_dashboard(&mut config, &chart.source)?;
            let payload = build_chart(&dashboard, &chart)?;
            let options = ExportOptions { width, height, format };
            let bytes = tipsdash::graph::render(&payload, &options).context("Failed to render chart")?;
            write_stdout(&bytes)?;
        }
    }

    Ok(())
}

fn start_dashboard(config: &mut Config, source: &SourceArgs) -> Result<Dashboard> {
    if let Some(data) = &source.data {
        config.data_path = Some(data.clone());
    }

    let dataset = config.load_dataset().context("Failed to load dataset")?;
    let mut palettes = config.palette_table().context("Invalid palette configuration")?;
    for spec in &source.palettes {
        palettes.register_spec(spec)?;
    }
    info!(records = dataset.len(), "dataset loaded");

    Ok(Dashboard::start(config.title.clone(), dataset, palettes, config.table_rows)?)
}

fn build_chart(dashboard: &Dashboard, args: &ChartArgs) -> Result<ChartPayload> {
    let charts = dashboard.charts();
    let payload = match args.chart {
        ChartKind::Scatter => charts.scatter(&args.hue)?,
        ChartKind::Bar => charts.bar(&args.x, &args.text)?,
    };
    Ok(payload)
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(bytes).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
