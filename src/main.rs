use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

use stock_dashboard::{
    Config, Dashboard, DashboardError, DashboardRequest, OutputFormat, Source, write_report,
};

#[derive(Parser, Debug)]
#[command(name = "stock_dashboard")]
#[command(about = "Daily stock price dashboard: trend, moving averages and returns")]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the full daily history of a symbol from Alpha Vantage
    Remote(RemoteArgs),
    /// Load one column of a CSV export
    File(FileArgs),
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// First day to show (YYYY-MM-DD), defaults to the first available day
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day to show (YYYY-MM-DD), defaults to the last available day
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct RemoteArgs {
    /// Stock symbol, e.g. AAPL, MSFT, TSLA
    #[arg(short, long, default_value = "AAPL")]
    symbol: String,

    /// API key (overrides the config file)
    #[arg(long)]
    api_key: Option<String>,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// CSV file; the configured default file is used when omitted
    #[arg(short, long, value_name = "FILE")]
    path: Option<PathBuf>,

    /// Column to chart as the closing price; defaults to the first one
    #[arg(short, long)]
    column: Option<String>,

    /// Print the selectable columns and exit
    #[arg(long, default_value_t = false)]
    list_columns: bool,

    #[command(flatten)]
    range: RangeArgs,
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

fn output_writer(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(io::stdout().lock()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.validate()?;
    if let Commands::Remote(args) = &cli.command {
        if let Some(key) = &args.api_key {
            config.alpha_vantage.api_key = key.clone();
        }
        config.validate_remote()?;
    }

    let format = cli.format.unwrap_or(config.output.format);
    let dashboard = Dashboard::from_config(&config)?;

    let request = match cli.command {
        Commands::Remote(args) => DashboardRequest {
            source: Source::Remote {
                symbol: args.symbol,
            },
            start: args.range.start,
            end: args.range.end,
        },
        Commands::File(args) => {
            if args.list_columns {
                let table = dashboard.table(args.path.as_ref())?;
                let mut out = output_writer(cli.output.as_ref())?;
                for column in table.columns() {
                    writeln!(out, "{}", column)?;
                }
                out.flush()?;
                return Ok(());
            }
            DashboardRequest {
                source: Source::File {
                    path: args.path,
                    column: args.column,
                },
                start: args.range.start,
                end: args.range.end,
            }
        }
    };

    let view = match dashboard.run(&request).await {
        Ok(view) => view,
        Err(e @ DashboardError::EmptyRange { .. }) => {
            warn!("{}", e);
            return Ok(());
        }
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let mut out = output_writer(cli.output.as_ref())?;
    write_report(&view, format, &mut out)?;
    out.flush()?;

    Ok(())
}
