mod cli;
mod error_fmt;
mod replay;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use enrich_config::{Config, Logging, TaperData, ThrottleTableData};
use error_fmt::{Stage, exit_code_for_error, format_error_json, humanize};
use eyre::{Result, WrapErr};
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %e, "enrich failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(cli.config.as_deref()).wrap_err(Stage::Config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging).wrap_err(Stage::Config)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let (table, taper) =
        load_tables(cli.table.as_deref(), cli.taper.as_deref()).wrap_err(Stage::Config)?;

    match &cli.cmd {
        Commands::Replay(opts) => {
            replay::run_replay(&cfg, table.as_ref(), taper.as_ref(), opts, cli.json)
        }
        Commands::Info => replay::print_info(&cfg, table.as_ref(), taper.as_ref(), cli.json),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            toml::from_str::<Config>(&text).wrap_err_with(|| format!("parse {}", p.display()))?
        }
        None => Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn load_tables(
    table: Option<&Path>,
    taper: Option<&Path>,
) -> Result<(Option<ThrottleTableData>, Option<TaperData>)> {
    let table = table
        .map(enrich_config::load_throttle_table_csv)
        .transpose()?;
    let taper = taper.map(enrich_config::load_taper_csv).transpose()?;
    Ok((table, taper))
}

/// Console layer on stderr (pretty or JSON), plus an optional JSON-lines file.
///
/// `RUST_LOG` wins over `--log-level`, which wins over `[logging] level`.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &Logging) -> Result<()> {
    let level = cli_level.or(logging.level.as_deref()).unwrap_or("warn");
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid log level '{level}'"))?,
    };

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
