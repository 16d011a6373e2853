mod cli;
mod commands;
mod error_fmt;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::{Cli, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    if let Err(e) = real_main() {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    color_eyre::install()?;

    let text = std::fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {}", cli.config.display()))?;
    let cfg = delta_config::load_toml(&text).wrap_err("parse config")?;

    init_tracing(&cli, &cfg.logging)?;
    cfg.validate().wrap_err("invalid config")?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    commands::dispatch(&cli, &cfg)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console filter precedence: `--log-level`, then `RUST_LOG`, then `logging.level`, then info.
fn console_filter(cli: &Cli, logging: &delta_config::Logging) -> eyre::Result<EnvFilter> {
    if let Some(level) = &cli.log_level {
        return EnvFilter::try_new(level).wrap_err_with(|| format!("invalid --log-level '{level}'"));
    }
    if let Ok(f) = EnvFilter::try_from_default_env() {
        return Ok(f);
    }
    let level = logging.level.as_deref().unwrap_or("info");
    EnvFilter::try_new(level).wrap_err_with(|| format!("invalid logging.level '{level}'"))
}

fn init_tracing(cli: &Cli, logging: &delta_config::Logging) -> eyre::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    // Console logs go to stderr so stdout stays parseable.
    let filter = console_filter(cli, logging)?;
    let console: BoxedLayer = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed()
    };
    layers.push(console);

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file '{file}' has no file name"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "never" => tracing_appender::rolling::never(dir, name),
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            other => eyre::bail!("logging.rotation must be never, daily or hourly, got '{other}'"),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let level = logging.level.as_deref().unwrap_or("info");
        let file_filter = EnvFilter::try_new(level)
            .wrap_err_with(|| format!("invalid logging.level '{level}'"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")
}
