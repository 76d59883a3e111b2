// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build, serve and package front-end assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Entry point to run: styles, images, js, copyAssets, copyCss, compress,
    /// serve, reload, monitor, dev, build, bundle or default.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Production mode: minify, no source maps. `PROD` set to anything but
    /// a falsey value (`0`, `false`, `no`, `off`, empty) also enables it.
    #[arg(long, env = "PROD", value_parser = FalseyValueParser::new())]
    pub prod: bool,

    /// Project root; every configured path is relative to it.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Path to the config file (TOML), relative to the root.
    ///
    /// A missing file is not an error; built-in defaults apply.
    #[arg(long, value_name = "PATH", default_value = "Assetpipe.toml")]
    pub config: PathBuf,

    /// Dev server port (overrides `[server].port`).
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the path table and plan, but run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
