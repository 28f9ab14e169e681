//! `conference` command-line entry point.
//!
//! # Responsibility
//! - Resolve server configuration from file, environment and flags.
//! - Offer an offline shape check for JSON documents.

mod args;

use anyhow::{anyhow, Context, Result};
use args::{Cli, Command, ServeArgs};
use clap::Parser;
use conference_core::{check_conference_shape, core_version, default_log_level, init_logging, ping};
use conference_server::ServerConfig;
use log::info;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            let config = resolve_config(&args)?;
            let level = config
                .log_level
                .clone()
                .unwrap_or_else(|| default_log_level().to_string());
            init_logging(&level, config.log_dir.as_deref()).map_err(|err| anyhow!(err))?;
            info!(
                "event=cli_serve module=cli status=start version={} level={level}",
                core_version()
            );

            conference_server::serve(config)
                .await
                .context("conference server failed")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::CheckShape { input } => {
            let raw = read_input(&input)?;
            let report = shape_report(&raw)?;
            for line in &report.lines {
                println!("{line}");
            }
            Ok(if report.conforms {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Version => {
            println!("conference_core ping={}", ping());
            println!("conference_core version={}", core_version());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_config(args: &ServeArgs) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config `{}`", path.display()))?,
        None => ServerConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_address = bind.to_string();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    if let Some(name) = &args.application_name {
        config.application_name = name.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.clone());
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config.cors_permissive |= args.cors_permissive;

    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading `{}`", input.display()))
}

#[derive(Debug, PartialEq, Eq)]
struct ShapeReport {
    conforms: bool,
    lines: Vec<String>,
}

/// Checks one object, or every element of an array, against the shape.
fn shape_report(raw: &str) -> Result<ShapeReport> {
    let value: Value = serde_json::from_str(raw).context("input is not valid JSON")?;

    let mut lines = Vec::new();
    match &value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if let Err(err) = check_conference_shape(item) {
                    lines.push(format!("[{index}] {err}"));
                }
            }
        }
        single => {
            if let Err(err) = check_conference_shape(single) {
                lines.push(err.to_string());
            }
        }
    }

    let conforms = lines.is_empty();
    if conforms {
        lines.push("conforms".to_string());
    }
    Ok(ShapeReport { conforms, lines })
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, shape_report};
    use crate::args::ServeArgs;
    use std::path::PathBuf;

    #[test]
    fn shape_report_accepts_conforming_object() {
        let report = shape_report(r#"{ "id": 1, "name": "DevCon", "date": "2024-05-01" }"#).unwrap();
        assert!(report.conforms);
        assert_eq!(report.lines, vec!["conforms".to_string()]);
    }

    #[test]
    fn shape_report_indexes_array_violations() {
        let report = shape_report(r#"[{ "name": "DevCon" }, { "id": "1" }]"#).unwrap();
        assert!(!report.conforms);
        assert_eq!(report.lines.len(), 1);
        assert!(report.lines[0].starts_with("[1] "));
        assert!(report.lines[0].contains("field `id` expected integer, found string"));
    }

    #[test]
    fn shape_report_rejects_invalid_json() {
        assert!(shape_report("{").is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conference.toml");
        std::fs::write(&path, "port = 9000\napplication_name = \"fromfile\"\n").unwrap();

        let args = ServeArgs {
            config: Some(path),
            port: Some(9100),
            database: Some(PathBuf::from("/tmp/override.sqlite3")),
            ..ServeArgs::default()
        };
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.application_name, "fromfile");
        assert_eq!(config.database_path, PathBuf::from("/tmp/override.sqlite3"));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = ServeArgs {
            application_name: Some("has space".to_string()),
            ..ServeArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }
}
