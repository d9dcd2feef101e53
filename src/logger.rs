use std::fs;
use std::path::Path;

use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "scenario_builder.log";
const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Installs the `scenario_builder` logger. Call it once, from `main`.
///
/// stdout carries the generated JSON, so records go to stderr and, when the
/// directory is writable, to `logs/scenario_builder.log`. `RUST_LOG` picks the
/// level (`info` if unset or unparsable), e.g.
/// `RUST_LOG=debug scenario_builder network-delay client 10.0.0.2`.
pub fn init() {
    let level = level_from_env(std::env::var("RUST_LOG").ok().as_deref());
    let mut dispatch = Dispatch::new().level(level).level_for("serde", LevelFilter::Warn).level_for("uuid", LevelFilter::Warn).chain(console_dispatch());

    let file_path = Path::new(LOG_DIR).join(LOG_FILE);
    match file_dispatch(&file_path) {
        Ok(file) => dispatch = dispatch.chain(file),
        Err(e) => eprintln!("Logging to stderr only, '{}' is not writable: {}", file_path.display(), e),
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("A logger is already installed: {}", e);
        return;
    }
    log::debug!("Logger ready at level {}.", level);
}

fn level_from_env(value: Option<&str>) -> LevelFilter {
    value.and_then(|v| v.parse().ok()).unwrap_or(LevelFilter::Info)
}

fn console_dispatch() -> Dispatch {
    let colors = ColoredLevelConfig::new().error(Color::Red).warn(Color::Yellow).info(Color::Green).debug(Color::Blue).trace(Color::BrightBlack);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("[{} {} {}] {}", Local::now().format(TIMESTAMP), colors.color(record.level()), record.target(), message))
        })
        .chain(std::io::stderr())
}

fn file_dispatch(path: &Path) -> std::io::Result<Dispatch> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fern::log_file(path)?;

    Ok(Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{} {} {}] {}", Local::now().format(TIMESTAMP), record.level(), record.target(), message)))
        .chain(file))
}
