use chrono::prelude::*;
use env_logger::{Builder, Env};
use std::fmt::Display;
use std::io::Write;

pub fn default_filter(verbosity: u64) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn format_message<Tz: TimeZone>(time: &DateTime<Tz>, message: &dyn Display) -> String
where
    Tz::Offset: Display,
{
    format!("[{}]: {}", time.format("%F %T"), message)
}

/// Installs the global logger. `RUST_LOG` takes precedence over `verbosity`.
pub fn init(verbosity: u64) {
    Builder::from_env(Env::default().default_filter_or(default_filter(verbosity)))
        .format(|buf, record| writeln!(buf, "{}", format_message(&Local::now(), record.args())))
        .init();
}
