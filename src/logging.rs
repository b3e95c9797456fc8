use std::{env, fmt::Display};

use colored::{Color, Colorize};
use log::{Level, LevelFilter};

/// Sets how much encore's own crates log, e.g. `ENCORE_LOG=debug`.
pub const LOG_VAR: &str = "ENCORE_LOG";

/// Colors used for highlights outside of log records
pub struct LogColor;

impl LogColor {
    pub const RED: Color = Color::Red;
    pub const DIMMED: Color = Color::BrightBlack;
}

/// Logs to stderr, leaving stdout to the console's cards and notices.
pub fn init_logger() -> Result<(), log::SetLoggerError> {
    let local_level = env::var(LOG_VAR)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Info);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let target = Target::from_str(record.target());
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                level_to_string(&record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target,
                message
            ))
        })
        .filter(move |meta| {
            let target = Target::from_str(meta.target());

            // Other crates only get to report problems
            if target.is_local() {
                meta.level() <= local_level
            } else {
                meta.level() <= Level::Warn
            }
        })
        .chain(std::io::stderr())
        .apply()
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

/// Where a record came from, narrowed down to the part of the engine that logged it.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    External(String),
    Console,
    Sessions,
    Render,
    Collab,
    Core,
}

impl Target {
    fn from_str(path: &str) -> Self {
        let mut modules = path.split("::");
        let krate = modules.next().unwrap_or_default();
        let module = modules.next().unwrap_or_default();

        match (krate, module) {
            ("encore_core", _) => Self::Core,
            ("encore_collab", "sessions" | "watchdog" | "search") => Self::Sessions,
            ("encore_collab", "render") => Self::Render,
            ("encore_collab", _) => Self::Collab,
            ("encore", _) => Self::Console,
            (other, _) => Self::External(other.to_string()),
        }
    }

    fn is_local(&self) -> bool {
        !matches!(self, Self::External(_))
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            Target::External(x) => x.as_str().clear(),
            Target::Console => "CONSOLE".bright_green(),
            Target::Sessions => "SESSION".bright_purple(),
            Target::Render => "RENDER".magenta(),
            Target::Collab => "COLLAB".purple(),
            Target::Core => "CORE".blue(),
        };

        Display::fmt(&result, f)
    }
}

fn level_to_string(level: &Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}

#[cfg(test)]
mod test {
    use log::LevelFilter;

    use super::{parse_level, Target};

    #[test]
    fn targets_are_tagged_by_module() {
        assert_eq!(Target::from_str("encore_collab::sessions::session"), Target::Sessions);
        assert_eq!(Target::from_str("encore_collab::watchdog"), Target::Sessions);
        assert_eq!(Target::from_str("encore_collab::render"), Target::Render);
        assert_eq!(Target::from_str("encore_collab"), Target::Collab);
        assert_eq!(Target::from_str("encore_core::queue"), Target::Core);
        assert_eq!(Target::from_str("encore::console"), Target::Console);
        assert!(!Target::from_str("tokio::runtime").is_local());
    }

    #[test]
    fn levels_are_read_loosely() {
        assert_eq!(parse_level(" Debug "), Some(LevelFilter::Debug));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
