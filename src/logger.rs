/*!
A small stderr logger for the `log` facade.

Report lines from the listeners go to stdout untouched. Everything routed
through `log` ends up on stderr, prefixed with a local timestamp and the
level, so the two streams can be separated with a shell redirect.
*/

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

#[derive(Debug)]
pub struct Logger(());

const LOGGER: &Logger = &Logger(());

/// Install the stderr logger as the global logger at `level`.
///
/// Calling this twice keeps the first logger and only updates the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(LOGGER);
    log::set_max_level(level);
}

fn format_record(record: &Record<'_>) -> String {
    let stamp = Local::now().format("%H:%M:%S%.3f");
    match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!(
            "{} {}|{}|{}:{}: {}",
            stamp,
            record.level(),
            record.target(),
            file,
            line,
            record.args()
        ),
        (Some(file), None) => format!(
            "{} {}|{}|{}: {}",
            stamp,
            record.level(),
            record.target(),
            file,
            record.args()
        ),
        _ => format!(
            "{} {}|{}: {}",
            stamp,
            record.level(),
            record.target(),
            record.args()
        ),
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", format_record(record));
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn includes_location_when_known() {
        let line = format_record(
            &Record::builder()
                .level(Level::Warn)
                .target("primecast::coordinator")
                .file(Some("src/coordinator/logic.rs"))
                .line(Some(42))
                .args(format_args!("listener {} gone", 3))
                .build(),
        );

        assert!(
            line.ends_with(
                " WARN|primecast::coordinator|src/coordinator/logic.rs:42: listener 3 gone"
            ),
            "{line}"
        );
    }

    #[test]
    fn falls_back_to_target_only() {
        let line = format_record(
            &Record::builder()
                .level(Level::Info)
                .target("primecast")
                .args(format_args!("ready"))
                .build(),
        );

        assert!(line.ends_with(" INFO|primecast: ready"), "{line}");
    }
}
