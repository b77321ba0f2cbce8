use console::Style;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct StderrLogger;
static STDERR_LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(
        &self,
        metadata: &Metadata<'_>,
    ) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(
        &self,
        record: &Record<'_>,
    ) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let style = match record.level() {
            Level::Error => Style::new().red().bold(),
            Level::Warn => Style::new().yellow(),
            Level::Info => Style::new().green(),
            Level::Debug => Style::new().cyan(),
            Level::Trace => Style::new().dim(),
        };
        eprintln!("{} {}", style.apply_to(format!("[{:<5}]", record.level())), record.args());
    }

    fn flush(&self) {}
}

/// Maps the number of `-v` flags to a level filter.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&STDERR_LOGGER).map(|_| log::set_max_level(level));
}
