//! Rendering of quietd events for the console and the per-command log file.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata};

use super::utils::{HEADER_TIME, LINE_TIME, log_file_path, utc_now};
use crate::commands::version::version;

/// Target of stage headers.
pub(super) const STAGE_TARGET: &str = "quietd::stage";
/// Target of actions skipped by `stage --dry-run`.
pub(super) const DRY_RUN_TARGET: &str = "quietd::dry_run";
/// Target of the resolved-inputs record.
pub(super) const RUN_TARGET: &str = "quietd::run";

/// Environment variable holding a console filter directive, e.g. `debug`.
pub const LOG_ENV: &str = "QUIETD_LOG";

/// How an event is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Run,
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(metadata: &Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (_, RUN_TARGET) => Self::Run,
            (_, STAGE_TARGET) => Self::Stage,
            (_, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Message and remaining fields of one event, in record order.
#[derive(Debug, Default)]
struct Fields {
    message: String,
    extra: Vec<(&'static str, String)>,
}

impl Fields {
    fn of(event: &Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }

    fn push(&mut self, name: &'static str, value: String) {
        if name == "message" {
            self.message = value;
        } else {
            self.extra.push((name, value));
        }
    }

    /// Message followed by `key=value` pairs.
    fn text(&self) -> String {
        self.extra
            .iter()
            .fold(self.message.clone(), |mut text, (key, value)| {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(key);
                text.push('=');
                text.push_str(value);
                text
            })
    }
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field.name(), format!("{value:?}"));
    }
}

fn file_line(kind: Kind, fields: &Fields, time: &str) -> String {
    let text = fields.text();
    match kind {
        Kind::Stage => format!("[{time}] ==> {text}"),
        Kind::Info => format!("[{time}]     {text}"),
        Kind::Run => format!("[{time}]     [run] {text}"),
        Kind::DryRun => format!("[{time}]     [dry run] {text}"),
        Kind::Error => format!("[{time}]     [error] {text}"),
        Kind::Warn => format!("[{time}]     [warn] {text}"),
        Kind::Debug => format!("[{time}]     [debug] {text}"),
    }
}

fn console_line(kind: Kind, fields: &Fields) -> String {
    let text = fields.text();
    match kind {
        Kind::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{text}\x1b[0m"),
        Kind::Error => format!("\x1b[31merror\x1b[0m {text}"),
        Kind::Warn => format!("\x1b[33mwarn\x1b[0m  {text}"),
        Kind::DryRun => format!("  \x1b[33m[dry run]\x1b[0m {text}"),
        Kind::Info => format!("  {text}"),
        Kind::Run | Kind::Debug => format!("  \x1b[2m{text}\x1b[0m"),
    }
}

/// Appends every event, plain text, to the log file of one command.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Start the log for `command`, replacing the previous run's.
    ///
    /// Returns `None` if no log directory is known or the file cannot be
    /// created.
    pub(super) fn new(command: &str) -> Option<Self> {
        Self::create(&log_file_path(command)?, command)
    }

    fn create(path: &Path, command: &str) -> Option<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        let mut file = fs::File::create(path).ok()?;
        writeln!(file, "# quietd {} {command} {}", version(), utc_now(HEADER_TIME)).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let line = file_line(
            Kind::of(event.metadata()),
            &Fields::of(event),
            &utc_now(LINE_TIME),
        );
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        writeln!(
            writer,
            "{}",
            console_line(Kind::of(event.metadata()), &Fields::of(event))
        )
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console output goes to stderr so documents printed to stdout can be
/// piped. Its level is `info`, `debug` with `verbose`, or whatever
/// `$QUIETD_LOG` says. The log file always receives `debug` and above.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Config, Overrides, SettingsFile};
    use crate::logging::Logger;
    use tracing_subscriber::layer::SubscriberExt as _;

    fn fields(message: &str, extra: &[(&'static str, &str)]) -> Fields {
        Fields {
            message: message.to_string(),
            extra: extra.iter().map(|(k, v)| (*k, (*v).to_string())).collect(),
        }
    }

    #[test]
    fn text_appends_pairs_after_message() {
        let f = fields("inputs", &[("settings", "defaults"), ("format", "Xml")]);
        assert_eq!(f.text(), "inputs settings=defaults format=Xml");
        assert_eq!(fields("", &[("a", "1")]).text(), "a=1");
    }

    #[test]
    fn file_lines_carry_no_color() {
        let f = fields("Compiling documents", &[]);
        assert_eq!(
            file_line(Kind::Stage, &f, "12:00:00"),
            "[12:00:00] ==> Compiling documents"
        );
        assert_eq!(
            file_line(Kind::DryRun, &f, "12:00:00"),
            "[12:00:00]     [dry run] Compiling documents"
        );
        assert!(!file_line(Kind::Error, &f, "t").contains('\x1b'));
    }

    #[test]
    fn console_highlights_stages_only() {
        let f = fields("2 key(s)", &[]);
        assert_eq!(console_line(Kind::Info, &f), "  2 key(s)");
        assert!(console_line(Kind::Stage, &f).starts_with("\x1b[1;34m==>"));
    }

    #[test]
    fn file_layer_records_header_and_resolved_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("stage.log");
        let layer = FileLayer::create(&path, "stage").unwrap();
        let config = Config::resolve(SettingsFile::default(), &Overrides::default()).unwrap();

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            let log = Logger::new("stage");
            log.stage("Loading settings");
            log.resolved(&config);
            log.warn("ignoring unknown toggle 'disable_siri'");
            log.debug("disable_ota = true");
        });

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines.first().unwrap().starts_with("# quietd "));
        assert!(lines.first().unwrap().contains(" stage "));
        assert!(content.contains("==> Loading settings"));
        assert!(content.contains(
            "[run] inputs settings=defaults policy=Strict format=Xml setup_skip=true"
        ));
        assert!(content.contains("[warn] ignoring unknown toggle 'disable_siri'"));
        assert!(content.contains("[debug] disable_ota = true"));
    }
}
