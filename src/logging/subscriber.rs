//! Console formatting and the persistent run log.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing::field::{Field, Visit};

use super::utils::{CLOCK, STAMP, local_now, log_file_path, strip_ansi};

/// Target for section headers.
pub(super) const STAGE_TARGET: &str = "caskbatch::stage";
/// Target for lines relayed verbatim from the package manager.
pub(super) const OUTPUT_TARGET: &str = "caskbatch::output";

/// What a single event is, as far as rendering goes.
enum Kind {
    Stage,
    Output,
    Plain(Level),
}

impl Kind {
    fn of(event: &tracing::Event<'_>) -> Self {
        let meta = event.metadata();
        match meta.target() {
            STAGE_TARGET => Self::Stage,
            OUTPUT_TARGET => Self::Output,
            _ => Self::Plain(*meta.level()),
        }
    }
}

/// The `message` field of an event.
#[derive(Default)]
struct Message(String);

impl Message {
    fn of(event: &tracing::Event<'_>) -> String {
        let mut visitor = Self::default();
        event.record(&mut visitor);
        visitor.0
    }
}

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Layer appending every event to the run log, without colour codes.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Run log for `command` in the cache directory; `None` when it cannot
    /// be created.
    pub(super) fn new(command: &str) -> Option<Self> {
        Self::at(&log_file_path(command)?, command)
    }

    /// Start a fresh run log at `path`.
    pub(super) fn at(path: &Path, command: &str) -> Option<Self> {
        let version = option_env!("CASKBATCH_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let mut file = fs::File::create(path).ok()?;
        writeln!(
            file,
            "# caskbatch {version} {command} started {}",
            local_now(STAMP)
        )
        .ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let msg = strip_ansi(&Message::of(event));
        let tag = match Kind::of(event) {
            Kind::Stage => "==>",
            Kind::Output => "   |",
            Kind::Plain(Level::ERROR) => "    error:",
            Kind::Plain(Level::WARN) => "    warn:",
            Kind::Plain(Level::INFO) => "   ",
            Kind::Plain(_) => "    debug:",
        };
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{} {tag} {msg}", local_now(CLOCK)).ok();
        }
    }
}

/// Console rendering: coloured level tags, bold stage arrows, and dimmed
/// package manager output.
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
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let msg = Message::of(event);
        match Kind::of(event) {
            Kind::Stage => writeln!(writer, "\n\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Kind::Output => writeln!(writer, "    \x1b[2m│ {msg}\x1b[0m"),
            Kind::Plain(Level::ERROR) => writeln!(writer, "\x1b[31merror:\x1b[0m {msg}"),
            Kind::Plain(Level::WARN) => writeln!(writer, "\x1b[33mwarning:\x1b[0m {msg}"),
            Kind::Plain(Level::INFO) => writeln!(writer, "  {msg}"),
            Kind::Plain(_) => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber.
///
/// Warnings and errors go to stderr and the rest to stdout; debug lines
/// only with `verbose`. The run log at
/// `$XDG_CACHE_HOME/caskbatch/<command>.log` gets everything. Call once,
/// before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        });
    let run_log = FileLayer::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(run_log)
        .init();
}
