//! The stateful logger: threshold filtering, line composition, routing and
//! block indentation.
//!
//! Every public operation funnels through [`Logger::write`]:
//!
//! 1. Drop the record when its severity ranks below the threshold.
//! 2. Apply a negative indent delta before composing the line.
//! 3. Compose `prefix| <indent><label>payloads`.
//! 4. Route to the console: `info`/`log`/`debug` to the normal channel,
//!    `error`/`warn` to the alert channel, `trace` to the alert channel with a
//!    stack trace.
//! 5. Apply a positive indent delta after the line is written.
//!
//! Indent deltas are applied even when the record is filtered, so block
//! nesting stays balanced regardless of the threshold.

use crate::file::FileSink;
use crate::format::{
    apply_indent, compose_label, compose_prefix_line, defers_to_native, format_channel_tag,
    format_timestamp, join_payloads,
};
use crate::sink::{Console, OutStream};
use crate::style::style_wrap;
use crate::{level, Channel, Error, LoggerConfig, Payload, Payloads, Result, Severity};
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Indentation added by `enter_block` and removed by `exit_block`
pub const BLOCK_INDENT: isize = 2;

const BLOCK_START: &str = "--- Start ---";
const BLOCK_COMPLETE: &str = "--- Complete ---";

/// Per-call options for [`Logger::write`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions<'a> {
    pub channel: Severity,
    pub label: Option<&'a str>,
    pub indent_delta: isize,
}

impl<'a> WriteOptions<'a> {
    pub fn new(channel: Severity) -> Self {
        Self {
            channel,
            label: None,
            indent_delta: 0,
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn indent_delta(mut self, delta: isize) -> Self {
        self.indent_delta = delta;
        self
    }
}

macro_rules! severity_methods {
    ($($name:ident => $severity:expr),* $(,)?) => {
        $(
            #[doc = concat!("Log on the `", stringify!($name), "` channel; `Ok(false)` when filtered.")]
            pub fn $name(&mut self, values: impl Into<Payloads>) -> Result<bool> {
                self.write(WriteOptions::new($severity), values)
            }
        )*
    };
}

/// Leveled, block-indenting logger over a two-channel console
pub struct Logger {
    config: LoggerConfig,
    indent: isize,
    console: Console,
}

impl Logger {
    pub fn new(config: LoggerConfig, out: OutStream) -> Self {
        Self {
            config,
            indent: 0,
            console: Console::new(out),
        }
    }

    /// Logger writing to stdout (normal) and stderr (alert)
    pub fn stdio(config: LoggerConfig) -> Self {
        Self::new(config, OutStream::Stdio)
    }

    /// File-backed logger.
    ///
    /// One path serves both channels; two paths are normal then alert.
    /// Colorization is always disabled.
    pub fn to_files<P: AsRef<Path>>(paths: &[P], config: LoggerConfig) -> Result<Self> {
        let out = match paths {
            [single] => OutStream::single(FileSink::open(single)?),
            [normal, alert] => OutStream::pair(FileSink::open(normal)?, FileSink::open(alert)?),
            _ => {
                return Err(Error::Config(format!(
                    "expected one or two log file paths, got {}",
                    paths.len()
                )))
            }
        };
        let config = LoggerConfig {
            colored: false,
            ..config
        };
        Ok(Self::new(config, out))
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn threshold(&self) -> Severity {
        self.config.level
    }

    /// Current indentation cursor; negative after unmatched block exits
    pub fn indent(&self) -> isize {
        self.indent
    }

    pub fn is_enabled(&self, severity: Severity) -> bool {
        severity.passes(self.config.level)
    }

    fn indent_width(&self) -> usize {
        usize::try_from(self.indent).unwrap_or(0)
    }

    /// Build the full text of one record at the current indentation
    pub fn compose_line(
        &self,
        channel: Severity,
        label: Option<&str>,
        payloads: &Payloads,
        now: &DateTime<Local>,
    ) -> String {
        let time = format_timestamp(now, self.config.show_time, self.config.short_time);
        let tag = format_channel_tag(channel, self.config.show_channel);
        let prefix = compose_prefix_line(tag, &time, &self.config.prefix);

        let body = format!("{}{}", compose_label(label), join_payloads(channel, payloads));
        format!(
            "{} {}",
            style_wrap(channel, &prefix, self.config.colored),
            apply_indent(&body, self.indent_width())
        )
    }

    /// Filter, compose and route one record.
    ///
    /// On `error` and `trace`, non-text payloads are left out of the composed
    /// line and appended after it in the console's native rendering, so they
    /// follow all text payloads regardless of argument order.
    pub fn write(&mut self, options: WriteOptions<'_>, values: impl Into<Payloads>) -> Result<bool> {
        let WriteOptions {
            channel,
            label,
            indent_delta,
        } = options;

        if !self.is_enabled(channel) {
            self.indent += indent_delta;
            return Ok(false);
        }

        if indent_delta < 0 {
            self.indent += indent_delta;
        }

        let payloads = values.into();
        let line = self.compose_line(channel, label, &payloads, &Local::now());
        let raw: Vec<&Payload> = if defers_to_native(channel) {
            payloads.iter().filter(|payload| !payload.is_text()).collect()
        } else {
            Vec::new()
        };

        let written = match (channel, channel.channel()) {
            (Severity::Trace, _) => self.console.trace(&line, &raw),
            (_, Channel::Alert) => self.console.error(&line, &raw),
            (_, Channel::Normal) => self.console.log(&line),
        };

        // Applied whether or not the sink accepted the line
        if indent_delta > 0 {
            self.indent += indent_delta;
        }
        written?;
        Ok(true)
    }

    severity_methods! {
        error => Severity::Error,
        warn => Severity::Warn,
        info => Severity::Info,
        log => Severity::Log,
        debug => Severity::Debug,
        trace => Severity::Trace,
    }

    /// Open a block on `info`; lines logged until the matching exit are
    /// indented by [`BLOCK_INDENT`]
    pub fn enter_block(&mut self, label: &str) -> Result<bool> {
        self.enter_block_at(label, Severity::Info)
    }

    pub fn enter_block_at(&mut self, label: &str, severity: Severity) -> Result<bool> {
        let options = WriteOptions::new(severity)
            .label(label)
            .indent_delta(BLOCK_INDENT);
        self.write(options, BLOCK_START)
    }

    /// Close a block on `info`; the indent is removed before the line is
    /// written so it aligns with its `Start` line
    pub fn exit_block(&mut self, label: &str) -> Result<bool> {
        self.exit_block_at(label, Severity::Info)
    }

    pub fn exit_block_at(&mut self, label: &str, severity: Severity) -> Result<bool> {
        let options = WriteOptions::new(severity)
            .label(label)
            .indent_delta(-BLOCK_INDENT);
        self.write(options, BLOCK_COMPLETE)
    }

    /// Swap the threshold by name, returning the previous one.
    ///
    /// An unknown name leaves the threshold untouched.
    pub fn change_log_level(&mut self, name: &str) -> Result<Severity> {
        let severity = level::validate(name)?;
        Ok(self.set_level(severity))
    }

    pub fn set_level(&mut self, severity: Severity) -> Severity {
        let previous = std::mem::replace(&mut self.config.level, severity);
        tracing::debug!("Log level changed from {} to {}", previous, severity);
        previous
    }

    /// Start a console group on `info`
    pub fn group(&mut self, label: &str) -> Result<bool> {
        self.group_at(label, Severity::Info)
    }

    pub fn group_at(&mut self, label: &str, severity: Severity) -> Result<bool> {
        if !self.is_enabled(severity) {
            return Ok(false);
        }
        self.console.group(label)?;
        Ok(true)
    }

    pub fn group_end(&mut self) -> bool {
        self.group_end_at(Severity::Info)
    }

    pub fn group_end_at(&mut self, severity: Severity) -> bool {
        if !self.is_enabled(severity) {
            return false;
        }
        self.console.group_end();
        true
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdio(LoggerConfig::default())
    }
}

/// A logger that can be shared between threads.
///
/// Each call holds the lock for the whole write, so indentation changes and
/// the line that reads them are never interleaved with another caller.
/// Use [`SharedLogger::lock`] to keep a sequence of calls together.
#[derive(Clone)]
pub struct SharedLogger {
    inner: Arc<Mutex<Logger>>,
}

macro_rules! shared_severity_methods {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self, values: impl Into<Payloads>) -> Result<bool> {
                self.lock().$name(values)
            }
        )*
    };
}

impl SharedLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(logger)),
        }
    }

    /// Exclusive access; a lock poisoned by a panicking writer is recovered
    pub fn lock(&self) -> MutexGuard<'_, Logger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self, options: WriteOptions<'_>, values: impl Into<Payloads>) -> Result<bool> {
        self.lock().write(options, values)
    }

    shared_severity_methods!(error, warn, info, log, debug, trace);

    pub fn enter_block(&self, label: &str) -> Result<bool> {
        self.lock().enter_block(label)
    }

    pub fn exit_block(&self, label: &str) -> Result<bool> {
        self.lock().exit_block(label)
    }

    pub fn enter_block_at(&self, label: &str, severity: Severity) -> Result<bool> {
        self.lock().enter_block_at(label, severity)
    }

    pub fn exit_block_at(&self, label: &str, severity: Severity) -> Result<bool> {
        self.lock().exit_block_at(label, severity)
    }

    pub fn change_log_level(&self, name: &str) -> Result<Severity> {
        self.lock().change_log_level(name)
    }

    pub fn set_level(&self, severity: Severity) -> Severity {
        self.lock().set_level(severity)
    }

    pub fn group(&self, label: &str) -> Result<bool> {
        self.lock().group(label)
    }

    pub fn group_at(&self, label: &str, severity: Severity) -> Result<bool> {
        self.lock().group_at(label, severity)
    }

    pub fn group_end(&self) -> bool {
        self.lock().group_end()
    }

    pub fn group_end_at(&self, severity: Severity) -> bool {
        self.lock().group_end_at(severity)
    }

    pub fn threshold(&self) -> Severity {
        self.lock().threshold()
    }

    pub fn indent(&self) -> isize {
        self.lock().indent()
    }
}

impl From<Logger> for SharedLogger {
    fn from(logger: Logger) -> Self {
        Self::new(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::payloads;
    use serde_json::json;
    use std::io::Write as _;

    fn plain_config() -> LoggerConfig {
        LoggerConfig {
            show_time: false,
            colored: false,
            ..LoggerConfig::default()
        }
    }

    fn split_logger(config: LoggerConfig) -> (Logger, MemorySink, MemorySink) {
        let normal = MemorySink::new();
        let alert = MemorySink::new();
        let logger = Logger::new(config, OutStream::pair(normal.clone(), alert.clone()));
        (logger, normal, alert)
    }

    fn leading_spaces(text: &str) -> usize {
        text.len() - text.trim_start_matches(' ').len()
    }

    #[test]
    fn test_default_threshold_scenario() {
        crate::logging::init_test();
        let (mut logger, normal, _alert) = split_logger(LoggerConfig::default());

        assert!(logger.info("a").unwrap());
        let lines = normal.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("IFO"));
        assert!(lines[0].ends_with(" a"));

        normal.clear();
        assert!(!logger.debug("b").unwrap());
        assert!(normal.contents().is_empty());

        assert_eq!(logger.change_log_level("trace").unwrap(), Severity::Info);
        assert!(logger.debug("b").unwrap());
        assert!(normal.contents().contains("DBG"));
    }

    #[test]
    fn test_filtering_per_threshold() {
        for threshold in Severity::ALL {
            let config = LoggerConfig {
                level: threshold,
                ..plain_config()
            };
            let sink = MemorySink::new();
            let mut logger = Logger::new(config, OutStream::single(sink.clone()));

            for channel in Severity::ALL {
                let emitted = logger.write(WriteOptions::new(channel), "x").unwrap();
                assert_eq!(emitted, channel.rank() <= threshold.rank());
            }
        }
    }

    #[test]
    fn test_change_log_level_invalid_keeps_threshold() {
        let (mut logger, _normal, _alert) = split_logger(plain_config());
        assert!(matches!(
            logger.change_log_level("verbose"),
            Err(Error::InvalidSeverity(_))
        ));
        assert_eq!(logger.threshold(), Severity::Info);
        assert!(!logger.log("still hidden").unwrap());
    }

    #[test]
    fn test_set_level_returns_previous() {
        let (mut logger, _normal, _alert) = split_logger(plain_config());
        assert_eq!(logger.set_level(Severity::Error), Severity::Info);
        assert_eq!(logger.set_level(Severity::Warn), Severity::Error);
        assert!(!logger.info("hidden").unwrap());
        assert!(logger.warn("shown").unwrap());
    }

    #[test]
    fn test_routing_to_channels() {
        let config = LoggerConfig {
            level: Severity::Debug,
            ..plain_config()
        };
        let (mut logger, normal, alert) = split_logger(config);

        logger.error("e").unwrap();
        logger.warn("w").unwrap();
        logger.info("i").unwrap();
        logger.log("l").unwrap();
        logger.debug("d").unwrap();

        assert_eq!(normal.lines(), vec!["IFO| i", "LOG| l", "DBG| d"]);
        assert_eq!(alert.lines(), vec!["ERR| e", "WRN| w"]);
    }

    #[test]
    fn test_trace_goes_to_alert_with_stack() {
        let config = LoggerConfig {
            level: Severity::Trace,
            ..plain_config()
        };
        let (mut logger, normal, alert) = split_logger(config);

        assert!(logger.trace("here").unwrap());
        assert!(normal.contents().is_empty());
        let lines = alert.lines();
        assert_eq!(lines[0], "Trace: TCE| here");
        assert!(lines.len() > 1);
    }

    #[test]
    fn test_block_scenario_indentation() {
        let (mut logger, normal, _alert) = split_logger(plain_config());

        logger.enter_block("S").unwrap();
        logger.info("x").unwrap();
        logger.exit_block("S").unwrap();

        let lines = normal.lines();
        assert_eq!(
            lines,
            vec!["IFO| <S> --- Start ---", "IFO|   x", "IFO| <S> --- Complete ---"]
        );

        let body = |line: &str| line.trim_start_matches("IFO| ").to_string();
        let start = leading_spaces(&body(&lines[0]));
        let inner = leading_spaces(&lines[1]["IFO| ".len()..]);
        let complete = leading_spaces(&body(&lines[2]));
        assert_eq!(start, complete);
        assert_eq!(inner, start + 2);
        assert_eq!(logger.indent(), 0);
    }

    #[test]
    fn test_nested_blocks_across_channels() {
        let (mut logger, normal, alert) = split_logger(plain_config());

        logger.enter_block("Story").unwrap();
        logger.info("Long long ago.").unwrap();
        logger.enter_block_at("Warnings", Severity::Warn).unwrap();
        logger.warn("boring").unwrap();
        logger.exit_block_at("Warnings", Severity::Warn).unwrap();
        logger.info("The end.").unwrap();
        logger.exit_block("Story").unwrap();

        assert_eq!(
            normal.lines(),
            vec![
                "IFO| <Story> --- Start ---",
                "IFO|   Long long ago.",
                "IFO|   The end.",
                "IFO| <Story> --- Complete ---",
            ]
        );
        assert_eq!(
            alert.lines(),
            vec![
                "WRN|   <Warnings> --- Start ---",
                "WRN|     boring",
                "WRN|   <Warnings> --- Complete ---",
            ]
        );
    }

    #[test]
    fn test_suppressed_block_pair_is_net_zero() {
        let config = LoggerConfig {
            level: Severity::Error,
            ..plain_config()
        };
        let (mut logger, normal, alert) = split_logger(config);

        assert!(!logger.enter_block("X").unwrap());
        assert_eq!(logger.indent(), BLOCK_INDENT);
        assert!(!logger.exit_block("X").unwrap());
        assert_eq!(logger.indent(), 0);

        assert!(normal.contents().is_empty());
        assert!(alert.contents().is_empty());
    }

    #[test]
    fn test_hidden_block_still_indents_visible_lines() {
        let (mut logger, _normal, alert) = split_logger(plain_config());

        logger.enter_block_at("quiet", Severity::Debug).unwrap();
        logger.error("inside").unwrap();
        logger.exit_block_at("quiet", Severity::Debug).unwrap();
        logger.error("outside").unwrap();

        assert_eq!(alert.lines(), vec!["ERR|   inside", "ERR| outside"]);
    }

    #[test]
    fn test_multiline_payload_reindented() {
        let (mut logger, normal, _alert) = split_logger(plain_config());

        logger.enter_block("M").unwrap();
        logger.enter_block("N").unwrap();
        normal.clear();
        logger.info("first\nsecond\nthird").unwrap();

        let lines = normal.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "IFO|     first");
        for line in &lines[1..] {
            assert_eq!(leading_spaces(line), 4);
        }
    }

    #[test]
    fn test_structured_debug_payload_is_inspected() {
        let config = LoggerConfig {
            level: Severity::Trace,
            ..plain_config()
        };
        let (mut logger, normal, _alert) = split_logger(config);

        let value = json!({"glossary": {"title": "example glossary", "Index": 8879}});
        logger.debug(value).unwrap();

        let lines = normal.lines();
        assert!(lines.len() > 1);
        assert_eq!(lines[0], "DBG| {");
        assert!(normal.contents().contains("\"Index\": 8879"));
    }

    #[test]
    fn test_structured_error_payload_passes_through() {
        let (mut logger, normal, alert) = split_logger(plain_config());

        let value = json!({"code": 7});
        logger.error(payloads!["failed:", value]).unwrap();

        let contents = alert.contents();
        assert!(contents.starts_with("ERR| failed: {"));
        assert!(contents.contains("\"code\": 7"));
        assert!(normal.contents().is_empty());
    }

    #[test]
    fn test_error_object_rendered_natively() {
        let (mut logger, _normal, alert) = split_logger(plain_config());

        let err = std::io::Error::new(std::io::ErrorKind::Other, "A Minor Error?");
        logger.error(Payload::error(err)).unwrap();

        assert!(alert.contents().contains("Error: A Minor Error?"));
    }

    #[test]
    fn test_label_and_prefix() {
        let config = LoggerConfig {
            prefix: "HelloWorld".into(),
            ..plain_config()
        };
        let (mut logger, normal, _alert) = split_logger(config);

        logger
            .write(WriteOptions::new(Severity::Info).label("net"), "up")
            .unwrap();
        assert_eq!(normal.lines(), vec!["IFO HelloWorld| <net> up"]);
    }

    #[test]
    fn test_no_channel_no_time() {
        let config = LoggerConfig {
            show_channel: false,
            ..plain_config()
        };
        let (mut logger, normal, _alert) = split_logger(config);
        logger.info("bare").unwrap();
        assert_eq!(normal.lines(), vec!["| bare"]);
    }

    #[test]
    fn test_short_time_prefix() {
        let config = LoggerConfig {
            show_time: true,
            short_time: true,
            prefix: "app".into(),
            colored: false,
            ..LoggerConfig::default()
        };
        let (mut logger, normal, _alert) = split_logger(config);
        logger.info("tick").unwrap();

        let line = normal.lines().remove(0);
        let parts: Vec<&str> = line.split(' ').collect();
        assert_eq!(parts[0], "IFO");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(&parts[1][2..3], ":");
        assert_eq!(&parts[1][5..6], ":");
        assert_eq!(parts[2], "app|");
        assert_eq!(parts[3], "tick");
    }

    #[test]
    fn test_compose_line_with_fixed_clock() {
        use chrono::TimeZone;

        let config = LoggerConfig {
            colored: false,
            ..LoggerConfig::default()
        };
        let (logger, _normal, _alert) = split_logger(config);
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let line = logger.compose_line(Severity::Warn, None, &"careful".into(), &now);
        assert_eq!(line, "WRN 2024-03-09 14:05:07| careful");
    }

    #[test]
    fn test_colored_prefix() {
        let config = LoggerConfig {
            show_time: false,
            ..LoggerConfig::default()
        };
        colored::control::set_override(true);
        let (mut logger, normal, _alert) = split_logger(config);
        logger.info("green").unwrap();
        assert_eq!(normal.contents(), "\x1b[32mIFO|\x1b[0m green\n");
    }

    #[test]
    fn test_custom_indent_delta() {
        let (mut logger, normal, _alert) = split_logger(plain_config());

        logger
            .write(WriteOptions::new(Severity::Info).indent_delta(4), "open")
            .unwrap();
        logger.info("deep").unwrap();
        logger
            .write(WriteOptions::new(Severity::Info).indent_delta(-4), "close")
            .unwrap();

        assert_eq!(normal.lines(), vec!["IFO| open", "IFO|     deep", "IFO| close"]);
    }

    #[test]
    fn test_unmatched_exit_underflows() {
        let (mut logger, normal, _alert) = split_logger(plain_config());

        logger.exit_block("orphan").unwrap();
        assert_eq!(logger.indent(), -BLOCK_INDENT);
        logger.info("flush left").unwrap();

        assert_eq!(
            normal.lines(),
            vec!["IFO| <orphan> --- Complete ---", "IFO| flush left"]
        );
    }

    #[test]
    fn test_group_gated_by_threshold() {
        let (mut logger, normal, _alert) = split_logger(plain_config());

        assert!(!logger.group_at("hidden", Severity::Debug).unwrap());
        assert!(logger.group("Section").unwrap());
        logger.info("inside").unwrap();
        assert!(logger.group_end());
        assert!(!logger.group_end_at(Severity::Trace));
        logger.info("outside").unwrap();

        assert_eq!(
            normal.lines(),
            vec!["Section", "  IFO| inside", "IFO| outside"]
        );
    }

    #[test]
    fn test_file_logger_single_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs").join("app.log");

        let mut logger = Logger::to_files(&[&path], LoggerConfig::default()).unwrap();
        assert!(!logger.config().colored);
        logger.info("to file").unwrap();
        logger.warn("also to file").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains('\x1b'));
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("IFO "));
        assert!(lines[0].ends_with("| to file"));
        assert!(lines[1].starts_with("WRN "));
    }

    #[test]
    fn test_file_logger_pair() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out_path = temp_dir.path().join("out.log");
        let err_path = temp_dir.path().join("err.log");

        let mut logger =
            Logger::to_files(&[&out_path, &err_path], plain_config()).unwrap();
        logger.info("normal").unwrap();
        logger.error("alert").unwrap();

        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "IFO| normal\n");
        assert_eq!(std::fs::read_to_string(&err_path).unwrap(), "ERR| alert\n");
    }

    #[test]
    fn test_file_logger_rejects_path_count() {
        let none: [&str; 0] = [];
        assert!(matches!(
            Logger::to_files(&none, LoggerConfig::default()),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Logger::to_files(&["a", "b", "c"], LoggerConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_shared_logger_across_threads() {
        let sink = MemorySink::new();
        let shared = SharedLogger::new(Logger::new(plain_config(), OutStream::single(sink.clone())));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let logger = shared.clone();
                std::thread::spawn(move || {
                    let label = format!("worker{}", i);
                    let mut guard = logger.lock();
                    guard.enter_block(&label).unwrap();
                    guard.info("working").unwrap();
                    guard.exit_block(&label).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 12);
        for chunk in lines.chunks(3) {
            assert!(chunk[0].ends_with("--- Start ---"));
            assert_eq!(chunk[1], "IFO|   working");
            assert!(chunk[2].ends_with("--- Complete ---"));
        }
        assert_eq!(shared.lock().indent(), 0);
        assert_eq!(shared.change_log_level("debug").unwrap(), Severity::Info);
        assert!(shared.debug("visible").unwrap());
    }

    /// Writer that fails while `broken` is set
    #[derive(Clone, Default)]
    struct FailingSink {
        broken: Arc<Mutex<bool>>,
        inner: MemorySink,
    }

    impl FailingSink {
        fn set_broken(&self, broken: bool) {
            *self.broken.lock().unwrap() = broken;
        }
    }

    impl std::io::Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if *self.broken.lock().unwrap() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "sink closed",
                ));
            }
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_propagates_and_keeps_blocks_balanced() {
        let sink = FailingSink::default();
        let mut logger = Logger::new(plain_config(), OutStream::single(sink.clone()));

        sink.set_broken(true);
        assert!(matches!(logger.enter_block("S"), Err(Error::Io(_))));
        assert_eq!(logger.indent(), BLOCK_INDENT);

        sink.set_broken(false);
        logger.info("x").unwrap();
        assert!(logger.exit_block("S").unwrap());
        assert_eq!(logger.indent(), 0);

        assert_eq!(
            sink.inner.lines(),
            vec!["IFO|   x", "IFO| <S> --- Complete ---"]
        );
    }

    #[test]
    fn test_failed_exit_still_dedents() {
        let sink = FailingSink::default();
        let mut logger = Logger::new(plain_config(), OutStream::single(sink.clone()));

        logger.enter_block("S").unwrap();
        sink.set_broken(true);
        assert!(matches!(logger.exit_block("S"), Err(Error::Io(_))));
        assert_eq!(logger.indent(), 0);
    }

    #[test]
    fn test_error_structured_payload_follows_text() {
        let (mut logger, _normal, alert) = split_logger(plain_config());

        logger.error(payloads!["a", json!(1), "b"]).unwrap();
        assert_eq!(alert.lines(), vec!["ERR| a b 1"]);
    }

    #[test]
    fn test_shared_logger_forwards_block_and_group_calls() {
        let sink = MemorySink::new();
        let shared = SharedLogger::from(Logger::new(plain_config(), OutStream::single(sink.clone())));

        assert_eq!(shared.set_level(Severity::Log), Severity::Info);
        assert_eq!(shared.threshold(), Severity::Log);
        assert!(shared.enter_block_at("W", Severity::Warn).unwrap());
        assert_eq!(shared.indent(), BLOCK_INDENT);
        assert!(!shared.group_at("hidden", Severity::Debug).unwrap());
        assert!(shared.group("G").unwrap());
        shared.log("inside").unwrap();
        assert!(shared.group_end());
        assert!(!shared.group_end_at(Severity::Trace));
        assert!(shared.exit_block_at("W", Severity::Warn).unwrap());
        assert_eq!(shared.indent(), 0);

        assert_eq!(
            sink.lines(),
            vec![
                "WRN| <W> --- Start ---",
                "G",
                "  LOG|   inside",
                "WRN| <W> --- Complete ---",
            ]
        );
    }
}
