// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    env,
    io::IsTerminal,
    sync::{Arc, Mutex, Once},
};

use bon::Builder;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Deserializer, Serialize, de};
use smart_default::SmartDefault;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
};

/// Deserializes a string value, falling back to `Default::default()` when the
/// string is empty.
///
/// Lets config files write `log_format = ""` to mean "use the default".
///
/// # Errors
/// Returns an error if the non-empty string is not a valid `T`.
pub fn empty_string_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Ok(T::default())
    } else {
        T::deserialize(de::value::StrDeserializer::new(&s)).map_err(|e: de::value::Error| {
            de::Error::custom(format!("invalid value, expect empty string, err: {e}"))
        })
    }
}

/// Default directory name for log files when file logging is enabled.
pub const DEFAULT_LOGGING_DIR: &str = "logs";

/// Fallback filter when neither `LoggingOptions::level` nor `RUST_LOG` is
/// set.
const DEFAULT_LOG_TARGETS: &str = "info";

/// Handle for changing the log filter at runtime.
///
/// Only populated after [`init_global_logging`] has run.
pub static RELOAD_HANDLE: OnceCell<tracing_subscriber::reload::Handle<filter::Targets, Registry>> =
    OnceCell::new();

/// Configuration options for the logging system.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault, Builder)]
#[serde(default)]
#[builder(on(String, into))]
pub struct LoggingOptions {
    /// Directory for rolling log files. Empty disables file logging.
    #[default = ""]
    #[builder(default)]
    pub dir: String,

    /// Filter string such as `"info"` or `"debug,playdeck_player=trace"`.
    ///
    /// Falls back to `RUST_LOG`, then to `"info"`.
    pub level: Option<String>,

    /// Output format for log lines.
    #[serde(default, deserialize_with = "empty_string_as_default")]
    #[builder(default)]
    pub log_format: LogFormat,

    /// Number of rotated files kept per log stream (hourly rotation).
    #[default = 720]
    #[builder(default = 720)]
    pub max_log_files: usize,

    /// Whether to also write to stdout when file logging is enabled.
    #[default = true]
    #[builder(default = true)]
    pub append_stdout: bool,
}

/// Available log output formats.
#[derive(
    Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, Default, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per line, with the current span and span list.
    Json,
    /// Human-readable lines.
    #[default]
    Text,
}

/// Stdout-only logging with default options.
///
/// Keep the returned guards alive for as long as logs should be flushed.
#[must_use]
pub fn init_tracing_subscriber(app_name: &str) -> Vec<WorkerGuard> {
    init_global_logging(app_name, &LoggingOptions::default())
}

/// Logging for unit and integration tests.
///
/// Safe to call from every test; only the first call installs the subscriber.
/// Reads `UNITTEST_LOG_DIR` (default `/tmp/__unittest_logs`) and
/// `UNITTEST_LOG_LEVEL` (default `debug`).
pub fn init_default_ut_logging() {
    static START: Once = Once::new();

    START.call_once(|| {
        let Ok(mut g) = GLOBAL_UT_LOG_GUARD.as_ref().lock() else {
            return;
        };

        let dir =
            env::var("UNITTEST_LOG_DIR").unwrap_or_else(|_| "/tmp/__unittest_logs".to_string());
        let level = env::var("UNITTEST_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());

        let opts = LoggingOptions {
            dir: dir.clone(),
            level: Some(level),
            append_stdout: false,
            ..Default::default()
        };
        *g = Some(init_global_logging("unittest", &opts));

        tracing::info!("logs dir = {}", dir);
    });
}

static GLOBAL_UT_LOG_GUARD: Lazy<Arc<Mutex<Option<Vec<WorkerGuard>>>>> =
    Lazy::new(|| Arc::new(Mutex::new(None)));

fn fmt_layer<S, W>(writer: W, format: LogFormat, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::Layer::new()
            .json()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Text => fmt::Layer::new()
            .with_writer(writer)
            .with_ansi(ansi)
            .boxed(),
    }
}

fn rolling_appender(app_name: &str, suffix: &str, opts: &LoggingOptions) -> RollingFileAppender {
    RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix(format!("{app_name}{suffix}"))
        .max_log_files(opts.max_log_files)
        .build(&opts.dir)
        .unwrap_or_else(|e| {
            panic!(
                "initializing rolling file appender at {} failed: {}",
                &opts.dir, e
            )
        })
}

/// Installs the global `tracing` subscriber.
///
/// Layers, depending on `opts`:
///
/// - stdout, when `append_stdout` is set or no `dir` is configured
/// - `{app_name}.*` hourly rolling files, when `dir` is set
/// - `{app_name}-err.*` files receiving `ERROR` events only, when `dir` is set
///
/// Runs once per process; later calls return no guards.
///
/// # Panics
///
/// Panics when the log directory cannot be created or the level string does
/// not parse. Observability misconfiguration should surface at startup.
pub fn init_global_logging(app_name: &str, opts: &LoggingOptions) -> Vec<WorkerGuard> {
    static START: Once = Once::new();
    let mut guards = vec![];

    START.call_once(|| {
        // Another logger may already be installed by the host.
        let _ = LogTracer::init();

        let stdout_layer = if opts.append_stdout || opts.dir.is_empty() {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            guards.push(guard);
            Some(fmt_layer(
                writer,
                opts.log_format,
                std::io::stdout().is_terminal(),
            ))
        } else {
            None
        };

        let (file_layer, err_file_layer) = if opts.dir.is_empty() {
            (None, None)
        } else {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling_appender(app_name, "", opts));
            guards.push(guard);
            let file_layer = fmt_layer(writer, opts.log_format, false);

            let (writer, guard) =
                tracing_appender::non_blocking(rolling_appender(app_name, "-err", opts));
            guards.push(guard);
            let err_layer =
                fmt_layer(writer, opts.log_format, false).with_filter(filter::LevelFilter::ERROR);

            (Some(file_layer), Some(err_layer))
        };

        let filter = opts
            .level
            .as_deref()
            .or(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
            .unwrap_or(DEFAULT_LOG_TARGETS)
            .parse::<filter::Targets>()
            .expect("error parsing log level string");

        let (dyn_filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
        let _ = RELOAD_HANDLE.set(reload_handle);

        let subscriber = Registry::default()
            .with(dyn_filter)
            .with(stdout_layer)
            .with(file_layer)
            .with(err_file_layer);

        tracing::subscriber::set_global_default(subscriber)
            .expect("error setting global tracing subscriber");
    });

    guards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_format_falls_back_to_text() {
        let opts: LoggingOptions =
            serde_json::from_str(r#"{"dir": "/tmp/x", "log_format": ""}"#).unwrap();
        assert_eq!(opts.log_format, LogFormat::Text);
        assert_eq!(opts.dir, "/tmp/x");
        assert_eq!(opts.max_log_files, 720);
        assert!(opts.append_stdout);
    }

    #[test]
    fn json_log_format_parses() {
        let opts: LoggingOptions = serde_json::from_str(r#"{"log_format": "json"}"#).unwrap();
        assert_eq!(opts.log_format, LogFormat::Json);
        assert!(opts.level.is_none());
    }

    #[test]
    fn builder_matches_default() {
        let built = LoggingOptions::builder().build();
        assert_eq!(built, LoggingOptions::default());

        let custom = LoggingOptions::builder()
            .dir("logs")
            .level("debug".to_string())
            .append_stdout(false)
            .build();
        assert_eq!(custom.dir, DEFAULT_LOGGING_DIR);
        assert_eq!(custom.level.as_deref(), Some("debug"));
        assert!(!custom.append_stdout);
    }
}
