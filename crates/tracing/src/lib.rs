//! Tracing setup shared by the slotscope binaries.
//!
//! A [`SlotscopeTracer`] collects the layers to install (stdout, journald and an optional
//! rolling log file) and installs them on the global [`tracing_subscriber::Registry`] in one
//! call to [`Tracer::init`].
//!
//! ```no_run
//! use slotscope_tracing::{LayerInfo, LogFormat, SlotscopeTracer, Tracer};
//!
//! let stdout = LayerInfo::new(LogFormat::Terminal, "info".to_string(), "".to_string(), None);
//! let _guard = SlotscopeTracer::new().with_stdout(stdout).init().expect("tracing");
//! ```

mod formatter;
mod layers;

pub use formatter::LogFormat;
pub use layers::{FileInfo, FileWorkerGuard, Layers};
pub use tracing_subscriber;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a set of layers as the global subscriber.
pub trait Tracer {
    /// Initialize the global subscriber. The returned guard must be held for as long as logs
    /// should be flushed to the log file, if one was configured.
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>>;
}

/// The layers slotscope logs to.
#[derive(Debug, Clone)]
pub struct SlotscopeTracer {
    stdout: LayerInfo,
    journald: Option<String>,
    file: Option<(LayerInfo, FileInfo)>,
}

impl SlotscopeTracer {
    /// A tracer writing terminal formatted logs to stdout, with no journald or file output.
    pub fn new() -> Self {
        Self { stdout: LayerInfo::default(), journald: None, file: None }
    }

    /// Replace the stdout layer configuration.
    pub fn with_stdout(mut self, config: LayerInfo) -> Self {
        self.stdout = config;
        self
    }

    /// Also write logs matching `filter` to journald.
    pub fn with_journald(mut self, filter: String) -> Self {
        self.journald = Some(filter);
        self
    }

    /// Also write logs to a rolling file.
    pub fn with_file(mut self, config: LayerInfo, info: FileInfo) -> Self {
        self.file = Some((config, info));
        self
    }
}

impl Default for SlotscopeTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for SlotscopeTracer {
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>> {
        let mut layers = Layers::new();

        layers.stdout(
            self.stdout.format,
            self.stdout.default_directive.parse()?,
            &self.stdout.filters,
            self.stdout.color,
        )?;

        if let Some(filter) = self.journald {
            layers.journald(&filter)?;
        }

        let file_guard = match self.file {
            Some((config, info)) => Some(layers.file(config.format, &config.filters, info)?),
            None => None,
        };

        // a subscriber may already be installed, e.g. by a test harness
        let _ = tracing_subscriber::registry().with(layers.into_inner()).try_init();

        Ok(file_guard)
    }
}

/// Configuration of a single output layer.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    format: LogFormat,
    default_directive: String,
    filters: String,
    color: Option<String>,
}

impl LayerInfo {
    /// Create a layer configuration.
    ///
    /// `default_directive` applies when `RUST_LOG` is unset, `filters` is a comma separated list
    /// of extra directives and `color` is one of `always`, `auto` or `never`.
    pub fn new(
        format: LogFormat,
        default_directive: String,
        filters: String,
        color: Option<String>,
    ) -> Self {
        Self { format, default_directive, filters, color }
    }
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            default_directive: "info".to_string(),
            filters: "".to_string(),
            color: Some("always".to_string()),
        }
    }
}
