use crate::formatter::LogFormat;
use rolling_file::{RollingConditionBasic, RollingFileAppender};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Directive, EnvFilter, Layer, Registry};

/// Flushes buffered log lines to the log file when dropped.
pub type FileWorkerGuard = WorkerGuard;

pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Noisy dependencies that are capped regardless of the requested verbosity.
const DEFAULT_ENV_FILTER_DIRECTIVES: [&str; 4] =
    ["hyper=off", "hyper_util=off", "h2=off", "reqwest=warn"];

/// An ordered collection of boxed layers, installed together on a [`Registry`].
#[derive(Default)]
pub struct Layers {
    inner: Vec<BoxedLayer<Registry>>,
}

impl std::fmt::Debug for Layers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layers").field("len", &self.inner.len()).finish()
    }
}

impl Layers {
    /// An empty set of layers.
    pub fn new() -> Self {
        Self { inner: vec![] }
    }

    pub(crate) fn into_inner(self) -> Vec<BoxedLayer<Registry>> {
        self.inner
    }

    /// Add a journald layer.
    pub fn journald(&mut self, filter: &str) -> eyre::Result<()> {
        let journald_filter = build_env_filter(None, filter)?;
        let layer = tracing_journald::layer()?.with_filter(journald_filter).boxed();
        self.inner.push(layer);
        Ok(())
    }

    /// Add a stdout layer.
    pub fn stdout(
        &mut self,
        format: LogFormat,
        default_directive: Directive,
        filters: &str,
        color: Option<String>,
    ) -> eyre::Result<()> {
        let filter = build_env_filter(Some(default_directive), filters)?;
        let layer = format.apply(filter, color, None);
        self.inner.push(layer);
        Ok(())
    }

    /// Add a rolling file layer. Lines are written from a background worker which stops
    /// when the returned guard is dropped.
    pub fn file(
        &mut self,
        format: LogFormat,
        filter: &str,
        file_info: FileInfo,
    ) -> eyre::Result<FileWorkerGuard> {
        let (writer, guard) = file_info.create_log_writer()?;
        let file_filter = build_env_filter(None, filter)?;
        let layer = format.apply(file_filter, None, Some(writer));
        self.inner.push(layer);
        Ok(guard)
    }
}

/// Where and how large the rolling log files are.
#[derive(Debug, Clone)]
pub struct FileInfo {
    dir: PathBuf,
    file_name: String,
    max_size_bytes: u64,
    max_files: usize,
}

impl FileInfo {
    /// Log to `dir/file_name`, rotating once a file reaches `max_size_bytes` and keeping at
    /// most `max_files` rotated files.
    pub fn new(dir: PathBuf, file_name: String, max_size_bytes: u64, max_files: usize) -> Self {
        Self { dir, file_name, max_size_bytes, max_files }
    }

    /// The directory log files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create_log_writer(
        &self,
    ) -> eyre::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.dir)?;

        let appender = RollingFileAppender::new(
            self.dir.join(&self.file_name),
            RollingConditionBasic::new().max_size(self.max_size_bytes),
            self.max_files,
        )?;

        Ok(tracing_appender::non_blocking(appender))
    }
}

/// Build an [`EnvFilter`] from `RUST_LOG`, the default directive and the comma separated
/// `directives`.
fn build_env_filter(
    default_directive: Option<Directive>,
    directives: &str,
) -> eyre::Result<EnvFilter> {
    let env_filter = match default_directive {
        Some(default_directive) => {
            EnvFilter::builder().with_default_directive(default_directive).from_env_lossy()
        }
        None => EnvFilter::builder().from_env_lossy(),
    };

    DEFAULT_ENV_FILTER_DIRECTIVES
        .into_iter()
        .chain(directives.split(',').filter(|d| !d.is_empty()))
        .try_fold(env_filter, |env_filter, directive| {
            Ok(env_filter.add_directive(directive.parse()?))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_env_filter_accepts_directives() {
        assert!(build_env_filter(None, "slotscope_storage=debug,actix_web=warn").is_ok());
        assert!(build_env_filter(Some(tracing::Level::INFO.into()), "").is_ok());
    }

    #[test]
    fn test_build_env_filter_rejects_garbage() {
        assert!(build_env_filter(None, "slotscope[=debug").is_err());
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = std::env::temp_dir().join("slotscope-tracing-test-logs");
        let _ = std::fs::remove_dir_all(&dir);

        let mut layers = Layers::new();
        let guard = layers
            .file(
                LogFormat::Json,
                "debug",
                FileInfo::new(dir.clone(), "slotscope.log".to_string(), 1024 * 1024, 2),
            )
            .expect("failed to create file layer");

        assert!(dir.exists());
        assert_eq!(layers.into_inner().len(), 1);
        drop(guard);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
