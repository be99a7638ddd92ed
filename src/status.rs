use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Where status updates land. Implemented by the host over its WPS response
/// object; the library never touches the framework directly.
pub trait StatusSink {
    /// Progress reported by the last update, 0..=100.
    fn status_percentage(&self) -> u8;

    fn update_status(&mut self, message: &str, percentage: u8);
}

/// The step table most processes share. Processes with more stages build
/// their own and pass it to [`StatusLogger::with_steps`].
pub fn common_status_percentages() -> IndexMap<String, u8> {
    IndexMap::from([
        ("start".to_string(), 0),
        ("process".to_string(), 20),
        ("build_output".to_string(), 95),
        ("complete".to_string(), 100),
    ])
}

/// Reports a message to three places at once: the `log` facade, a log file in
/// the process working directory, and the host's status sink.
///
/// The logging facade itself is configured by the hosting process at startup;
/// this type only emits.
#[derive(Debug)]
pub struct StatusLogger {
    workdir: PathBuf,
    log_file: String,
    steps: IndexMap<String, u8>,
}

impl StatusLogger {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            log_file: "log.txt".to_string(),
            steps: common_status_percentages(),
        }
    }

    pub fn with_steps(mut self, steps: IndexMap<String, u8>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        self.log_file = name.into();
        self
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.workdir.join(&self.log_file)
    }

    /// Log `message` at `level` and push a status update to the sink.
    ///
    /// The progress percentage comes from the step table when `step` is
    /// given (a name absent from the table is an error), or from the sink's
    /// current percentage otherwise.
    pub fn log(
        &self,
        sink: &mut dyn StatusSink,
        step: Option<&str>,
        level: log::Level,
        message: &str,
    ) -> Result<()> {
        let percentage = match step {
            Some(name) => *self
                .steps
                .get(name)
                .ok_or_else(|| Error::UnknownStep(name.to_string()))?,
            None => sink.status_percentage(),
        };

        log::log!(level, "{message}");
        append_line(&self.log_file_path(), level, message)?;
        sink.update_status(message, percentage);
        Ok(())
    }

    /// Report a process step at `Info` level.
    pub fn step(&self, sink: &mut dyn StatusSink, step: &str, message: &str) -> Result<()> {
        self.log(sink, Some(step), log::Level::Info, message)
    }
}

fn append_line(path: &Path, level: log::Level, message: &str) -> Result<()> {
    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{stamp} {level}: {message}")?;
    Ok(())
}
