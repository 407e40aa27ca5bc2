use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{runtime::ConfigErrors, Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use thiserror::Error;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}";

/// Errors raised while building or installing the process-wide logger.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log4rs configuration: {0}")]
    Config(#[from] ConfigErrors),
    #[error("a logger was already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Builds and installs the process-wide logger: always a file appender,
/// plus an optional console appender for foreground runs.
///
/// # Arguments
///
/// * `log_path` - path of the log file to append to
/// * `log_level` - minimum level passed through to the root logger
/// * `log_to_stdout` - also mirror output to the console
pub fn setup_logger(log_path: &str, log_level: LevelFilter, log_to_stdout: bool) -> Result<(), LoggingError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(log_path)
        .expect("log file path should be writable");

    let mut builder = LogConfig::builder().appender(Appender::builder().build("file", Box::new(file)));
    let mut root_builder = Root::builder().appender("file");

    if log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root_builder = root_builder.appender("stdout");
    }

    let config = builder.build(root_builder.build(log_level))?;

    log4rs::init_config(config)?;

    Ok(())
}
