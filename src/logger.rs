// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{clock::Clock, config::Config, fault, fault::Result};
use std::{fs, io, io::Write, process, sync::Mutex};


/// Structured sink behind the `log` facade.
///
/// Every line reads
/// `<program>: CMN<station>: <datetime>: <LEVEL>: <message>`, which keeps
/// interleaved logs from a fleet of station processes greppable. With a
/// log directory configured, lines go to a per process file named
/// `<program>.<station>.<YYYYMMDD>.<HHMMSS>.<pid>.log`; the persistent
/// variant appends to `<program>.<station>.log` across restarts. Without
/// one, lines go to stderr.
pub struct Logger {
  program:  String,
  station:  String,
  hostname: String,
  sink:     Mutex<Box<dyn io::Write + Send>>,
}

impl Logger {
  /// A logger writing to a fresh, time-and-pid-named file in the log
  /// directory, or to stderr when none is configured. An unwritable log
  /// directory also falls back to stderr rather than failing the caller.
  pub fn new(config: &Config) -> Result<Self> {
    let sink: Box<dyn io::Write + Send> = match config.log_dir() {
      Some(dir) => {
        let path = dir.join(rotating_name(config)?);
        match fs::File::create(&path) {
          Ok(file) => Box::new(file),
          Err(cause) => {
            eprintln!("cannot open log file '{}': {}, logging to stderr",
                      path.display(),
                      cause);
            Box::new(io::stderr())
          }
        }
      }
      None => Box::new(io::stderr()),
    };
    Ok(Self::to_writer(config, sink))
  }

  /// A logger appending to the station's fixed persistent file, surviving
  /// process restarts. Falls back to stderr like [`Logger::new`].
  pub fn persistent(config: &Config) -> Result<Self> {
    let sink: Box<dyn io::Write + Send> = match config.log_dir() {
      Some(dir) => {
        let path = dir.join(persistent_name(config));
        match fs::OpenOptions::new().create(true).append(true).open(&path) {
          Ok(file) => Box::new(file),
          Err(cause) => {
            eprintln!("cannot open log file '{}': {}, logging to stderr",
                      path.display(),
                      cause);
            Box::new(io::stderr())
          }
        }
      }
      None => Box::new(io::stderr()),
    };
    Ok(Self::to_writer(config, sink))
  }

  /// A logger writing to an arbitrary sink. The file-backed constructors
  /// go through this; it is also the hook for capturing output in tests.
  pub fn to_writer(config: &Config, sink: Box<dyn io::Write + Send>)
                   -> Self {
    Self { program: config.program().clone(),
           station: format!("{:04}", config.station()),
           hostname: config.hostname().clone(),
           sink: Mutex::new(sink) }
  }

  /// Installs this logger process wide and emits the start-of-log line.
  /// Fails if some logger is already installed.
  pub fn install(self) -> Result<()> {
    let hostname = self.hostname.clone();
    if log::set_boxed_logger(Box::new(self)).is_err() {
      return fault!(Precondition, "a logger is already installed");
    }
    log::set_max_level(log::LevelFilter::Info);

    let stamp = match Clock::now().to_sql_datetime() {
      Ok(stamp) => stamp,
      Err(_) => Clock::now().to_string(),
    };
    log::info!("log started at: {}, on: {}", stamp, hostname);
    Ok(())
  }

  /// One call setup: build a rotating logger from the configuration and
  /// install it.
  pub fn init(config: &Config) -> Result<()> {
    Self::new(config)?.install()
  }

  /// One call setup for the persistent variant.
  pub fn init_persistent(config: &Config) -> Result<()> {
    Self::persistent(config)?.install()
  }

  fn line(&self, record: &log::Record) -> String {
    let stamp = match Clock::now().to_sql_datetime_full() {
      Ok(stamp) => stamp,
      Err(_) => Clock::now().to_string(),
    };
    format!("{}: CMN{}: {}: {}: {}\n",
            self.program,
            self.station,
            stamp,
            level_tag(record.level()),
            record.args())
  }
}

impl log::Log for Logger {
  fn enabled(&self, metadata: &log::Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &log::Record) {
    let line = self.line(record);
    if let Ok(mut sink) = self.sink.lock() {
      let _ = sink.write_all(line.as_bytes());
    }
  }

  fn flush(&self) {
    if let Ok(mut sink) = self.sink.lock() {
      let _ = sink.flush();
    }
  }
}


/// Logs a `FATAL` line with the last OS error appended, flushes and
/// terminates the process. For conditions no caller can recover from,
/// e.g. losing the directory all data files live in.
#[macro_export]
macro_rules! fatal {
  ($($arg:tt)*) => {{
    ::log::error!("FATAL: {}, last os error: {}",
                  format_args!($($arg)*),
                  ::std::io::Error::last_os_error());
    ::log::logger().flush();
    ::std::process::exit(1)
  }}
}


fn level_tag(level: log::Level) -> &'static str {
  match level {
    log::Level::Error => "ERROR",
    log::Level::Warn => "WARNING",
    log::Level::Info => "INFO",
    log::Level::Debug => "DEBUG",
    log::Level::Trace => "TRACE",
  }
}

/// `<program>.<station>.<YYYYMMDD>.<HHMMSS>.<pid>.log`, unique per process
/// and start time.
fn rotating_name(config: &Config) -> Result<String> {
  let now = Clock::now();
  Ok(format!("{}.{:04}.{}.{}.{}.log",
             config.program(),
             config.station(),
             now.day_moniker()?,
             now.time_moniker()?,
             process::id()))
}

/// `<program>.<station>.log`, shared by every run of the station.
fn persistent_name(config: &Config) -> String {
  format!("{}.{:04}.log", config.program(), config.station())
}
