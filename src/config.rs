// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Author: Florian Eich <florian@bmc-labs.com>

use getset::{CopyGetters, Getters, Setters};
use std::{env, path::PathBuf};


const DEFAULT_SCRATCH_DIR: &str = "/tmp";
const DEFAULT_HOSTNAME: &str = "localhost";


/// Process wide configuration, built once at startup and passed by
/// reference to the collaborators that need it. Nothing in here is read
/// from hidden global state after construction; the setters let a caller
/// override what the environment provided.
#[derive(Clone, Debug, PartialEq, CopyGetters, Getters, Setters)]
pub struct Config {
  /// Name of the running program, used in log lines and log file names.
  #[getset(get = "pub")]
  program:     String,
  /// Station number of the sensor this process serves.
  #[getset(get_copy = "pub")]
  station:     u32,
  /// Host this process runs on, recorded in lock files.
  #[getset(get = "pub", set = "pub")]
  hostname:    String,
  /// Directory holding advisory lock files.
  #[getset(get = "pub", set = "pub")]
  lock_dir:    PathBuf,
  /// Directory persistent logs move to. `None` when not configured; the
  /// logger then stays on the scratch directory.
  #[getset(get = "pub", set = "pub")]
  log_dir:     Option<PathBuf>,
  /// Always writable spill space.
  #[getset(get = "pub", set = "pub")]
  scratch_dir: PathBuf,
}

impl Config {
  /// Builds the configuration from the process environment: `LOCK_PATH`
  /// for the lock directory, `LOG_PATH` for the log directory, `HOSTNAME`
  /// for the host name. Missing variables fall back to the scratch
  /// directory resp. `localhost`. Performs no filesystem access; the
  /// collaborators using a directory are responsible for checking it.
  pub fn from_env(program: &str, station: u32) -> Self {
    let scratch_dir = PathBuf::from(DEFAULT_SCRATCH_DIR);
    let lock_dir = env::var("LOCK_PATH").map(PathBuf::from)
                                        .unwrap_or_else(|_| {
                                          scratch_dir.clone()
                                        });
    let log_dir = env::var("LOG_PATH").map(PathBuf::from).ok();
    let hostname =
      env::var("HOSTNAME").unwrap_or_else(|_| DEFAULT_HOSTNAME.to_string());

    Self { program: program.to_string(),
           station,
           hostname,
           lock_dir,
           log_dir,
           scratch_dir }
  }
}
