// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{config::Config, ensure, fault, fault::Result};
use getset::Getters;
use log::warn;
use std::{fs,
          io,
          io::Write,
          path::{Path, PathBuf},
          process};


/// Outcome of an acquire attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Acquire {
  Acquired,
  /// The lock file already existed; holds the pid written into it. This is
  /// reported even when the pid is our own, since a second acquire for the
  /// same tag means the first one leaked.
  AlreadyHeld(u32),
}

/// Outcome of a release attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Release {
  Released,
  /// The lock file now belongs to another process; it is left in place.
  HeldByOther(u32),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockState {
  Unlocked,
  HeldBySelf,
  HeldByOther,
}


/// Advisory pid file lock keyed by a string tag.
///
/// A lock is the file `<lock dir>/lock.<tag>.pid` holding the owning pid
/// and host name, one per line. The lock directory and host name come from
/// [`Config`]. Cooperating processes only; nothing stops a rogue writer
/// from ignoring the files.
#[derive(Debug, Getters)]
pub struct PidLock {
  #[getset(get = "pub")]
  lock_dir:  PathBuf,
  #[getset(get = "pub")]
  hostname:  String,
  lock_file: Option<PathBuf>,
}

impl PidLock {
  pub fn new(config: &Config) -> Self {
    Self { lock_dir:  config.lock_dir().clone(),
           hostname:  config.hostname().clone(),
           lock_file: None, }
  }

  /// Attempts to take the lock for `tag`, creating the lock directory if
  /// needed. An existing lock file turns into [`Acquire::AlreadyHeld`] and
  /// detaches this instance from the tag, so a later [`PidLock::state`]
  /// reports [`LockState::Unlocked`].
  pub fn acquire(&mut self, tag: &str) -> Result<Acquire> {
    ensure!(!tag.is_empty(), Validation, "a lock needs a non-empty tag");

    fs::create_dir_all(&self.lock_dir)?;
    let path = self.lock_dir.join(format!("lock.{}.pid", tag));

    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(mut file) => {
        file.write_all(
          format!("{}\n{}\n", process::id(), self.hostname).as_bytes(),
        )?;
        self.lock_file = Some(path);
        Ok(Acquire::Acquired)
      }
      Err(cause) if cause.kind() == io::ErrorKind::AlreadyExists => {
        let (holder, host) = holder_of(&path)?;
        self.lock_file = None;
        warn!("lock '{}' already held by process {} on {}", tag, holder,
              host);
        Ok(Acquire::AlreadyHeld(holder))
      }
      Err(cause) => {
        self.lock_file = None;
        fault!(Io, "cannot create lock '{}': {}", path.display(), cause)
      }
    }
  }

  /// Releases the held lock. Refuses to delete a lock file which has come
  /// to belong to another process and reports that pid instead.
  pub fn release(&mut self) -> Result<Release> {
    let path = match &self.lock_file {
      Some(path) => path.clone(),
      None => return fault!(Precondition, "no lock is held"),
    };

    let (holder, _) = holder_of(&path)?;
    if holder != process::id() {
      warn!("lock file '{}' belongs to process {}", path.display(), holder);
      return Ok(Release::HeldByOther(holder));
    }

    fs::remove_file(&path)?;
    self.lock_file = None;
    Ok(Release::Released)
  }

  /// Where this instance stands with the tag it last acquired. Detached
  /// instances and vanished lock files read as unlocked; an unreadable or
  /// foreign lock file reads as held by another process.
  pub fn state(&self) -> LockState {
    let path = match &self.lock_file {
      Some(path) => path,
      None => return LockState::Unlocked,
    };
    if !path.exists() {
      return LockState::Unlocked;
    }
    match holder_of(path) {
      Ok((holder, _)) if holder == process::id() => LockState::HeldBySelf,
      _ => LockState::HeldByOther,
    }
  }
}

impl Drop for PidLock {
  fn drop(&mut self) {
    if self.state() == LockState::HeldBySelf {
      warn!("dropping a pid lock while still holding it");
    }
  }
}


/// Reads pid and host name back out of a lock file. Both lines must be
/// present for the file to count as a valid lock.
fn holder_of(path: &Path) -> Result<(u32, String)> {
  let content = fs::read_to_string(path)?;
  let mut lines = content.lines();
  let pid = match lines.next() {
    Some(line) => line.trim().parse::<u32>()?,
    None => return fault!(Format, "lock file '{}' is empty", path.display()),
  };
  let host = match lines.next() {
    Some(line) if !line.trim().is_empty() => line.trim().to_string(),
    _ => {
      return fault!(Format, "lock file '{}' names no host", path.display())
    }
  };
  Ok((pid, host))
}
