// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{clock::Clock,
            ensure,
            fault,
            fault::Result,
            sample_buffer::{float_from, BufferKind, SampleBuffer}};
use getset::{Getters, MutGetters};
use log::warn;
use std::{fmt, io, io::Write};


/// Plausible day monikers: recordings before 1980 or after 2050 point to a
/// corrupt clock somewhere upstream.
const MIN_DAY_MONIKER: i32 = 19_800_000;
const MAX_DAY_MONIKER: i32 = 20_500_000;


/// Table of time-stamped events, sorted ascending by date-number.
///
/// Every row holds two doubles: column 0 is the event's date-number,
/// column 1 its duration. Windowed extraction relies on the ascending
/// order of column 0.
#[derive(Clone, Debug, PartialEq, Getters, MutGetters)]
pub struct EventTable {
  #[getset(get = "pub", get_mut = "pub")]
  buffer: SampleBuffer,
}

impl Default for EventTable {
  fn default() -> Self {
    Self::new()
  }
}

impl EventTable {
  pub fn new() -> Self {
    Self { buffer: SampleBuffer::with_layout(BufferKind::Event, 8, 2) }
  }

  /// Creates an empty table spanning the given time range.
  pub fn for_range(begin: Clock, end: Clock) -> Result<Self> {
    ensure!(!begin.is_zero(),
            Validation,
            "event table range must not start at the zero time");
    ensure!(begin <= end,
            Validation,
            "event table range of {} to {} is inverted",
            begin,
            end);
    if begin == end {
      warn!("event table range of {} to {} spans no time", begin, end);
    }
    let mut table = Self::new();
    table.buffer.set_start(begin);
    table.buffer.set_end(end);
    Ok(table)
  }

  /// Creates an empty table spanning two day monikers, e.g. 20110206.
  pub fn for_day_range(begin_day: i32, end_day: i32) -> Result<Self> {
    ensure!((MIN_DAY_MONIKER..=MAX_DAY_MONIKER).contains(&begin_day),
            Validation,
            "start day {} is outside the plausible range",
            begin_day);
    ensure!((MIN_DAY_MONIKER..=MAX_DAY_MONIKER).contains(&end_day),
            Validation,
            "end day {} is outside the plausible range",
            end_day);
    let begin = Clock::from_moniker(&format!("{:08}", begin_day))?;
    let end = Clock::from_moniker(&format!("{:08}", end_day))?;
    Self::for_range(begin, end)
  }

  /// The event at `row` as a (date-number, duration) pair, or `None`
  /// beyond the table.
  pub fn event(&self, row: usize) -> Option<(f64, f64)> {
    if row >= self.buffer.rows() {
      return None;
    }
    Some((self.datenum_at(row), self.duration_at(row)))
  }

  /// True iff column 0 is non-decreasing over all rows.
  pub fn is_sorted(&self) -> bool {
    (1..self.buffer.rows())
      .all(|row| self.datenum_at(row - 1) <= self.datenum_at(row))
  }

  /// Copies the contiguous row range covered by `[begin, end]` into a new
  /// table: from the first row whose date-number is at or after `begin` to
  /// the last row at or before `end`. A window matching no rows yields an
  /// empty table. Fails on an empty or unsorted source table.
  pub fn extract_window(&self, begin: Clock, end: Clock) -> Result<Self> {
    ensure!(!self.buffer.is_empty(),
            Validation,
            "cannot window an empty event table");
    ensure!(self.is_sorted(),
            Validation,
            "event table is not sorted by date-number");

    let begin_dn = begin.datenum();
    let end_dn = end.datenum();
    let rows = self.buffer.rows();
    let lo = (0..rows).find(|&row| self.datenum_at(row) >= begin_dn);
    let hi = (0..rows).rev().find(|&row| self.datenum_at(row) <= end_dn);

    let mut window = Self { buffer: self.buffer.without_data() };
    window.buffer.set_start(begin);
    window.buffer.set_end(end);

    if let (Some(lo), Some(hi)) = (lo, hi) {
      if lo <= hi {
        let row_bytes = self.buffer.row_bytes();
        let span = &self.buffer.bytes()[lo * row_bytes..(hi + 1) * row_bytes];
        window.buffer.append_row_bytes(span)?;
      }
    }
    Ok(window)
  }

  /// Concatenates `other`'s events after this table's. Unless `force` is
  /// set, the layouts must match and the merged column 0 must stay
  /// non-decreasing across the seam.
  pub fn append(&mut self, other: &Self, force: bool) -> Result<()> {
    ensure!(!other.buffer.is_empty(),
            Validation,
            "cannot append an empty event table");
    if !force {
      ensure!(self.buffer.width() == other.buffer.width()
              && self.buffer.cols() == other.buffer.cols(),
              Validation,
              "event table layouts do not match: [{}] vs [{}]",
              self.buffer,
              other.buffer);
      if !self.buffer.is_empty() {
        ensure!(self.datenum_at(self.buffer.rows() - 1)
                <= other.datenum_at(0),
                Validation,
                "appending would break the date-number order");
      }
    }

    let was_empty = self.buffer.is_empty();
    self.buffer.append_row_bytes(other.buffer.bytes())?;
    if was_empty {
      self.buffer.set_start(other.buffer.start());
    }
    if other.buffer.end() > self.buffer.end() {
      self.buffer.set_end(other.buffer.end());
    }
    Ok(())
  }

  /// Writes the events as ASCII, date-number and duration per line.
  pub fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    for row in 0..self.buffer.rows() {
      writeln!(out, "{} {}", self.datenum_at(row), self.duration_at(row))?;
    }
    Ok(())
  }

  fn datenum_at(&self, row: usize) -> f64 {
    self.col_value(row, 0)
  }

  fn duration_at(&self, row: usize) -> f64 {
    self.col_value(row, 1)
  }

  fn col_value(&self, row: usize, col: usize) -> f64 {
    let offset = (row * self.buffer.cols() + col) * self.buffer.width();
    float_from(&self.buffer.bytes()[offset..offset + 8])
  }
}

impl fmt::Display for EventTable {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.buffer)
  }
}
