// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{event_table::EventTable,
            fault,
            fault::Result,
            freq::{FreqSeries, Spectrogram},
            labeled_table::{FileFormat, LabeledTable},
            sample_buffer::SampleBuffer,
            series::RegularSeries};
use std::{fmt, io, path::Path};


/// The capabilities every dataset variant offers, regardless of kind.
///
/// `load` replaces previous content from a file, capped at `max_rows` rows
/// when nonzero (the labeled ASCII form reads whole files and ignores the
/// cap). `append` concatenates a dataset of the same variant under that
/// variant's own seam rules. The frequency placeholders have no file form
/// and refuse all three fallible operations.
pub trait Dataset: fmt::Display {
  fn load(&mut self, path: &Path, max_rows: usize) -> Result<usize>;

  fn write_stream(&self, out: &mut dyn io::Write) -> Result<()>;

  fn is_empty(&self) -> bool;

  fn append(&mut self, other: &Self) -> Result<()>;
}

impl Dataset for RegularSeries {
  fn load(&mut self, path: &Path, max_rows: usize) -> Result<usize> {
    let rows = self.buffer_mut().load(path, max_rows)?;
    self.derive_end_time();
    Ok(rows)
  }

  fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    RegularSeries::write_stream(self, out)
  }

  fn is_empty(&self) -> bool {
    self.buffer().is_empty()
  }

  fn append(&mut self, other: &Self) -> Result<()> {
    RegularSeries::append(self, other, false)
  }
}

impl Dataset for EventTable {
  fn load(&mut self, path: &Path, max_rows: usize) -> Result<usize> {
    self.buffer_mut().load(path, max_rows)
  }

  fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    EventTable::write_stream(self, out)
  }

  fn is_empty(&self) -> bool {
    self.buffer().is_empty()
  }

  fn append(&mut self, other: &Self) -> Result<()> {
    EventTable::append(self, other, false)
  }
}

impl Dataset for LabeledTable {
  fn load(&mut self, path: &Path, _max_rows: usize) -> Result<usize> {
    LabeledTable::load(self, path, FileFormat::Labels, None)
  }

  fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    LabeledTable::write_stream(self, out)
  }

  fn is_empty(&self) -> bool {
    self.buffer().is_empty()
  }

  fn append(&mut self, other: &Self) -> Result<()> {
    LabeledTable::append(self, other)
  }
}

impl Dataset for FreqSeries {
  fn load(&mut self, _path: &Path, _max_rows: usize) -> Result<usize> {
    fault!(Validation, "frequency series have no file form")
  }

  fn write_stream(&self, _out: &mut dyn io::Write) -> Result<()> {
    fault!(Validation, "frequency series have no file form")
  }

  fn is_empty(&self) -> bool {
    self.buffer().is_empty()
  }

  fn append(&mut self, _other: &Self) -> Result<()> {
    fault!(Validation, "frequency series cannot be appended")
  }
}

impl Dataset for Spectrogram {
  fn load(&mut self, _path: &Path, _max_rows: usize) -> Result<usize> {
    fault!(Validation, "spectrograms have no file form")
  }

  fn write_stream(&self, _out: &mut dyn io::Write) -> Result<()> {
    fault!(Validation, "spectrograms have no file form")
  }

  fn is_empty(&self) -> bool {
    self.buffer().is_empty()
  }

  fn append(&mut self, _other: &Self) -> Result<()> {
    fault!(Validation, "spectrograms cannot be appended")
  }
}


/// A dataset of any variant, dispatching [`Dataset`] calls by match. The
/// closed set replaces an open class hierarchy; appending across variants
/// is a validation fault rather than a type error, which lets callers keep
/// heterogeneous collections.
#[derive(Clone, Debug)]
pub enum AnyDataset {
  Series(RegularSeries),
  Events(EventTable),
  Labeled(LabeledTable),
  Frequency(FreqSeries),
  Spectrogram(Spectrogram),
}

impl AnyDataset {
  /// The wrapped variant's buffer.
  pub fn buffer(&self) -> &SampleBuffer {
    match self {
      Self::Series(series) => series.buffer(),
      Self::Events(events) => events.buffer(),
      Self::Labeled(table) => table.buffer(),
      Self::Frequency(series) => series.buffer(),
      Self::Spectrogram(gram) => gram.buffer(),
    }
  }

  fn variant(&self) -> &'static str {
    match self {
      Self::Series(_) => "time series",
      Self::Events(_) => "event table",
      Self::Labeled(_) => "labeled table",
      Self::Frequency(_) => "frequency series",
      Self::Spectrogram(_) => "spectrogram",
    }
  }
}

impl Dataset for AnyDataset {
  fn load(&mut self, path: &Path, max_rows: usize) -> Result<usize> {
    match self {
      Self::Series(series) => series.load(path, max_rows),
      Self::Events(events) => events.load(path, max_rows),
      Self::Labeled(table) => Dataset::load(table, path, max_rows),
      Self::Frequency(series) => series.load(path, max_rows),
      Self::Spectrogram(gram) => gram.load(path, max_rows),
    }
  }

  fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    match self {
      Self::Series(series) => series.write_stream(out),
      Self::Events(events) => events.write_stream(out),
      Self::Labeled(table) => table.write_stream(out),
      Self::Frequency(series) => Dataset::write_stream(series, out),
      Self::Spectrogram(gram) => Dataset::write_stream(gram, out),
    }
  }

  fn is_empty(&self) -> bool {
    self.buffer().is_empty()
  }

  fn append(&mut self, other: &Self) -> Result<()> {
    match (self, other) {
      (Self::Series(ours), Self::Series(theirs)) => {
        Dataset::append(ours, theirs)
      }
      (Self::Events(ours), Self::Events(theirs)) => {
        Dataset::append(ours, theirs)
      }
      (Self::Labeled(ours), Self::Labeled(theirs)) => {
        Dataset::append(ours, theirs)
      }
      (Self::Frequency(ours), Self::Frequency(theirs)) => {
        Dataset::append(ours, theirs)
      }
      (Self::Spectrogram(ours), Self::Spectrogram(theirs)) => {
        Dataset::append(ours, theirs)
      }
      (ours, theirs) => fault!(Validation,
                               "cannot append {} data onto {} data",
                               theirs.variant(),
                               ours.variant()),
    }
  }
}

impl fmt::Display for AnyDataset {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Series(series) => series.fmt(f),
      Self::Events(events) => events.fmt(f),
      Self::Labeled(table) => table.fmt(f),
      Self::Frequency(series) => series.fmt(f),
      Self::Spectrogram(gram) => gram.fmt(f),
    }
  }
}

impl From<RegularSeries> for AnyDataset {
  fn from(series: RegularSeries) -> Self {
    Self::Series(series)
  }
}

impl From<EventTable> for AnyDataset {
  fn from(events: EventTable) -> Self {
    Self::Events(events)
  }
}

impl From<LabeledTable> for AnyDataset {
  fn from(table: LabeledTable) -> Self {
    Self::Labeled(table)
  }
}

impl From<FreqSeries> for AnyDataset {
  fn from(series: FreqSeries) -> Self {
    Self::Frequency(series)
  }
}

impl From<Spectrogram> for AnyDataset {
  fn from(gram: Spectrogram) -> Self {
    Self::Spectrogram(gram)
  }
}
