// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{clock::Clock, ensure, fault, fault::Result, raw_buffer::RawBuffer};
use getset::{CopyGetters, Getters};
use log::warn;
use std::{fmt, fs, io, path::Path};


/// Row capacity used when a load has to allocate without knowing the size.
pub const DEFAULT_ROW_CAPACITY: usize = 10_000_000;

/// Metadata indexes beyond this are suspicious and logged as such.
const META_INDEX_SANITY: usize = 1_000;

const DEFAULT_WIDTH: usize = 4;


/// Tag identifying the concrete buffer variant at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferKind {
  Common,
  TimeSeries,
  Frequency,
  FrequencyTime,
  Event,
  Labeled,
}

impl fmt::Display for BufferKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      Self::Common => "common",
      Self::TimeSeries => "time series",
      Self::Frequency => "frequency",
      Self::FrequencyTime => "frequency/time",
      Self::Event => "event",
      Self::Labeled => "labeled",
    };
    write!(f, "{}", name)
  }
}


/// Typed sample storage shared by all buffer variants.
///
/// Holds the element width, column and row counts, the interleaved flag,
/// the start time with its group delay offset, the cached end time and the
/// positional metadata strings, plus the owned byte storage. The byte
/// storage always spans exactly `width * cols * rows` bytes; every public
/// mutation preserves that.
///
/// The cached end time is not kept in sync automatically. The owning
/// variant recomputes it whenever row count or rate changes.
#[derive(Clone, Debug, PartialEq, CopyGetters, Getters)]
pub struct SampleBuffer {
  /// Variant tag, fixed at construction.
  #[getset(get_copy = "pub")]
  kind:        BufferKind,
  /// Time of the first sample.
  #[getset(get_copy = "pub")]
  start:       Clock,
  /// Group delay of the recording chain. Carried alongside `start`, never
  /// folded into it.
  #[getset(get_copy = "pub")]
  time_offset: Clock,
  /// Cached time of the last sample.
  #[getset(get_copy = "pub")]
  end:         Clock,
  /// Bytes per sample element.
  #[getset(get_copy = "pub")]
  width:       usize,
  #[getset(get_copy = "pub")]
  cols:        usize,
  #[getset(get_copy = "pub")]
  rows:        usize,
  /// Whether samples are laid out row-major (interleaved across columns).
  #[getset(get_copy = "pub")]
  interleaved: bool,
  /// Free-form metadata strings, indexed positionally.
  #[getset(get = "pub")]
  meta:        Vec<String>,
  data:        RawBuffer,
}

impl Default for SampleBuffer {
  fn default() -> Self {
    Self::new(BufferKind::Common)
  }
}

// CONSTRUCTION AND LAYOUT ------------------------------------------------- //
impl SampleBuffer {
  /// Creates an empty buffer of the given kind with the default layout of
  /// one column of 4 byte samples.
  pub fn new(kind: BufferKind) -> Self {
    Self::with_layout(kind, DEFAULT_WIDTH, 1)
  }

  /// Creates an empty buffer with an explicit element width and column
  /// count.
  pub fn with_layout(kind: BufferKind, width: usize, cols: usize) -> Self {
    Self { kind,
           start: Clock::default(),
           time_offset: Clock::default(),
           end: Clock::default(),
           width,
           cols,
           rows: 0,
           interleaved: true,
           meta: Vec::new(),
           data: RawBuffer::new() }
  }

  /// Changes element width and column count. Only legal while the buffer
  /// holds no data.
  pub fn set_layout(&mut self, width: usize, cols: usize) -> Result<()> {
    ensure!(self.rows == 0 && self.data.is_empty(),
            Precondition,
            "cannot reshape a buffer holding {} rows",
            self.rows);
    self.width = width;
    self.cols = cols;
    Ok(())
  }

  pub fn set_start(&mut self, start: Clock) {
    self.start = start;
  }

  pub fn set_time_offset(&mut self, offset: Clock) {
    self.time_offset = offset;
  }

  pub fn set_end(&mut self, end: Clock) {
    self.end = end;
  }

  /// Copies everything but the sample data: same kind, times, layout and
  /// metadata, but zero rows and no storage.
  pub fn without_data(&self) -> Self {
    Self { kind:        self.kind,
           start:       self.start,
           time_offset: self.time_offset,
           end:         self.end,
           width:       self.width,
           cols:        self.cols,
           rows:        0,
           interleaved: self.interleaved,
           meta:        self.meta.clone(),
           data:        RawBuffer::new(), }
  }
}

// SIZE AND STORAGE -------------------------------------------------------- //
impl SampleBuffer {
  /// Total size of the sample data in bytes.
  pub fn byte_size(&self) -> usize {
    self.width * self.cols * self.rows
  }

  /// Size of a single row in bytes.
  pub fn row_bytes(&self) -> usize {
    self.width * self.cols
  }

  pub fn is_empty(&self) -> bool {
    self.rows == 0
  }

  pub fn bytes(&self) -> &[u8] {
    self.data.as_slice()
  }

  pub fn bytes_mut(&mut self) -> &mut [u8] {
    self.data.as_mut_slice()
  }

  /// Replaces any existing storage with a zero-filled buffer sized for the
  /// current layout and row count. On failure the storage is released.
  pub fn allocate(&mut self) -> Result<()> {
    self.data.clear();
    self.data.resize(self.byte_size())
  }

  /// Grows (zero-filling) or truncates the buffer to `rows` rows,
  /// preserving leading content.
  pub fn resize_rows(&mut self, rows: usize) -> Result<()> {
    self.data.resize(self.width * self.cols * rows)?;
    self.rows = rows;
    Ok(())
  }

  /// Appends whole rows given as raw bytes, updating the row count.
  pub fn append_row_bytes(&mut self, bytes: &[u8]) -> Result<()> {
    let row_bytes = self.row_bytes();
    ensure!(row_bytes > 0, Validation, "zero byte rows cannot hold data");
    ensure!(bytes.len() % row_bytes == 0,
            Validation,
            "{} bytes is not a whole number of {} byte rows",
            bytes.len(),
            row_bytes);
    self.data.extend_from_slice(bytes)?;
    self.rows += bytes.len() / row_bytes;
    Ok(())
  }

  /// Releases the sample storage and zeroes the row count. All other
  /// fields keep their values.
  pub fn clear(&mut self) {
    self.data.clear();
    self.rows = 0;
  }

  /// Overwrites the sample data with zeroes without changing dimensions.
  pub fn zero(&mut self) {
    self.data.zero();
  }
}

// LOADING AND WRITING ----------------------------------------------------- //
impl SampleBuffer {
  /// Reads whole rows from `stream` until the buffer is full or the stream
  /// ends. Allocates storage for [`DEFAULT_ROW_CAPACITY`] rows first if
  /// none exists. A partial trailing row at end of stream is dropped; on
  /// end of stream the buffer shrinks to the rows actually read. Any read
  /// failure clears the buffer. Returns the number of rows loaded.
  pub fn load_stream<R: io::Read>(&mut self, stream: &mut R) -> Result<usize> {
    let row_bytes = self.row_bytes();
    ensure!(row_bytes > 0, Validation, "zero byte rows cannot hold data");

    if self.data.is_empty() {
      self.rows = DEFAULT_ROW_CAPACITY;
      if let Err(fault) = self.allocate() {
        self.rows = 0;
        return Err(fault);
      }
    }

    let target = self.data.len();
    let mut filled = 0;
    while filled < target {
      match stream.read(&mut self.data.as_mut_slice()[filled..]) {
        Ok(0) => break, // end of stream
        Ok(count) => filled += count,
        Err(ref cause) if cause.kind() == io::ErrorKind::Interrupted => {
          continue
        }
        Err(cause) => {
          self.clear();
          return Err(cause.into());
        }
      }
    }

    let rows_read = filled / row_bytes;
    if rows_read == 0 {
      self.clear();
      return Ok(0);
    }
    if rows_read < self.rows {
      self.rows = rows_read;
      if let Err(fault) = self.data.resize(self.byte_size()) {
        self.clear();
        return Err(fault);
      }
    }
    Ok(rows_read)
  }

  /// Loads rows from the file at `path`, reading at most `max_rows` rows
  /// (0 means the default capacity). Refuses to run over an existing
  /// buffer; call [`SampleBuffer::clear`] first.
  pub fn load(&mut self, path: &Path, max_rows: usize) -> Result<usize> {
    ensure!(self.rows == 0 && self.data.is_empty(),
            Precondition,
            "buffer holds {} rows, clear it before loading '{}'",
            self.rows,
            path.display());

    let mut file = match fs::File::open(path) {
      Ok(file) => file,
      Err(cause) => {
        return fault!(Io, "cannot open '{}': {}", path.display(), cause)
      }
    };

    if max_rows > 0 {
      self.rows = max_rows;
      if let Err(fault) = self.allocate() {
        self.rows = 0;
        return Err(fault);
      }
    }
    self.load_stream(&mut file)
  }

  /// Writes the raw buffer bytes to the file at `path`, replacing any
  /// existing file.
  pub fn write(&self, path: &Path) -> Result<()> {
    match fs::write(path, self.data.as_slice()) {
      Ok(()) => Ok(()),
      Err(cause) => {
        fault!(Io, "cannot write '{}': {}", path.display(), cause)
      }
    }
  }
}

// COMPARISON -------------------------------------------------------------- //
impl SampleBuffer {
  /// True iff kind, start time, element width, column count and row count
  /// all match.
  pub fn pedigree_matches(&self, other: &Self) -> bool {
    self.kind == other.kind
    && self.start == other.start
    && self.width == other.width
    && self.cols == other.cols
    && self.rows == other.rows
  }

  /// True iff the raw sample bytes differ. Only meaningful for buffers of
  /// equal dimensions.
  pub fn content_differs(&self, other: &Self) -> bool {
    self.data.as_slice() != other.data.as_slice()
  }

  /// True iff pedigree or content differ.
  pub fn differs(&self, other: &Self) -> bool {
    !self.pedigree_matches(other) || self.content_differs(other)
  }
}

// METADATA ---------------------------------------------------------------- //
impl SampleBuffer {
  /// Stores a metadata string at `index`, growing the list with empty
  /// entries as needed.
  pub fn set_meta(&mut self, index: usize, text: &str) {
    if index > META_INDEX_SANITY {
      warn!("metadata index {} looks implausibly large", index);
    }
    if index >= self.meta.len() {
      self.meta.resize(index + 1, String::new());
    }
    self.meta[index] = text.to_string();
  }

  /// The metadata string at `index`, or `None` beyond the list.
  pub fn meta_item(&self, index: usize) -> Option<&str> {
    self.meta.get(index).map(|entry| entry.as_str())
  }
}

impl fmt::Display for SampleBuffer {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f,
           "{} buffer: {} rows x {} cols ({} bytes/sample), start {}, end {}",
           self.kind, self.rows, self.cols, self.width, self.start, self.end)
  }
}


/// Reads one double precision sample from an 8 byte chunk in memory order.
pub(crate) fn float_from(chunk: &[u8]) -> f64 {
  f64::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3], chunk[4],
                      chunk[5], chunk[6], chunk[7]])
}

/// Writes one double precision sample into an 8 byte chunk in memory order.
pub(crate) fn float_into(chunk: &mut [u8], value: f64) {
  chunk.copy_from_slice(&value.to_ne_bytes());
}
