// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{ensure,
            fault,
            fault::Result,
            sample_buffer::{float_from, float_into, BufferKind, SampleBuffer}};
use getset::{Getters, MutGetters};
use log::warn;
use std::{fmt, fs, io, io::Write, path::Path, str};


/// Size of one label slot in the binary format, terminator included.
pub const LABEL_LENGTH: usize = 64;

/// Hard column limit, shared by the ASCII and binary forms.
pub const MAX_COLS: usize = 32;

const MAX_LINE_LENGTH: usize = 4_096;

/// Row growth granularity while reading ASCII tables of unknown length.
const ROW_PAGE: usize = 1_024;

const LABEL_PREFIX: &str = "LABELS = ";


/// On-disk representations a table can be read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFormat {
  Native,
  Binary,
  Ascii,
  Wav,
  Labels,
}

impl fmt::Display for FileFormat {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      Self::Native => "native",
      Self::Binary => "binary",
      Self::Ascii => "ascii",
      Self::Wav => "wav",
      Self::Labels => "labels",
    };
    write!(f, "{}", name)
  }
}


/// Table of named double precision columns.
///
/// Loads from the ASCII labels format (a `LABELS = ` header naming the
/// columns, then one whitespace-separated row per line, optionally
/// filtered down to a column subset by a scanf style format string) and
/// round-trips through a fixed binary layout. All values are stored as
/// doubles regardless of how a column was declared.
#[derive(Clone, Debug, PartialEq, Getters, MutGetters)]
pub struct LabeledTable {
  #[getset(get = "pub", get_mut = "pub")]
  buffer: SampleBuffer,
  #[getset(get = "pub")]
  labels: Vec<String>,
}

impl Default for LabeledTable {
  fn default() -> Self {
    Self::new()
  }
}

impl LabeledTable {
  pub fn new() -> Self {
    Self { buffer: SampleBuffer::with_layout(BufferKind::Labeled, 8, 0),
           labels: Vec::new(), }
  }

  /// The label of column `which`, or `None` beyond the table.
  pub fn label(&self, which: usize) -> Option<&str> {
    self.labels.get(which).map(|label| label.as_str())
  }

  /// The value at `row`, `col`, or `None` outside the table.
  pub fn value(&self, row: usize, col: usize) -> Option<f64> {
    if row >= self.buffer.rows() || col >= self.buffer.cols() {
      return None;
    }
    let offset = (row * self.buffer.cols() + col) * 8;
    Some(float_from(&self.buffer.bytes()[offset..offset + 8]))
  }

  /// True iff column count, row count, any label or any data byte differ.
  /// Times and metadata do not take part in the comparison.
  pub fn differs(&self, other: &Self) -> bool {
    self.buffer.cols() != other.buffer.cols()
    || self.buffer.rows() != other.buffer.rows()
    || self.labels != other.labels
    || self.buffer.content_differs(&other.buffer)
  }

  fn reset(&mut self) {
    *self = Self::new();
  }
}

// LOADING ----------------------------------------------------------------- //
impl LabeledTable {
  /// Reads the file at `path` in the given format, replacing any previous
  /// content. Only [`FileFormat::Labels`] is supported here; binary tables
  /// go through [`LabeledTable::load_binary`]. Returns the number of rows
  /// read; the table is left empty after any failure.
  pub fn load(&mut self,
              path: &Path,
              format: FileFormat,
              pattern: Option<&str>)
              -> Result<usize> {
    self.reset();
    let outcome = match format {
      FileFormat::Labels => self.load_labels(path, pattern),
      other => fault!(Validation, "read format '{}' is not supported", other),
    };
    if outcome.is_err() {
      self.reset();
    }
    outcome
  }

  fn load_labels(&mut self, path: &Path, pattern: Option<&str>)
                 -> Result<usize> {
    let file = match fs::File::open(path) {
      Ok(file) => file,
      Err(cause) => {
        return fault!(Io, "cannot open '{}': {}", path.display(), cause)
      }
    };
    self.load_labels_stream(&mut io::BufReader::new(file), pattern)
  }

  /// Stream form of the ASCII labels reader. With a format string given,
  /// only the columns of non-suppressed conversions are kept, in format
  /// order; `%*` conversions consume a field without storing it.
  pub fn load_labels_stream<R: io::BufRead>(&mut self,
                                            reader: &mut R,
                                            pattern: Option<&str>)
                                            -> Result<usize> {
    self.reset();

    let mut line = String::new();
    ensure!(reader.read_line(&mut line)? > 0,
            Format,
            "missing the label header line");
    ensure!(line.len() <= MAX_LINE_LENGTH,
            Format,
            "label header exceeds {} characters",
            MAX_LINE_LENGTH);
    let header = line.strip_suffix('\n').unwrap_or(&line);
    ensure!(header.starts_with(LABEL_PREFIX),
            Format,
            "label header must start with '{}'",
            LABEL_PREFIX);

    let named: Vec<String> = header[LABEL_PREFIX.len()..].split('\t')
                                                         .map(clipped)
                                                         .collect();
    ensure!(named.len() <= MAX_COLS,
            Format,
            "header names {} columns, the limit is {}",
            named.len(),
            MAX_COLS);

    let flags = match pattern {
      None => vec![true; named.len()],
      Some(pattern) => conversion_flags(pattern),
    };
    ensure!(flags.len() <= MAX_COLS,
            Format,
            "format string holds {} conversions, the limit is {}",
            flags.len(),
            MAX_COLS);
    ensure!(flags.len() <= named.len(),
            Format,
            "format string holds {} conversions but the header names only \
             {} columns",
            flags.len(),
            named.len());

    self.labels = flags.iter()
                       .enumerate()
                       .filter(|(_, &keep)| keep)
                       .map(|(nth, _)| named[nth].clone())
                       .collect();
    let cols = self.labels.len();
    self.buffer.set_layout(8, cols)?;

    // grow page-wise while reading, shrink to fit at end of file
    let mut parsed = 0;
    let mut capacity = 0;
    let mut number = 0;
    loop {
      line.clear();
      if reader.read_line(&mut line)? == 0 {
        break;
      }
      number += 1;
      ensure!(line.len() <= MAX_LINE_LENGTH,
              Format,
              "line {} exceeds {} characters",
              number,
              MAX_LINE_LENGTH);

      if parsed == capacity {
        capacity += ROW_PAGE;
        self.buffer.resize_rows(capacity)?;
      }

      let mut fields = line.split_whitespace();
      let mut col = 0;
      for (nth, keep) in flags.iter().enumerate() {
        let field = match fields.next() {
          Some(field) => field,
          None => {
            return fault!(Format,
                          "choked on line {}: only {} of {} fields present",
                          number,
                          nth,
                          flags.len())
          }
        };
        if !keep {
          continue;
        }
        let value = match field.parse::<f64>() {
          Ok(value) => value,
          Err(_) => {
            return fault!(Format,
                          "choked on line {}: '{}' is not a number",
                          number,
                          field)
          }
        };
        let offset = (parsed * cols + col) * 8;
        float_into(&mut self.buffer.bytes_mut()[offset..offset + 8], value);
        col += 1;
      }
      parsed += 1;
    }

    self.buffer.resize_rows(parsed)?;
    Ok(parsed)
  }
}

// APPENDING --------------------------------------------------------------- //
impl LabeledTable {
  /// Concatenates `other`'s rows after this table's. A pristine table
  /// adopts `other`'s column layout wholesale. Otherwise the column counts
  /// must match; differing labels are logged but do not block the append.
  pub fn append(&mut self, other: &Self) -> Result<()> {
    if self.buffer.is_empty() && self.labels.is_empty() {
      self.buffer
          .set_layout(other.buffer.width(), other.buffer.cols())?;
      self.labels = other.labels.clone();
    } else {
      ensure!(!other.buffer.is_empty(), Validation, "nothing to append");
      ensure!(self.buffer.cols() == other.buffer.cols(),
              Validation,
              "column counts differ: {} vs {}",
              self.buffer.cols(),
              other.buffer.cols());
      for (ours, theirs) in self.labels.iter().zip(other.labels.iter()) {
        if ours != theirs {
          warn!("column labels differ: '{}' vs '{}'", ours, theirs);
        }
      }
    }
    if other.buffer.bytes().is_empty() {
      return Ok(());
    }
    self.buffer.append_row_bytes(other.buffer.bytes())
  }
}

// BINARY FORM ------------------------------------------------------------- //
//
// uint32 column count, uint64 row count, one 64 byte label slot per
// column, then rows x cols doubles in row-major order. All little-endian.
impl LabeledTable {
  pub fn store_binary(&self, path: &Path) -> Result<()> {
    let file = match fs::File::create(path) {
      Ok(file) => file,
      Err(cause) => {
        return fault!(Io, "cannot create '{}': {}", path.display(), cause)
      }
    };
    let mut out = io::BufWriter::new(file);
    self.store_binary_stream(&mut out)?;
    out.flush()?;
    Ok(())
  }

  pub fn store_binary_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    out.write_all(&(self.buffer.cols() as u32).to_le_bytes())?;
    out.write_all(&(self.buffer.rows() as u64).to_le_bytes())?;

    for which in 0..self.buffer.cols() {
      let mut slot = [0u8; LABEL_LENGTH];
      if let Some(label) = self.labels.get(which) {
        let name = clipped(label);
        slot[..name.len()].copy_from_slice(name.as_bytes());
      }
      out.write_all(&slot)?;
    }

    for chunk in self.buffer.bytes().chunks_exact(8) {
      out.write_all(&float_from(chunk).to_le_bytes())?;
    }
    Ok(())
  }

  /// Replaces this table with the binary table at `path`. The table is
  /// left empty after any failure.
  pub fn load_binary(&mut self, path: &Path) -> Result<()> {
    self.reset();
    let outcome = self.load_binary_inner(path);
    if outcome.is_err() {
      self.reset();
    }
    outcome
  }

  fn load_binary_inner(&mut self, path: &Path) -> Result<()> {
    let file = match fs::File::open(path) {
      Ok(file) => file,
      Err(cause) => {
        return fault!(Io, "cannot open '{}': {}", path.display(), cause)
      }
    };
    self.load_binary_stream(&mut io::BufReader::new(file))
  }

  pub fn load_binary_stream<R: io::Read>(&mut self, reader: &mut R)
                                         -> Result<()> {
    self.reset();

    let mut quad = [0u8; 4];
    reader.read_exact(&mut quad)?;
    let cols = u32::from_le_bytes(quad) as usize;
    let mut oct = [0u8; 8];
    reader.read_exact(&mut oct)?;
    let rows = u64::from_le_bytes(oct) as usize;

    ensure!(cols <= MAX_COLS,
            Format,
            "binary table claims {} columns, the limit is {}",
            cols,
            MAX_COLS);
    ensure!(rows.checked_mul(cols * 8).is_some(),
            Format,
            "binary table size overflows: {} rows x {} cols",
            rows,
            cols);

    let mut slot = [0u8; LABEL_LENGTH];
    for _ in 0..cols {
      reader.read_exact(&mut slot)?;
      let end = slot.iter().position(|&byte| byte == 0).unwrap_or(LABEL_LENGTH);
      self.labels.push(str::from_utf8(&slot[..end])?.to_string());
    }

    self.buffer.set_layout(8, cols)?;
    self.buffer.resize_rows(rows)?;
    let mut value = [0u8; 8];
    for chunk in self.buffer.bytes_mut().chunks_exact_mut(8) {
      reader.read_exact(&mut value)?;
      float_into(chunk, f64::from_le_bytes(value));
    }
    Ok(())
  }
}

// ASCII EXPORT ------------------------------------------------------------ //
impl LabeledTable {
  /// Writes the table in the ASCII labels format, the inverse of
  /// [`LabeledTable::load_labels_stream`] without a format string.
  pub fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    writeln!(out, "{}{}", LABEL_PREFIX, self.labels.join("\t"))?;
    for row in 0..self.buffer.rows() {
      for col in 0..self.buffer.cols() {
        if col > 0 {
          write!(out, "\t")?;
        }
        let offset = (row * self.buffer.cols() + col) * 8;
        write!(out, "{}", float_from(&self.buffer.bytes()[offset..offset + 8]))?;
      }
      writeln!(out)?;
    }
    Ok(())
  }
}

impl fmt::Display for LabeledTable {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}, labels [{}]", self.buffer, self.labels.join(", "))
  }
}


/// Fits a column name into a label slot, leaving room for the terminator.
fn clipped(name: &str) -> String {
  let mut end = name.len().min(LABEL_LENGTH - 1);
  while !name.is_char_boundary(end) {
    end -= 1;
  }
  name[..end].to_string()
}

/// One flag per `%` conversion in a scanf style format string: `true` to
/// keep the column, `false` for suppressed (`%*`) conversions. A literal
/// `%%` is not a conversion.
fn conversion_flags(pattern: &str) -> Vec<bool> {
  let mut flags = Vec::new();
  let mut chars = pattern.chars().peekable();
  while let Some(current) = chars.next() {
    if current != '%' {
      continue;
    }
    match chars.peek() {
      Some('%') => {
        chars.next();
      }
      Some('*') => {
        chars.next();
        flags.push(false);
      }
      _ => flags.push(true),
    }
  }
  flags
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  const LABELS_FILE: &str = "LABELS = time\tma4\tma5\n\
                             1 2.5 3\n\
                             4 5.5 6\n";

  fn from_ascii(content: &str, pattern: Option<&str>) -> LabeledTable {
    let mut table = LabeledTable::new();
    table.load_labels_stream(&mut content.as_bytes(), pattern).unwrap();
    table
  }

  #[test]
  fn conversion_flags_test() {
    assert_eq!(vec![true, false, true], conversion_flags("%lf%*lf%lf"));
    assert_eq!(vec![true; 3], conversion_flags("%lf %d %u"));
    assert_eq!(vec![true], conversion_flags("100%% %lf"));
    assert!(conversion_flags("no conversions here").is_empty());
  }

  #[test]
  fn load_labels_test() {
    let table = from_ascii(LABELS_FILE, None);
    assert_eq!(3, table.buffer().cols());
    assert_eq!(2, table.buffer().rows());
    assert_eq!(Some("time"), table.label(0));
    assert_eq!(Some("ma4"), table.label(1));
    assert_eq!(Some("ma5"), table.label(2));
    assert_eq!(None, table.label(3));
    assert_eq!(Some(2.5), table.value(0, 1));
    assert_eq!(Some(6.0), table.value(1, 2));
    assert_eq!(None, table.value(2, 0));
  }

  #[test]
  fn column_subset_test() {
    let content = "LABELS = time\ta\tb\tc\tma4\tma5\n\
                   1 9 9 9 2 3\n\
                   4 9 9 9 5 6\n";
    let table = from_ascii(content, Some("%lf%*lf%*lf%*lf%lf%lf"));
    assert_eq!(3, table.buffer().cols());
    assert_eq!(vec!["time", "ma4", "ma5"],
               table.labels().iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(Some(1.0), table.value(0, 0));
    assert_eq!(Some(2.0), table.value(0, 1));
    assert_eq!(Some(3.0), table.value(0, 2));
    assert_eq!(Some(5.0), table.value(1, 1));
  }

  #[test]
  fn load_labels_rejects_test() {
    let mut table = LabeledTable::new();

    // not a labels header
    let content = "COLUMNS = a\tb\n1 2\n";
    assert!(table.load_labels_stream(&mut content.as_bytes(), None).is_err());

    // short line
    let content = "LABELS = a\tb\n1 2\n1\n";
    assert!(table.load_labels_stream(&mut content.as_bytes(), None).is_err());

    // not a number
    let content = "LABELS = a\tb\n1 x\n";
    assert!(table.load_labels_stream(&mut content.as_bytes(), None).is_err());

    // more conversions than header columns
    let content = "LABELS = a\n1\n";
    assert!(table.load_labels_stream(&mut content.as_bytes(), Some("%lf%lf"))
                 .is_err());
  }

  #[test]
  fn load_resets_on_failure_test() {
    let mut table = from_ascii(LABELS_FILE, None);
    assert_eq!(2, table.buffer().rows());

    let content = "LABELS = a\tb\n1 x\n";
    assert!(table.load_labels_stream(&mut content.as_bytes(), None).is_err());
    assert_eq!(0, table.buffer().rows());
    assert!(table.labels().is_empty());
  }

  #[test]
  fn paged_growth_test() {
    let mut content = String::from("LABELS = n\n");
    for nth in 0..1_500 {
      content.push_str(&format!("{}\n", nth));
    }
    let table = from_ascii(&content, None);
    assert_eq!(1_500, table.buffer().rows());
    assert_eq!(table.buffer().byte_size(), table.buffer().bytes().len());
    assert_eq!(Some(0.0), table.value(0, 0));
    assert_eq!(Some(1_499.0), table.value(1_499, 0));
  }

  #[test]
  fn format_dispatch_test() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.fb");
    std::fs::write(&path, LABELS_FILE).unwrap();

    let mut table = LabeledTable::new();
    assert_eq!(2, table.load(&path, FileFormat::Labels, None).unwrap());
    assert!(table.load(&path, FileFormat::Wav, None).is_err());
    assert!(table.load(&path, FileFormat::Native, None).is_err());
    // the failed load leaves an empty table behind
    assert!(table.buffer().is_empty());
  }

  #[test]
  fn append_test() {
    let day_one = from_ascii(LABELS_FILE, None);
    let day_two = from_ascii("LABELS = time\tma4\tma5\n7 8 9\n", None);

    // adopting an empty table onto an empty table is a no-op
    let mut blank = LabeledTable::new();
    blank.append(&LabeledTable::new()).unwrap();
    assert!(blank.buffer().is_empty());

    // a pristine table adopts the layout wholesale
    let mut merged = LabeledTable::new();
    merged.append(&day_one).unwrap();
    assert_eq!(2, merged.buffer().rows());
    assert_eq!(day_one.labels(), merged.labels());

    merged.append(&day_two).unwrap();
    assert_eq!(3, merged.buffer().rows());
    assert_eq!(Some(7.0), merged.value(2, 0));
    assert_eq!(Some(9.0), merged.value(2, 2));

    // column count mismatches are hard failures
    let narrow = from_ascii("LABELS = a\n1\n", None);
    assert!(merged.append(&narrow).is_err());

    // appending nothing onto a non-empty table is refused
    assert!(merged.append(&LabeledTable::new()).is_err());

    // differing labels only warn
    let relabeled = from_ascii("LABELS = time\tmb4\tmb5\n7 8 9\n", None);
    merged.append(&relabeled).unwrap();
    assert_eq!(4, merged.buffer().rows());
  }

  #[test]
  fn binary_round_trip_test() {
    let table = from_ascii(LABELS_FILE, None);

    let mut bytes: Vec<u8> = Vec::new();
    table.store_binary_stream(&mut bytes).unwrap();
    assert_eq!(4 + 8 + 3 * LABEL_LENGTH + 2 * 3 * 8, bytes.len());

    let mut reread = LabeledTable::new();
    reread.load_binary_stream(&mut &bytes[..]).unwrap();
    assert!(!table.differs(&reread));
    assert_eq!(table.labels(), reread.labels());
    assert_eq!(table.buffer().rows(), reread.buffer().rows());
  }

  #[test]
  fn binary_file_round_trip_test() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.bin");

    let table = from_ascii(LABELS_FILE, None);
    table.store_binary(&path).unwrap();

    let mut reread = LabeledTable::new();
    reread.load_binary(&path).unwrap();
    assert!(!table.differs(&reread));

    // truncated files leave an empty table behind
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(reread.load_binary(&path).is_err());
    assert!(reread.buffer().is_empty());
    assert!(reread.labels().is_empty());
  }

  #[test]
  fn differs_test() {
    let table = from_ascii(LABELS_FILE, None);

    let mut same = table.clone();
    assert!(!table.differs(&same));

    same.buffer_mut().bytes_mut()[0] ^= 0xff;
    assert!(table.differs(&same));

    let relabeled = from_ascii("LABELS = time\tmb4\tma5\n1 2.5 3\n4 5.5 6\n",
                               None);
    assert!(table.differs(&relabeled));

    let shorter = from_ascii("LABELS = time\tma4\tma5\n1 2.5 3\n", None);
    assert!(table.differs(&shorter));
  }

  #[test]
  fn label_truncation_test() {
    let long_label = "x".repeat(70);
    let content = format!("LABELS = {}\n1\n", long_label);
    let table = from_ascii(&content, None);
    assert_eq!(LABEL_LENGTH - 1, table.label(0).unwrap().len());
  }

  #[test]
  fn ascii_write_round_trip_test() {
    let table = from_ascii(LABELS_FILE, None);
    let mut out = Vec::new();
    table.write_stream(&mut out).unwrap();
    assert_eq!("LABELS = time\tma4\tma5\n1\t2.5\t3\n4\t5.5\t6\n",
               String::from_utf8(out.clone()).unwrap());

    let mut reread = LabeledTable::new();
    reread.load_labels_stream(&mut &out[..], None).unwrap();
    assert!(!table.differs(&reread));
  }
}
