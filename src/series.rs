// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{clock::Clock,
            ensure,
            fault,
            fault::Result,
            sample_buffer::{float_from, float_into, BufferKind, SampleBuffer}};
use getset::{CopyGetters, Getters, MutGetters};
use std::{fmt, io, io::Write};


/// Relative tolerance when comparing sample rates on append.
const RATE_GRACE: f64 = 0.01;

/// Largest acceptable gap between two series, in sample periods.
const GAP_GRACE: f64 = 1.1;


/// Sample buffer with a constant sample rate.
///
/// The end time follows from start time, rate and row count; call
/// [`RegularSeries::derive_end_time`] after any mutation that changes rows
/// or rate.
#[derive(Clone, Debug, PartialEq, CopyGetters, Getters, MutGetters)]
pub struct RegularSeries {
  #[getset(get = "pub", get_mut = "pub")]
  buffer: SampleBuffer,
  /// Samples per second.
  #[getset(get_copy = "pub")]
  rate:   f64,
}

impl Default for RegularSeries {
  fn default() -> Self {
    Self::new(0.0)
  }
}

impl RegularSeries {
  /// Creates an empty series of single column, 4 byte integer samples.
  pub fn new(rate: f64) -> Self {
    Self::with_layout(rate, 4, 1)
  }

  /// Creates an empty series with an explicit element width and column
  /// count.
  pub fn with_layout(rate: f64, width: usize, cols: usize) -> Self {
    Self { buffer: SampleBuffer::with_layout(BufferKind::TimeSeries,
                                             width,
                                             cols),
           rate }
  }

  pub fn set_rate(&mut self, rate: f64) {
    self.rate = rate;
  }

  /// Recomputes the cached end time: `start + (rows - 1) / rate`, or just
  /// `start` while the series is empty.
  pub fn derive_end_time(&mut self) {
    let end = if self.buffer.rows() == 0 || self.rate <= 0.0 {
      self.buffer.start()
    } else {
      self.buffer.start()
      + Clock::from_secs_f64((self.buffer.rows() - 1) as f64 / self.rate)
    };
    self.buffer.set_end(end);
  }

  /// Covered time span in seconds, `(rows - 1) / rate`. Negative for an
  /// empty series; callers wanting zero for empty must special-case that.
  pub fn length_seconds(&self) -> f64 {
    (self.buffer.rows() as f64 - 1.0) / self.rate
  }

  /// Concatenates `other` onto this series.
  ///
  /// Unless `force` is set, validates that the layouts match, that the
  /// sample rates agree within [`RATE_GRACE`] and that `other` starts
  /// within [`GAP_GRACE`] sample periods after this series ends. On any
  /// validation failure nothing is mutated. On success the row count grows
  /// by `other`'s rows and the end time is rederived.
  pub fn append(&mut self, other: &Self, force: bool) -> Result<()> {
    ensure!(!other.buffer.is_empty(),
            Validation,
            "cannot append an empty series");

    if !force {
      ensure!(self.buffer.kind() == other.buffer.kind()
              && self.buffer.width() == other.buffer.width()
              && self.buffer.cols() == other.buffer.cols(),
              Validation,
              "series layouts do not match: [{}] vs [{}]",
              self.buffer,
              other.buffer);
      ensure!(self.rate > 0.0,
              Validation,
              "sample rate must be positive to append");
      ensure!((self.rate - other.rate).abs() <= RATE_GRACE * self.rate,
              Validation,
              "sample rates differ by more than {}%: {} vs {}",
              RATE_GRACE * 100.0,
              self.rate,
              other.rate);

      self.derive_end_time();
      let gap = other.buffer.start() - self.buffer.end();
      ensure!(gap >= Clock::default()
              && gap <= Clock::from_secs_f64(GAP_GRACE / self.rate),
              Validation,
              "time gap of {}s is outside [0, {}]s",
              gap,
              GAP_GRACE / self.rate);
    }

    self.buffer.append_row_bytes(other.buffer.bytes())?;
    self.derive_end_time();
    Ok(())
  }

  /// Sum over all samples, interpreted per the element width: 4 byte
  /// elements are signed integers, 8 byte elements are doubles.
  pub fn sum(&self) -> Result<f64> {
    let bytes = self.buffer.bytes();
    match self.buffer.width() {
      4 => Ok(bytes.chunks_exact(4).map(int_sample).map(f64::from).sum()),
      8 => Ok(bytes.chunks_exact(8).map(float_from).sum()),
      width => {
        fault!(Validation, "no sample interpretation for {} byte elements",
               width)
      }
    }
  }

  /// Subtracts the arithmetic mean from every sample.
  pub fn remove_dc(&mut self) -> Result<()> {
    let count = self.buffer.rows() * self.buffer.cols();
    if count == 0 {
      return Ok(());
    }
    let mean = self.sum()? / count as f64;

    match self.buffer.width() {
      4 => {
        for chunk in self.buffer.bytes_mut().chunks_exact_mut(4) {
          let sample = (f64::from(int_sample(chunk)) - mean) as i32;
          chunk.copy_from_slice(&sample.to_ne_bytes());
        }
      }
      8 => {
        for chunk in self.buffer.bytes_mut().chunks_exact_mut(8) {
          let sample = float_from(chunk) - mean;
          float_into(chunk, sample);
        }
      }
      width => {
        return fault!(Validation,
                      "no sample interpretation for {} byte elements",
                      width)
      }
    }
    Ok(())
  }

  /// Writes the samples as ASCII, one per line.
  pub fn write_stream(&self, out: &mut dyn io::Write) -> Result<()> {
    let bytes = self.buffer.bytes();
    match self.buffer.width() {
      4 => {
        for chunk in bytes.chunks_exact(4) {
          writeln!(out, "{}", int_sample(chunk))?;
        }
      }
      8 => {
        for chunk in bytes.chunks_exact(8) {
          writeln!(out, "{}", float_from(chunk))?;
        }
      }
      width => {
        return fault!(Validation,
                      "no sample interpretation for {} byte elements",
                      width)
      }
    }
    Ok(())
  }
}

impl fmt::Display for RegularSeries {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} at {} Hz", self.buffer, self.rate)
  }
}


fn int_sample(chunk: &[u8]) -> i32 {
  i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn int_series(rate: f64, start: Clock, samples: &[i32]) -> RegularSeries {
    let mut series = RegularSeries::new(rate);
    series.buffer_mut().set_start(start);
    let bytes: Vec<u8> =
      samples.iter().flat_map(|sample| sample.to_ne_bytes()).collect();
    series.buffer_mut().append_row_bytes(&bytes).unwrap();
    series.derive_end_time();
    series
  }

  fn float_series(rate: f64, start: Clock, samples: &[f64]) -> RegularSeries {
    let mut series = RegularSeries::with_layout(rate, 8, 1);
    series.buffer_mut().set_start(start);
    let bytes: Vec<u8> =
      samples.iter().flat_map(|sample| sample.to_ne_bytes()).collect();
    series.buffer_mut().append_row_bytes(&bytes).unwrap();
    series.derive_end_time();
    series
  }

  #[test]
  fn derive_end_time_test() {
    let series = int_series(100.0, Clock::new(10, 0), &[1, 2, 3]);
    assert_eq!(Clock::new(10, 20_000), series.buffer().end());

    let mut empty = RegularSeries::new(100.0);
    empty.buffer_mut().set_start(Clock::new(10, 0));
    empty.derive_end_time();
    assert_eq!(Clock::new(10, 0), empty.buffer().end());
  }

  #[test]
  fn length_seconds_test() {
    let series = int_series(100.0, Clock::default(), &[1, 2, 3]);
    assert_eq!(0.02, series.length_seconds());
    assert!(RegularSeries::new(100.0).length_seconds() < 0.0);
  }

  #[test]
  fn append_test() {
    // 100 Hz, so rows 0..=2 cover [10.00, 10.02] and the next sample is
    // due at 10.03
    let mut head = int_series(100.0, Clock::new(10, 0), &[1, 2, 3]);
    let tail = int_series(100.0, Clock::new(10, 30_000), &[4, 5]);

    head.append(&tail, false).unwrap();
    assert_eq!(5, head.buffer().rows());
    assert_eq!(Clock::new(10, 40_000), head.buffer().end());
    assert_eq!(15.0, head.sum().unwrap());
  }

  #[test]
  fn append_rejects_test() {
    let pristine = int_series(100.0, Clock::new(10, 0), &[1, 2, 3]);

    // rates further apart than 1%
    let mut head = pristine.clone();
    let tail = int_series(102.0, Clock::new(10, 30_000), &[4, 5]);
    assert!(head.append(&tail, false).is_err());
    assert_eq!(pristine, head);

    // overlap: tail starts before this series ends
    let mut head = pristine.clone();
    let tail = int_series(100.0, Clock::new(10, 10_000), &[4, 5]);
    assert!(head.append(&tail, false).is_err());
    assert_eq!(pristine, head);

    // gap beyond 1.1 sample periods after the end
    let mut head = pristine.clone();
    let tail = int_series(100.0, Clock::new(10, 40_000), &[4, 5]);
    assert!(head.append(&tail, false).is_err());
    assert_eq!(pristine, head);

    // empty sources are rejected even when forced
    let mut head = pristine.clone();
    assert!(head.append(&RegularSeries::new(100.0), true).is_err());

    // force skips the gap validation
    let mut head = pristine.clone();
    let tail = int_series(100.0, Clock::new(12, 0), &[4, 5]);
    head.append(&tail, true).unwrap();
    assert_eq!(5, head.buffer().rows());
  }

  #[test]
  fn sum_and_remove_dc_test() {
    let mut series = int_series(100.0, Clock::default(), &[1, 2, 3]);
    assert_eq!(6.0, series.sum().unwrap());

    series.remove_dc().unwrap();
    assert_eq!(0.0, series.sum().unwrap());
    let bytes: Vec<u8> =
      [-1i32, 0, 1].iter().flat_map(|sample| sample.to_ne_bytes()).collect();
    assert_eq!(&bytes[..], series.buffer().bytes());

    let mut series = float_series(100.0, Clock::default(), &[1.5, 2.5]);
    assert_eq!(4.0, series.sum().unwrap());
    series.remove_dc().unwrap();
    assert_eq!(0.0, series.sum().unwrap());
  }

  #[test]
  fn write_stream_test() {
    let series = int_series(100.0, Clock::default(), &[1, -2, 3]);
    let mut out = Vec::new();
    series.write_stream(&mut out).unwrap();
    assert_eq!("1\n-2\n3\n", String::from_utf8(out).unwrap());

    let series = float_series(100.0, Clock::default(), &[1.5, -0.25]);
    let mut out = Vec::new();
    series.write_stream(&mut out).unwrap();
    assert_eq!("1.5\n-0.25\n", String::from_utf8(out).unwrap());
  }
}
