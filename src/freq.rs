// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::sample_buffer::{BufferKind, SampleBuffer};
use getset::{CopyGetters, Getters, MutGetters};
use std::fmt;


/// Placeholder for a frequency-domain series. Carries the buffer and its
/// frequency resolution; the transform pipeline which fills these lives
/// elsewhere, so the resolution stays NaN until set.
#[derive(Clone, Debug, CopyGetters, Getters, MutGetters)]
pub struct FreqSeries {
  #[getset(get = "pub", get_mut = "pub")]
  buffer:     SampleBuffer,
  #[getset(get_copy = "pub")]
  resolution: f64,
}

impl Default for FreqSeries {
  fn default() -> Self {
    Self::new()
  }
}

impl FreqSeries {
  pub fn new() -> Self {
    Self { buffer:     SampleBuffer::with_layout(BufferKind::Frequency, 8, 1),
           resolution: f64::NAN, }
  }

  pub fn set_resolution(&mut self, resolution: f64) {
    self.resolution = resolution;
  }
}

impl fmt::Display for FreqSeries {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}, {} Hz resolution", self.buffer, self.resolution)
  }
}


/// Placeholder for a spectrogram, a frequency over time buffer. Like
/// [`FreqSeries`], resolution and rate stay NaN until a transform sets
/// them.
#[derive(Clone, Debug, CopyGetters, Getters, MutGetters)]
pub struct Spectrogram {
  #[getset(get = "pub", get_mut = "pub")]
  buffer:     SampleBuffer,
  #[getset(get_copy = "pub")]
  resolution: f64,
  #[getset(get_copy = "pub")]
  rate:       f64,
}

impl Default for Spectrogram {
  fn default() -> Self {
    Self::new()
  }
}

impl Spectrogram {
  pub fn new() -> Self {
    Self { buffer:
             SampleBuffer::with_layout(BufferKind::FrequencyTime, 8, 1),
           resolution: f64::NAN,
           rate: f64::NAN, }
  }

  pub fn set_resolution(&mut self, resolution: f64) {
    self.resolution = resolution;
  }

  pub fn set_rate(&mut self, rate: f64) {
    self.rate = rate;
  }
}

impl fmt::Display for Spectrogram {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f,
           "{}, {} Hz resolution at {} Hz",
           self.buffer, self.resolution, self.rate)
  }
}
