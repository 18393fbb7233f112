// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::fault::Result;


/// Owned byte storage backing a sample buffer.
///
/// All size changes go through [`RawBuffer::resize`] or
/// [`RawBuffer::extend_from_slice`], both of which report allocation failure
/// as a recoverable fault instead of aborting the process. New bytes are
/// always zero-filled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawBuffer {
  bytes: Vec<u8>,
}

impl RawBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a zero-filled buffer of `len` bytes.
  pub fn with_len(len: usize) -> Result<Self> {
    let mut buffer = Self::default();
    buffer.resize(len)?;
    Ok(buffer)
  }

  /// Grows (zero-filling) or truncates the buffer to exactly `len` bytes.
  /// On allocation failure the buffer is left unchanged.
  pub fn resize(&mut self, len: usize) -> Result<()> {
    if len > self.bytes.len() {
      self.bytes.try_reserve_exact(len - self.bytes.len())?;
    }
    self.bytes.resize(len, 0);
    Ok(())
  }

  /// Appends `more` at the end of the buffer.
  pub fn extend_from_slice(&mut self, more: &[u8]) -> Result<()> {
    self.bytes.try_reserve_exact(more.len())?;
    self.bytes.extend_from_slice(more);
    Ok(())
  }

  /// Releases the storage entirely, leaving an empty buffer.
  pub fn clear(&mut self) {
    self.bytes = Vec::new();
  }

  /// Overwrites every byte with zero without changing the length.
  pub fn zero(&mut self) {
    self.bytes.fill(0);
  }

  pub fn as_slice(&self) -> &[u8] {
    &self.bytes
  }

  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    &mut self.bytes
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.bytes.capacity()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn resize_test() {
    let mut buffer = RawBuffer::with_len(4).unwrap();
    assert_eq!(4, buffer.len());
    assert_eq!(&[0u8, 0, 0, 0], buffer.as_slice());

    buffer.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
    buffer.resize(6).unwrap();
    assert_eq!(&[1u8, 2, 3, 4, 0, 0], buffer.as_slice());

    buffer.resize(2).unwrap();
    assert_eq!(&[1u8, 2], buffer.as_slice());
  }

  #[test]
  fn extend_test() {
    let mut buffer = RawBuffer::new();
    buffer.extend_from_slice(&[7, 8]).unwrap();
    buffer.extend_from_slice(&[9]).unwrap();
    assert_eq!(&[7u8, 8, 9], buffer.as_slice());
  }

  #[test]
  fn clear_and_zero_test() {
    let mut buffer = RawBuffer::with_len(3).unwrap();
    buffer.as_mut_slice().copy_from_slice(&[5, 6, 7]);

    buffer.zero();
    assert_eq!(&[0u8, 0, 0], buffer.as_slice());
    assert_eq!(3, buffer.len());

    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(0, buffer.capacity());
  }

  #[test]
  fn allocation_overflow_test() {
    assert!(RawBuffer::with_len(usize::MAX).is_err());

    let mut buffer = RawBuffer::with_len(2).unwrap();
    assert!(buffer.resize(usize::MAX).is_err());
    assert_eq!(2, buffer.len());
  }
}
