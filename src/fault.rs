// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use serde::Deserialize;
use std::{collections::TryReserveError, error, fmt, num, result, str};


/// timebuf's result type `Result` is used by every fallible operation in
/// the crate.
pub type Result<T> = result::Result<T, Fault>;


#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Error type used throughout timebuf to bubble failures back to callers.
///
/// Every variant names a failure kind and carries human readable context,
/// so calling code can match on what went wrong while log output stays
/// debuggable without a stack trace.
///
/// It is strongly recommended to use `Fault` through the `fault!` macro,
/// which takes the kind as its first argument followed by the same
/// parameters as the `format!` macro and returns an `Err(Fault)`. See the
/// macro documentation for a code example.
pub enum Fault {
  /// Buffer storage could not be (re)sized.
  Allocation(String),
  /// An open, read, write or close failed.
  Io(String),
  /// A header, line or date string did not match the expected grammar.
  Format(String),
  /// A pedigree, sort order, tolerance or column count check failed.
  Validation(String),
  /// An operation was invoked in a state or environment it refuses to run
  /// in, e.g. a non-UTC time zone or a buffer which must be cleared first.
  Precondition(String),
}

impl Fault {
  /// Short kind tag, stable regardless of context message.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Allocation(_) => "allocation",
      Self::Io(_) => "io",
      Self::Format(_) => "format",
      Self::Validation(_) => "validation",
      Self::Precondition(_) => "precondition",
    }
  }

  /// Human readable context carried by this fault.
  pub fn context(&self) -> &str {
    match self {
      Self::Allocation(msg)
      | Self::Io(msg)
      | Self::Format(msg)
      | Self::Validation(msg)
      | Self::Precondition(msg) => msg,
    }
  }
}

/// The following traits - `fmt::Display` and `error::Error` - are required
/// in addition to deriving the `Debug` trait for `Fault` to implement the
/// `error::Error` trait fully.
impl fmt::Display for Fault {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}: {}", self.kind(), self.context())
  }
}

impl error::Error for Fault {}


/// This macro - internal use only - generates the implementation of the
/// `From` trait for `Fault` for a given list of type to kind mappings.
macro_rules! implement_from {
  ($($ErrType:ty => $kind:ident),*) => {$(
    impl From<$ErrType> for Fault {
      fn from(error: $ErrType) -> Self {
        Self::$kind(error.to_string())
      }
    }
  )*}
}

// here the macro is called with the types used in our codebase
implement_from!(std::io::Error => Io,
                TryReserveError => Allocation,
                chrono::ParseError => Format,
                str::Utf8Error => Format,
                num::ParseIntError => Format,
                num::ParseFloatError => Format);


/// The `fault!` macro provides an easy way to return classified errors
/// from functions returning a `Result`. It takes the error kind followed
/// by something which can be formatted using the `format!` macro and
/// returns an `Err(Fault)`. You can use it in your code as follows:
///
/// ```ignore
/// match something {
///   Ok(()) => Ok(()),  // the world is a happy place
///   Err(err) => fault!(Io, "error \"{}\" could not be resolved", err),
/// }
/// ```
#[macro_export]
macro_rules! fault {
  ($kind:ident, $($arg:tt)*) => {
    Err($crate::fault::Fault::$kind(format!($($arg)*)))
  }
}


/// The `ensure!` macro provides an easy way to make sure a condition is
/// true, and if not, return an `Err(Fault)` of the given kind (exactly as
/// `fault!` does - `ensure!` is actually implemented on top of `fault!`).
/// Use it as follows:
///
/// ```ignore
/// fn my_function(&self) -> Result<()> {
///   ensure!(self.has_enough_fish(),
///           Validation,
///           "sorry, only {} fish",
///           self.fish());
/// }
/// ```
#[macro_export]
macro_rules! ensure {
  ($cond:expr, $kind:ident, $($arg:tt)*) => {
    if !($cond) { return fault!($kind, $($arg)*) }
  }
}
