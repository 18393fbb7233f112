// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

mod clock;
mod config;
mod dataset;
mod event_table;
mod fault;
mod freq;
mod labeled_table;
mod lock;
mod logger;
mod raw_buffer;
mod sample_buffer;
mod series;

pub use clock::Clock;
pub use config::Config;
pub use dataset::{AnyDataset, Dataset};
pub use event_table::EventTable;
pub use fault::{Fault, Result};
pub use freq::{FreqSeries, Spectrogram};
pub use labeled_table::{FileFormat, LabeledTable, LABEL_LENGTH, MAX_COLS};
pub use lock::{Acquire, LockState, PidLock, Release};
pub use logger::Logger;
pub use raw_buffer::RawBuffer;
pub use sample_buffer::{BufferKind, SampleBuffer, DEFAULT_ROW_CAPACITY};
pub use series::RegularSeries;
