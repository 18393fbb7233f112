// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use pretty_assertions::assert_eq;
use timebuf::{FileFormat, LabeledTable};


fn sensor_table() -> LabeledTable {
  let content = "LABELS = time\tma4\tma5\n\
                 1 2.5 3\n\
                 4 5.5 6\n";
  let mut table = LabeledTable::new();
  table.load_labels_stream(&mut content.as_bytes(), None)
       .expect("labels parse");
  table
}

#[test]
fn binary_file_round_trip() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("day.tbl");

  let table = sensor_table();
  table.store_binary(&path).expect("store");

  let mut reread = LabeledTable::new();
  reread.load_binary(&path).expect("load");

  assert!(!table.differs(&reread));
  assert_eq!(table.labels(), reread.labels());
  assert_eq!(table.buffer().cols(), reread.buffer().cols());
  assert_eq!(table.buffer().rows(), reread.buffer().rows());
  assert_eq!(table.buffer().bytes(), reread.buffer().bytes());
}

#[test]
fn ascii_export_reimports() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("day.fb");

  let table = sensor_table();
  let mut out = Vec::new();
  table.write_stream(&mut out).expect("export");
  std::fs::write(&path, &out).expect("write file");

  let mut reread = LabeledTable::new();
  assert_eq!(2,
             reread.load(&path, FileFormat::Labels, None).expect("reload"));
  assert!(!table.differs(&reread));
}

#[test]
fn column_subset_on_reload() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("wide.fb");
  std::fs::write(&path,
                 "LABELS = time\ta\tb\tc\tma4\tma5\n\
                  1 9 9 9 2 3\n\
                  4 9 9 9 5 6\n").expect("write file");

  let mut table = LabeledTable::new();
  table.load(&path, FileFormat::Labels, Some("%lf%*lf%*lf%*lf%lf%lf"))
       .expect("subset load");

  assert!(!table.differs(&sensor_table()));
}
