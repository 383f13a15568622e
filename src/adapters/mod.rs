// Adapters layer: rendering and persistence of finished reports.

pub mod report_writer;
