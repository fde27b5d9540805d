//! Unit test suite entry point.

mod batch_tests;
mod config_tests;
mod report_snapshot_tests;
mod scenario_tests;
