//! Property-based test suite entry point.

mod pipeline_properties;
