//! Cross-module test suites
//!
//! The manager, recording and status suites run against an in-memory
//! adapter implementing the full `SchemaAdapter` contract, so the
//! reconciliation and inversion logic is exercised end to end without a
//! database server.

mod mock;

mod prefix_tests;
mod recording_tests;
