//! CLI integration tests.

mod common;
mod patch_tests;
mod sync_tests;
