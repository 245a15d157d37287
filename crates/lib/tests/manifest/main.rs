//! Integration tests for manifest patching and the sync pipeline.

mod common;
mod patch_tests;
mod sync_tests;
