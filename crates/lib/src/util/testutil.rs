//! Test utilities for l10nsync-lib.

/// A small but complete two-target project manifest.
pub const SAMPLE_MANIFEST: &str = include_str!("../../tests/fixtures/App.pbxproj");

/// Non-overlapping occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
  haystack.matches(needle).count()
}
