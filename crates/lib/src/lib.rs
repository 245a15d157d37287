//! l10nsync-lib: localization pipeline for Xcode projects
//!
//! This crate provides the stages of a sync:
//! - `fetch`: retrieves the translation table from a URL or file
//! - `table`: parses the CSV table into keys, comments and translations
//! - `generate`: writes per-language `.strings` files and a Swift accessor
//! - `project`: registers the generated files in the `project.pbxproj` manifest
//! - `pipeline`: runs the stages in order with cooperative cancellation

pub mod config;
pub mod consts;
pub mod fetch;
pub mod generate;
pub mod pipeline;
pub mod project;
pub mod table;
pub mod util;
