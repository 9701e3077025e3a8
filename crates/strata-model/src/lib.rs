//! Configuration models for Strata.
//!
//! This crate turns settings sources into [`ConfigurationModel`]s:
//!
//! - [`visitor`]: JSON event source with comment and trailing-comma support
//! - [`raw_parser`]: registry-driven filtering of raw settings objects
//! - [`parser`]: named parsers that can re-filter without re-reading text
//! - [`model`]: value lookup, override buckets, merging and mutation
//! - [`compare`]: diffs between models and change descriptors
//! - [`defaults`]: default and policy layers built from the registry

pub mod compare;
pub mod data;
pub mod defaults;
pub mod inspect;
pub mod model;
pub mod parse_options;
pub mod parser;
pub mod raw_parser;
pub mod visitor;

pub use compare::{ConfigurationChange, ConfigurationCompareResult, compare, merge_changes};
pub use data::{ConfigurationModelData, RawSourceData};
pub use defaults::{default_configuration_model, policy_configuration_model};
pub use inspect::{InspectValue, ModelInspection, OverrideValue};
pub use model::{ConfigurationModel, ModelView, OverrideBucket, RawSource};
pub use parse_options::ParseOptions;
pub use parser::ConfigurationModelParser;
pub use raw_parser::{RawParseResult, RawParser};
pub use visitor::{JsonVisitor, ParseError, ParseErrorCode, visit};
