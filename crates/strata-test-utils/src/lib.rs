//! Shared test utilities for the Strata workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each build their own registries and models. It is a dev-dependency only,
//! never published.
//!
//! # Modules
//!
//! - [`fixtures`]: models from JSON and a typical editor registry
//! - [`settings_dir`]: [`SettingsDir`] for settings files on disk

pub mod fixtures;
pub mod settings_dir;

pub use fixtures::{editor_registry, model, parse_model};
pub use settings_dir::SettingsDir;
