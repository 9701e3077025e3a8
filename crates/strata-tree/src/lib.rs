//! Dotted-key value trees for Strata
//!
//! This crate provides the single tree primitive every other Strata crate
//! builds on: reading, writing, removing and deep-merging values addressed
//! by dotted keys inside a `serde_json` object.

pub mod value_tree;

pub use value_tree::{
    TreeConflict, ValueTree, add_to_value_tree, get_value, leaf_keys, merge_contents,
    remove_from_value_tree, to_values_tree,
};
