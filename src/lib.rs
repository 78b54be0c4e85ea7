//! Order-preserving YAML to JSON conversion.
//!
//! YAML text is parsed with `saphyr-parser`, composed into a node [`Tree`] and then
//! converted by [`jsonify`] into a [`Value`] that always serializes as valid JSON:
//!
//! - mapping keys keep their source order, including keys brought in by `<<` merges;
//! - NaN and the infinities can be replaced by configurable sentinels;
//! - cyclic aliases and "billion laughs" style alias expansion are rejected, while
//!   legitimate heavy use of aliases in small documents is still accepted.
//!
//! ```rust
//! let yaml = "defaults: &d {retries: 3, verbose: false}\nprod:\n  <<: *d\n  verbose: true\n";
//! let value = saphyr_json::from_str(yaml).unwrap();
//! assert_eq!(
//!     saphyr_json::to_string(&value).unwrap(),
//!     r#"{"defaults":{"retries":3,"verbose":false},"prod":{"retries":3,"verbose":true}}"#
//! );
//! ```

pub use alias_guard::allowed_alias_ratio;
pub use budget::{Budget, BudgetBreach, BudgetReport};
pub use compose::{check_yaml_budget, compose_str};
pub use decoder::{
    from_json_str, from_multiple, from_multiple_with_options, from_reader,
    from_reader_multiple_with_options, from_reader_with_options, from_slice,
    from_slice_with_options, from_str, from_str_with_options,
};
pub use error::Error;
pub use json::{JsonOptions, to_string, to_string_pretty, to_string_with_options, to_writer_with_options};
pub use jsonify::{DecodeReport, jsonify};
pub use location::Location;
pub use node::{Node, NodeId, NodeKind, ScalarStyle, Tree, TreeBuilder};
pub use normalize::normalize_float;
pub use options::{AliasLimits, DuplicateKeyPolicy, KeyMarshal, Options};
pub use ordered_map::OrderedMap;
pub use value::{Number, Value};

mod alias_guard;
pub mod budget;
mod compose;
mod decoder;
mod error;
mod json;
mod jsonify;
mod location;
#[macro_use]
mod macros;
mod merge;
mod node;
mod normalize;
pub mod options;
pub mod ordered_map;
mod parse_scalars;
#[cfg(feature = "snippets")]
mod snippet;
mod tags;
mod value;
