//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! Call sites stay valid when the option structs gain fields.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// use saphyr_json::DuplicateKeyPolicy;
///
/// let options = saphyr_json::options! {
///     duplicate_keys: DuplicateKeyPolicy::Error,
///     strict_booleans: false,
/// };
/// assert!(!options.strict_booleans);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let budget = saphyr_json::budget! {
///     max_documents: 2,
///     max_aliases: 10,
/// };
/// assert_eq!(budget.max_documents, 2);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            {
                budget.$field = $value;
            }
        )*
        budget
    }};
}

/// Construct [`crate::JsonOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let json = saphyr_json::json_options! { pretty: true };
/// assert!(json.pretty && !json.escape_html);
/// ```
#[macro_export]
macro_rules! json_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::JsonOptions::default();
        $(
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}
