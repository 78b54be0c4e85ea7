use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::budget::{Budget, BudgetReport};
use crate::jsonify::DecodeReport;
use crate::value::Value;

/// Duplicate key handling policy for mappings.
///
/// Applies to explicit keys only; keys supplied by `<<` merges never conflict with
/// explicit ones.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Error out on encountering a duplicate key.
    Error,
    /// First key wins: later duplicate pairs are converted and then dropped.
    FirstWins,
    /// Last key wins: the later value replaces the earlier one, keeping the first position.
    LastWins,
}

/// Limits applied to alias expansion to harden against alias bombs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AliasLimits {
    /// Maximum nesting of alias expansions (an alias inside an expanded alias, etc.).
    pub max_alias_depth: usize,
    /// Maximum nesting of sequences, mappings and aliases while converting, counted
    /// through alias expansions. Textual nesting alone is capped by the parser, but
    /// a chain of aliases can multiply it; this keeps the converter's recursion off
    /// the end of the stack.
    pub max_nesting_depth: usize,
    /// Maximum number of times a **single anchor** may be expanded via alias.
    /// Use `usize::MAX` for "unlimited".
    pub max_alias_expansions_per_anchor: usize,
    /// Reject documents whose values come predominantly from alias expansion
    /// (see [`crate::allowed_alias_ratio`]).
    pub enforce_expansion_ratio: bool,
}

impl Default for AliasLimits {
    fn default() -> Self {
        Self {
            max_alias_depth: 64,
            max_nesting_depth: 500,
            max_alias_expansions_per_anchor: usize::MAX,
            enforce_expansion_ratio: true,
        }
    }
}

/// Renders a converted non-string mapping key as a string.
pub type KeyMarshal = Arc<dyn Fn(&Value) -> Result<String, String> + Send + Sync>;

/// Conversion options.
///
/// Use this to configure float sentinels, key marshaling, duplicate-key policy,
/// alias limits and an optional YAML [`Budget`].
///
/// ```rust
/// use saphyr_json::{DuplicateKeyPolicy, Value, from_str_with_options};
///
/// let options = saphyr_json::options! {
///     nan: Some(Value::Null),
///     duplicate_keys: DuplicateKeyPolicy::FirstWins,
/// };
///
/// let value = from_str_with_options("a: .nan\nb: 1\nb: 2\n", options).unwrap();
/// assert_eq!(saphyr_json::to_string(&value).unwrap(), r#"{"a":null,"b":1}"#);
/// ```
#[derive(Clone)]
pub struct Options {
    /// Replacement for NaN floats. `None` keeps the float, which then cannot be written as JSON.
    pub nan: Option<Value>,
    /// Replacement for positive infinity.
    pub pos_inf: Option<Value>,
    /// Replacement for negative infinity.
    pub neg_inf: Option<Value>,
    /// Turns non-string mapping keys into strings. When unset, keys are written as
    /// compact JSON text (`1` becomes `"1"`, `[1, 2]` becomes `"[1,2]"`).
    pub key_marshal: Option<KeyMarshal>,
    /// Policy for duplicate keys. Default: [`DuplicateKeyPolicy::LastWins`], which is
    /// how most JSON readers treat a repeated key.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Limits for alias expansion.
    pub alias_limits: AliasLimits,
    /// Optional YAML budget enforced while composing the node tree from text.
    pub budget: Option<Budget>,
    /// Optional callback invoked with the final budget report after composing.
    /// It is invoked both when composing succeeded and when the budget was breached.
    pub budget_report: Option<fn(&BudgetReport)>,
    /// Optional callback invoked with alias and merge statistics after each conversion,
    /// successful or not.
    pub decode_report: Option<fn(&DecodeReport)>,
    /// If true (default), interpret only `true`/`false` (and `True`, `TRUE`, ...) as booleans.
    /// If false, YAML 1.1 forms like `yes`/`no`/`on`/`off` are booleans too.
    pub strict_booleans: bool,
    /// Enable legacy octal parsing where values starting with `0` are treated as base-8.
    /// They are deprecated in YAML 1.2. Default: false.
    pub legacy_octal_numbers: bool,
    /// If true (default), entry points that have the YAML text wrap located errors
    /// with a rendered excerpt of the input.
    pub with_snippet: bool,
    /// Horizontal crop radius (in character columns) when rendering snippets.
    ///
    /// If set to `0`, snippet wrapping is disabled.
    pub crop_radius: usize,
}

impl Options {
    /// Registers a key marshal. Any closure can be used, including ones that capture
    /// state, as long as it is `Send + Sync`.
    ///
    /// ```rust
    /// use saphyr_json::{Options, Value};
    ///
    /// let options = Options::default().with_key_marshal(|key: &Value| match key {
    ///     Value::Bool(b) => Ok(if *b { "yes".into() } else { "no".into() }),
    ///     other => Err(format!("unsupported key {other:?}")),
    /// });
    /// let value = saphyr_json::from_str_with_options("true: 1\n", options).unwrap();
    /// assert!(value.get("yes").is_some());
    /// ```
    pub fn with_key_marshal<F>(mut self, marshal: F) -> Self
    where
        F: Fn(&Value) -> Result<String, String> + Send + Sync + 'static,
    {
        self.key_marshal = Some(Arc::new(marshal));
        self
    }

    /// Replace NaN with `null` and the infinities with the largest finite floats.
    ///
    /// This is what [`crate::from_json_str`] uses.
    pub fn with_json_float_sentinels(mut self) -> Self {
        self.nan = Some(Value::Null);
        self.pos_inf = Some(Value::from(f64::MAX));
        self.neg_inf = Some(Value::from(-f64::MAX));
        self
    }

    pub(crate) fn scalar_config(&self) -> crate::parse_scalars::ScalarConfig {
        crate::parse_scalars::ScalarConfig {
            strict_booleans: self.strict_booleans,
            legacy_octal_numbers: self.legacy_octal_numbers,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            nan: None,
            pos_inf: None,
            neg_inf: None,
            key_marshal: None,
            duplicate_keys: DuplicateKeyPolicy::LastWins,
            alias_limits: AliasLimits::default(),
            budget: Some(Budget::default()),
            budget_report: None,
            decode_report: None,
            strict_booleans: true,
            legacy_octal_numbers: false,
            with_snippet: true,
            crop_radius: 64,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("nan", &self.nan)
            .field("pos_inf", &self.pos_inf)
            .field("neg_inf", &self.neg_inf)
            .field("key_marshal", &if self.key_marshal.is_some() { "set" } else { "none" })
            .field("duplicate_keys", &self.duplicate_keys)
            .field("alias_limits", &self.alias_limits)
            .field("budget", &self.budget)
            .field("budget_report", &self.budget_report)
            .field("decode_report", &self.decode_report)
            .field("strict_booleans", &self.strict_booleans)
            .field("legacy_octal_numbers", &self.legacy_octal_numbers)
            .field("with_snippet", &self.with_snippet)
            .field("crop_radius", &self.crop_radius)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert!(opts.nan.is_none() && opts.pos_inf.is_none() && opts.neg_inf.is_none());
        assert!(opts.key_marshal.is_none());
        assert!(opts.budget.is_some());
        assert!(opts.budget_report.is_none());
        assert!(opts.decode_report.is_none());
        assert_eq!(opts.duplicate_keys, DuplicateKeyPolicy::LastWins);
        assert!(opts.strict_booleans);
        assert!(!opts.legacy_octal_numbers);
        assert!(opts.with_snippet);
        assert_eq!(opts.crop_radius, 64);
    }

    #[test]
    fn test_options_debug_format() {
        let opts = Options::default();
        let debug_str = format!("{:?}", opts);
        assert!(debug_str.contains("Options"));
        assert!(debug_str.contains("key_marshal: \"none\""));

        let opts = opts.with_key_marshal(|_| Ok(String::new()));
        assert!(format!("{:?}", opts).contains("key_marshal: \"set\""));
    }

    #[test]
    fn test_alias_limits_default() {
        let limits = AliasLimits::default();
        assert_eq!(limits.max_alias_depth, 64);
        assert_eq!(limits.max_nesting_depth, 500);
        assert_eq!(limits.max_alias_expansions_per_anchor, usize::MAX);
        assert!(limits.enforce_expansion_ratio);
    }

    #[test]
    fn options_are_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Options>();
    }
}
