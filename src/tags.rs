//! YAML core tag classification.
//!
//! Tags reach us in several spellings: the shorthand `!!int`, the canonical
//! `tag:yaml.org,2002:int` (what the parser produces after resolving `!!`), the
//! lenient `!int`, and `tag:yaml.org,2002:!int`. All of them classify the same way.

pub(crate) const LONG_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Classified tag of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum YamlTag {
    /// No tag at all; plain scalars are resolved implicitly.
    None,
    /// The non-specific tag `!`; forces a string.
    NonSpecific,
    Str,
    Int,
    Float,
    Bool,
    Null,
    Binary,
    Timestamp,
    Seq,
    Map,
    Merge,
    /// Any application-specific tag.
    Other,
}

impl YamlTag {
    pub(crate) fn classify(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return YamlTag::None;
        };
        if tag.is_empty() {
            return YamlTag::None;
        }
        if tag == "!" {
            return YamlTag::NonSpecific;
        }
        let name = if let Some(rest) = tag.strip_prefix(LONG_TAG_PREFIX) {
            rest.strip_prefix('!').unwrap_or(rest)
        } else if let Some(rest) = tag.strip_prefix("!!") {
            rest
        } else if let Some(rest) = tag.strip_prefix('!') {
            rest
        } else {
            return YamlTag::Other;
        };
        match name {
            "str" => YamlTag::Str,
            "int" => YamlTag::Int,
            "float" => YamlTag::Float,
            "bool" => YamlTag::Bool,
            "null" => YamlTag::Null,
            "binary" => YamlTag::Binary,
            "timestamp" => YamlTag::Timestamp,
            "seq" => YamlTag::Seq,
            "map" => YamlTag::Map,
            "merge" => YamlTag::Merge,
            _ => YamlTag::Other,
        }
    }
}

/// Short display form of a tag: `tag:yaml.org,2002:int` becomes `!!int`.
pub(crate) fn short_tag(tag: &str) -> String {
    match tag.strip_prefix(LONG_TAG_PREFIX) {
        Some(rest) => format!("!!{rest}"),
        None => tag.to_owned(),
    }
}
