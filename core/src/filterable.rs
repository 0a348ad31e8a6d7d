//! Polymorphic filterable-attribute representation.
//!
//! # Design
//! One configured filterable field has two incompatible wire shapes: a bare
//! JSON string (shorthand for a single pattern with nothing else specified)
//! and a structured object carrying pattern lists and feature flags. Both
//! shapes map onto the single in-memory [`FilterableAttributes`] value, and
//! the mapping is symmetric: a one-pattern, feature-absent value always
//! serializes back to the bare string.
//!
//! The hand-written `Serialize`/`Deserialize` impls are the registration
//! point with the codec layer — any serde-backed codec picks them up without
//! further wiring. Both directions validate the same two invariants and
//! share one message vocabulary, so callers can match failures on a fixed
//! literal regardless of which side raised them.
//!
//! A JSON `null` for a settings field holding these values decodes through
//! the owning `Option` to `None`; null is not an error.

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raised when a value carries no patterns, at encode or decode time.
pub const PATTERNS_NOT_SPECIFIED: &str = "Patterns to filter for were not specified";

/// Raised when a feature map is present but enables no filter method.
pub const NO_FILTER_METHODS: &str = "No filtration methods were allowed";

/// One configured filterable field.
///
/// `facet_search` and `filter_features` distinguish "not specified" (`None`)
/// from an explicit setting; the wire shorthand only applies when both are
/// unspecified and exactly one pattern is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterableAttributes {
    /// Ordered field patterns; must be non-empty. Order is wire-significant
    /// for the single-pattern shorthand.
    pub patterns: Vec<String>,
    /// Whether facet search is enabled for the matched fields.
    pub facet_search: Option<bool>,
    /// Filter capabilities ("equality", "comparison", ...) in insertion
    /// order. If present, at least one entry must be enabled.
    pub filter_features: Option<Vec<(String, bool)>>,
}

impl FilterableAttributes {
    /// A single-pattern value with nothing else specified — the bare-string
    /// wire shorthand.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            patterns: vec![pattern.into()],
            facet_search: None,
            filter_features: None,
        }
    }

    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            facet_search: None,
            filter_features: None,
        }
    }

    pub fn facet_search(mut self, enabled: bool) -> Self {
        self.facet_search = Some(enabled);
        self
    }

    pub fn filter_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.filter_features
            .get_or_insert_with(Vec::new)
            .push((name.into(), enabled));
        self
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.patterns.is_empty() {
            return Err(PATTERNS_NOT_SPECIFIED);
        }
        if let Some(features) = &self.filter_features {
            if !features.iter().any(|(_, enabled)| *enabled) {
                return Err(NO_FILTER_METHODS);
            }
        }
        Ok(())
    }

    /// True when the value is wire-equivalent to a bare string.
    fn is_shorthand(&self) -> bool {
        self.patterns.len() == 1 && self.facet_search.is_none() && self.filter_features.is_none()
    }
}

impl Serialize for FilterableAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.validate().map_err(serde::ser::Error::custom)?;

        if self.is_shorthand() {
            return serializer.serialize_str(&self.patterns[0]);
        }

        let has_features = self.facet_search.is_some() || self.filter_features.is_some();
        let mut map = serializer.serialize_map(Some(1 + usize::from(has_features)))?;
        map.serialize_entry("attributePatterns", &self.patterns)?;
        if has_features {
            map.serialize_entry(
                "features",
                &FeaturesRef {
                    facet_search: self.facet_search,
                    filter: self.filter_features.as_deref(),
                },
            )?;
        }
        map.end()
    }
}

/// `features` sub-object, serialized with the caller's feature-map order.
struct FeaturesRef<'a> {
    facet_search: Option<bool>,
    filter: Option<&'a [(String, bool)]>,
}

impl Serialize for FeaturesRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.facet_search.is_some()) + usize::from(self.filter.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(enabled) = self.facet_search {
            map.serialize_entry("facetSearch", &enabled)?;
        }
        if let Some(flags) = self.filter {
            map.serialize_entry("filter", &OrderedFlags(flags))?;
        }
        map.end()
    }
}

/// Serializes `[(name, enabled)]` pairs as a JSON object, preserving order.
struct OrderedFlags<'a>(&'a [(String, bool)]);

impl Serialize for OrderedFlags<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, enabled) in self.0 {
            map.serialize_entry(name, enabled)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterableAttributes {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AttributesVisitor)
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = FilterableAttributes;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a pattern string or a filterable-attribute object")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(FilterableAttributes::new(value))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut patterns: Option<Vec<String>> = None;
        let mut facet_search = None;
        let mut filter_features = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "attributePatterns" => patterns = Some(map.next_value()?),
                "features" => {
                    let features: RawFeatures = map.next_value()?;
                    facet_search = features.facet_search;
                    filter_features = features.filter.map(|flags| flags.0);
                }
                // Unknown keys are the server's business, not ours.
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        let value = FilterableAttributes {
            patterns: patterns.ok_or_else(|| de::Error::custom(PATTERNS_NOT_SPECIFIED))?,
            facet_search,
            filter_features,
        };
        value.validate().map_err(de::Error::custom)?;
        Ok(value)
    }
}

#[derive(Deserialize)]
struct RawFeatures {
    #[serde(default, rename = "facetSearch")]
    facet_search: Option<bool>,
    #[serde(default)]
    filter: Option<FlagList>,
}

/// `filter` sub-object decoded in encounter order.
struct FlagList(Vec<(String, bool)>);

impl<'de> Deserialize<'de> for FlagList {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagListVisitor;

        impl<'de> Visitor<'de> for FlagListVisitor {
            type Value = FlagList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of filter capability names to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut flags = Vec::new();
                while let Some((name, enabled)) = map.next_entry::<String, bool>()? {
                    flags.push((name, enabled));
                }
                Ok(FlagList(flags))
            }
        }

        deserializer.deserialize_map(FlagListVisitor)
    }
}
