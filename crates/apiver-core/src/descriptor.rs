//! API descriptor model
//!
//! An [`ApiDescriptorSet`] maps qualified function names to the declared shape
//! of each function. Absent, empty and `null` fields all mean "declares nothing
//! of this kind".

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Declared shape of a single function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Positional argument names, in call order
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub arguments: Vec<String>,

    /// Keyword argument name -> description or default marker
    #[serde(
        default,
        deserialize_with = "keyword_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub keywords: BTreeMap<String, String>,

    /// Return-type labels
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub returns: BTreeSet<String>,

    /// Exception labels
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub exceptions: BTreeSet<String>,

    /// Free-text side-effect labels
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub side_effects: BTreeSet<String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub deprecated: bool,
}

impl FunctionDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn with_returns<I, S>(mut self, returns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returns = returns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exceptions<I, S>(mut self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exceptions = exceptions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_side_effects<I, S>(mut self, side_effects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.side_effects = side_effects.into_iter().map(Into::into).collect();
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }
}

/// Mapping from qualified function name to its descriptor.
///
/// Backed by an ordered map so that iteration and serialization are canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApiDescriptorSet {
    functions: BTreeMap<String, FunctionDescriptor>,
}

impl ApiDescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a function descriptor
    pub fn insert(&mut self, name: impl Into<String>, descriptor: FunctionDescriptor) {
        self.functions.insert(name.into(), descriptor);
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, descriptor: FunctionDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FunctionDescriptor> {
        self.functions.remove(name)
    }

    /// Function names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FunctionDescriptor)> {
        self.functions.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Canonical JSON form, used both for digests and for the persisted snapshot
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a set previously produced by [`Self::to_canonical_json`]
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl<'de> Deserialize<'de> for ApiDescriptorSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, Option<FunctionDescriptor>>>::deserialize(deserializer)?;
        let functions = raw
            .unwrap_or_default()
            .into_iter()
            .map(|(name, descriptor)| (name, descriptor.unwrap_or_default()))
            .collect();
        Ok(Self { functions })
    }
}

impl<S: Into<String>> FromIterator<(S, FunctionDescriptor)> for ApiDescriptorSet {
    fn from_iter<I: IntoIterator<Item = (S, FunctionDescriptor)>>(iter: I) -> Self {
        Self {
            functions: iter
                .into_iter()
                .map(|(name, descriptor)| (name.into(), descriptor))
                .collect(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keyword values may be written as any scalar; they are compared as text
fn keyword_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}
