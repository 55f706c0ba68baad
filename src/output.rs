//! Deferred values.
//!
//! An [`Output`] is a string whose value may only be known once the resources
//! it references have been created. In a desired-state document it is written
//! as an interpolation template such as `http://${bucket.websiteEndpoint}`;
//! a literal `${` is escaped as `$${`.

use crate::types::{Attributes, StackError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Reference to one attribute of a declared resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrRef {
    pub resource: String,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Known(String),
    Attribute(AttrRef),
    Concat(Vec<Output>),
}

/// Source of attribute values for resolving outputs
pub trait AttributeLookup {
    fn attribute(&self, resource: &str, attribute: &str) -> Option<&str>;
}

impl AttributeLookup for BTreeMap<String, Attributes> {
    fn attribute(&self, resource: &str, attribute: &str) -> Option<&str> {
        self.get(resource)
            .and_then(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }
}

impl AttributeLookup for HashMap<String, Attributes> {
    fn attribute(&self, resource: &str, attribute: &str) -> Option<&str> {
        self.get(resource)
            .and_then(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }
}

impl Output {
    pub fn known(value: impl Into<String>) -> Self {
        Output::Known(value.into())
    }

    pub fn attribute(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Output::Attribute(AttrRef {
            resource: resource.into(),
            attribute: attribute.into(),
        })
    }

    /// Concatenate parts, merging adjacent known text
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Output>,
    {
        let mut flat = Vec::new();
        for part in parts {
            push_part(&mut flat, part);
        }

        match flat.len() {
            0 => Output::Known(String::new()),
            1 => flat.remove(0),
            _ => Output::Concat(flat),
        }
    }

    pub fn with_suffix(&self, suffix: &str) -> Self {
        Output::concat([self.clone(), Output::known(suffix)])
    }

    pub fn with_prefix(&self, prefix: &str) -> Self {
        Output::concat([Output::known(prefix), self.clone()])
    }

    pub fn as_known(&self) -> Option<&str> {
        match self {
            Output::Known(value) => Some(value),
            _ => None,
        }
    }

    /// The value of an output that must already be resolved
    pub fn known_value(&self) -> Result<&str, StackError> {
        if let Output::Known(value) = self {
            return Ok(value);
        }
        match self.references().into_iter().next() {
            Some(reference) => Err(StackError::UnresolvedReference {
                resource: reference.resource,
                attribute: reference.attribute,
            }),
            None => Err(StackError::InvalidTemplate(self.to_string())),
        }
    }

    pub fn references(&self) -> BTreeSet<AttrRef> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut BTreeSet<AttrRef>) {
        match self {
            Output::Known(_) => {}
            Output::Attribute(reference) => {
                refs.insert(reference.clone());
            }
            Output::Concat(parts) => parts.iter().for_each(|p| p.collect_references(refs)),
        }
    }

    pub fn resolve<L>(&self, lookup: &L) -> Result<String, StackError>
    where
        L: AttributeLookup + ?Sized,
    {
        match self {
            Output::Known(value) => Ok(value.clone()),
            Output::Attribute(reference) => lookup
                .attribute(&reference.resource, &reference.attribute)
                .map(str::to_string)
                .ok_or_else(|| StackError::UnresolvedReference {
                    resource: reference.resource.clone(),
                    attribute: reference.attribute.clone(),
                }),
            Output::Concat(parts) => {
                let mut resolved = String::new();
                for part in parts {
                    resolved.push_str(&part.resolve(lookup)?);
                }
                Ok(resolved)
            }
        }
    }

    /// Parse an interpolation template
    pub fn parse(template: &str) -> Result<Self, StackError> {
        let invalid = || StackError::InvalidTemplate(template.to_string());

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix("$${") {
                literal.push_str("${");
                rest = after;
            } else if let Some(after) = tail.strip_prefix("${") {
                let end = after.find('}').ok_or_else(invalid)?;
                let (resource, attribute) = after[..end]
                    .split_once('.')
                    .filter(|(r, a)| !r.is_empty() && !a.is_empty())
                    .ok_or_else(invalid)?;

                if !literal.is_empty() {
                    parts.push(Output::Known(std::mem::take(&mut literal)));
                }
                parts.push(Output::attribute(resource, attribute));
                rest = &after[end + 1..];
            } else {
                literal.push('$');
                rest = &tail[1..];
            }
        }
        literal.push_str(rest);
        parts.push(Output::Known(literal));

        Ok(Output::concat(parts))
    }

    fn write_template(&self, out: &mut String) {
        match self {
            Output::Known(value) => out.push_str(&value.replace("${", "$${")),
            Output::Attribute(reference) => {
                out.push_str("${");
                out.push_str(&reference.resource);
                out.push('.');
                out.push_str(&reference.attribute);
                out.push('}');
            }
            Output::Concat(parts) => parts.iter().for_each(|p| p.write_template(out)),
        }
    }
}

fn push_part(flat: &mut Vec<Output>, part: Output) {
    match part {
        Output::Known(value) if value.is_empty() => {}
        Output::Known(value) => match flat.last_mut() {
            Some(Output::Known(prev)) => prev.push_str(&value),
            _ => flat.push(Output::Known(value)),
        },
        Output::Concat(parts) => parts.into_iter().for_each(|p| push_part(flat, p)),
        attribute => flat.push(attribute),
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut template = String::new();
        self.write_template(&mut template);
        f.write_str(&template)
    }
}

impl From<&str> for Output {
    fn from(value: &str) -> Self {
        Output::known(value)
    }
}

impl From<String> for Output {
    fn from(value: String) -> Self {
        Output::Known(value)
    }
}

impl Serialize for Output {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Output {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let template = String::deserialize(deserializer)?;
        Output::parse(&template).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for plain text fields that live in a rendered document
/// next to templates: `${` is written escaped, and reading back rejects
/// anything that is not fully known.
///
/// ```ignore
/// #[serde(with = "crate::output::literal")]
/// pub path: String,
/// ```
pub mod literal {
    use super::Output;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.replace("${", "$${"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let template = String::deserialize(deserializer)?;
        match Output::parse(&template).map_err(de::Error::custom)? {
            Output::Known(value) => Ok(value),
            _ => Err(de::Error::custom(format!(
                "'{template}' is plain text and cannot reference other resources"
            ))),
        }
    }
}

/// Resolve every template string inside a rendered document.
///
/// Resolved text is written back in template form (a literal `${` stays
/// escaped), so the result deserializes into fully known outputs.
pub fn interpolate<L>(value: Value, lookup: &L) -> Result<Value, StackError>
where
    L: AttributeLookup + ?Sized,
{
    Ok(match value {
        Value::String(template) => {
            let resolved = Output::parse(&template)?.resolve(lookup)?;
            Value::String(Output::Known(resolved).to_string())
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| interpolate(item, lookup))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, item)| Ok((key, interpolate(item, lookup)?)))
                .collect::<Result<_, StackError>>()?,
        ),
        other => other,
    })
}

/// Every attribute reference found in a rendered document
pub fn references_in(value: &Value) -> Result<BTreeSet<AttrRef>, StackError> {
    let mut refs = BTreeSet::new();
    collect_value_references(value, &mut refs)?;
    Ok(refs)
}

fn collect_value_references(value: &Value, refs: &mut BTreeSet<AttrRef>) -> Result<(), StackError> {
    match value {
        Value::String(template) => Output::parse(template)?.collect_references(refs),
        Value::Array(items) => {
            for item in items {
                collect_value_references(item, refs)?;
            }
        }
        Value::Object(fields) => {
            for item in fields.values() {
                collect_value_references(item, refs)?;
            }
        }
        _ => {}
    }
    Ok(())
}
