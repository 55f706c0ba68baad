//! IAM-style policy documents whose resources and condition values may be
//! deferred outputs, so a policy follows the live identity of what it guards.

use crate::output::Output;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who a statement applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Anyone, rendered as `"*"`
    Any,
    /// Typed identifiers, e.g. `{"Service": ["s3.amazonaws.com"]}`
    Typed(BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    pub principal: Principal,
    pub action: Vec<String>,
    pub resource: Vec<Output>,
    /// test -> variable -> values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub condition: BTreeMap<String, BTreeMap<String, Vec<Output>>>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            id: None,
            statement: statements,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether any allow statement is open to everyone
    pub fn is_public(&self) -> bool {
        self.statement
            .iter()
            .any(|s| s.effect == Effect::Allow && s.principal == Principal::Any)
    }

    /// Allow statements granting `action` on `resource`
    pub fn grants<'a>(&'a self, action: &'a str, resource: &'a str) -> impl Iterator<Item = &'a Statement> {
        self.statement.iter().filter(move |s| {
            s.effect == Effect::Allow
                && s.action.iter().any(|a| a == action)
                && s.resource.iter().any(|r| r.as_known() == Some(resource))
        })
    }
}

impl Statement {
    pub fn allow(principal: Principal) -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal,
            action: Vec::new(),
            resource: Vec::new(),
            condition: BTreeMap::new(),
        }
    }

    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn resources<I>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = Output>,
    {
        self.resource.extend(resources);
        self
    }

    pub fn condition<I>(mut self, test: &str, variable: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Output>,
    {
        self.condition
            .entry(test.to_string())
            .or_default()
            .entry(variable.to_string())
            .or_default()
            .extend(values);
        self
    }

    pub fn condition_values(&self, test: &str, variable: &str) -> &[Output] {
        self.condition
            .get(test)
            .and_then(|vars| vars.get(variable))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Principal::Any => serializer.serialize_str("*"),
            Principal::Typed(identifiers) => {
                let mut map = serializer.serialize_map(Some(identifiers.len()))?;
                for (kind, ids) in identifiers {
                    map.serialize_entry(kind, ids)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Wildcard(String),
            Typed(BTreeMap<String, Vec<String>>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Wildcard(value) if value == "*" => Ok(Principal::Any),
            Raw::Wildcard(value) => Err(de::Error::custom(format!(
                "unsupported principal '{value}'"
            ))),
            Raw::Typed(identifiers) => Ok(Principal::Typed(identifiers)),
        }
    }
}
