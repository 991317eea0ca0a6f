//! CloudFormation template document
//!
//! The template is the shared accumulator every compilation step writes
//! into. It may already hold resources contributed by other tools, so all
//! writes are keyed by logical id and additive: nothing here removes or
//! rewrites a resource of a different type.

use crate::{ProxyError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// CloudFormation resource type names
pub mod resource_types {
    pub const REST_API: &str = "AWS::ApiGateway::RestApi";
    pub const RESOURCE: &str = "AWS::ApiGateway::Resource";
    pub const METHOD: &str = "AWS::ApiGateway::Method";
    pub const DEPLOYMENT: &str = "AWS::ApiGateway::Deployment";
    pub const IAM_ROLE: &str = "AWS::IAM::Role";
}

/// A CloudFormation template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Value>,

    /// Any other top-level section, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single resource entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Condition, DeletionPolicy and other attributes, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Create a resource from a type and a JSON object of properties
    ///
    /// Non-object property values are ignored.
    pub fn new(resource_type: &str, properties: Value) -> Self {
        let properties = match properties {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
            metadata: None,
            extra: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource_type == resource_type
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Union `ids` into `DependsOn`, keeping existing order and skipping duplicates
    ///
    /// Returns the number of ids actually added.
    pub fn add_dependencies<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for id in ids {
            let id = id.as_ref();
            if !self.depends_on.iter().any(|existing| existing == id) {
                self.depends_on.push(id.to_string());
                added += 1;
            }
        }
        added
    }
}

impl Template {
    /// Parse a template from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProxyError::Parse(format!("Failed to parse template JSON: {}", e)))
    }

    /// Serialize the template as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Resource> {
        self.resources.get_mut(logical_id)
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    /// All resources of the given type, in logical id order
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.is_type(resource_type))
    }

    /// Insert a resource unless one already exists under `logical_id`
    ///
    /// Returns `true` when the resource was inserted. An identical existing
    /// resource is left alone; a different one is a conflict.
    pub fn add_resource(&mut self, logical_id: &str, resource: Resource) -> Result<bool> {
        match self.resources.get(logical_id) {
            None => {
                self.resources.insert(logical_id.to_string(), resource);
                Ok(true)
            }
            Some(existing) if *existing == resource => Ok(false),
            Some(existing) => Err(ProxyError::DocumentConflict {
                logical_id: logical_id.to_string(),
                reason: format!(
                    "already defined as a different {} resource",
                    existing.resource_type
                ),
            }),
        }
    }

    /// Insert or replace a resource this compiler owns
    ///
    /// Replacing is only allowed for a resource of the same type; existing
    /// `DependsOn` entries and extra attributes are carried over.
    pub fn put_resource(&mut self, logical_id: &str, mut resource: Resource) -> Result<()> {
        if let Some(existing) = self.resources.get(logical_id) {
            if existing.resource_type != resource.resource_type {
                return Err(ProxyError::DocumentConflict {
                    logical_id: logical_id.to_string(),
                    reason: format!(
                        "expected {} but found {}",
                        resource.resource_type, existing.resource_type
                    ),
                });
            }
            let carried = existing.depends_on.clone();
            resource.add_dependencies(carried);
            for (key, value) in &existing.extra {
                resource
                    .extra
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        self.resources.insert(logical_id.to_string(), resource);
        Ok(())
    }

    /// Add an output unless one with the same name exists
    pub fn add_output(&mut self, name: &str, output: Value) -> bool {
        if self.outputs.contains_key(name) {
            return false;
        }
        self.outputs.insert(name.to_string(), output);
        true
    }

    /// Deep-merge another template into this one
    ///
    /// Objects merge key by key; any other value in `other` replaces the
    /// value here.
    pub fn merge(&mut self, other: Template) -> Result<()> {
        let mut target = serde_json::to_value(&*self)?;
        merge_value(&mut target, serde_json::to_value(other)?);
        *self = serde_json::from_value(target)?;
        Ok(())
    }
}

/// Recursively merge `source` into `target`
pub fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Append the values of `extra` missing from `list`, preserving order
pub fn union_values(list: &mut Vec<Value>, extra: impl IntoIterator<Item = Value>) {
    for value in extra {
        if !list.contains(&value) {
            list.push(value);
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}
