//! Path resource tree
//!
//! Every path segment maps to one `AWS::ApiGateway::Resource` node. Nodes are
//! looked up by (parent, path part) in the template itself, so a node created
//! by an earlier proxy, an earlier run or another tool is reused rather than
//! duplicated.

use crate::rest_api::RestApiRef;
use serde_json::{json, Value};
use service_proxy_common::naming::resource_logical_id;
use service_proxy_common::{resource_types, Resource, Result, Template};
use tracing::debug;

/// A node of the path tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRef {
    /// Logical id of the node; `None` for the API root
    pub logical_id: Option<String>,
    /// Normalized segments leading to the node
    pub segments: Vec<String>,
    /// Value for `ResourceId` / `ParentId` properties
    pub value: Value,
}

impl ResourceRef {
    pub fn root(api: &RestApiRef) -> Self {
        Self {
            logical_id: None,
            segments: Vec::new(),
            value: api.root_resource_id(),
        }
    }

    fn node(logical_id: &str, segments: &[String]) -> Self {
        Self {
            logical_id: Some(logical_id.to_string()),
            segments: segments.to_vec(),
            value: json!({ "Ref": logical_id }),
        }
    }

    pub fn is_root(&self) -> bool {
        self.logical_id.is_none()
    }

    /// Path with a single leading slash
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Ensures a path exists in the resource tree
pub trait PathResourceBuilder {
    fn ensure_path(
        &self,
        template: &mut Template,
        api: &RestApiRef,
        segments: &[String],
    ) -> Result<ResourceRef>;
}

#[derive(Debug, Default)]
pub struct DefaultPathResourceBuilder;

impl DefaultPathResourceBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Find an existing node under `parent` with the given path part
    fn find_node(
        template: &Template,
        api: &RestApiRef,
        parent: &Value,
        path_part: &str,
    ) -> Option<String> {
        let rest_api_id = api.rest_api_id();
        template
            .resources_of_type(resource_types::RESOURCE)
            .find(|(_, resource)| {
                resource.property("PathPart").and_then(Value::as_str) == Some(path_part)
                    && resource.property("ParentId") == Some(parent)
                    && resource.property("RestApiId") == Some(&rest_api_id)
            })
            .map(|(logical_id, _)| logical_id.clone())
    }
}

impl PathResourceBuilder for DefaultPathResourceBuilder {
    fn ensure_path(
        &self,
        template: &mut Template,
        api: &RestApiRef,
        segments: &[String],
    ) -> Result<ResourceRef> {
        let mut current = ResourceRef::root(api);

        for (depth, segment) in segments.iter().enumerate() {
            let prefix = &segments[..=depth];

            if let Some(existing) = Self::find_node(template, api, &current.value, segment) {
                debug!("Reusing resource {} for /{}", existing, prefix.join("/"));
                current = ResourceRef::node(&existing, prefix);
                continue;
            }

            let logical_id = resource_logical_id(prefix);
            let node = Resource::new(
                resource_types::RESOURCE,
                json!({
                    "ParentId": current.value.clone(),
                    "PathPart": segment,
                    "RestApiId": api.rest_api_id(),
                }),
            );
            template.add_resource(&logical_id, node)?;
            debug!("Created resource {} for /{}", logical_id, prefix.join("/"));

            current = ResourceRef::node(&logical_id, prefix);
        }

        Ok(current)
    }
}
