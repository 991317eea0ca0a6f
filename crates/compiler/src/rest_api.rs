//! REST API the proxies attach to

use crate::context::HostContext;
use serde_json::{json, Value};
use service_proxy_common::naming::REST_API_LOGICAL_ID;
use service_proxy_common::{resource_types, ProxyError, Resource, Result, Template};
use tracing::debug;

/// Either the REST API owned by this template or one created elsewhere
#[derive(Debug, Clone, PartialEq)]
pub enum RestApiRef {
    Owned {
        logical_id: String,
    },
    External {
        rest_api_id: Value,
        root_resource_id: Value,
    },
}

impl RestApiRef {
    /// Value for `RestApiId` properties
    pub fn rest_api_id(&self) -> Value {
        match self {
            RestApiRef::Owned { logical_id } => json!({ "Ref": logical_id }),
            RestApiRef::External { rest_api_id, .. } => rest_api_id.clone(),
        }
    }

    /// Value for the `ParentId` of first-level resources
    pub fn root_resource_id(&self) -> Value {
        match self {
            RestApiRef::Owned { logical_id } => {
                json!({ "Fn::GetAtt": [logical_id, "RootResourceId"] })
            }
            RestApiRef::External {
                root_resource_id, ..
            } => root_resource_id.clone(),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, RestApiRef::Owned { .. })
    }
}

/// Resolve the REST API, creating `ApiGatewayRestApi` when the host names none
///
/// An existing `ApiGatewayRestApi` resource is reused as is.
pub fn ensure_rest_api(template: &mut Template, host: &dyn HostContext) -> Result<RestApiRef> {
    if let Some(external) = host.rest_api() {
        debug!("Using external REST API {}", external.rest_api_id);
        return Ok(RestApiRef::External {
            rest_api_id: external.rest_api_id,
            root_resource_id: external.root_resource_id,
        });
    }

    match template.resource(REST_API_LOGICAL_ID) {
        Some(existing) if existing.is_type(resource_types::REST_API) => {
            debug!("Reusing REST API {}", REST_API_LOGICAL_ID);
        }
        Some(existing) => {
            return Err(ProxyError::DocumentConflict {
                logical_id: REST_API_LOGICAL_ID.to_string(),
                reason: format!(
                    "expected {} but found {}",
                    resource_types::REST_API,
                    existing.resource_type
                ),
            });
        }
        None => {
            let stage = host
                .stage()
                .ok_or_else(|| ProxyError::MissingDependency("stage".to_string()))?;
            let api = Resource::new(
                resource_types::REST_API,
                json!({
                    "Name": format!("{}-{}", stage, host.service_name()),
                    "EndpointConfiguration": { "Types": ["EDGE"] },
                }),
            );
            template.add_resource(REST_API_LOGICAL_ID, api)?;
            debug!("Created REST API {}", REST_API_LOGICAL_ID);
        }
    }

    Ok(RestApiRef::Owned {
        logical_id: REST_API_LOGICAL_ID.to_string(),
    })
}
