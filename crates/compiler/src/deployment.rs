//! Deployment reconciliation
//!
//! A template holds at most one `AWS::ApiGateway::Deployment`. Every method
//! compiled in a run must be in its `DependsOn` so the deployment is ordered
//! after them.

use crate::rest_api::RestApiRef;
use serde_json::json;
use service_proxy_common::naming::deployment_logical_id;
use service_proxy_common::{resource_types, ProxyError, Resource, Result, Template};
use tracing::debug;

pub const SERVICE_ENDPOINT_OUTPUT: &str = "ServiceEndpoint";

/// What a newly created deployment deploys
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentTarget {
    pub api: RestApiRef,
    pub stage: String,
    pub instance_id: String,
}

/// Makes the single deployment depend on the compiled methods
pub trait DeploymentReconciler {
    /// Returns the logical id of the deployment
    fn reconcile(
        &self,
        template: &mut Template,
        method_ids: &[String],
        target: &DeploymentTarget,
    ) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct DefaultDeploymentReconciler;

impl DefaultDeploymentReconciler {
    pub fn new() -> Self {
        Self
    }
}

impl DeploymentReconciler for DefaultDeploymentReconciler {
    fn reconcile(
        &self,
        template: &mut Template,
        method_ids: &[String],
        target: &DeploymentTarget,
    ) -> Result<String> {
        let existing: Vec<String> = template
            .resources_of_type(resource_types::DEPLOYMENT)
            .map(|(id, _)| id.clone())
            .collect();

        match existing.as_slice() {
            [] => {
                let logical_id = deployment_logical_id(&target.instance_id);
                let mut deployment = Resource::new(
                    resource_types::DEPLOYMENT,
                    json!({
                        "RestApiId": target.api.rest_api_id(),
                        "StageName": target.stage,
                    }),
                );
                deployment.add_dependencies(method_ids);
                template.add_resource(&logical_id, deployment)?;

                if target.api.is_owned() {
                    template.add_output(SERVICE_ENDPOINT_OUTPUT, service_endpoint(target));
                }
                debug!(
                    "Created deployment {} depending on {} methods",
                    logical_id,
                    method_ids.len()
                );
                Ok(logical_id)
            }
            [logical_id] => {
                let deployment = template
                    .resource_mut(logical_id)
                    .ok_or_else(|| ProxyError::MissingDependency(logical_id.clone()))?;
                let added = deployment.add_dependencies(method_ids);
                debug!("Added {} dependencies to deployment {}", added, logical_id);
                Ok(logical_id.clone())
            }
            _ => Err(ProxyError::DeploymentInvariant {
                ids: existing.clone(),
            }),
        }
    }
}

fn service_endpoint(target: &DeploymentTarget) -> serde_json::Value {
    json!({
        "Description": "URL of the service endpoint",
        "Value": {
            "Fn::Join": ["", [
                "https://",
                target.api.rest_api_id(),
                ".execute-api.",
                { "Ref": "AWS::Region" },
                ".",
                { "Ref": "AWS::URLSuffix" },
                "/",
                target.stage,
            ]],
        },
    })
}
