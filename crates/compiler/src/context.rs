//! Host collaborator interface
//!
//! The compiler never reads configuration on its own. Service name, stage,
//! region, deployment instance id and an optional pre-existing REST API are
//! all obtained from the host through [`HostContext`].

use serde_json::Value;

/// A REST API created outside this template
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRestApi {
    pub rest_api_id: Value,
    pub root_resource_id: Value,
}

/// Settings the host provides to a compilation run
#[cfg_attr(test, mockall::automock)]
pub trait HostContext {
    fn service_name(&self) -> String;

    /// Deployment stage; `None` when the host has not resolved one
    fn stage(&self) -> Option<String>;

    fn region(&self) -> Option<String>;

    /// Suffix for the deployment logical id, unique per deploy
    fn deployment_instance_id(&self) -> String;

    /// Existing REST API to attach to instead of creating one
    fn rest_api(&self) -> Option<ExternalRestApi>;
}

/// Host context backed by plain values
///
/// # Example
/// ```rust,ignore
/// let host = StaticHostContext::new("orders")
///     .with_stage("prod")
///     .with_region("eu-west-1")
///     .with_deployment_instance_id("1700000000000");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticHostContext {
    service_name: String,
    stage: Option<String>,
    region: Option<String>,
    deployment_instance_id: String,
    rest_api: Option<ExternalRestApi>,
}

impl StaticHostContext {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_deployment_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.deployment_instance_id = instance_id.into();
        self
    }

    pub fn with_rest_api(mut self, rest_api_id: Value, root_resource_id: Value) -> Self {
        self.rest_api = Some(ExternalRestApi {
            rest_api_id,
            root_resource_id,
        });
        self
    }
}

impl HostContext for StaticHostContext {
    fn service_name(&self) -> String {
        self.service_name.clone()
    }

    fn stage(&self) -> Option<String> {
        self.stage.clone()
    }

    fn region(&self) -> Option<String> {
        self.region.clone()
    }

    fn deployment_instance_id(&self) -> String {
        self.deployment_instance_id.clone()
    }

    fn rest_api(&self) -> Option<ExternalRestApi> {
        self.rest_api.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_host_context() {
        let host = StaticHostContext::new("orders")
            .with_stage("prod")
            .with_deployment_instance_id("42")
            .with_rest_api(json!("abc123"), json!("root456"));

        assert_eq!(host.service_name(), "orders");
        assert_eq!(host.stage().as_deref(), Some("prod"));
        assert_eq!(host.region(), None);
        assert_eq!(host.deployment_instance_id(), "42");
        assert_eq!(
            host.rest_api(),
            Some(ExternalRestApi {
                rest_api_id: json!("abc123"),
                root_resource_id: json!("root456"),
            })
        );
    }
}
