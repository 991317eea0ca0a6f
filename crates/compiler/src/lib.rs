//! Service proxy compilation
//!
//! This crate turns validated service proxy declarations into the API
//! Gateway resources, methods, IAM roles and deployment of a CloudFormation
//! template.
//!
//! A run proceeds in fixed phases over one explicitly passed [`Template`]:
//! 1. validate every entry (nothing is written if any entry is invalid)
//! 2. resolve the REST API and build the path resource tree
//! 3. synthesize methods and family roles, family by family
//! 4. add CORS preflight methods
//! 5. reconcile the deployment with everything compiled in this run
//!
//! ## Usage
//! ```rust,ignore
//! use service_proxy_compiler::{ProxyCompiler, StaticHostContext};
//!
//! let host = StaticHostContext::new("orders").with_stage("dev");
//! let report = ProxyCompiler::new()?.compile_proxies(&mut template, &entries, &host)?;
//! ```

mod context;
mod cors;
mod deployment;
mod display;
mod families;
mod method;
mod resources;
mod rest_api;
mod role;
mod templates;

pub use context::{ExternalRestApi, HostContext, StaticHostContext};
pub use cors::{CorsAggregate, CorsAugmenter, DefaultCorsAugmenter};
pub use deployment::{
    DefaultDeploymentReconciler, DeploymentReconciler, DeploymentTarget, SERVICE_ENDPOINT_OUTPUT,
};
pub use display::{display, resolve_endpoint};
pub use families::{integration_shape, permission_grants, IntegrationShape, PermissionGrant};
pub use method::{DefaultMethodSynthesizer, MethodSynthesizer};
pub use service_proxy_common::naming::{
    deployment_logical_id, method_logical_id, normalize_path_part, resource_logical_id,
    REST_API_LOGICAL_ID,
};
pub use resources::{DefaultPathResourceBuilder, PathResourceBuilder, ResourceRef};
pub use rest_api::{ensure_rest_api, RestApiRef};

use service_proxy_common::{
    resource_types, DeclarationValidator, ProxyError, RawProxyEntry, Result, ServiceFamily,
    Template, ValidatedSet,
};
use service_proxy_parser::ProxyValidator;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Summary of one compilation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileReport {
    /// Proxy methods written, in emission order
    pub method_ids: Vec<String>,
    /// CORS preflight methods written
    pub options_method_ids: Vec<String>,
    /// Family roles created or extended
    pub role_ids: BTreeSet<String>,
    /// Deployment the methods were attached to
    pub deployment_id: Option<String>,
    /// Declarations compiled, in declaration order
    pub validated: ValidatedSet,
}

impl CompileReport {
    /// Every method id the deployment depends on
    pub fn all_method_ids(&self) -> Vec<String> {
        self.method_ids
            .iter()
            .chain(self.options_method_ids.iter())
            .cloned()
            .collect()
    }
}

/// Service proxy compiler
///
/// Composes the validator and the four emitting components. Each can be
/// replaced with a `with_*` builder.
pub struct ProxyCompiler {
    validator: Box<dyn DeclarationValidator>,
    paths: Box<dyn PathResourceBuilder>,
    methods: Box<dyn MethodSynthesizer>,
    cors: Box<dyn CorsAugmenter>,
    deployments: Box<dyn DeploymentReconciler>,
}

impl ProxyCompiler {
    /// Create a compiler with the default components
    pub fn new() -> Result<Self> {
        Ok(Self {
            validator: Box::new(ProxyValidator::new()),
            paths: Box::new(DefaultPathResourceBuilder::new()),
            methods: Box::new(DefaultMethodSynthesizer::new()?),
            cors: Box::new(DefaultCorsAugmenter::new()?),
            deployments: Box::new(DefaultDeploymentReconciler::new()),
        })
    }

    pub fn with_validator(mut self, validator: Box<dyn DeclarationValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_path_builder(mut self, paths: Box<dyn PathResourceBuilder>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_method_synthesizer(mut self, methods: Box<dyn MethodSynthesizer>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_cors_augmenter(mut self, cors: Box<dyn CorsAugmenter>) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_deployment_reconciler(
        mut self,
        deployments: Box<dyn DeploymentReconciler>,
    ) -> Self {
        self.deployments = deployments;
        self
    }

    /// Compile `entries` into `template`
    ///
    /// Does nothing when there are no entries. Validation runs first, so an
    /// invalid entry leaves the template untouched. Errors from later phases
    /// may leave it partially written; callers must discard it then.
    pub fn compile_proxies(
        &self,
        template: &mut Template,
        entries: &[RawProxyEntry],
        host: &dyn HostContext,
    ) -> Result<CompileReport> {
        if entries.is_empty() {
            debug!("No service proxies declared, nothing to compile");
            return Ok(CompileReport::default());
        }

        let validated = self.validator.validate(entries)?;
        info!("Validated {} service proxies", validated.len());

        self.compile_validated(template, validated, host)
    }

    /// Compile into a fresh template and deep-merge it into `resources`
    ///
    /// Used for local emulation, where the host only reads the user's
    /// `resources` block. A deployment the user already declared takes the
    /// place of the one compiled here, so the merged document still holds
    /// exactly one.
    pub fn compile_for_offline(
        &self,
        resources: &mut Template,
        entries: &[RawProxyEntry],
        host: &dyn HostContext,
    ) -> Result<CompileReport> {
        let user_deployments: Vec<(String, Vec<String>)> = resources
            .resources_of_type(resource_types::DEPLOYMENT)
            .map(|(id, deployment)| (id.clone(), deployment.depends_on.clone()))
            .collect();
        if user_deployments.len() > 1 {
            return Err(ProxyError::DeploymentInvariant {
                ids: user_deployments.into_iter().map(|(id, _)| id).collect(),
            });
        }

        let mut fresh = Template::default();
        let mut report = self.compile_proxies(&mut fresh, entries, host)?;
        let compiled_deployment = report.deployment_id.clone();
        resources.merge(fresh)?;

        if let Some((user_id, depends_on)) = user_deployments.into_iter().next() {
            if let Some(compiled_id) = compiled_deployment.filter(|id| *id != user_id) {
                resources.resources.remove(&compiled_id);
            }
            let deployment = resources
                .resource_mut(&user_id)
                .ok_or_else(|| ProxyError::MissingDependency(user_id.clone()))?;
            deployment.depends_on = depends_on;
            deployment.add_dependencies(report.all_method_ids());
            debug!("Offline methods attached to user deployment {}", user_id);
            report.deployment_id = Some(user_id);
        }

        Ok(report)
    }

    fn compile_validated(
        &self,
        template: &mut Template,
        validated: ValidatedSet,
        host: &dyn HostContext,
    ) -> Result<CompileReport> {
        let stage = host
            .stage()
            .ok_or_else(|| ProxyError::MissingDependency("stage".to_string()))?;
        let api = ensure_rest_api(template, host)?;

        let mut nodes = Vec::with_capacity(validated.len());
        for proxy in validated.iter() {
            nodes.push(self.paths.ensure_path(template, &api, &proxy.segments)?);
        }
        let bound: Vec<_> = validated.iter().zip(nodes).collect();

        let mut report = CompileReport::default();
        for family in ServiceFamily::ALL {
            for (proxy, node) in bound.iter().filter(|(proxy, _)| proxy.family() == family) {
                if proxy.role_arn.is_none() {
                    let role_id = role::ensure_role(template, family, &permission_grants(proxy))?;
                    report.role_ids.insert(role_id);
                }
                let method_id = self.methods.synthesize(template, &api, proxy, node)?;
                report.method_ids.push(method_id);
            }
        }
        info!(
            "Synthesized {} methods and {} roles",
            report.method_ids.len(),
            report.role_ids.len()
        );

        report.options_method_ids = self.cors.augment(template, &api, &bound)?;
        if !report.options_method_ids.is_empty() {
            info!(
                "Added {} CORS preflight methods",
                report.options_method_ids.len()
            );
        }

        let target = DeploymentTarget {
            api,
            stage,
            instance_id: host.deployment_instance_id(),
        };
        let deployment_id = self
            .deployments
            .reconcile(template, &report.all_method_ids(), &target)?;
        info!("Deployment {} depends on this run's methods", deployment_id);

        report.deployment_id = Some(deployment_id);
        report.validated = validated;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MockHostContext;
    use serde_json::json;

    fn host() -> MockHostContext {
        let mut host = MockHostContext::new();
        host.expect_service_name().return_const("orders".to_string());
        host.expect_stage().return_const(Some("dev".to_string()));
        host.expect_region().return_const(Some("us-east-1".to_string()));
        host.expect_deployment_instance_id()
            .return_const("1700000000000".to_string());
        host.expect_rest_api().return_const(None::<ExternalRestApi>);
        host
    }

    fn entry(value: serde_json::Value) -> RawProxyEntry {
        RawProxyEntry(value)
    }

    #[test]
    fn test_compiler_creation() {
        assert!(ProxyCompiler::new().is_ok());
    }

    #[test]
    fn test_no_entries_is_a_no_op() {
        let mut template = Template::default();
        let mut host = MockHostContext::new();
        host.expect_stage().never();

        let report = ProxyCompiler::new()
            .unwrap()
            .compile_proxies(&mut template, &[], &host)
            .unwrap();

        assert_eq!(report, CompileReport::default());
        assert!(template.resources.is_empty());
    }

    #[test]
    fn test_compile_single_proxy() {
        let mut template = Template::default();
        let entries = vec![entry(json!({
            "sqs": {"path": "/orders", "method": "post", "queueName": "inbox", "cors": true}
        }))];

        let report = ProxyCompiler::new()
            .unwrap()
            .compile_proxies(&mut template, &entries, &host())
            .unwrap();

        assert_eq!(report.method_ids, vec!["ApiGatewayMethodOrdersPost"]);
        assert_eq!(report.options_method_ids, vec!["ApiGatewayMethodOrdersOptions"]);
        assert!(report.role_ids.contains("ApigatewayToSqsRole"));
        assert_eq!(
            report.deployment_id.as_deref(),
            Some("ApiGatewayDeployment1700000000000")
        );

        let deployment = template
            .resource("ApiGatewayDeployment1700000000000")
            .unwrap();
        assert_eq!(
            deployment.depends_on,
            vec!["ApiGatewayMethodOrdersPost", "ApiGatewayMethodOrdersOptions"]
        );
        assert!(template.contains(REST_API_LOGICAL_ID));
        assert!(template.contains("ApiGatewayResourceOrders"));
    }

    #[test]
    fn test_replaced_validator_is_used() {
        struct RejectAll;
        impl DeclarationValidator for RejectAll {
            fn validate(&self, _entries: &[RawProxyEntry]) -> Result<ValidatedSet> {
                Err(ProxyError::Parse("rejected".to_string()))
            }
        }

        let mut template = Template::default();
        let entries = vec![entry(json!({"sqs": {"path": "/a", "method": "get", "queueName": "q"}}))];
        let err = ProxyCompiler::new()
            .unwrap()
            .with_validator(Box::new(RejectAll))
            .compile_proxies(&mut template, &entries, &host())
            .unwrap_err();

        assert!(matches!(err, ProxyError::Parse(_)));
        assert!(template.resources.is_empty());
    }
}
