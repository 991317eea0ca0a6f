//! Method and integration synthesis

use crate::families::{integration_shape, IntegrationShape};
use crate::resources::ResourceRef;
use crate::rest_api::RestApiRef;
use crate::templates::{self, load_templates, render};
use serde_json::{json, Map, Value};
use service_proxy_common::naming::method_logical_id;
use service_proxy_common::{
    resource_types, CorsConfig, ProxyDeclaration, ProxyError, Resource, Result, Template,
};
use tera::{Context, Tera};
use tracing::debug;

const ALLOW_ORIGIN: &str = "method.response.header.Access-Control-Allow-Origin";
const ALLOW_CREDENTIALS: &str = "method.response.header.Access-Control-Allow-Credentials";

/// Emits the method resource of one proxy
pub trait MethodSynthesizer {
    /// Write the method for `proxy` on `resource`, returning its logical id
    fn synthesize(
        &self,
        template: &mut Template,
        api: &RestApiRef,
        proxy: &ProxyDeclaration,
        resource: &ResourceRef,
    ) -> Result<String>;
}

pub struct DefaultMethodSynthesizer {
    tera: Tera,
}

impl DefaultMethodSynthesizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tera: load_templates()?,
        })
    }

    /// Fail if another method already binds (resource, method)
    fn check_binding(
        template: &Template,
        logical_id: &str,
        proxy: &ProxyDeclaration,
        resource: &ResourceRef,
    ) -> Result<()> {
        let method = proxy.method.as_str();

        let taken = template
            .resources_of_type(resource_types::METHOD)
            .any(|(id, existing)| {
                id != logical_id
                    && existing.property("ResourceId") == Some(&resource.value)
                    && existing.property("HttpMethod").and_then(Value::as_str) == Some(method)
            });
        if taken {
            return Err(ProxyError::DuplicateMethod {
                resource: resource.path(),
                method: method.to_string(),
            });
        }

        if let Some(existing) = template.resource(logical_id) {
            let same_binding = existing.property("ResourceId") == Some(&resource.value)
                && existing.property("HttpMethod").and_then(Value::as_str) == Some(method);
            if existing.is_type(resource_types::METHOD) && !same_binding {
                return Err(ProxyError::DocumentConflict {
                    logical_id: logical_id.to_string(),
                    reason: format!(
                        "already bound to a different resource or method than {}",
                        proxy.label()
                    ),
                });
            }
        }

        Ok(())
    }

    fn integration(&self, proxy: &ProxyDeclaration, shape: IntegrationShape) -> Result<Value> {
        let mut request_parameters = shape.request_parameters;
        for (key, value) in &proxy.request_parameters {
            request_parameters.insert(key.clone(), value.clone());
        }

        let mut request_templates = shape.request_templates;
        for (content_type, body) in &proxy.request_templates {
            request_templates.insert(content_type.clone(), Value::String(body.clone()));
        }

        let credentials = match &proxy.role_arn {
            Some(role_arn) => role_arn.clone(),
            None => json!({ "Fn::GetAtt": [proxy.family().role_logical_id(), "Arn"] }),
        };

        let responses = self.integration_responses(proxy, shape.success_response_parameters)?;

        let mut integration = json!({
            "IntegrationHttpMethod": shape.http_method.as_str(),
            "Type": "AWS",
            "Credentials": credentials,
            "Uri": shape.uri,
            "PassthroughBehavior": shape.passthrough_behavior,
            "IntegrationResponses": responses,
        });
        if !request_parameters.is_empty() {
            integration["RequestParameters"] = Value::Object(request_parameters);
        }
        if !request_templates.is_empty() {
            integration["RequestTemplates"] = Value::Object(request_templates);
        }

        Ok(integration)
    }

    fn integration_responses(
        &self,
        proxy: &ProxyDeclaration,
        success_parameters: Map<String, Value>,
    ) -> Result<Vec<Value>> {
        let cors_parameters = proxy
            .cors
            .as_ref()
            .map(cors_response_parameters)
            .unwrap_or_default();

        let mut success = success_parameters;
        success.extend(cors_parameters.clone());

        let mut success_templates = Map::new();
        if let Some(cors) = proxy.cors.as_ref().filter(|cors| cors.origins.len() > 1) {
            let mut context = Context::new();
            context.insert("origins", &cors.origins);
            let origin_template = render(&self.tera, templates::CORS_ORIGIN, &context)?;
            success_templates.insert(
                "application/json".to_string(),
                json!(format!("{}\n$input.body", origin_template)),
            );
        }

        Ok(vec![
            json!({
                "StatusCode": 200,
                "SelectionPattern": "2\\d{2}",
                "ResponseParameters": success,
                "ResponseTemplates": success_templates,
            }),
            json!({
                "StatusCode": 400,
                "SelectionPattern": "4\\d{2}",
                "ResponseParameters": cors_parameters,
                "ResponseTemplates": {},
            }),
            json!({
                "StatusCode": 500,
                "SelectionPattern": "5\\d{2}",
                "ResponseParameters": cors_parameters,
                "ResponseTemplates": {},
            }),
        ])
    }
}

impl MethodSynthesizer for DefaultMethodSynthesizer {
    fn synthesize(
        &self,
        template: &mut Template,
        api: &RestApiRef,
        proxy: &ProxyDeclaration,
        resource: &ResourceRef,
    ) -> Result<String> {
        let logical_id = method_logical_id(&proxy.segments, proxy.method);
        Self::check_binding(template, &logical_id, proxy, resource)?;

        let shape = integration_shape(&self.tera, proxy)?;

        let mut request_parameters: Map<String, Value> = shape
            .method_request_parameters
            .iter()
            .map(|(key, required)| (key.clone(), json!(required)))
            .collect();
        for (key, required) in &proxy.accept_parameters {
            request_parameters.insert(key.clone(), json!(required));
        }

        let cors_keys = proxy
            .cors
            .as_ref()
            .map(cors_response_parameters)
            .unwrap_or_default();
        let success_keys: Vec<String> = shape
            .success_response_parameters
            .keys()
            .chain(cors_keys.keys())
            .cloned()
            .collect();

        let mut properties = json!({
            "HttpMethod": proxy.method.as_str(),
            "AuthorizationType": proxy.authorization.authorization_type,
            "ApiKeyRequired": proxy.authorization.api_key_required,
            "ResourceId": resource.value,
            "RestApiId": api.rest_api_id(),
            "Integration": self.integration(proxy, shape)?,
            "MethodResponses": method_responses(&success_keys, proxy.cors.as_ref()),
        });
        if !request_parameters.is_empty() {
            properties["RequestParameters"] = Value::Object(request_parameters);
        }
        if let Some(authorizer_id) = &proxy.authorization.authorizer_id {
            properties["AuthorizerId"] = authorizer_id.clone();
        }
        if !proxy.authorization.scopes.is_empty() {
            properties["AuthorizationScopes"] = json!(proxy.authorization.scopes);
        }

        template.put_resource(&logical_id, Resource::new(resource_types::METHOD, properties))?;
        debug!("Synthesized method {} for {}", logical_id, proxy.label());

        Ok(logical_id)
    }
}

/// Static CORS headers added to every integration response
fn cors_response_parameters(cors: &CorsConfig) -> Map<String, Value> {
    let mut parameters = Map::new();
    parameters.insert(
        ALLOW_ORIGIN.to_string(),
        json!(format!("'{}'", cors.origins.join(","))),
    );
    if cors.allow_credentials {
        parameters.insert(ALLOW_CREDENTIALS.to_string(), json!("'true'"));
    }
    parameters
}

fn method_responses(success_keys: &[String], cors: Option<&CorsConfig>) -> Value {
    let success: Map<String, Value> = success_keys
        .iter()
        .map(|key| (key.clone(), json!(true)))
        .collect();
    let error: Map<String, Value> = cors
        .map(cors_response_parameters)
        .unwrap_or_default()
        .into_iter()
        .map(|(key, _)| (key, json!(true)))
        .collect();

    json!([
        { "StatusCode": 200, "ResponseParameters": success },
        { "StatusCode": 400, "ResponseParameters": error },
        { "StatusCode": 500, "ResponseParameters": error },
    ])
}
