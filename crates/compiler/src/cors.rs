//! CORS preflight methods
//!
//! Each path node with at least one cors-enabled proxy gets exactly one
//! `OPTIONS` method. Settings of all proxies on the node are aggregated, and
//! an `OPTIONS` method already in the template is merged rather than
//! replaced. The aggregate is kept in the method's `Metadata` so later runs
//! can read it back exactly.

use crate::resources::ResourceRef;
use crate::rest_api::RestApiRef;
use crate::templates::{self, load_templates, render};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use service_proxy_common::naming::method_logical_id;
use service_proxy_common::{
    resource_types, CorsConfig, HttpMethod, ProxyDeclaration, Resource, Result, Template,
};
use std::collections::BTreeMap;
use tera::{Context, Tera};
use tracing::debug;

const METADATA_KEY: &str = "ServiceProxyCors";
const HEADER_PREFIX: &str = "method.response.header.";

/// Adds preflight methods for cors-enabled proxies
pub trait CorsAugmenter {
    /// Returns the logical ids of the `OPTIONS` methods written
    fn augment(
        &self,
        template: &mut Template,
        api: &RestApiRef,
        proxies: &[(&ProxyDeclaration, ResourceRef)],
    ) -> Result<Vec<String>>;
}

/// CORS settings of one path node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsAggregate {
    pub methods: Vec<String>,
    pub headers: Vec<String>,
    pub origins: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

impl CorsAggregate {
    fn add_proxy(&mut self, method: HttpMethod, cors: &CorsConfig) {
        self.add_methods([method.as_str().to_string()]);
        union(&mut self.headers, cors.headers.iter().cloned());
        union(&mut self.origins, cors.origins.iter().cloned());
        self.allow_credentials |= cors.allow_credentials;
        self.max_age = self.max_age.max(cors.max_age);
        if self.cache_control.is_none() {
            self.cache_control = cors.cache_control.clone();
        }
    }

    fn merge(&mut self, other: CorsAggregate) {
        self.add_methods(other.methods);
        union(&mut self.headers, other.headers);
        union(&mut self.origins, other.origins);
        self.allow_credentials |= other.allow_credentials;
        self.max_age = self.max_age.max(other.max_age);
        if self.cache_control.is_none() {
            self.cache_control = other.cache_control;
        }
    }

    /// Methods stay sorted and always include OPTIONS
    ///
    /// `ANY` is not a verb a browser understands, so it is expanded.
    fn add_methods(&mut self, methods: impl IntoIterator<Item = String>) {
        for method in methods {
            if method.eq_ignore_ascii_case(HttpMethod::Any.as_str()) {
                self.methods.extend(
                    HttpMethod::Any
                        .concrete_methods()
                        .iter()
                        .map(|verb| verb.as_str().to_string()),
                );
            } else {
                self.methods.push(method);
            }
        }
        self.methods.push(HttpMethod::Options.as_str().to_string());
        self.methods.sort();
        self.methods.dedup();
    }

    /// Read back the aggregate of an existing `OPTIONS` method
    ///
    /// Prefers the metadata written by this compiler and falls back to the
    /// static integration response headers.
    pub fn from_resource(resource: &Resource) -> Option<Self> {
        if let Some(aggregate) = resource
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get(METADATA_KEY))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
        {
            return Some(aggregate);
        }

        let parameters = resource
            .property("Integration")?
            .get("IntegrationResponses")?
            .as_array()?
            .first()?
            .get("ResponseParameters")?
            .as_object()?;
        let header = |name: &str| {
            parameters
                .get(&format!("{}{}", HEADER_PREFIX, name))
                .and_then(Value::as_str)
                .map(|value| value.trim_matches('\'').to_string())
        };
        let list = |name: &str| {
            header(name)
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<String>>()
                })
                .unwrap_or_default()
        };

        let mut aggregate = CorsAggregate {
            methods: Vec::new(),
            headers: list("Access-Control-Allow-Headers"),
            origins: list("Access-Control-Allow-Origin"),
            allow_credentials: header("Access-Control-Allow-Credentials").as_deref()
                == Some("true"),
            max_age: header("Access-Control-Max-Age").and_then(|age| age.parse().ok()),
            cache_control: header("Cache-Control"),
        };
        aggregate.add_methods(list("Access-Control-Allow-Methods"));
        Some(aggregate)
    }
}

pub struct DefaultCorsAugmenter {
    tera: Tera,
}

impl DefaultCorsAugmenter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tera: load_templates()?,
        })
    }

    /// Existing `OPTIONS` method of a node, by conventional id or by binding
    fn find_existing(template: &Template, logical_id: &str, node: &ResourceRef) -> Option<String> {
        if template
            .resource(logical_id)
            .is_some_and(|resource| resource.is_type(resource_types::METHOD))
        {
            return Some(logical_id.to_string());
        }

        template
            .resources_of_type(resource_types::METHOD)
            .find(|(_, resource)| {
                resource.property("ResourceId") == Some(&node.value)
                    && resource.property("HttpMethod").and_then(Value::as_str)
                        == Some(HttpMethod::Options.as_str())
            })
            .map(|(id, _)| id.clone())
    }

    fn preflight_method(
        &self,
        api: &RestApiRef,
        node: &ResourceRef,
        aggregate: &CorsAggregate,
    ) -> Result<Value> {
        let mut parameters = Map::new();
        let mut quoted = |name: &str, value: String| {
            parameters.insert(format!("{}{}", HEADER_PREFIX, name), json!(format!("'{}'", value)));
        };
        quoted("Access-Control-Allow-Origin", aggregate.origins.join(","));
        quoted("Access-Control-Allow-Headers", aggregate.headers.join(","));
        quoted("Access-Control-Allow-Methods", aggregate.methods.join(","));
        if aggregate.allow_credentials {
            quoted("Access-Control-Allow-Credentials", "true".to_string());
        }
        if let Some(max_age) = aggregate.max_age {
            quoted("Access-Control-Max-Age", max_age.to_string());
        }
        if let Some(cache_control) = &aggregate.cache_control {
            quoted("Cache-Control", cache_control.clone());
        }

        let mut response_templates = Map::new();
        if aggregate.origins.len() > 1 {
            let mut context = Context::new();
            context.insert("origins", &aggregate.origins);
            response_templates.insert(
                "application/json".to_string(),
                json!(render(&self.tera, templates::CORS_ORIGIN, &context)?),
            );
        }

        let method_parameters: Map<String, Value> =
            parameters.keys().map(|key| (key.clone(), json!(true))).collect();

        Ok(json!({
            "AuthorizationType": "NONE",
            "HttpMethod": HttpMethod::Options.as_str(),
            "MethodResponses": [{
                "StatusCode": "200",
                "ResponseParameters": method_parameters,
                "ResponseModels": {},
            }],
            "RequestParameters": {},
            "Integration": {
                "Type": "MOCK",
                "RequestTemplates": { "application/json": "{statusCode:200}" },
                "ContentHandling": "CONVERT_TO_TEXT",
                "IntegrationResponses": [{
                    "StatusCode": "200",
                    "ResponseParameters": parameters,
                    "ResponseTemplates": response_templates,
                }],
            },
            "ResourceId": node.value,
            "RestApiId": api.rest_api_id(),
        }))
    }
}

impl CorsAugmenter for DefaultCorsAugmenter {
    fn augment(
        &self,
        template: &mut Template,
        api: &RestApiRef,
        proxies: &[(&ProxyDeclaration, ResourceRef)],
    ) -> Result<Vec<String>> {
        let mut nodes: BTreeMap<Vec<String>, (&ResourceRef, CorsAggregate)> = BTreeMap::new();
        for (proxy, node) in proxies {
            let Some(cors) = &proxy.cors else {
                continue;
            };
            nodes
                .entry(node.segments.clone())
                .or_insert_with(|| (node, CorsAggregate::default()))
                .1
                .add_proxy(proxy.method, cors);
        }

        let mut ids = Vec::with_capacity(nodes.len());
        for (segments, (node, mut aggregate)) in nodes {
            let conventional_id = method_logical_id(&segments, HttpMethod::Options);
            let existing_id = Self::find_existing(template, &conventional_id, node);

            let mut metadata = Map::new();
            if let Some(existing) = existing_id.as_deref().and_then(|id| template.resource(id)) {
                if let Some(previous) = CorsAggregate::from_resource(existing) {
                    let mut merged = previous;
                    merged.merge(aggregate);
                    aggregate = merged;
                }
                if let Some(Value::Object(previous)) = &existing.metadata {
                    metadata = previous.clone();
                }
            }
            metadata.insert(METADATA_KEY.to_string(), serde_json::to_value(&aggregate)?);

            let logical_id = existing_id.unwrap_or(conventional_id);
            let method = Resource::new(
                resource_types::METHOD,
                self.preflight_method(api, node, &aggregate)?,
            )
            .with_metadata(Value::Object(metadata));
            template.put_resource(&logical_id, method)?;
            debug!(
                "CORS preflight {} allows {}",
                logical_id,
                aggregate.methods.join(",")
            );

            ids.push(logical_id);
        }

        Ok(ids)
    }
}

/// Append items not yet present, keeping order
fn union(list: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}
