//! Service configuration loading
//!
//! Reads the host's service configuration (serverless-style YAML or JSON)
//! and extracts the parts the compiler needs: provider settings, the list
//! of raw service proxy entries and any user-supplied resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_proxy_common::{ProxyError, RawProxyEntry, Result, Template};
use std::fs;
use std::path::Path;

/// Parsed service configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    /// Service name (e.g., "orders")
    pub service: String,

    /// Provider settings (stage, region, API Gateway)
    pub provider: ProviderSettings,

    /// Raw `custom.apiGatewayServiceProxies` entries, in declaration order
    pub proxies: Vec<RawProxyEntry>,

    /// User-supplied CloudFormation fragment from the `resources` block
    pub resources: Template,
}

/// Provider section of the service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub stage: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub api_gateway: ApiGatewaySettings,
}

/// Existing REST API to attach proxies to instead of creating one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewaySettings {
    #[serde(default)]
    pub rest_api_id: Option<Value>,

    #[serde(default)]
    pub rest_api_root_resource_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ServiceFile {
    #[serde(default)]
    service: Option<ServiceName>,

    #[serde(default)]
    provider: ProviderSettings,

    #[serde(default)]
    custom: CustomSection,

    #[serde(default)]
    resources: Option<Template>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Name(String),
    Detailed { name: String },
}

#[derive(Debug, Default, Deserialize)]
struct CustomSection {
    #[serde(default, rename = "apiGatewayServiceProxies")]
    api_gateway_service_proxies: Option<Vec<RawProxyEntry>>,
}

impl ServiceConfig {
    /// Load configuration from a file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ProxyError::Parse(format!(
                "Failed to read service configuration {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: ServiceFile = serde_yaml::from_str(yaml).map_err(|e| {
            ProxyError::Parse(format!("Failed to parse service configuration YAML: {}", e))
        })?;
        Ok(file.into())
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ServiceFile = serde_json::from_str(json).map_err(|e| {
            ProxyError::Parse(format!("Failed to parse service configuration JSON: {}", e))
        })?;
        Ok(file.into())
    }

    pub fn has_proxies(&self) -> bool {
        !self.proxies.is_empty()
    }
}

impl From<ServiceFile> for ServiceConfig {
    fn from(file: ServiceFile) -> Self {
        let service = match file.service {
            Some(ServiceName::Name(name)) | Some(ServiceName::Detailed { name }) => name,
            None => String::new(),
        };

        Self {
            service,
            provider: file.provider,
            proxies: file
                .custom
                .api_gateway_service_proxies
                .unwrap_or_default(),
            resources: file.resources.unwrap_or_default(),
        }
    }
}
