//! Proxy declaration model
//!
//! `RawProxyEntry` is what a user wrote in the service configuration.
//! `ProxyDeclaration` is the typed form produced by validation, annotated
//! with normalized path segments for reuse by the compiler.

use crate::family::{HttpMethod, ServiceFamily};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One user-authored entry, e.g. `{"kinesis": {"path": "/stream", ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProxyEntry(pub Value);

/// Reference to a backing AWS resource
///
/// Either a plain resource name or a CloudFormation intrinsic such as
/// `{"Ref": "MyStream"}` or `{"Fn::GetAtt": ["MyQueue", "QueueName"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceReference(Value);

impl ResourceReference {
    /// Intrinsic functions that resolve to a name at deploy time
    pub const INTRINSICS: [&'static str; 5] =
        ["Ref", "Fn::GetAtt", "Fn::ImportValue", "Fn::Sub", "Fn::Join"];

    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Whether the reference can be resolved when the template is compiled
    pub fn is_resolvable(&self) -> bool {
        match &self.0 {
            Value::String(name) => !name.trim().is_empty(),
            Value::Object(map) => {
                map.len() == 1
                    && map
                        .keys()
                        .all(|key| Self::INTRINSICS.contains(&key.as_str()))
            }
            _ => false,
        }
    }
}

/// Where a request value comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamBinding {
    PathParam(String),
    QueryStringParam(String),
    BodyParam(String),
}

impl ParamBinding {
    pub fn name(&self) -> &str {
        match self {
            ParamBinding::PathParam(name)
            | ParamBinding::QueryStringParam(name)
            | ParamBinding::BodyParam(name) => name,
        }
    }

    /// Mapping expression that reads the value inside a request template
    pub fn vtl_expression(&self) -> String {
        match self {
            ParamBinding::PathParam(name) => format!("$input.params().path.{}", name),
            ParamBinding::QueryStringParam(name) => {
                format!("$input.params().querystring.{}", name)
            }
            ParamBinding::BodyParam(name) => format!("$util.parseJson($input.body).{}", name),
        }
    }

    /// Method request parameter the binding reads, if any
    pub fn method_request_parameter(&self) -> Option<String> {
        match self {
            ParamBinding::PathParam(name) => Some(format!("method.request.path.{}", name)),
            ParamBinding::QueryStringParam(name) => {
                Some(format!("method.request.querystring.{}", name))
            }
            ParamBinding::BodyParam(_) => None,
        }
    }
}

/// A literal value or a binding to part of the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSource {
    Literal(String),
    Bound(ParamBinding),
}

impl ValueSource {
    pub fn vtl_expression(&self) -> String {
        match self {
            ValueSource::Literal(value) => value.clone(),
            ValueSource::Bound(binding) => binding.vtl_expression(),
        }
    }

    pub fn binding(&self) -> Option<&ParamBinding> {
        match self {
            ValueSource::Literal(_) => None,
            ValueSource::Bound(binding) => Some(binding),
        }
    }
}

/// Kinesis operation invoked by a stream proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum StreamAction {
    #[default]
    PutRecord,
    PutRecords,
}

impl StreamAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamAction::PutRecord => "PutRecord",
            StreamAction::PutRecords => "PutRecords",
        }
    }

    pub fn iam_action(&self) -> String {
        format!("kinesis:{}", self.as_str())
    }
}

/// S3 operation invoked by an object-store proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectAction {
    GetObject,
    PutObject,
    DeleteObject,
}

impl ObjectAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAction::GetObject => "GetObject",
            ObjectAction::PutObject => "PutObject",
            ObjectAction::DeleteObject => "DeleteObject",
        }
    }

    /// HTTP method of the S3 REST call behind the action
    pub fn http_method(&self) -> HttpMethod {
        match self {
            ObjectAction::GetObject => HttpMethod::Get,
            ObjectAction::PutObject => HttpMethod::Put,
            ObjectAction::DeleteObject => HttpMethod::Delete,
        }
    }

    pub fn iam_action(&self) -> String {
        format!("s3:{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamParams {
    pub stream_name: ResourceReference,
    pub partition_key: Option<ValueSource>,
    pub action: StreamAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueParams {
    pub queue_name: ResourceReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectStoreParams {
    pub bucket: ResourceReference,
    pub action: ObjectAction,
    pub key: ValueSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicParams {
    pub topic_name: ResourceReference,
}

/// Family-specific parameters, one variant per supported family
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceParams {
    Stream(StreamParams),
    Queue(QueueParams),
    ObjectStore(ObjectStoreParams),
    Topic(TopicParams),
}

impl ServiceParams {
    pub fn family(&self) -> ServiceFamily {
        match self {
            ServiceParams::Stream(_) => ServiceFamily::Stream,
            ServiceParams::Queue(_) => ServiceFamily::Queue,
            ServiceParams::ObjectStore(_) => ServiceFamily::ObjectStore,
            ServiceParams::Topic(_) => ServiceFamily::Topic,
        }
    }
}

/// Resolved cross-origin settings for one proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub origins: Vec<String>,
    pub headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u32>,
    pub cache_control: Option<String>,
}

impl CorsConfig {
    pub const DEFAULT_HEADERS: [&'static str; 6] = [
        "Content-Type",
        "X-Amz-Date",
        "Authorization",
        "X-Api-Key",
        "X-Amz-Security-Token",
        "X-Amz-User-Agent",
    ];
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
            headers: Self::DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
            allow_credentials: false,
            max_age: None,
            cache_control: None,
        }
    }
}

/// Method authorization passthrough
#[derive(Debug, Clone, PartialEq)]
pub struct Authorization {
    pub authorization_type: String,
    pub authorizer_id: Option<Value>,
    pub scopes: Vec<String>,
    pub api_key_required: bool,
}

impl Default for Authorization {
    fn default() -> Self {
        Self {
            authorization_type: "NONE".to_string(),
            authorizer_id: None,
            scopes: Vec::new(),
            api_key_required: false,
        }
    }
}

/// A validated service proxy
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyDeclaration {
    /// Path as authored
    pub path: String,
    /// Normalized path segments (empty for the root path)
    pub segments: Vec<String>,
    pub method: HttpMethod,
    pub params: ServiceParams,
    pub cors: Option<CorsConfig>,
    pub authorization: Authorization,
    /// Integration request parameters passed through verbatim
    pub request_parameters: BTreeMap<String, Value>,
    /// Method request parameters passed through verbatim
    pub accept_parameters: BTreeMap<String, bool>,
    /// Per content-type overrides of the generated request mapping
    pub request_templates: BTreeMap<String, String>,
    /// Caller-supplied integration role; no role is generated for this proxy
    pub role_arn: Option<Value>,
}

impl ProxyDeclaration {
    pub fn family(&self) -> ServiceFamily {
        self.params.family()
    }

    /// Normalized path with a single leading slash ("/" for the root)
    pub fn normalized_path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Short human-readable label, e.g. "kinesis POST /stream"
    pub fn label(&self) -> String {
        format!("{} {} {}", self.family(), self.method, self.normalized_path())
    }
}

/// Declarations that passed validation, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedSet {
    proxies: Vec<ProxyDeclaration>,
}

impl ValidatedSet {
    pub fn new(proxies: Vec<ProxyDeclaration>) -> Self {
        Self { proxies }
    }

    pub fn proxies(&self) -> &[ProxyDeclaration] {
        &self.proxies
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyDeclaration> {
        self.proxies.iter()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Families exercised by at least one declaration
    pub fn families(&self) -> BTreeSet<ServiceFamily> {
        self.proxies.iter().map(|p| p.family()).collect()
    }
}
