//! Service proxy validation
//!
//! Turns raw configuration entries into typed `ProxyDeclaration`s. The
//! check is pure and stops at the first offending entry; nothing is
//! emitted into a template until the whole set has passed.

use crate::path::{normalize_path, path_parameters};
use serde::Deserialize;
use serde_json::{Map, Value};
use service_proxy_common::naming::resource_logical_id;
use service_proxy_common::{
    Authorization, CorsConfig, DeclarationValidator, HttpMethod, ObjectAction, ObjectStoreParams,
    ParamBinding, ProxyDeclaration, ProxyError, QueueParams, RawProxyEntry, ResourceReference,
    Result, ServiceFamily, ServiceParams, StreamAction, StreamParams, TopicParams, ValidatedSet,
    ValidationKind, ValueSource,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const AUTHORIZATION_TYPES: [&str; 4] = ["NONE", "AWS_IAM", "CUSTOM", "COGNITO_USER_POOLS"];

/// Default validator for service proxy entries
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyValidator;

impl ProxyValidator {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarationValidator for ProxyValidator {
    fn validate(&self, entries: &[RawProxyEntry]) -> Result<ValidatedSet> {
        validate(entries)
    }
}

/// Validate raw entries into a `ValidatedSet`
pub fn validate(entries: &[RawProxyEntry]) -> Result<ValidatedSet> {
    let mut proxies = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        proxies.push(validate_entry(index, entry)?);
    }

    check_duplicates(&proxies)?;
    check_logical_ids(&proxies)?;
    check_options_conflicts(&proxies)?;

    debug!(count = proxies.len(), "validated service proxies");
    Ok(ValidatedSet::new(proxies))
}

/// Raw entry body; fields of every family, all optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProxyBody {
    path: Option<String>,
    method: Option<String>,
    cors: Option<RawCors>,
    authorization_type: Option<String>,
    authorizer_id: Option<Value>,
    authorization_scopes: Option<Vec<String>>,
    private: Option<bool>,
    request_parameters: Option<BTreeMap<String, Value>>,
    accept_parameters: Option<BTreeMap<String, bool>>,
    request: Option<RawRequest>,
    role_arn: Option<Value>,

    // stream
    stream_name: Option<Value>,
    partition_key: Option<ValueSource>,
    // stream and object-store
    action: Option<String>,
    // queue
    queue_name: Option<Value>,
    // object-store
    bucket: Option<Value>,
    key: Option<ValueSource>,
    // topic
    topic_name: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCors {
    Enabled(bool),
    Custom(RawCorsOptions),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCorsOptions {
    origin: Option<String>,
    origins: Option<Vec<String>>,
    headers: Option<Vec<String>>,
    #[serde(default)]
    allow_credentials: bool,
    max_age: Option<u32>,
    cache_control: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    #[serde(default)]
    template: BTreeMap<String, String>,
}

/// Error context for one entry
struct EntryContext {
    index: usize,
    label: String,
}

impl EntryContext {
    fn error(&self, kind: ValidationKind, message: impl Into<String>) -> ProxyError {
        ProxyError::validation(self.index, self.label.clone(), kind, message)
    }

    fn missing(&self, field: &str) -> ProxyError {
        self.error(
            ValidationKind::MissingField,
            format!("'{}' is required", field),
        )
    }
}

fn validate_entry(index: usize, entry: &RawProxyEntry) -> Result<ProxyDeclaration> {
    let (key, body) = split_entry(index, entry)?;

    let family = ServiceFamily::from_key(key).ok_or_else(|| ProxyError::UnsupportedFamily {
        index,
        family: key.to_string(),
    })?;

    let ctx = EntryContext {
        index,
        label: entry_label(key, body),
    };

    let raw: RawProxyBody = serde_json::from_value(Value::Object(body.clone()))
        .map_err(|e| ctx.error(ValidationKind::MalformedEntry, e.to_string()))?;

    let path = raw.path.clone().ok_or_else(|| ctx.missing("path"))?;
    let segments =
        normalize_path(&path).map_err(|reason| ctx.error(ValidationKind::InvalidPath, reason))?;

    let method_name = raw.method.as_deref().ok_or_else(|| ctx.missing("method"))?;
    let method: HttpMethod = method_name
        .parse()
        .map_err(|reason: String| ctx.error(ValidationKind::InvalidMethod, reason))?;

    let path_params = path_parameters(&segments);
    let params = match family {
        ServiceFamily::Stream => stream_params(&ctx, &raw, &path_params)?,
        ServiceFamily::Queue => ServiceParams::Queue(QueueParams {
            queue_name: required_reference(&ctx, "queueName", raw.queue_name.as_ref())?,
        }),
        ServiceFamily::ObjectStore => object_store_params(&ctx, &raw, &path_params)?,
        ServiceFamily::Topic => ServiceParams::Topic(TopicParams {
            topic_name: required_reference(&ctx, "topicName", raw.topic_name.as_ref())?,
        }),
    };

    let cors = cors_config(&ctx, raw.cors)?;
    let authorization = authorization(
        &ctx,
        raw.authorization_type,
        raw.authorizer_id,
        raw.authorization_scopes,
        raw.private,
    )?;

    if let Some(role_arn) = &raw.role_arn {
        if !ResourceReference::new(role_arn.clone()).is_resolvable() {
            return Err(ctx.error(
                ValidationKind::MalformedEntry,
                "'roleArn' must be an ARN string or a CloudFormation intrinsic",
            ));
        }
    }

    Ok(ProxyDeclaration {
        path,
        segments,
        method,
        params,
        cors,
        authorization,
        request_parameters: raw.request_parameters.unwrap_or_default(),
        accept_parameters: raw.accept_parameters.unwrap_or_default(),
        request_templates: raw.request.map(|r| r.template).unwrap_or_default(),
        role_arn: raw.role_arn,
    })
}

fn split_entry(index: usize, entry: &RawProxyEntry) -> Result<(&str, &Map<String, Value>)> {
    let malformed = |message: &str| {
        ProxyError::validation(
            index,
            "<entry>",
            ValidationKind::MalformedEntry,
            message.to_string(),
        )
    };

    let map = entry
        .0
        .as_object()
        .ok_or_else(|| malformed("each service proxy must be a map"))?;

    if map.len() != 1 {
        return Err(malformed(&format!(
            "each service proxy must declare exactly one service, found {}",
            map.len()
        )));
    }

    let Some((key, body)) = map.iter().next() else {
        return Err(malformed("empty service proxy"));
    };

    let body = body.as_object().ok_or_else(|| {
        ProxyError::validation(
            index,
            key.clone(),
            ValidationKind::MalformedEntry,
            "service proxy settings must be a map",
        )
    })?;

    Ok((key.as_str(), body))
}

fn entry_label(key: &str, body: &Map<String, Value>) -> String {
    let method = body
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_uppercase)
        .unwrap_or_else(|| "?".to_string());
    let path = body.get("path").and_then(Value::as_str).unwrap_or("?");
    format!("{} {} {}", key, method, path)
}

fn required_reference(
    ctx: &EntryContext,
    field: &str,
    value: Option<&Value>,
) -> Result<ResourceReference> {
    let value = value.ok_or_else(|| ctx.missing(field))?;
    let reference = ResourceReference::new(value.clone());
    if !reference.is_resolvable() {
        return Err(ctx.error(
            ValidationKind::FamilyConstraint,
            format!(
                "'{}' must be a name or one of {} resolvable at compile time",
                field,
                ResourceReference::INTRINSICS.join(", ")
            ),
        ));
    }
    Ok(reference)
}

fn check_path_binding(
    ctx: &EntryContext,
    field: &str,
    source: &ValueSource,
    path_params: &[String],
) -> Result<()> {
    if let Some(ParamBinding::PathParam(name)) = source.binding() {
        if !path_params.iter().any(|p| p == name) {
            return Err(ctx.error(
                ValidationKind::FamilyConstraint,
                format!(
                    "'{}' binds path parameter '{}' which is not in the path",
                    field, name
                ),
            ));
        }
    }
    Ok(())
}

fn stream_params(
    ctx: &EntryContext,
    raw: &RawProxyBody,
    path_params: &[String],
) -> Result<ServiceParams> {
    let stream_name = required_reference(ctx, "streamName", raw.stream_name.as_ref())?;

    let action = match raw.action.as_deref() {
        None | Some("PutRecord") => StreamAction::PutRecord,
        Some("PutRecords") => StreamAction::PutRecords,
        Some(other) => {
            return Err(ctx.error(
                ValidationKind::FamilyConstraint,
                format!(
                    "unsupported kinesis action '{}', expected PutRecord or PutRecords",
                    other
                ),
            ))
        }
    };

    if let Some(partition_key) = &raw.partition_key {
        check_path_binding(ctx, "partitionKey", partition_key, path_params)?;
    }

    Ok(ServiceParams::Stream(StreamParams {
        stream_name,
        partition_key: raw.partition_key.clone(),
        action,
    }))
}

fn object_store_params(
    ctx: &EntryContext,
    raw: &RawProxyBody,
    path_params: &[String],
) -> Result<ServiceParams> {
    let bucket = required_reference(ctx, "bucket", raw.bucket.as_ref())?;

    let action = match raw.action.as_deref() {
        None => return Err(ctx.missing("action")),
        Some("GetObject") => ObjectAction::GetObject,
        Some("PutObject") => ObjectAction::PutObject,
        Some("DeleteObject") => ObjectAction::DeleteObject,
        Some(other) => {
            return Err(ctx.error(
                ValidationKind::FamilyConstraint,
                format!(
                    "unsupported s3 action '{}', expected GetObject, PutObject or DeleteObject",
                    other
                ),
            ))
        }
    };

    let key = raw.key.clone().ok_or_else(|| ctx.missing("key"))?;
    match &key {
        ValueSource::Literal(value) if value.trim().is_empty() => {
            return Err(ctx.error(ValidationKind::FamilyConstraint, "'key' must not be empty"));
        }
        ValueSource::Bound(ParamBinding::BodyParam(_)) => {
            return Err(ctx.error(
                ValidationKind::FamilyConstraint,
                "'key' can only be bound to a pathParam or queryStringParam",
            ));
        }
        _ => {}
    }
    check_path_binding(ctx, "key", &key, path_params)?;

    Ok(ServiceParams::ObjectStore(ObjectStoreParams {
        bucket,
        action,
        key,
    }))
}

fn cors_config(ctx: &EntryContext, raw: Option<RawCors>) -> Result<Option<CorsConfig>> {
    let options = match raw {
        None | Some(RawCors::Enabled(false)) => return Ok(None),
        Some(RawCors::Enabled(true)) => return Ok(Some(CorsConfig::default())),
        Some(RawCors::Custom(options)) => options,
    };

    let defaults = CorsConfig::default();
    let origins = match (options.origin, options.origins) {
        (Some(_), Some(_)) => {
            return Err(ctx.error(
                ValidationKind::ConflictingOptions,
                "cors accepts either 'origin' or 'origins', not both",
            ))
        }
        (Some(origin), None) => vec![origin],
        (None, Some(origins)) if !origins.is_empty() => origins,
        _ => defaults.origins,
    };

    Ok(Some(CorsConfig {
        origins,
        headers: options.headers.unwrap_or(defaults.headers),
        allow_credentials: options.allow_credentials,
        max_age: options.max_age,
        cache_control: options.cache_control,
    }))
}

fn authorization(
    ctx: &EntryContext,
    authorization_type: Option<String>,
    authorizer_id: Option<Value>,
    scopes: Option<Vec<String>>,
    private: Option<bool>,
) -> Result<Authorization> {
    let authorization_type = authorization_type
        .map(|t| t.to_uppercase())
        .unwrap_or_else(|| "NONE".to_string());

    if !AUTHORIZATION_TYPES.contains(&authorization_type.as_str()) {
        return Err(ctx.error(
            ValidationKind::MalformedEntry,
            format!(
                "unsupported authorizationType '{}', expected one of {}",
                authorization_type,
                AUTHORIZATION_TYPES.join(", ")
            ),
        ));
    }

    if authorizer_id.is_some()
        && !matches!(authorization_type.as_str(), "CUSTOM" | "COGNITO_USER_POOLS")
    {
        return Err(ctx.error(
            ValidationKind::ConflictingOptions,
            "'authorizerId' requires authorizationType CUSTOM or COGNITO_USER_POOLS",
        ));
    }

    let scopes = scopes.unwrap_or_default();
    if !scopes.is_empty() && authorization_type != "COGNITO_USER_POOLS" {
        return Err(ctx.error(
            ValidationKind::ConflictingOptions,
            "'authorizationScopes' requires authorizationType COGNITO_USER_POOLS",
        ));
    }

    Ok(Authorization {
        authorization_type,
        authorizer_id,
        scopes,
        api_key_required: private.unwrap_or(false),
    })
}

fn check_duplicates(proxies: &[ProxyDeclaration]) -> Result<()> {
    let mut seen: HashMap<(&[String], HttpMethod), usize> = HashMap::new();
    for (index, proxy) in proxies.iter().enumerate() {
        if let Some(first) = seen.insert((proxy.segments.as_slice(), proxy.method), index) {
            return Err(ProxyError::validation(
                index,
                proxy.label(),
                ValidationKind::DuplicateMethod,
                format!(
                    "{} {} is already declared by the service proxy at index {}",
                    proxy.method,
                    proxy.normalized_path(),
                    first
                ),
            ));
        }
    }
    Ok(())
}

/// Distinct paths must not share a resource logical id
///
/// Normalization drops characters and folds case on the first letter, so
/// `/users` and `/Users` (or `/a-b` and `/aDashb`) would name the same node.
/// Method ids derive from the same normalized path, so this covers them too.
fn check_logical_ids(proxies: &[ProxyDeclaration]) -> Result<()> {
    let mut seen: HashMap<String, (&[String], usize)> = HashMap::new();
    for (index, proxy) in proxies.iter().enumerate() {
        for end in 1..=proxy.segments.len() {
            let prefix = &proxy.segments[..end];
            let logical_id = resource_logical_id(prefix);
            match seen.get(&logical_id) {
                Some((other, first)) if *other != prefix => {
                    return Err(ProxyError::validation(
                        index,
                        proxy.label(),
                        ValidationKind::InvalidPath,
                        format!(
                            "/{} and /{} (service proxy at index {}) both map to logical id {}",
                            prefix.join("/"),
                            other.join("/"),
                            first,
                            logical_id
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    seen.insert(logical_id, (prefix, index));
                }
            }
        }
    }
    Ok(())
}

/// A user-declared OPTIONS proxy cannot share a path with generated CORS support
fn check_options_conflicts(proxies: &[ProxyDeclaration]) -> Result<()> {
    for (index, proxy) in proxies.iter().enumerate() {
        if proxy.method != HttpMethod::Options {
            continue;
        }
        if proxies
            .iter()
            .any(|other| other.cors.is_some() && other.segments == proxy.segments)
        {
            return Err(ProxyError::validation(
                index,
                proxy.label(),
                ValidationKind::ConflictingOptions,
                format!(
                    "OPTIONS on {} conflicts with cors enabled on the same path",
                    proxy.normalized_path()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> RawProxyEntry {
        RawProxyEntry(value)
    }

    fn kind_of(result: Result<ValidatedSet>) -> ValidationKind {
        result
            .unwrap_err()
            .validation_kind()
            .expect("expected a validation error")
    }

    #[test]
    fn test_entry_must_have_one_service() {
        let result = validate(&[entry(json!({
            "kinesis": {"path": "/a", "method": "post", "streamName": "s"},
            "sqs": {"path": "/b", "method": "post", "queueName": "q"}
        }))]);
        assert_eq!(kind_of(result), ValidationKind::MalformedEntry);
    }

    #[test]
    fn test_unsupported_family() {
        let result = validate(&[entry(json!({"dynamodb": {"path": "/a", "method": "get"}}))]);
        assert!(matches!(
            result,
            Err(ProxyError::UnsupportedFamily { index: 0, ref family }) if family == "dynamodb"
        ));
    }

    #[test]
    fn test_missing_path_and_method() {
        let result = validate(&[entry(json!({"sqs": {"method": "post", "queueName": "q"}}))]);
        assert_eq!(kind_of(result), ValidationKind::MissingField);

        let result = validate(&[entry(json!({"sqs": {"path": "/q", "queueName": "q"}}))]);
        assert_eq!(kind_of(result), ValidationKind::MissingField);
    }

    #[test]
    fn test_invalid_method() {
        let result = validate(&[entry(json!({
            "sqs": {"path": "/q", "method": "trace", "queueName": "q"}
        }))]);
        assert_eq!(kind_of(result), ValidationKind::InvalidMethod);
    }

    #[test]
    fn test_invalid_path() {
        let result = validate(&[entry(json!({
            "sqs": {"path": "/q/{id", "method": "post", "queueName": "q"}
        }))]);
        assert_eq!(kind_of(result), ValidationKind::InvalidPath);
    }

    #[test]
    fn test_family_required_fields() {
        let cases = [
            json!({"kinesis": {"path": "/a", "method": "post"}}),
            json!({"sqs": {"path": "/a", "method": "post"}}),
            json!({"s3": {"path": "/a", "method": "get", "action": "GetObject", "key": "k"}}),
            json!({"s3": {"path": "/a", "method": "get", "bucket": "b", "key": "k"}}),
            json!({"s3": {"path": "/a", "method": "get", "bucket": "b", "action": "GetObject"}}),
            json!({"sns": {"path": "/a", "method": "post"}}),
        ];
        for case in cases {
            assert_eq!(
                kind_of(validate(&[entry(case.clone())])),
                ValidationKind::MissingField,
                "case: {}",
                case
            );
        }
    }

    #[test]
    fn test_unresolvable_bucket_reference() {
        let result = validate(&[entry(json!({
            "s3": {
                "path": "/a", "method": "get", "action": "GetObject", "key": "k",
                "bucket": {"Fn::If": ["IsProd", "a", "b"]}
            }
        }))]);
        assert_eq!(kind_of(result), ValidationKind::FamilyConstraint);
    }

    #[test]
    fn test_object_store_key_constraints() {
        let body_key = validate(&[entry(json!({
            "s3": {
                "path": "/a", "method": "get", "action": "GetObject", "bucket": "b",
                "key": {"bodyParam": "name"}
            }
        }))]);
        assert_eq!(kind_of(body_key), ValidationKind::FamilyConstraint);

        let unknown_path_param = validate(&[entry(json!({
            "s3": {
                "path": "/a", "method": "get", "action": "GetObject", "bucket": "b",
                "key": {"pathParam": "key"}
            }
        }))]);
        assert_eq!(kind_of(unknown_path_param), ValidationKind::FamilyConstraint);

        let ok = validate(&[entry(json!({
            "s3": {
                "path": "/a/{key}", "method": "get", "action": "GetObject", "bucket": "b",
                "key": {"pathParam": "key"}
            }
        }))]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_stream_action() {
        let result = validate(&[entry(json!({
            "kinesis": {"path": "/a", "method": "post", "streamName": "s", "action": "DeleteStream"}
        }))])
        .unwrap_err();
        assert_eq!(result.validation_kind(), Some(ValidationKind::FamilyConstraint));

        let set = validate(&[entry(json!({
            "kinesis": {"path": "/a", "method": "post", "streamName": "s", "action": "PutRecords"}
        }))])
        .unwrap();
        match &set.proxies()[0].params {
            ServiceParams::Stream(params) => assert_eq!(params.action, StreamAction::PutRecords),
            other => panic!("unexpected params {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_is_case_insensitive_on_method_and_normalized_on_path() {
        let result = validate(&[
            entry(json!({"sqs": {"path": "/x", "method": "GET", "queueName": "q"}})),
            entry(json!({"sns": {"path": "x/", "method": "get", "topicName": "t"}})),
        ]);
        let err = result.unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::DuplicateMethod));
        assert!(matches!(err, ProxyError::Validation { index: 1, .. }));
    }

    #[test]
    fn test_paths_colliding_on_logical_id() {
        let colliding = [("/users", "/Users"), ("/a-b", "/aDashb"), ("/v1.2", "/v12")];
        for (first, second) in colliding {
            let result = validate(&[
                entry(json!({"sqs": {"path": first, "method": "get", "queueName": "q"}})),
                entry(json!({"sqs": {"path": second, "method": "post", "queueName": "q"}})),
            ]);
            let err = result.unwrap_err();
            assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidPath));
            assert!(matches!(err, ProxyError::Validation { index: 1, .. }));
        }
    }

    #[test]
    fn test_collision_on_a_shared_prefix() {
        let result = validate(&[
            entry(json!({"sqs": {"path": "/users/{id}", "method": "get", "queueName": "q"}})),
            entry(json!({"sns": {"path": "/Users", "method": "post", "topicName": "t"}})),
        ]);
        assert_eq!(kind_of(result), ValidationKind::InvalidPath);

        let result = validate(&[
            entry(json!({"sqs": {"path": "/users/{id}", "method": "get", "queueName": "q"}})),
            entry(json!({"sns": {"path": "/users", "method": "post", "topicName": "t"}})),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_cors_settings() {
        let set = validate(&[
            entry(json!({"sqs": {"path": "/a", "method": "post", "queueName": "q", "cors": true}})),
            entry(json!({"sqs": {
                "path": "/b", "method": "post", "queueName": "q",
                "cors": {"origins": ["https://a.example", "https://b.example"], "headers": ["X-Id"], "maxAge": 60}
            }})),
            entry(json!({"sqs": {"path": "/c", "method": "post", "queueName": "q", "cors": false}})),
        ])
        .unwrap();

        let proxies = set.proxies();
        assert_eq!(proxies[0].cors, Some(CorsConfig::default()));
        let custom = proxies[1].cors.as_ref().unwrap();
        assert_eq!(custom.origins.len(), 2);
        assert_eq!(custom.headers, vec!["X-Id".to_string()]);
        assert_eq!(custom.max_age, Some(60));
        assert_eq!(proxies[2].cors, None);
    }

    #[test]
    fn test_cors_origin_and_origins_conflict() {
        let result = validate(&[entry(json!({"sqs": {
            "path": "/a", "method": "post", "queueName": "q",
            "cors": {"origin": "*", "origins": ["*"]}
        }}))]);
        assert_eq!(kind_of(result), ValidationKind::ConflictingOptions);
    }

    #[test]
    fn test_options_conflicts_with_cors() {
        let result = validate(&[
            entry(json!({"sqs": {"path": "/a", "method": "post", "queueName": "q", "cors": true}})),
            entry(json!({"sqs": {"path": "/a", "method": "options", "queueName": "q"}})),
        ]);
        assert_eq!(kind_of(result), ValidationKind::ConflictingOptions);
    }

    #[test]
    fn test_authorization_options() {
        let set = validate(&[entry(json!({"sns": {
            "path": "/a", "method": "post", "topicName": "t",
            "authorizationType": "cognito_user_pools",
            "authorizerId": {"Ref": "Authorizer"},
            "authorizationScopes": ["orders/write"],
            "private": true
        }}))])
        .unwrap();
        let auth = &set.proxies()[0].authorization;
        assert_eq!(auth.authorization_type, "COGNITO_USER_POOLS");
        assert_eq!(auth.scopes, vec!["orders/write".to_string()]);
        assert!(auth.api_key_required);

        let result = validate(&[entry(json!({"sns": {
            "path": "/a", "method": "post", "topicName": "t",
            "authorizerId": "abc"
        }}))]);
        assert_eq!(kind_of(result), ValidationKind::ConflictingOptions);
    }

    #[test]
    fn test_segments_are_annotated() {
        let set = validate(&[entry(json!({
            "kinesis": {"path": "/v1/events/", "method": "Post", "streamName": {"Ref": "Events"}}
        }))])
        .unwrap();
        let proxy = &set.proxies()[0];
        assert_eq!(proxy.segments, vec!["v1", "events"]);
        assert_eq!(proxy.method, HttpMethod::Post);
        assert_eq!(proxy.label(), "kinesis POST /v1/events");
    }
}
