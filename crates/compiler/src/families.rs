//! Per-family integration shapes
//!
//! Each service family differs only in data: the integration URI, how the
//! request is mapped, which headers are forwarded and which IAM actions the
//! integration role needs. Dispatch is a match over [`ServiceParams`].

use crate::templates::{self, render};
use serde_json::{json, Map, Value};
use service_proxy_common::{
    HttpMethod, ObjectAction, ObjectStoreParams, ParamBinding, ProxyDeclaration, QueueParams,
    Result, ServiceParams, StreamAction, StreamParams, TopicParams, ValueSource,
};
use std::collections::BTreeMap;
use tera::{Context, Tera};

const FORM_CONTENT_TYPE: &str = "'application/x-www-form-urlencoded'";
const DEFAULT_PARTITION_KEY: &str = "$context.requestId";

/// Family-specific part of an `AWS` integration
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationShape {
    /// HTTP method of the call to the backing service
    pub http_method: HttpMethod,
    pub uri: Value,
    pub request_parameters: Map<String, Value>,
    pub request_templates: Map<String, Value>,
    pub passthrough_behavior: &'static str,
    /// Method request parameters the integration reads
    pub method_request_parameters: BTreeMap<String, bool>,
    /// Integration response parameters for the 2xx response
    pub success_response_parameters: Map<String, Value>,
}

impl IntegrationShape {
    fn new(http_method: HttpMethod, uri: Value) -> Self {
        Self {
            http_method,
            uri,
            request_parameters: Map::new(),
            request_templates: Map::new(),
            passthrough_behavior: "NEVER",
            method_request_parameters: BTreeMap::new(),
            success_response_parameters: Map::new(),
        }
    }
}

/// One IAM permission a proxy needs on its backing resource
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionGrant {
    pub action: String,
    pub resource: Value,
}

/// Build the integration shape for a proxy
pub fn integration_shape(tera: &Tera, proxy: &ProxyDeclaration) -> Result<IntegrationShape> {
    match &proxy.params {
        ServiceParams::Stream(params) => stream_shape(tera, params),
        ServiceParams::Queue(params) => queue_shape(tera, params),
        ServiceParams::ObjectStore(params) => Ok(object_store_shape(params)),
        ServiceParams::Topic(params) => topic_shape(tera, params),
    }
}

/// IAM permissions the generated family role must grant for a proxy
pub fn permission_grants(proxy: &ProxyDeclaration) -> Vec<PermissionGrant> {
    match &proxy.params {
        ServiceParams::Stream(params) => vec![PermissionGrant {
            action: params.action.iam_action(),
            resource: sub_with(
                "arn:${AWS::Partition}:kinesis:${AWS::Region}:${AWS::AccountId}:stream/${StreamName}",
                "StreamName",
                params.stream_name.as_value(),
            ),
        }],
        ServiceParams::Queue(params) => vec![PermissionGrant {
            action: "sqs:SendMessage".to_string(),
            resource: sub_with(
                "arn:${AWS::Partition}:sqs:${AWS::Region}:${AWS::AccountId}:${QueueName}",
                "QueueName",
                params.queue_name.as_value(),
            ),
        }],
        ServiceParams::ObjectStore(params) => vec![PermissionGrant {
            action: params.action.iam_action(),
            resource: sub_with(
                "arn:${AWS::Partition}:s3:::${Bucket}/*",
                "Bucket",
                params.bucket.as_value(),
            ),
        }],
        ServiceParams::Topic(params) => vec![PermissionGrant {
            action: "sns:Publish".to_string(),
            resource: sub_with(
                "arn:${AWS::Partition}:sns:${AWS::Region}:${AWS::AccountId}:${TopicName}",
                "TopicName",
                params.topic_name.as_value(),
            ),
        }],
    }
}

fn stream_shape(tera: &Tera, params: &StreamParams) -> Result<IntegrationShape> {
    let mut shape = IntegrationShape::new(
        HttpMethod::Post,
        json!({
            "Fn::Sub": format!(
                "arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:kinesis:action/{}",
                params.action.as_str()
            )
        }),
    );

    let mut context = Context::new();
    let template_name = match params.action {
        StreamAction::PutRecord => {
            context.insert("data", "$util.base64Encode($input.body)");
            context.insert("partition_key", &partition_key_expression(params, false));
            templates::STREAM_PUT_RECORD
        }
        StreamAction::PutRecords => {
            context.insert("partition_key", &partition_key_expression(params, true));
            templates::STREAM_PUT_RECORDS
        }
    };
    let mapping = sub_with(
        &render(tera, template_name, &context)?,
        "StreamName",
        params.stream_name.as_value(),
    );

    shape
        .request_templates
        .insert("application/json".to_string(), mapping.clone());
    shape
        .request_templates
        .insert("application/x-amz-json-1.1".to_string(), mapping);
    add_binding_parameters(&mut shape, params.partition_key.as_ref());

    Ok(shape)
}

/// Partition key expression; body fields refer to `$elem` inside a records loop
fn partition_key_expression(params: &StreamParams, per_record: bool) -> String {
    match &params.partition_key {
        None => DEFAULT_PARTITION_KEY.to_string(),
        Some(ValueSource::Bound(ParamBinding::BodyParam(name))) if per_record => {
            format!("$elem.{}", name)
        }
        Some(source) => source.vtl_expression(),
    }
}

fn queue_shape(tera: &Tera, params: &QueueParams) -> Result<IntegrationShape> {
    let mut shape = IntegrationShape::new(
        HttpMethod::Post,
        sub_with(
            "arn:${AWS::Partition}:apigateway:${AWS::Region}:sqs:path//${AWS::AccountId}/${QueueName}",
            "QueueName",
            params.queue_name.as_value(),
        ),
    );

    shape.request_parameters.insert(
        "integration.request.header.Content-Type".to_string(),
        json!(FORM_CONTENT_TYPE),
    );
    let mapping = render(tera, templates::QUEUE_SEND_MESSAGE, &Context::new())?;
    shape
        .request_templates
        .insert("application/json".to_string(), Value::String(mapping));

    Ok(shape)
}

fn object_store_shape(params: &ObjectStoreParams) -> IntegrationShape {
    let mut shape = IntegrationShape::new(
        params.action.http_method(),
        json!({
            "Fn::Sub": "arn:${AWS::Partition}:apigateway:${AWS::Region}:s3:path/{bucket}/{object}"
        }),
    );
    shape.passthrough_behavior = "WHEN_NO_MATCH";

    shape.request_parameters.insert(
        "integration.request.path.bucket".to_string(),
        sub_with("'${Bucket}'", "Bucket", params.bucket.as_value()),
    );
    let object = match &params.key {
        ValueSource::Literal(key) => format!("'{}'", key),
        ValueSource::Bound(binding) => binding
            .method_request_parameter()
            .unwrap_or_else(|| format!("'{}'", binding.name())),
    };
    shape
        .request_parameters
        .insert("integration.request.path.object".to_string(), json!(object));
    add_binding_parameters(&mut shape, Some(&params.key));

    match params.action {
        ObjectAction::PutObject => {
            shape.request_parameters.insert(
                "integration.request.header.Content-Type".to_string(),
                json!("method.request.header.Content-Type"),
            );
            shape
                .method_request_parameters
                .insert("method.request.header.Content-Type".to_string(), false);
        }
        ObjectAction::GetObject => {
            for header in ["Content-Type", "Content-Length"] {
                shape.success_response_parameters.insert(
                    format!("method.response.header.{}", header),
                    json!(format!("integration.response.header.{}", header)),
                );
            }
        }
        ObjectAction::DeleteObject => {}
    }

    shape
}

fn topic_shape(tera: &Tera, params: &TopicParams) -> Result<IntegrationShape> {
    let mut shape = IntegrationShape::new(
        HttpMethod::Post,
        json!({ "Fn::Sub": "arn:${AWS::Partition}:apigateway:${AWS::Region}:sns:path//" }),
    );

    shape.request_parameters.insert(
        "integration.request.header.Content-Type".to_string(),
        json!(FORM_CONTENT_TYPE),
    );
    let mapping = sub_with(
        &render(tera, templates::TOPIC_PUBLISH, &Context::new())?,
        "TopicName",
        params.topic_name.as_value(),
    );
    shape
        .request_templates
        .insert("application/json".to_string(), mapping);

    Ok(shape)
}

/// Declare the method request parameter a binding reads
fn add_binding_parameters(shape: &mut IntegrationShape, source: Option<&ValueSource>) {
    let Some(binding) = source.and_then(ValueSource::binding) else {
        return;
    };
    if let Some(parameter) = binding.method_request_parameter() {
        let required = matches!(binding, ParamBinding::PathParam(_));
        shape.method_request_parameters.insert(parameter, required);
    }
}

/// `{"Fn::Sub": [template, {name: value}]}`
fn sub_with(template: &str, name: &str, value: &Value) -> Value {
    json!({ "Fn::Sub": [template, { name: value }] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::load_templates;
    use service_proxy_common::{Authorization, ResourceReference};

    fn proxy(segments: &[&str], method: HttpMethod, params: ServiceParams) -> ProxyDeclaration {
        let segments: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
        ProxyDeclaration {
            path: format!("/{}", segments.join("/")),
            segments,
            method,
            params,
            cors: None,
            authorization: Authorization::default(),
            request_parameters: BTreeMap::new(),
            accept_parameters: BTreeMap::new(),
            request_templates: BTreeMap::new(),
            role_arn: None,
        }
    }

    #[test]
    fn test_stream_put_record_shape() {
        let tera = load_templates().unwrap();
        let params = ServiceParams::Stream(StreamParams {
            stream_name: ResourceReference::new(json!({"Ref": "Events"})),
            partition_key: Some(ValueSource::Bound(ParamBinding::QueryStringParam(
                "user".to_string(),
            ))),
            action: StreamAction::PutRecord,
        });
        let shape = integration_shape(&tera, &proxy(&["stream"], HttpMethod::Post, params)).unwrap();

        assert_eq!(shape.http_method, HttpMethod::Post);
        assert_eq!(
            shape.uri,
            json!({"Fn::Sub": "arn:${AWS::Partition}:apigateway:${AWS::Region}:kinesis:action/PutRecord"})
        );
        let mapping = &shape.request_templates["application/json"];
        assert_eq!(mapping["Fn::Sub"][1], json!({"StreamName": {"Ref": "Events"}}));
        assert!(mapping["Fn::Sub"][0]
            .as_str()
            .unwrap()
            .contains(r#""PartitionKey":"$input.params().querystring.user""#));
        assert_eq!(
            shape.method_request_parameters.get("method.request.querystring.user"),
            Some(&false)
        );
        assert!(shape.request_templates.contains_key("application/x-amz-json-1.1"));
    }

    #[test]
    fn test_stream_put_records_uses_element_fields() {
        let tera = load_templates().unwrap();
        let params = ServiceParams::Stream(StreamParams {
            stream_name: ResourceReference::new(json!("events")),
            partition_key: Some(ValueSource::Bound(ParamBinding::BodyParam("id".to_string()))),
            action: StreamAction::PutRecords,
        });
        let shape = integration_shape(&tera, &proxy(&["batch"], HttpMethod::Post, params)).unwrap();

        let body = shape.request_templates["application/json"]["Fn::Sub"][0]
            .as_str()
            .unwrap()
            .to_string();
        assert!(body.contains(r#""PartitionKey":"$elem.id""#));
        assert!(body.contains("#foreach($elem in $input.path('$.records'))"));
        assert!(shape.method_request_parameters.is_empty());
    }

    #[test]
    fn test_object_store_shape() {
        let tera = load_templates().unwrap();
        let params = ServiceParams::ObjectStore(ObjectStoreParams {
            bucket: ResourceReference::new(json!({"Ref": "Assets"})),
            action: ObjectAction::GetObject,
            key: ValueSource::Bound(ParamBinding::PathParam("key".to_string())),
        });
        let shape =
            integration_shape(&tera, &proxy(&["assets", "{key}"], HttpMethod::Get, params)).unwrap();

        assert_eq!(shape.http_method, HttpMethod::Get);
        assert_eq!(shape.passthrough_behavior, "WHEN_NO_MATCH");
        assert_eq!(
            shape.request_parameters["integration.request.path.object"],
            json!("method.request.path.key")
        );
        assert_eq!(
            shape.request_parameters["integration.request.path.bucket"],
            json!({"Fn::Sub": ["'${Bucket}'", {"Bucket": {"Ref": "Assets"}}]})
        );
        assert_eq!(
            shape.method_request_parameters.get("method.request.path.key"),
            Some(&true)
        );
        assert!(shape
            .success_response_parameters
            .contains_key("method.response.header.Content-Length"));
        assert!(shape.request_templates.is_empty());
    }

    #[test]
    fn test_object_store_put_forwards_content_type() {
        let tera = load_templates().unwrap();
        let params = ServiceParams::ObjectStore(ObjectStoreParams {
            bucket: ResourceReference::new(json!("uploads")),
            action: ObjectAction::PutObject,
            key: ValueSource::Literal("latest.json".to_string()),
        });
        let shape = integration_shape(&tera, &proxy(&["upload"], HttpMethod::Post, params)).unwrap();

        assert_eq!(shape.http_method, HttpMethod::Put);
        assert_eq!(
            shape.request_parameters["integration.request.path.object"],
            json!("'latest.json'")
        );
        assert_eq!(
            shape.request_parameters["integration.request.header.Content-Type"],
            json!("method.request.header.Content-Type")
        );
    }

    #[test]
    fn test_queue_and_topic_shapes() {
        let tera = load_templates().unwrap();
        let queue = proxy(
            &["orders"],
            HttpMethod::Post,
            ServiceParams::Queue(QueueParams {
                queue_name: ResourceReference::new(json!("orders")),
            }),
        );
        let shape = integration_shape(&tera, &queue).unwrap();
        assert_eq!(
            shape.request_templates["application/json"],
            json!("Action=SendMessage&MessageBody=$util.urlEncode($input.body)")
        );
        assert_eq!(
            shape.request_parameters["integration.request.header.Content-Type"],
            json!(FORM_CONTENT_TYPE)
        );

        let topic = proxy(
            &["notify"],
            HttpMethod::Post,
            ServiceParams::Topic(TopicParams {
                topic_name: ResourceReference::new(json!("alerts")),
            }),
        );
        let shape = integration_shape(&tera, &topic).unwrap();
        let mapping = &shape.request_templates["application/json"]["Fn::Sub"];
        assert!(mapping[0].as_str().unwrap().starts_with("Action=Publish"));
        assert_eq!(mapping[1], json!({"TopicName": "alerts"}));
    }

    #[test]
    fn test_permission_grants() {
        let s3 = proxy(
            &["data"],
            HttpMethod::Delete,
            ServiceParams::ObjectStore(ObjectStoreParams {
                bucket: ResourceReference::new(json!("data-bucket")),
                action: ObjectAction::DeleteObject,
                key: ValueSource::Literal("x".to_string()),
            }),
        );
        assert_eq!(
            permission_grants(&s3),
            vec![PermissionGrant {
                action: "s3:DeleteObject".to_string(),
                resource: json!({"Fn::Sub": ["arn:${AWS::Partition}:s3:::${Bucket}/*", {"Bucket": "data-bucket"}]}),
            }]
        );
    }
}
