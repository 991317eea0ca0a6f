//! Integration test for loading and validating a service configuration

use service_proxy_common::{
    DeclarationValidator, HttpMethod, ProxyError, ServiceFamily, ServiceParams, ValidationKind,
    ValueSource,
};
use service_proxy_parser::{validate, ProxyValidator, ServiceConfig};
use std::io::Write;
use tempfile::Builder;

const SERVICE_YAML: &str = r#"
service: storefront
provider:
  name: aws
  stage: dev
  region: us-east-1
custom:
  apiGatewayServiceProxies:
    - kinesis:
        path: /events
        method: post
        streamName: { Ref: EventsStream }
        partitionKey:
          bodyParam: customerId
        cors: true
    - sqs:
        path: /orders
        method: post
        queueName: { "Fn::GetAtt": [OrdersQueue, QueueName] }
        requestParameters:
          integration.request.querystring.MessageAttribute.1.Name: "'source'"
    - s3:
        path: /assets/{key}
        method: get
        action: GetObject
        bucket: { Ref: AssetsBucket }
        key:
          pathParam: key
    - sns:
        path: /notify
        method: post
        topicName: { "Fn::GetAtt": [NotifyTopic, TopicName] }
"#;

#[test]
fn test_load_and_validate_all_families() {
    let mut file = Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(SERVICE_YAML.as_bytes()).unwrap();

    let config = ServiceConfig::from_file(file.path()).unwrap();
    assert_eq!(config.service, "storefront");
    assert_eq!(config.proxies.len(), 4);

    let validated = ProxyValidator::new().validate(&config.proxies).unwrap();
    assert_eq!(validated.len(), 4);
    assert_eq!(
        validated.families().into_iter().collect::<Vec<_>>(),
        vec![
            ServiceFamily::Stream,
            ServiceFamily::Queue,
            ServiceFamily::ObjectStore,
            ServiceFamily::Topic
        ]
    );

    let stream = &validated.proxies()[0];
    assert_eq!(stream.method, HttpMethod::Post);
    assert!(stream.cors.is_some());
    match &stream.params {
        ServiceParams::Stream(params) => {
            assert!(matches!(params.partition_key, Some(ValueSource::Bound(_))));
        }
        other => panic!("expected stream params, got {:?}", other),
    }

    let queue = &validated.proxies()[1];
    assert_eq!(queue.request_parameters.len(), 1);

    let object = &validated.proxies()[2];
    assert_eq!(object.segments, vec!["assets", "{key}"]);
}

#[test]
fn test_json_configuration() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(
        br#"{
            "service": "json-service",
            "custom": {
                "apiGatewayServiceProxies": [
                    {"sqs": {"path": "/", "method": "post", "queueName": "inbox"}}
                ]
            }
        }"#,
    )
    .unwrap();

    let config = ServiceConfig::from_file(file.path()).unwrap();
    let validated = validate(&config.proxies).unwrap();
    assert_eq!(validated.proxies()[0].segments, Vec::<String>::new());
    assert_eq!(validated.proxies()[0].normalized_path(), "/");
}

#[test]
fn test_missing_file_is_a_parse_error() {
    let result = ServiceConfig::from_file("/definitely/not/here/serverless.yml");
    assert!(matches!(result, Err(ProxyError::Parse(_))));
}

#[test]
fn test_duplicate_declarations_fail_before_anything_else() {
    let yaml = r#"
custom:
  apiGatewayServiceProxies:
    - sqs:
        path: /x
        method: GET
        queueName: q
    - sqs:
        path: /x
        method: GET
        queueName: q
"#;
    let config = ServiceConfig::from_yaml(yaml).unwrap();
    let err = validate(&config.proxies).unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationKind::DuplicateMethod));
    assert!(err.to_string().contains("sqs GET /x"));
}
