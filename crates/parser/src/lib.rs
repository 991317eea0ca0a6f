//! Service configuration parsing and proxy validation
//!
//! This crate reads the host's service configuration and validates its
//! `apiGatewayServiceProxies` entries into typed declarations.
//!
//! ## Validation
//!
//! Each entry is a single-key map naming the service family:
//! - `kinesis` (stream): `streamName`, optional `partitionKey`, `action`
//! - `sqs` (queue): `queueName`
//! - `s3` (object store): `bucket`, `action`, `key`
//! - `sns` (topic): `topicName`
//!
//! Every entry also needs `path` and `method`; `cors`, authorization
//! settings and request overrides are optional.
//!
//! ## Usage
//! ```rust,ignore
//! use service_proxy_parser::{validate, ServiceConfig};
//!
//! let config = ServiceConfig::from_file("serverless.yml")?;
//! let validated = validate(&config.proxies)?;
//! ```

mod config;
mod path;
mod validate;

pub use config::{ApiGatewaySettings, ProviderSettings, ServiceConfig};
pub use path::{normalize_path, path_parameters};
pub use validate::{validate, ProxyValidator};
