//! Service families and HTTP methods

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The managed AWS service categories a proxy can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceFamily {
    /// Kinesis data stream
    #[serde(alias = "kinesis")]
    Stream,
    /// SQS queue
    #[serde(alias = "sqs")]
    Queue,
    /// S3 bucket
    #[serde(alias = "s3")]
    ObjectStore,
    /// SNS topic
    #[serde(alias = "sns")]
    Topic,
}

impl ServiceFamily {
    pub const ALL: [ServiceFamily; 4] = [
        ServiceFamily::Stream,
        ServiceFamily::Queue,
        ServiceFamily::ObjectStore,
        ServiceFamily::Topic,
    ];

    /// Resolve a configuration key to a family
    ///
    /// Accepts both the AWS service keys used in service configuration
    /// (`kinesis`, `sqs`, `s3`, `sns`) and the generic family names.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "kinesis" | "stream" => Some(ServiceFamily::Stream),
            "sqs" | "queue" => Some(ServiceFamily::Queue),
            "s3" | "object-store" | "objectstore" => Some(ServiceFamily::ObjectStore),
            "sns" | "topic" => Some(ServiceFamily::Topic),
            _ => None,
        }
    }

    /// AWS service key (e.g., "kinesis")
    pub fn service_key(&self) -> &'static str {
        match self {
            ServiceFamily::Stream => "kinesis",
            ServiceFamily::Queue => "sqs",
            ServiceFamily::ObjectStore => "s3",
            ServiceFamily::Topic => "sns",
        }
    }

    /// Logical id of the IAM role generated for this family
    pub fn role_logical_id(&self) -> String {
        let service = match self {
            ServiceFamily::Stream => "Kinesis",
            ServiceFamily::Queue => "Sqs",
            ServiceFamily::ObjectStore => "S3",
            ServiceFamily::Topic => "Sns",
        };
        format!("ApigatewayTo{}Role", service)
    }
}

impl fmt::Display for ServiceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_key())
    }
}

/// HTTP verbs accepted for a proxy method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Any,
}

impl HttpMethod {
    /// Method name as API Gateway expects it (`ANY` is the catch-all)
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Any => "ANY",
        }
    }

    /// The verbs a method stands for; `ANY` covers every verb except OPTIONS
    pub fn concrete_methods(&self) -> &'static [HttpMethod] {
        match self {
            HttpMethod::Get => &[HttpMethod::Get],
            HttpMethod::Post => &[HttpMethod::Post],
            HttpMethod::Put => &[HttpMethod::Put],
            HttpMethod::Patch => &[HttpMethod::Patch],
            HttpMethod::Delete => &[HttpMethod::Delete],
            HttpMethod::Head => &[HttpMethod::Head],
            HttpMethod::Options => &[HttpMethod::Options],
            HttpMethod::Any => &[
                HttpMethod::Delete,
                HttpMethod::Get,
                HttpMethod::Head,
                HttpMethod::Patch,
                HttpMethod::Post,
                HttpMethod::Put,
            ],
        }
    }

    /// Suffix used when building method logical ids (e.g., "Post")
    pub fn logical_id_part(&self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Patch => "Patch",
            HttpMethod::Delete => "Delete",
            HttpMethod::Head => "Head",
            HttpMethod::Options => "Options",
            HttpMethod::Any => "Any",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            "delete" => Ok(HttpMethod::Delete),
            "head" => Ok(HttpMethod::Head),
            "options" => Ok(HttpMethod::Options),
            "any" => Ok(HttpMethod::Any),
            other => Err(format!("unsupported HTTP method '{}'", other)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
