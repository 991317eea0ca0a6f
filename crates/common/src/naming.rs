//! CloudFormation logical id naming
//!
//! Ids follow the serverless framework's conventions so that resources
//! compiled here line up with the ones the framework itself generates.

use crate::HttpMethod;

pub const REST_API_LOGICAL_ID: &str = "ApiGatewayRestApi";

/// Normalize a single path part for use inside a logical id
///
/// `-` becomes `Dash`, `{name}` / `{name+}` become `NameVar`, any other
/// non-alphanumeric character is dropped and the first letter is uppercased.
pub fn normalize_path_part(part: &str) -> String {
    let (inner, is_param) = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        Some(inner) => (inner.trim_end_matches('+'), true),
        None => (part, false),
    };

    let mut normalized = String::with_capacity(inner.len() + 3);
    for c in inner.chars() {
        if c == '-' {
            normalized.push_str("Dash");
        } else if c.is_ascii_alphanumeric() {
            normalized.push(c);
        }
    }
    if is_param {
        normalized.push_str("Var");
    }

    upper_first(&normalized)
}

/// Normalize a sequence of path segments, e.g. `["users", "{id}"]` -> `UsersIdVar`
pub fn normalize_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| normalize_path_part(segment))
        .collect()
}

pub fn resource_logical_id(segments: &[String]) -> String {
    format!("ApiGatewayResource{}", normalize_path(segments))
}

/// Method ids on the root node have no path part: `ApiGatewayMethodPost`
pub fn method_logical_id(segments: &[String], method: HttpMethod) -> String {
    format!(
        "ApiGatewayMethod{}{}",
        normalize_path(segments),
        method.logical_id_part()
    )
}

pub fn deployment_logical_id(instance_id: &str) -> String {
    format!("ApiGatewayDeployment{}", instance_id)
}

fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
