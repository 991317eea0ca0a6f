//! Endpoint summary shown after a deploy

use crate::context::HostContext;
use colored::Colorize;
use serde_json::Value;
use service_proxy_common::{ProxyDeclaration, ProxyError, Result};

/// Render the endpoint list for the compiled proxies
///
/// Returns an empty string when there are no proxies.
///
/// # Example
/// ```rust,ignore
/// let summary = display(validated.proxies(), "https://abc.execute-api.us-east-1.amazonaws.com/dev");
/// println!("{}", summary);
/// ```
pub fn display(proxies: &[ProxyDeclaration], endpoint: &str) -> String {
    if proxies.is_empty() {
        return String::new();
    }

    let mut message = format!(
        "{}\n{}\n",
        "Serverless APIGateway Service Proxy OutPuts".yellow().underline(),
        "endpoints:".yellow()
    );
    for proxy in proxies {
        let path = if proxy.segments.is_empty() {
            String::new()
        } else {
            proxy.normalized_path()
        };
        message.push_str(&format!("  {} - {}{}\n", proxy.method, endpoint, path));
    }

    message
}

/// Base URL of the deployed stage for a REST API created outside the template
///
/// When the template owns the REST API its id is only known after deploy,
/// so the host has to pass the endpoint in explicitly.
pub fn resolve_endpoint(host: &dyn HostContext) -> Result<String> {
    let rest_api_id = match host.rest_api().map(|api| api.rest_api_id) {
        Some(Value::String(id)) => id,
        _ => {
            return Err(ProxyError::MissingDependency(
                "restApiId (a literal REST API id is needed to build the endpoint)".to_string(),
            ))
        }
    };
    let stage = host
        .stage()
        .ok_or_else(|| ProxyError::MissingDependency("stage".to_string()))?;
    let region = host
        .region()
        .ok_or_else(|| ProxyError::MissingDependency("region".to_string()))?;

    Ok(format!(
        "https://{}.execute-api.{}.amazonaws.com/{}",
        rest_api_id, region, stage
    ))
}
