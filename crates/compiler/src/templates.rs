//! Request mapping template loading and rendering
//!
//! The per-family mapping bodies are data: they live in `templates/` and
//! are rendered with tera before being embedded into integrations.

use service_proxy_common::{ProxyError, Result};
use std::collections::HashMap;
use tera::{Context, Tera, Value};

pub const STREAM_PUT_RECORD: &str = "stream_put_record.vtl";
pub const STREAM_PUT_RECORDS: &str = "stream_put_records.vtl";
pub const QUEUE_SEND_MESSAGE: &str = "queue_send_message.vtl";
pub const TOPIC_PUBLISH: &str = "topic_publish.vtl";
pub const CORS_ORIGIN: &str = "cors_origin.vtl";

/// Load all mapping templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("origin_pattern", origin_pattern_filter);

    let templates = [
        (
            STREAM_PUT_RECORD,
            include_str!("../templates/stream_put_record.vtl.tera"),
        ),
        (
            STREAM_PUT_RECORDS,
            include_str!("../templates/stream_put_records.vtl.tera"),
        ),
        (
            QUEUE_SEND_MESSAGE,
            include_str!("../templates/queue_send_message.vtl.tera"),
        ),
        (
            TOPIC_PUBLISH,
            include_str!("../templates/topic_publish.vtl.tera"),
        ),
        (CORS_ORIGIN, include_str!("../templates/cors_origin.vtl.tera")),
    ];

    for (name, source) in templates {
        tera.add_raw_template(name, source).map_err(|e| {
            ProxyError::Template(format!("Failed to load {} template: {}", name, e))
        })?;
    }

    Ok(tera)
}

/// Render a template, trimming the trailing newline of the source file
pub fn render(tera: &Tera, name: &str, context: &Context) -> Result<String> {
    let rendered = tera
        .render(name, context)
        .map_err(|e| ProxyError::Template(format!("Failed to render {}: {:?}", name, e)))?;
    Ok(rendered.trim_end().to_string())
}

/// Filter turning a CORS origin (possibly with `*` wildcards) into a regex
fn origin_pattern_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let origin = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("origin_pattern filter expects a string"))?;

    let pattern = origin
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Ok(Value::String(pattern))
}
