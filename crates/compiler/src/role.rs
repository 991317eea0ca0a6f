//! Per-family integration roles
//!
//! One `ApigatewayTo<Family>Role` per family. The first proxy creates it;
//! later proxies and later runs only widen the resource list of the
//! statement for their action.

use crate::families::PermissionGrant;
use serde_json::{json, Value};
use service_proxy_common::{
    resource_types, union_values, ProxyError, Resource, Result, ServiceFamily, Template,
};
use tracing::debug;

/// Ensure the family role exists and grants `grants`
///
/// Returns the role logical id.
pub fn ensure_role(
    template: &mut Template,
    family: ServiceFamily,
    grants: &[PermissionGrant],
) -> Result<String> {
    let logical_id = family.role_logical_id();

    if !template.contains(&logical_id) {
        template.add_resource(&logical_id, new_role(family))?;
        debug!("Created role {}", logical_id);
    }

    let role = template
        .resource_mut(&logical_id)
        .ok_or_else(|| ProxyError::MissingDependency(logical_id.clone()))?;
    if !role.is_type(resource_types::IAM_ROLE) {
        return Err(ProxyError::DocumentConflict {
            logical_id,
            reason: format!(
                "expected {} but found {}",
                resource_types::IAM_ROLE,
                role.resource_type
            ),
        });
    }

    let statements = policy_statements(role, family, &logical_id)?;
    for grant in grants {
        add_grant(statements, grant);
    }

    Ok(logical_id)
}

fn new_role(family: ServiceFamily) -> Resource {
    Resource::new(
        resource_types::IAM_ROLE,
        json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": ["apigateway.amazonaws.com"] },
                    "Action": ["sts:AssumeRole"],
                }],
            },
            "Policies": [{
                "PolicyName": policy_name(family),
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [],
                },
            }],
        }),
    )
}

fn policy_name(family: ServiceFamily) -> String {
    format!("apigatewayto{}", family.service_key())
}

/// Statement list of the family policy; the policy is added if missing
fn policy_statements<'a>(
    role: &'a mut Resource,
    family: ServiceFamily,
    logical_id: &str,
) -> Result<&'a mut Vec<Value>> {
    let conflict = |reason: &str| ProxyError::DocumentConflict {
        logical_id: logical_id.to_string(),
        reason: reason.to_string(),
    };

    let policies = role
        .properties
        .entry("Policies")
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(|| conflict("Policies is not a list"))?;

    let name = policy_name(family);
    let position = match policies
        .iter()
        .position(|policy| policy["PolicyName"].as_str() == Some(name.as_str()))
    {
        Some(position) => position,
        None => {
            policies.push(json!({
                "PolicyName": name,
                "PolicyDocument": { "Version": "2012-10-17", "Statement": [] },
            }));
            policies.len() - 1
        }
    };

    policies[position]
        .get_mut("PolicyDocument")
        .and_then(|document| document.get_mut("Statement"))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| conflict("policy statement is not a list"))
}

fn add_grant(statements: &mut Vec<Value>, grant: &PermissionGrant) {
    let existing = statements.iter_mut().find(|statement| {
        statement["Effect"] == "Allow" && statement_action(statement) == Some(grant.action.as_str())
    });

    match existing {
        Some(statement) => {
            let mut resources = match statement["Resource"].take() {
                Value::Array(list) => list,
                Value::Null => Vec::new(),
                single => vec![single],
            };
            union_values(&mut resources, [grant.resource.clone()]);
            statement["Resource"] = Value::Array(resources);
        }
        None => statements.push(json!({
            "Effect": "Allow",
            "Action": [grant.action],
            "Resource": [grant.resource],
        })),
    }
}

/// The single action of a statement, whether written as a string or a one-item list
fn statement_action(statement: &Value) -> Option<&str> {
    match &statement["Action"] {
        Value::String(action) => Some(action),
        Value::Array(actions) if actions.len() == 1 => actions[0].as_str(),
        _ => None,
    }
}
