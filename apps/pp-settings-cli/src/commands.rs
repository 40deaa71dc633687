//! Subcommand execution and JSON rendering.

use anyhow::{Result, bail};
use environment_settings_sdk::{
    EnvironmentDescriptor, EnvironmentSettingsClient, OrganizationSettings,
    OrganizationSettingsPatch,
};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

/// A remote operation selected on the command line.
#[derive(Debug)]
pub enum Action {
    Describe(String),
    Host(String),
    Linked(String),
    Get(String),
    Update(String, Vec<(String, Value)>),
}

/// Parse `key=value`. The value is read as JSON when it parses, otherwise
/// taken as a plain string (`maxuploadfilesize=5242880` is a number,
/// `name=contoso` a string).
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{raw}'");
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

pub async fn run(
    client: &dyn EnvironmentSettingsClient,
    ctx: &CancellationToken,
    action: Action,
) -> Result<Value> {
    let output = match action {
        Action::Describe(environment_id) => {
            descriptor_json(&client.resolve_environment(ctx, &environment_id).await?)
        }
        Action::Host(environment_id) => {
            let host = client.resolve_host(ctx, &environment_id).await?;
            json!({ "environmentId": environment_id, "host": host })
        }
        Action::Linked(environment_id) => {
            let linked = client.has_linked_service(ctx, &environment_id).await?;
            json!({ "environmentId": environment_id, "linked": linked })
        }
        Action::Get(environment_id) => {
            settings_json(&client.get_settings(ctx, &environment_id).await?)
        }
        Action::Update(environment_id, assignments) => {
            let patch = assignments
                .into_iter()
                .fold(OrganizationSettingsPatch::new(), |patch, (key, value)| {
                    patch.set(key, value)
                });
            tracing::info!(
                %environment_id,
                fields = patch.fields().len(),
                "updating organization settings"
            );
            settings_json(&client.update_settings(ctx, &environment_id, &patch).await?)
        }
    };
    Ok(output)
}

fn descriptor_json(descriptor: &EnvironmentDescriptor) -> Value {
    let linked = &descriptor.linked_service;
    json!({
        "id": descriptor.id,
        "name": descriptor.name,
        "location": descriptor.location,
        "displayName": descriptor.display_name,
        "linked": descriptor.has_linked_service(),
        "linkedEnvironmentMetadata": {
            "instanceUrl": linked.instance_url,
            "version": linked.version,
            "domainName": linked.domain_name,
            "uniqueName": linked.unique_name,
        }
    })
}

fn settings_json(settings: &OrganizationSettings) -> Value {
    let mut record = Map::new();
    if let Some(id) = &settings.organization_id {
        record.insert("organizationid".to_owned(), Value::String(id.clone()));
    }
    record.extend(settings.fields.clone());
    Value::Object(record)
}
