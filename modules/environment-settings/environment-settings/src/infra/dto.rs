//! Wire DTOs and their mapping onto SDK models.
//!
//! Every nested object is optional on the wire. A missing or `null`
//! `properties`, `linkedEnvironmentMetadata` or `instanceUrl` decodes as an
//! empty instance URL, which means "not linked".

use environment_settings_sdk::{EnvironmentDescriptor, LinkedServiceMetadata, OrganizationSettings};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Admin API environment resource.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: Option<EnvironmentPropertiesDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPropertiesDto {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub linked_environment_metadata: Option<LinkedEnvironmentMetadataDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedEnvironmentMetadataDto {
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub unique_name: Option<String>,
}

impl From<EnvironmentDto> for EnvironmentDescriptor {
    fn from(dto: EnvironmentDto) -> Self {
        let properties = dto.properties.unwrap_or_default();
        let linked = properties.linked_environment_metadata.unwrap_or_default();
        Self {
            id: dto.id,
            name: dto.name,
            location: dto.location,
            display_name: properties.display_name,
            linked_service: LinkedServiceMetadata {
                instance_url: linked.instance_url.unwrap_or_default(),
                version: linked.version,
                domain_name: linked.domain_name,
                unique_name: linked.unique_name,
            },
        }
    }
}

/// Collection envelope returned by `GET .../organizations`.
#[derive(Debug, Deserialize)]
pub struct OrganizationsEnvelopeDto {
    pub value: Vec<OrganizationSettingsDto>,
}

/// One organization record. Everything except the id is kept as-is.
///
/// Dataverse spells the key `organizationid`; `organizationId` is accepted
/// too, and a record may carry both.
#[derive(Debug, Deserialize)]
pub struct OrganizationSettingsDto {
    #[serde(default, rename = "organizationId")]
    pub organization_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

const ORGANIZATION_ID_KEY: &str = "organizationid";

/// Annotation keys (`@odata.etag`, `field@OData.Community...`) carry no settings.
fn is_annotation(key: &str) -> bool {
    key.contains('@')
}

impl From<OrganizationSettingsDto> for OrganizationSettings {
    fn from(mut dto: OrganizationSettingsDto) -> Self {
        let lowercase_id = match dto.fields.remove(ORGANIZATION_ID_KEY) {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };
        let fields = dto
            .fields
            .into_iter()
            .filter(|(key, _)| !is_annotation(key))
            .collect();
        Self {
            organization_id: lowercase_id.or(dto.organization_id),
            fields,
        }
    }
}
