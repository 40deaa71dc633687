//! Public models for the environment-settings module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the module and its consumers. Wire DTOs live in the module crate.

use serde_json::{Map, Value};

/// Snapshot of one environment as reported by the admin API.
///
/// Fetched fresh for every resolution; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentDescriptor {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub display_name: Option<String>,
    pub linked_service: LinkedServiceMetadata,
}

impl EnvironmentDescriptor {
    /// Whether a data service is attached to this environment.
    #[must_use]
    pub fn has_linked_service(&self) -> bool {
        !self.linked_service.instance_url.is_empty()
    }
}

/// Metadata of the data-service instance linked to an environment.
///
/// An empty `instance_url` means no data service is attached.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkedServiceMetadata {
    pub instance_url: String,
    pub version: Option<String>,
    pub domain_name: Option<String>,
    pub unique_name: Option<String>,
}

/// Well-known organization settings attributes.
pub struct SettingsFields;

impl SettingsFields {
    pub const MAX_UPLOAD_FILE_SIZE: &'static str = "maxuploadfilesize";
    pub const PLUGIN_TRACE_LOG_SETTING: &'static str = "plugintracelogsetting";
    pub const IS_AUDIT_ENABLED: &'static str = "isauditenabled";
    pub const IS_USER_ACCESS_AUDIT_ENABLED: &'static str = "isuseraccessauditenabled";
    pub const IS_READ_AUDIT_ENABLED: &'static str = "isreadauditenabled";
    pub const BOUND_DASHBOARD_DEFAULT_CARD_EXPANDED: &'static str =
        "boundashboarddefaultcardexpanded";
}

/// Plugin trace logging level stored in `plugintracelogsetting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginTraceLogSetting {
    Off,
    Exception,
    All,
}

impl PluginTraceLogSetting {
    /// Option-set value used on the wire.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Exception => 1,
            Self::All => 2,
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Exception),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

/// The single organization settings record of a data-service instance.
///
/// `fields` holds every attribute returned by the service except the
/// organization id and `@odata` annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrganizationSettings {
    pub organization_id: Option<String>,
    pub fields: Map<String, Value>,
}

impl OrganizationSettings {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn max_upload_file_size(&self) -> Option<i64> {
        self.get(SettingsFields::MAX_UPLOAD_FILE_SIZE)
            .and_then(Value::as_i64)
    }

    #[must_use]
    pub fn plugin_trace_log_setting(&self) -> Option<PluginTraceLogSetting> {
        self.get(SettingsFields::PLUGIN_TRACE_LOG_SETTING)
            .and_then(Value::as_i64)
            .and_then(PluginTraceLogSetting::from_code)
    }

    #[must_use]
    pub fn is_audit_enabled(&self) -> Option<bool> {
        self.flag(SettingsFields::IS_AUDIT_ENABLED)
    }

    #[must_use]
    pub fn is_user_access_audit_enabled(&self) -> Option<bool> {
        self.flag(SettingsFields::IS_USER_ACCESS_AUDIT_ENABLED)
    }

    #[must_use]
    pub fn is_read_audit_enabled(&self) -> Option<bool> {
        self.flag(SettingsFields::IS_READ_AUDIT_ENABLED)
    }

    #[must_use]
    pub fn bound_dashboard_default_card_expanded(&self) -> Option<bool> {
        self.flag(SettingsFields::BOUND_DASHBOARD_DEFAULT_CARD_EXPANDED)
    }

    fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }
}

/// Partial update for organization settings.
///
/// Only the fields set here are sent; everything else is left untouched by
/// the service. The record is always addressed by the organization id read
/// from the service, never by anything carried in the patch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrganizationSettingsPatch {
    fields: Map<String, Value>,
}

impl OrganizationSettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary attribute.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn max_upload_file_size(self, bytes: i64) -> Self {
        self.set(SettingsFields::MAX_UPLOAD_FILE_SIZE, bytes)
    }

    #[must_use]
    pub fn plugin_trace_log_setting(self, setting: PluginTraceLogSetting) -> Self {
        self.set(SettingsFields::PLUGIN_TRACE_LOG_SETTING, setting.code())
    }

    #[must_use]
    pub fn audit_enabled(self, enabled: bool) -> Self {
        self.set(SettingsFields::IS_AUDIT_ENABLED, enabled)
    }

    #[must_use]
    pub fn user_access_audit_enabled(self, enabled: bool) -> Self {
        self.set(SettingsFields::IS_USER_ACCESS_AUDIT_ENABLED, enabled)
    }

    #[must_use]
    pub fn read_audit_enabled(self, enabled: bool) -> Self {
        self.set(SettingsFields::IS_READ_AUDIT_ENABLED, enabled)
    }

    #[must_use]
    pub fn bound_dashboard_default_card_expanded(self, expanded: bool) -> Self {
        self.set(SettingsFields::BOUND_DASHBOARD_DEFAULT_CARD_EXPANDED, expanded)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for OrganizationSettingsPatch {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
