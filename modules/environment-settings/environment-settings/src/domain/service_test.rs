use std::sync::Arc;

use async_trait::async_trait;
use environment_settings_sdk::{
    OrganizationSettingsPatch, PluginTraceLogSetting, SettingsOperation,
};
use parking_lot::Mutex;
use ppkit_http::testing::{Reply, ScriptedExecutor};
use ppkit_http::{ApiExecutor, ApiRequest, ApiResponse, HttpError, Method, StatusCode};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

use super::error::DomainError;
use super::service::EnvironmentSettingsService;
use crate::config::EnvironmentSettingsConfig;

const ENV_ID: &str = "env-1";
const ENV_PATH: &str = "/providers/Microsoft.BusinessAppPlatform/scopes/admin/environments/env-1";
const ORGS_PATH: &str = "/api/data/v9.0/organizations";
const ORG_ID: &str = "6f1c2a4e-0000-0000-0000-000000000001";

fn org_path(id: &str) -> String {
    format!("/api/data/v9.0/organizations({id})")
}

fn environment(instance_url: &str) -> Value {
    json!({
        "id": format!("/providers/Microsoft.BusinessAppPlatform/environments/{ENV_ID}"),
        "name": ENV_ID,
        "location": "europe",
        "properties": {
            "displayName": "Contoso",
            "linkedEnvironmentMetadata": { "instanceUrl": instance_url }
        }
    })
}

fn linked_environment() -> Reply {
    Reply::json(StatusCode::OK, &environment("https://org1.crm.example.com/"))
}

fn settings(record: &Value) -> Reply {
    Reply::json(StatusCode::OK, &json!({ "value": [record] }))
}

fn service(executor: Arc<dyn ApiExecutor>) -> EnvironmentSettingsService {
    EnvironmentSettingsService::new(executor, EnvironmentSettingsConfig::default())
}

fn scripted(executor: ScriptedExecutor) -> (Arc<ScriptedExecutor>, EnvironmentSettingsService) {
    let executor = Arc::new(executor);
    let svc = service(executor.clone());
    (executor, svc)
}

fn paths(executor: &ScriptedExecutor) -> Vec<(Method, String)> {
    executor
        .calls()
        .into_iter()
        .map(|c| (c.method, c.url.path().to_owned()))
        .collect()
}

#[tokio::test]
async fn test_resolve_environment_calls_admin_api() {
    let (executor, svc) =
        scripted(ScriptedExecutor::new().on(Method::GET, ENV_PATH, linked_environment()));

    let descriptor = svc
        .resolve_environment(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap();

    assert_eq!(descriptor.name.as_deref(), Some(ENV_ID));
    assert_eq!(descriptor.display_name.as_deref(), Some("Contoso"));

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url.host_str(), Some("api.bap.microsoft.com"));
    assert_eq!(calls[0].url.query(), Some("api-version=2023-06-01"));
}

#[tokio::test]
async fn test_resolve_host_strips_scheme_and_trailing_slash() {
    let (_, svc) =
        scripted(ScriptedExecutor::new().on(Method::GET, ENV_PATH, linked_environment()));

    let host = svc
        .resolve_host(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap();
    assert_eq!(host, "org1.crm.example.com");
}

#[tokio::test]
async fn test_empty_instance_url_is_not_linked() {
    let (executor, svc) = scripted(ScriptedExecutor::new().on(
        Method::GET,
        ENV_PATH,
        Reply::json(StatusCode::OK, &environment("")),
    ));
    let ctx = CancellationToken::new();

    let err = svc.resolve_host(&ctx, ENV_ID).await.unwrap_err();
    assert!(matches!(err, DomainError::NotLinked { .. }), "got {err:?}");

    assert!(!svc.has_linked_service(&ctx, ENV_ID).await.unwrap());

    let err = svc.get_settings(&ctx, ENV_ID).await.unwrap_err();
    assert!(matches!(err, DomainError::NotLinked { .. }), "got {err:?}");
    assert!(
        executor.calls().iter().all(|c| c.url.path() == ENV_PATH),
        "no data-service call may follow a not-linked environment"
    );
}

#[tokio::test]
async fn test_missing_linkage_metadata_is_not_linked() {
    let (_, svc) = scripted(ScriptedExecutor::new().on(
        Method::GET,
        ENV_PATH,
        Reply::json(StatusCode::OK, &json!({ "name": ENV_ID })),
    ));

    assert!(
        !svc.has_linked_service(&CancellationToken::new(), ENV_ID)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_null_linkage_is_not_linked() {
    for body in [
        json!({ "name": ENV_ID, "properties": null }),
        json!({ "name": ENV_ID, "properties": { "linkedEnvironmentMetadata": null } }),
    ] {
        let (executor, svc) = scripted(
            ScriptedExecutor::new()
                .on(Method::GET, ENV_PATH, Reply::json(StatusCode::OK, &body))
                .on(Method::GET, ENV_PATH, Reply::json(StatusCode::OK, &body)),
        );
        let ctx = CancellationToken::new();

        assert!(!svc.has_linked_service(&ctx, ENV_ID).await.unwrap());

        let err = svc.resolve_host(&ctx, ENV_ID).await.unwrap_err();
        assert!(matches!(err, DomainError::NotLinked { .. }), "got {err:?}");
        assert_eq!(executor.calls().len(), 2);
    }
}

#[tokio::test]
async fn test_has_linked_service_true() {
    let (_, svc) =
        scripted(ScriptedExecutor::new().on(Method::GET, ENV_PATH, linked_environment()));

    assert!(
        svc.has_linked_service(&CancellationToken::new(), ENV_ID)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_malformed_instance_url_is_distinct_from_not_linked() {
    let (_, svc) = scripted(ScriptedExecutor::new().on(
        Method::GET,
        ENV_PATH,
        Reply::json(StatusCode::OK, &environment("org1 crm example com")),
    ));

    let err = svc
        .resolve_host(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    match err {
        DomainError::InvalidInstanceUrl { url, .. } => assert_eq!(url, "org1 crm example com"),
        other => panic!("expected InvalidInstanceUrl, got {other:?}"),
    }
}

#[tokio::test]
async fn test_admin_status_failure_propagates() {
    let (_, svc) = scripted(ScriptedExecutor::new().on(
        Method::GET,
        ENV_PATH,
        Reply::raw(StatusCode::NOT_FOUND, "{\"error\":{\"code\":\"EnvironmentNotFound\"}}"),
    ));

    let err = svc
        .resolve_host(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    match err {
        DomainError::Http {
            operation,
            source: HttpError::UnexpectedStatus { status, .. },
            ..
        } => {
            assert_eq!(operation, SettingsOperation::ResolveEnvironment);
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_settings_returns_first_record() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(
                Method::GET,
                ORGS_PATH,
                Reply::json(
                    StatusCode::OK,
                    &json!({ "value": [
                        { "organizationid": ORG_ID, "maxuploadfilesize": 5_242_880 },
                        { "organizationid": "other" }
                    ]}),
                ),
            ),
    );

    let settings = svc
        .get_settings(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap();

    assert_eq!(settings.organization_id.as_deref(), Some(ORG_ID));
    assert_eq!(settings.max_upload_file_size(), Some(5_242_880));

    let calls = executor.calls();
    assert_eq!(calls[1].url.host_str(), Some("org1.crm.example.com"));
    assert_eq!(calls[1].url.scheme(), "https");
}

#[tokio::test]
async fn test_empty_collection() {
    let (_, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(
                Method::GET,
                ORGS_PATH,
                Reply::json(StatusCode::OK, &json!({ "value": [] })),
            ),
    );

    let err = svc
        .get_settings(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(err, DomainError::EmptySettingsCollection { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let (_, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, Reply::raw(StatusCode::OK, "{\"value\": [")),
    );

    let err = svc
        .get_settings(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DomainError::Decode {
                operation: SettingsOperation::ReadSettings,
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_admin_body_is_decode_error() {
    let (executor, svc) = scripted(ScriptedExecutor::new().on(
        Method::GET,
        ENV_PATH,
        Reply::raw(StatusCode::OK, "{not json"),
    ));

    let err = svc
        .get_settings(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DomainError::Decode {
                operation: SettingsOperation::ResolveEnvironment,
                ..
            }
        ),
        "got {err:?}"
    );
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn test_server_error_is_status_error_not_decode() {
    let (_, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(
                Method::GET,
                ORGS_PATH,
                Reply::raw(StatusCode::INTERNAL_SERVER_ERROR, "not json at all"),
            ),
    );

    let err = svc
        .get_settings(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DomainError::Http {
                source: HttpError::UnexpectedStatus { .. },
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let (_, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, Reply::Transport("connection reset".to_owned())),
    );

    let err = svc
        .get_settings(&CancellationToken::new(), ENV_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DomainError::Http {
                operation: SettingsOperation::ReadSettings,
                source: HttpError::Transport(_),
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_update_issues_read_patch_read_in_order() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(
                Method::GET,
                ORGS_PATH,
                settings(&json!({ "organizationid": ORG_ID, "isauditenabled": false })),
            )
            .on(
                Method::GET,
                ORGS_PATH,
                settings(&json!({ "organizationid": ORG_ID, "isauditenabled": true })),
            )
            .on(Method::PATCH, &org_path(ORG_ID), Reply::empty(StatusCode::NO_CONTENT)),
    );
    let patch = OrganizationSettingsPatch::new().audit_enabled(true);

    let updated = svc
        .update_settings(&CancellationToken::new(), ENV_ID, &patch)
        .await
        .unwrap();

    assert_eq!(updated.is_audit_enabled(), Some(true));
    assert_eq!(
        paths(&executor),
        vec![
            (Method::GET, ENV_PATH.to_owned()),
            (Method::GET, ORGS_PATH.to_owned()),
            (Method::PATCH, org_path(ORG_ID)),
            (Method::GET, ORGS_PATH.to_owned()),
        ]
    );

    let patch_call = &executor.calls()[2];
    assert_eq!(patch_call.json_body(), Some(json!({ "isauditenabled": true })));
}

#[tokio::test]
async fn test_update_addresses_record_by_read_id_not_payload() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, settings(&json!({ "organizationid": ORG_ID })))
            .on(Method::PATCH, &org_path(ORG_ID), Reply::empty(StatusCode::NO_CONTENT)),
    );
    let patch = OrganizationSettingsPatch::new()
        .set("organizationid", "attacker-chosen")
        .max_upload_file_size(1024);

    svc.update_settings(&CancellationToken::new(), ENV_ID, &patch)
        .await
        .unwrap();

    let patches: Vec<_> = executor
        .calls()
        .into_iter()
        .filter(|c| c.method == Method::PATCH)
        .collect();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].url.path(), org_path(ORG_ID));
}

#[tokio::test]
async fn test_update_aborts_without_patch_when_read_fails() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(
                Method::GET,
                ORGS_PATH,
                Reply::raw(StatusCode::SERVICE_UNAVAILABLE, "busy"),
            )
            .on(Method::PATCH, &org_path(ORG_ID), Reply::empty(StatusCode::NO_CONTENT)),
    );
    let patch = OrganizationSettingsPatch::new().audit_enabled(true);

    let err = svc
        .update_settings(&CancellationToken::new(), ENV_ID, &patch)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            DomainError::Http {
                operation: SettingsOperation::ReadSettings,
                ..
            }
        ),
        "got {err:?}"
    );
    assert_eq!(executor.count(&Method::PATCH), 0);
}

#[tokio::test]
async fn test_update_aborts_when_record_has_no_id() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, settings(&json!({ "isauditenabled": false }))),
    );
    let patch = OrganizationSettingsPatch::new().audit_enabled(true);

    let err = svc
        .update_settings(&CancellationToken::new(), ENV_ID, &patch)
        .await
        .unwrap_err();

    assert!(
        matches!(err, DomainError::MissingOrganizationId { .. }),
        "got {err:?}"
    );
    assert_eq!(executor.count(&Method::PATCH), 0);
}

#[tokio::test]
async fn test_update_does_not_reread_after_failed_patch() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, settings(&json!({ "organizationid": ORG_ID })))
            .on(
                Method::PATCH,
                &org_path(ORG_ID),
                Reply::raw(StatusCode::BAD_REQUEST, "{\"error\":{\"message\":\"bad value\"}}"),
            ),
    );
    let patch = OrganizationSettingsPatch::new().max_upload_file_size(-1);

    let err = svc
        .update_settings(&CancellationToken::new(), ENV_ID, &patch)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            DomainError::Http {
                operation: SettingsOperation::PatchSettings,
                source: HttpError::UnexpectedStatus { .. },
                ..
            }
        ),
        "got {err:?}"
    );
    let reads = executor
        .calls()
        .iter()
        .filter(|c| c.url.path() == ORGS_PATH)
        .count();
    assert_eq!(reads, 1);
}

#[tokio::test]
async fn test_patch_answering_200_is_rejected() {
    let (_, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, settings(&json!({ "organizationid": ORG_ID })))
            .on(
                Method::PATCH,
                &org_path(ORG_ID),
                Reply::json(StatusCode::OK, &json!({ "organizationid": ORG_ID })),
            ),
    );

    let err = svc
        .update_settings(
            &CancellationToken::new(),
            ENV_ID,
            &OrganizationSettingsPatch::new().audit_enabled(true),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DomainError::Http {
                operation: SettingsOperation::PatchSettings,
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_cancelled_context_issues_no_calls() {
    let (executor, svc) = scripted(
        ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, settings(&json!({ "organizationid": ORG_ID }))),
    );
    let ctx = CancellationToken::new();
    ctx.cancel();

    let err = svc.resolve_host(&ctx, ENV_ID).await.unwrap_err();
    assert!(matches!(err, DomainError::Cancelled { .. }), "got {err:?}");

    let err = svc.has_linked_service(&ctx, ENV_ID).await.unwrap_err();
    assert!(matches!(err, DomainError::Cancelled { .. }), "got {err:?}");

    let err = svc
        .update_settings(
            &ctx,
            ENV_ID,
            &OrganizationSettingsPatch::new().audit_enabled(true),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DomainError::Cancelled {
                operation: SettingsOperation::ResolveEnvironment,
                ..
            }
        ),
        "got {err:?}"
    );

    assert!(executor.calls().is_empty());
}

/// Delegates to a scripted executor and cancels `token` once a call with
/// `method` has completed.
struct CancelAfter {
    inner: ScriptedExecutor,
    method: Method,
    token: CancellationToken,
}

#[async_trait]
impl ApiExecutor for CancelAfter {
    async fn execute(
        &self,
        ctx: &CancellationToken,
        request: ApiRequest,
    ) -> Result<ApiResponse, HttpError> {
        let method = request.method().clone();
        let result = self.inner.execute(ctx, request).await;
        if method == self.method {
            self.token.cancel();
        }
        result
    }
}

#[tokio::test]
async fn test_cancellation_between_steps_stops_pipeline() {
    let ctx = CancellationToken::new();
    let executor = Arc::new(CancelAfter {
        inner: ScriptedExecutor::new()
            .on(Method::GET, ENV_PATH, linked_environment())
            .on(Method::GET, ORGS_PATH, settings(&json!({ "organizationid": ORG_ID })))
            .on(Method::PATCH, &org_path(ORG_ID), Reply::empty(StatusCode::NO_CONTENT)),
        method: Method::PATCH,
        token: ctx.clone(),
    });
    let svc = service(executor.clone());

    let err = svc
        .update_settings(
            &ctx,
            ENV_ID,
            &OrganizationSettingsPatch::new().audit_enabled(true),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            DomainError::Cancelled {
                operation: SettingsOperation::ReadSettings,
                ..
            }
        ),
        "got {err:?}"
    );
    assert_eq!(executor.inner.count(&Method::PATCH), 1);
    assert_eq!(executor.inner.calls().len(), 3);
}

/// Stateful data service: PATCH merges into the stored record and reads
/// return it, so an update is observable through the re-read.
struct EchoingDataverse {
    organization_id: String,
    record: Mutex<Map<String, Value>>,
}

impl EchoingDataverse {
    fn new(organization_id: &str, record: Value) -> Self {
        let Value::Object(record) = record else {
            panic!("record must be an object")
        };
        Self {
            organization_id: organization_id.to_owned(),
            record: Mutex::new(record),
        }
    }

    fn respond(
        request: &ApiRequest,
        status: StatusCode,
        body: Vec<u8>,
    ) -> Result<ApiResponse, HttpError> {
        request.check_status(status, &body)?;
        Ok(ApiResponse::from_parts(status, body))
    }
}

#[async_trait]
impl ApiExecutor for EchoingDataverse {
    async fn execute(
        &self,
        ctx: &CancellationToken,
        request: ApiRequest,
    ) -> Result<ApiResponse, HttpError> {
        if ctx.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        let path = request.url().path().to_owned();
        let method = request.method();
        if method == Method::GET && path == ENV_PATH {
            let body = environment("https://org1.crm.example.com/").to_string();
            return Self::respond(&request, StatusCode::OK, body.into_bytes());
        }
        if method == Method::GET && path == ORGS_PATH {
            let mut record = self.record.lock().clone();
            record.insert(
                "organizationid".to_owned(),
                Value::String(self.organization_id.clone()),
            );
            record.insert("@odata.etag".to_owned(), json!("W/\"42\""));
            let body = json!({ "value": [record] }).to_string();
            return Self::respond(&request, StatusCode::OK, body.into_bytes());
        }
        if method == Method::PATCH && path == org_path(&self.organization_id) {
            let patch: Map<String, Value> = request
                .body()
                .map(|b| serde_json::from_slice(b))
                .transpose()?
                .unwrap_or_default();
            self.record.lock().extend(patch);
            return Self::respond(&request, StatusCode::NO_CONTENT, Vec::new());
        }
        Self::respond(&request, StatusCode::NOT_FOUND, Vec::new())
    }
}

#[tokio::test]
async fn test_update_round_trip_reflects_patch() {
    let dataverse = Arc::new(EchoingDataverse::new(
        ORG_ID,
        json!({
            "maxuploadfilesize": 5_242_880,
            "plugintracelogsetting": 0,
            "isauditenabled": false,
        }),
    ));
    let svc = service(dataverse.clone());
    let ctx = CancellationToken::new();

    let before = svc.get_settings(&ctx, ENV_ID).await.unwrap();
    assert_eq!(
        before.plugin_trace_log_setting(),
        Some(PluginTraceLogSetting::Off)
    );

    let patch = OrganizationSettingsPatch::new()
        .plugin_trace_log_setting(PluginTraceLogSetting::All)
        .audit_enabled(true);
    let after = svc.update_settings(&ctx, ENV_ID, &patch).await.unwrap();

    assert_eq!(after.organization_id.as_deref(), Some(ORG_ID));
    assert_eq!(
        after.plugin_trace_log_setting(),
        Some(PluginTraceLogSetting::All)
    );
    assert_eq!(after.is_audit_enabled(), Some(true));
    assert_eq!(after.max_upload_file_size(), Some(5_242_880));
    assert!(after.get("@odata.etag").is_none());

    let reread = svc.get_settings(&ctx, ENV_ID).await.unwrap();
    assert_eq!(reread, after);
}
