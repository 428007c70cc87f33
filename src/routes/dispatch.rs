use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::dto::application_dto::{
    ApplicationForm, ApplicationIdPayload, ApplicationSinglePayload, ApplicationsListPayload,
    ApplicationsListResponse, ApplyToJobPayload, ApplyToJobResponse, MoveStagePayload,
    UploadFileMeta,
};
use crate::dto::job_dto::{CareersListingPayload, CareersListingResponse};
use crate::dto::settings_dto::SaveSettingsPayload;
use crate::dto::user_dto::{SearchUserPayload, SearchUserResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::application::{ApplicationDetail, Qualification};
use crate::models::field::FieldSpec;
use crate::models::user::role;
use crate::services::event_service::Phase;
use crate::utils::nonce;
use crate::utils::sanitize::sanitize_recursive;
use crate::AppState;

/// Headers carrying the session token and nonce issued by bootstrap.
pub const SESSION_HEADER: &str = "x-hrm-session";
pub const NONCE_HEADER: &str = "x-hrm-nonce";

/// The flat action namespace exposed to the SPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetCareersListing,
    ApplyToJob,
    UploadApplicationFile,
    GetApplicationsList,
    GetApplicationSingle,
    MoveApplicationStage,
    GetApplicationPipeline,
    DeleteApplication,
    SearchUser,
    SaveSettings,
}

/// Permission rule per action: open to anonymous callers or gated on a role
/// set.
#[derive(Debug, Clone, Copy)]
pub enum Permission {
    Public,
    Roles(&'static [&'static str]),
}

const ADMIN_ONLY: Permission = Permission::Roles(&[role::ADMINISTRATOR]);

impl Action {
    pub fn from_name(name: &str) -> Option<Action> {
        Some(match name {
            "getCareersListing" => Action::GetCareersListing,
            "applyToJob" => Action::ApplyToJob,
            "uploadApplicationFile" => Action::UploadApplicationFile,
            "getApplicationsList" => Action::GetApplicationsList,
            "getApplicationSingle" => Action::GetApplicationSingle,
            "moveApplicationStage" => Action::MoveApplicationStage,
            "getApplicationPipeline" => Action::GetApplicationPipeline,
            "deleteApplication" => Action::DeleteApplication,
            "searchUser" => Action::SearchUser,
            "saveSettings" => Action::SaveSettings,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::GetCareersListing => "getCareersListing",
            Action::ApplyToJob => "applyToJob",
            Action::UploadApplicationFile => "uploadApplicationFile",
            Action::GetApplicationsList => "getApplicationsList",
            Action::GetApplicationSingle => "getApplicationSingle",
            Action::MoveApplicationStage => "moveApplicationStage",
            Action::GetApplicationPipeline => "getApplicationPipeline",
            Action::DeleteApplication => "deleteApplication",
            Action::SearchUser => "searchUser",
            Action::SaveSettings => "saveSettings",
        }
    }

    pub fn permission(&self) -> Permission {
        match self {
            Action::GetCareersListing | Action::ApplyToJob | Action::UploadApplicationFile => {
                Permission::Public
            }
            Action::GetApplicationsList
            | Action::GetApplicationSingle
            | Action::MoveApplicationStage
            | Action::GetApplicationPipeline
            | Action::DeleteApplication
            | Action::SearchUser
            | Action::SaveSettings => ADMIN_ONLY,
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Action::ApplyToJob
                | Action::UploadApplicationFile
                | Action::MoveApplicationStage
                | Action::DeleteApplication
                | Action::SaveSettings
        )
    }

    /// Anonymous mutations carry the bootstrap nonce; role-gated actions are
    /// already covered by the bearer token.
    pub fn requires_nonce(&self) -> bool {
        matches!(self, Action::ApplyToJob | Action::UploadApplicationFile)
    }
}

/// Consults the permission table; unauthorized calls short-circuit here and
/// never reach a model.
pub fn authorize(action: Action, identity: &Identity) -> Result<()> {
    match action.permission() {
        Permission::Public => Ok(()),
        Permission::Roles(required) => {
            if identity.has_role(required) {
                Ok(())
            } else {
                Err(Error::Unauthorized(
                    "You are not allowed to perform this action".to_string(),
                ))
            }
        }
    }
}

/// Checks the session/nonce pair on actions that require one. The pair is
/// handed out by bootstrap and must verify under the server's nonce secret.
fn check_nonce(action: Action, headers: &HeaderMap, nonce_secret: &str) -> Result<()> {
    if !action.requires_nonce() {
        return Ok(());
    }
    let session = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
    let supplied = headers.get(NONCE_HEADER).and_then(|v| v.to_str().ok());
    match (session, supplied) {
        (Some(session), Some(supplied)) if nonce::verify_nonce(nonce_secret, session, supplied) => {
            Ok(())
        }
        _ => Err(Error::Unauthorized("Invalid nonce".to_string())),
    }
}

fn success<T: Serialize>(data: T) -> Json<JsonValue> {
    Json(json!({ "success": true, "data": data }))
}

pub async fn dispatch_action(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(action_name): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<JsonValue>,
) -> Result<impl IntoResponse> {
    let action = Action::from_name(&action_name)
        .ok_or_else(|| Error::BadRequest(format!("Unknown action: {}", action_name)))?;
    authorize(action, &identity)?;
    check_nonce(action, &headers, &state.config.nonce_secret)?;

    if action.is_mutating() {
        state.events.emit(action.name(), Phase::Before, &payload);
    }

    let response = match action {
        Action::ApplyToJob => apply_to_job(&state, payload.clone()).await?,
        Action::GetApplicationsList => get_applications_list(&state, payload.clone()).await?,
        Action::GetApplicationSingle => get_application_single(&state, payload.clone()).await?,
        Action::MoveApplicationStage => {
            move_application_stage(&state, &identity, payload.clone()).await?
        }
        Action::GetApplicationPipeline => get_application_pipeline(&state, payload.clone()).await?,
        Action::GetCareersListing => get_careers_listing(&state, payload.clone()).await?,
        Action::DeleteApplication => delete_application(&state, payload.clone()).await?,
        Action::SearchUser => search_user(&state, payload.clone()).await?,
        Action::SaveSettings => save_settings(&state, payload.clone()).await?,
        // Uploads carry a multipart body and land on their own handler.
        Action::UploadApplicationFile => {
            return Err(Error::BadRequest(
                "uploadApplicationFile requires a multipart body".to_string(),
            ))
        }
    };

    if action.is_mutating() {
        state.events.emit(action.name(), Phase::After, &payload);
    }

    Ok(response)
}

async fn apply_to_job(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let mut payload: ApplyToJobPayload = serde_json::from_value(payload)?;
    if !payload.application.is_object() {
        return Err(Error::BadRequest("Invalid request data".to_string()));
    }

    // Everything is plain text except the cover letter, which is rendered as
    // HTML on the applicant profile.
    sanitize_recursive(&mut payload.application, &["cover_letter"]);
    let form: ApplicationForm = serde_json::from_value(payload.application)?;
    form.validate()?;

    let job = state
        .job_service
        .get_job(form.job_id)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
    let schema: Vec<FieldSpec> = serde_json::from_value(job.field_schema)?;

    let application_id = state
        .application_service
        .create_application(&form, &schema)
        .await
        .map_err(|err| match err {
            Error::BadRequest(_) => err,
            other => {
                tracing::error!(error = ?other, "application insert failed");
                Error::Internal("Application submission failed!".to_string())
            }
        })?;

    // No attachment step expected: finalize right away, the uploader will
    // never be called.
    if payload.finalize {
        state
            .application_service
            .finalize_application(
                application_id,
                &state.pipeline_service,
                &state.mail_service,
                &state.settings_service,
            )
            .await?;
    }

    Ok(success(ApplyToJobResponse {
        application_id,
        message: "Application has been created.".to_string(),
    }))
}

pub async fn upload_application_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let action = Action::UploadApplicationFile;
    authorize(action, &identity)?;
    check_nonce(action, &headers, &state.config.nonce_secret)?;

    let mut meta = UploadFileMeta::default();
    let mut file: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "application_id" => {
                meta.application_id = field.text().await?.parse().unwrap_or(0);
            }
            "field_name" => meta.field_name = Some(field.text().await?),
            "finalize" => meta.finalize = field.text().await? == "true",
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field.bytes().await?;
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let (file_name, data) = file
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| Error::BadRequest("Invalid file".to_string()))?;
    let field_name = meta
        .field_name
        .clone()
        .ok_or_else(|| Error::BadRequest("Missing field name".to_string()))?;

    // Only existing, still-incomplete applications accept uploads.
    match state
        .application_service
        .is_complete(meta.application_id)
        .await?
    {
        Some(false) => {}
        _ => return Err(Error::BadRequest("Invalid request".to_string())),
    }

    let meta_payload = json!({
        "application_id": meta.application_id,
        "field_name": field_name,
        "finalize": meta.finalize,
    });
    state
        .events
        .emit(action.name(), Phase::Before, &meta_payload);

    state
        .application_service
        .upload_application_file(
            meta.application_id,
            &field_name,
            &file_name,
            &data,
            &state.config.uploads_dir,
        )
        .await?;

    if meta.finalize {
        state
            .application_service
            .finalize_application(
                meta.application_id,
                &state.pipeline_service,
                &state.mail_service,
                &state.settings_service,
            )
            .await?;
    }

    state.events.emit(action.name(), Phase::After, &meta_payload);

    Ok(success(json!({})))
}

async fn get_applications_list(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: ApplicationsListPayload = serde_json::from_value(payload)?;

    let applications = state
        .application_service
        .get_applications(&payload.filter)
        .await?;

    // Count the requested axis, then flip it for the opposite tab's badge.
    let axis = payload.filter.qualification.unwrap_or_default();
    let on_axis = state
        .application_service
        .count_applications(&payload.filter, axis)
        .await?;
    let off_axis = state
        .application_service
        .count_applications(&payload.filter, axis.inverted())
        .await?;
    let (qualified_count, disqualified_count) = match axis {
        Qualification::Qualified => (on_axis, off_axis),
        Qualification::Disqualified => (off_axis, on_axis),
    };

    Ok(success(ApplicationsListResponse {
        applications,
        qualified_count,
        disqualified_count,
    }))
}

async fn get_application_single(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: ApplicationSinglePayload = serde_json::from_value(payload)?;

    let found = state
        .application_service
        .get_single_application(payload.job_id, payload.application_id)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
    let (application, stage_name, values) = found;

    let detail = ApplicationDetail {
        application,
        stage_name,
        values,
        recruiter_email: state.settings_service.recruiter_email().await?,
    };
    Ok(success(json!({ "application": detail })))
}

async fn move_application_stage(
    state: &AppState,
    identity: &Identity,
    payload: JsonValue,
) -> Result<Json<JsonValue>> {
    let payload: MoveStagePayload = serde_json::from_value(payload)?;

    let stage = state
        .job_service
        .get_stage(payload.job_id, payload.stage_id)
        .await?
        .ok_or_else(|| Error::NotFound("Stage not found".to_string()))?;

    state
        .application_service
        .change_stage(
            payload.application_id,
            &stage,
            identity.user_id,
            &state.pipeline_service,
        )
        .await?;

    Ok(success(json!({
        "message": "Application stage changed successfully!"
    })))
}

async fn get_application_pipeline(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: ApplicationIdPayload = serde_json::from_value(payload)?;

    let pipeline = state
        .pipeline_service
        .get_pipeline(payload.application_id)
        .await?;
    if pipeline.is_empty() {
        return Err(Error::NotFound("No activity".to_string()));
    }

    Ok(success(json!({ "pipeline": pipeline })))
}

async fn get_careers_listing(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: CareersListingPayload = serde_json::from_value(payload)?;

    let jobs = state.job_service.careers_listing(&payload.filters).await?;
    let departments = state.job_service.department_facets().await?;
    let countries = state.job_service.country_facets().await?;

    Ok(success(CareersListingResponse {
        jobs,
        departments,
        countries,
    }))
}

async fn delete_application(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: ApplicationIdPayload = serde_json::from_value(payload)?;

    state
        .application_service
        .delete_application(payload.application_id, &state.config.uploads_dir)
        .await?;

    Ok(success(json!({ "message": "Application deleted" })))
}

async fn search_user(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: SearchUserPayload = serde_json::from_value(payload)?;

    let users = state
        .user_service
        .search(&payload.keyword, &payload.exclude)
        .await?;
    Ok(success(SearchUserResponse { users }))
}

async fn save_settings(state: &AppState, payload: JsonValue) -> Result<Json<JsonValue>> {
    let payload: SaveSettingsPayload = serde_json::from_value(payload)?;

    state.settings_service.save_many(&payload.settings).await?;
    Ok(success(json!({ "message": "Settings saved" })))
}
