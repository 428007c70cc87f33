use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::middleware::auth::Identity;
use crate::models::user::User;
use crate::utils::{colors, nonce, token};
use crate::AppState;

/// Everything the SPA needs on page load, in one payload: base URLs, the
/// color palette, public settings, the caller's identity, and a session
/// token with its matching nonce.
#[derive(Debug, Serialize)]
pub struct BootstrapPayload {
    pub home_url: String,
    pub api_base: String,
    pub colors: BTreeMap<String, String>,
    pub settings: serde_json::Map<String, JsonValue>,
    pub current_user: Option<User>,
    pub session_token: String,
    pub nonce: String,
    pub upload_max_bytes: i64,
    pub features: Features,
}

#[derive(Debug, Serialize)]
pub struct Features {
    pub careers: bool,
    pub hrm_dashboard: bool,
}

pub async fn bootstrap(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    let base_color = state.settings_service.careers_base_color().await?;

    let current_user = match identity.user_id {
        Some(id) => state.user_service.get_user(id).await?,
        None => None,
    };

    let session_token = token::generate_session_token(32);
    let nonce = nonce::create_nonce(&state.config.nonce_secret, &session_token);

    let payload = BootstrapPayload {
        home_url: state.config.home_url.clone(),
        api_base: "/api/hrm/actions".to_string(),
        colors: colors::derive_palette(&base_color),
        settings: state.settings_service.get_all().await?,
        // The dashboard is only offered to authenticated staff.
        features: Features {
            careers: true,
            hrm_dashboard: current_user.is_some(),
        },
        current_user,
        session_token,
        nonce,
        upload_max_bytes: state.settings_service.upload_max_bytes().await?,
    };

    Ok(Json(payload))
}
