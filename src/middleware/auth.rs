use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Who is making the request, if anyone. Dispatch enforces per-action role
/// requirements against this; nopriv actions pass through anonymous.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Option<i64>,
    pub role: Option<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: None,
        }
    }

    pub fn has_role(&self, required: &[&str]) -> bool {
        self.role
            .as_deref()
            .map(|r| required.contains(&r))
            .unwrap_or(false)
    }
}

/// Decode the bearer token when present and attach an `Identity` extension.
/// Invalid or missing tokens leave the request anonymous rather than failing:
/// the permission table decides whether anonymity is acceptable per action.
pub async fn attach_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = bearer_token(&req)
        .and_then(|token| decode_claims(&state.config.jwt_secret, token))
        .map(|claims| Identity {
            user_id: claims.sub.parse().ok(),
            role: claims.role,
        })
        .unwrap_or_else(Identity::anonymous);

    req.extensions_mut().insert(identity);
    next.run(req).await
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn decode_claims(secret: &str, token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn has_role_matches_required_set() {
        let identity = Identity {
            user_id: Some(1),
            role: Some("administrator".to_string()),
        };
        assert!(identity.has_role(&["administrator"]));
        assert!(!identity.has_role(&["recruiter"]));
        assert!(!Identity::anonymous().has_role(&["administrator"]));
    }

    #[test]
    fn decode_rejects_wrong_secret() {
        let claims = Claims {
            sub: "7".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            role: Some("administrator".to_string()),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"right"),
        )
        .unwrap();

        assert!(decode_claims("right", &token).is_some());
        assert!(decode_claims("wrong", &token).is_none());
    }
}
