//! End-to-end flow over a live database. Skipped unless DATABASE_URL is set.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use hrm_backend::routes::dispatch::{NONCE_HEADER, SESSION_HEADER};
use hrm_backend::utils::nonce::create_nonce;
use hrm_backend::{
    build_router,
    config::Config,
    dto::job_dto::CreateJobPayload,
    models::stage::DISQUALIFIED_STAGE,
    AppState,
};

const JWT_SECRET: &str = "test_secret_key";
const NONCE_SECRET: &str = "test_nonce_secret";

async fn setup() -> Option<(Router, AppState)> {
    setup_with(None).await
}

async fn setup_with(mail_relay_url: Option<String>) -> Option<(Router, AppState)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url,
        jwt_secret: JWT_SECRET.to_string(),
        nonce_secret: NONCE_SECRET.to_string(),
        mail_relay_url,
        public_rps: 1000,
        admin_rps: 1000,
        uploads_dir: "./uploads-test".to_string(),
        home_url: "http://localhost".to_string(),
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    let state = AppState::new(pool, config);
    Some((build_router(state.clone()), state))
}

async fn seed_job(state: &AppState) -> i64 {
    let job = state
        .job_service
        .create(CreateJobPayload {
            title: "Backend Engineer".to_string(),
            description: Some("Build things".to_string()),
            department_name: Some("Engineering".to_string()),
            employment_type: Some("full-time".to_string()),
            country_code: Some("DE".to_string()),
            address: None,
            vacancy_count: 2,
            salary_from: None,
            salary_to: None,
            currency: Some("EUR".to_string()),
            status: Some("publish".to_string()),
            field_schema: json!([
                { "key": "resume", "type": "attachment", "required": true },
                { "key": "expected_salary", "type": "number", "required": false }
            ]),
        })
        .await
        .expect("seed job");
    job.id
}

fn make_token(role: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    let claims = json!({
        "sub": "1",
        "exp": chrono::Utc::now().timestamp() + 3600,
        "role": role,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Session/nonce pair as bootstrap would issue it under the test secret.
/// Attached to every call; only anonymous mutations check it.
fn nonce_pair() -> (String, String) {
    let session = "flow-session".to_string();
    let nonce = create_nonce(NONCE_SECRET, &session);
    (session, nonce)
}

async fn post_action(
    app: &Router,
    action: &str,
    token: Option<&str>,
    payload: JsonValue,
) -> (StatusCode, JsonValue) {
    let (session, nonce) = nonce_pair();
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/hrm/actions/{}", action))
        .header("content-type", "application/json")
        .header(SESSION_HEADER, session)
        .header(NONCE_HEADER, nonce);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(payload.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

async fn upload_file(
    app: &Router,
    application_id: i64,
    field_name: &str,
    file_name: &str,
    data: &[u8],
    finalize: bool,
) -> (StatusCode, JsonValue) {
    let boundary = "----hrmflowboundary";
    let mut body = Vec::new();
    for (name, value) in [
        ("application_id", application_id.to_string()),
        ("field_name", field_name.to_string()),
        ("finalize", finalize.to_string()),
    ] {
        body.extend_from_slice(
            format!(
                "--{}\r\ncontent-disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             content-type: application/octet-stream\r\n\r\n",
            boundary, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let (session, nonce) = nonce_pair();
    let request = Request::builder()
        .method("POST")
        .uri("/api/hrm/actions/uploadApplicationFile")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(SESSION_HEADER, session)
        .header(NONCE_HEADER, nonce)
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

fn apply_payload(job_id: i64, finalize: bool) -> JsonValue {
    json!({
        "application": {
            "job_id": job_id,
            "first_name": "<b>Alice</b>",
            "last_name": "Meyer",
            "email": "alice@example.com",
            "phone": "+4915123456789",
            "cover_letter": "<p>Dear team,</p>",
            "fields": { "expected_salary": 65000 }
        },
        "finalize": finalize
    })
}

#[tokio::test]
async fn apply_upload_finalize_and_list() {
    let Some((app, state)) = setup().await else { return };
    let job_id = seed_job(&state).await;
    let admin = make_token("administrator");

    // Submit without finalizing: an upload step is expected.
    let (status, body) = post_action(&app, "applyToJob", None, apply_payload(job_id, false)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let application_id = body["data"]["application_id"].as_i64().unwrap();

    // Incomplete applications are invisible to the listing.
    let (_, body) = post_action(
        &app,
        "getApplicationsList",
        Some(&admin),
        json!({ "filter": { "job_id": job_id } }),
    )
    .await;
    assert_eq!(body["data"]["applications"], json!([]));

    // Upload the resume and finalize in the same call.
    let (status, _) = upload_file(&app, application_id, "resume", "cv.pdf", b"%PDF-1.7 pdf", true).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post_action(
        &app,
        "getApplicationsList",
        Some(&admin),
        json!({ "filter": { "job_id": job_id, "qualification": "qualified" } }),
    )
    .await;
    let listed: Vec<i64> = body["data"]["applications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert!(listed.contains(&application_id));

    // Sanitization stripped tags everywhere but the cover letter.
    let (_, body) = post_action(
        &app,
        "getApplicationSingle",
        Some(&admin),
        json!({ "job_id": job_id, "application_id": application_id }),
    )
    .await;
    assert_eq!(body["data"]["application"]["first_name"], json!("Alice"));
    assert_eq!(
        body["data"]["application"]["cover_letter"],
        json!("<p>Dear team,</p>")
    );

    // A second upload against the now-complete application must be rejected.
    let (status, body) =
        upload_file(&app, application_id, "resume", "cv2.pdf", b"%PDF-1.7 other", false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid request"));
}

#[tokio::test]
async fn finalize_is_idempotent() {
    let Some((app, state)) = setup().await else { return };
    let job_id = seed_job(&state).await;

    let (_, body) = post_action(&app, "applyToJob", None, apply_payload(job_id, true)).await;
    let application_id = body["data"]["application_id"].as_i64().unwrap();

    // Already finalized by applyToJob: the second call is a silent no-op.
    let again = state
        .application_service
        .finalize_application(
            application_id,
            &state.pipeline_service,
            &state.mail_service,
            &state.settings_service,
        )
        .await
        .expect("second finalize");
    assert!(!again);

    // Exactly one "applied" entry despite two finalize calls.
    let pipeline = state
        .pipeline_service
        .get_pipeline(application_id)
        .await
        .unwrap();
    let applied = pipeline.iter().filter(|e| e.event_type == "applied").count();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn stage_moves_append_ordered_pipeline_entries() {
    let Some((app, state)) = setup().await else { return };
    let job_id = seed_job(&state).await;
    let admin = make_token("administrator");

    let (_, body) = post_action(&app, "applyToJob", None, apply_payload(job_id, true)).await;
    let application_id = body["data"]["application_id"].as_i64().unwrap();

    let stages = state.job_service.job_stages(job_id).await.unwrap();
    let interview = stages.iter().find(|s| s.name == "Interview").unwrap();

    let before = state
        .pipeline_service
        .get_pipeline(application_id)
        .await
        .unwrap()
        .len();

    let (status, _) = post_action(
        &app,
        "moveApplicationStage",
        Some(&admin),
        json!({ "job_id": job_id, "application_id": application_id, "stage_id": interview.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Moving to the current stage appends again: no deduplication.
    let (status, _) = post_action(
        &app,
        "moveApplicationStage",
        Some(&admin),
        json!({ "job_id": job_id, "application_id": application_id, "stage_id": interview.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post_action(
        &app,
        "getApplicationPipeline",
        Some(&admin),
        json!({ "application_id": application_id }),
    )
    .await;
    let entries = body["data"]["pipeline"].as_array().unwrap();
    assert_eq!(entries.len(), before + 2);

    let timestamps: Vec<&str> = entries
        .iter()
        .map(|e| e["created_at"].as_str().unwrap())
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);
}

#[tokio::test]
async fn qualification_counts_partition_the_total() {
    let Some((app, state)) = setup().await else { return };
    let job_id = seed_job(&state).await;
    let admin = make_token("administrator");

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, body) = post_action(&app, "applyToJob", None, apply_payload(job_id, true)).await;
        ids.push(body["data"]["application_id"].as_i64().unwrap());
    }

    let stages = state.job_service.job_stages(job_id).await.unwrap();
    let disqualified = stages
        .iter()
        .find(|s| s.name == DISQUALIFIED_STAGE)
        .unwrap();

    let (status, _) = post_action(
        &app,
        "moveApplicationStage",
        Some(&admin),
        json!({ "job_id": job_id, "application_id": ids[0], "stage_id": disqualified.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post_action(
        &app,
        "getApplicationsList",
        Some(&admin),
        json!({ "filter": { "job_id": job_id, "qualification": "disqualified" } }),
    )
    .await;
    let qualified = body["data"]["qualified_count"].as_i64().unwrap();
    let disqualified_count = body["data"]["disqualified_count"].as_i64().unwrap();
    assert_eq!(disqualified_count, 1);
    assert_eq!(qualified + disqualified_count, ids.len() as i64);

    // The listing itself follows the requested axis.
    let listed = body["data"]["applications"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_i64().unwrap(), ids[0]);
}

#[tokio::test]
async fn delete_removes_application_and_its_history() {
    let Some((app, state)) = setup().await else { return };
    let job_id = seed_job(&state).await;
    let admin = make_token("administrator");

    let (_, body) = post_action(&app, "applyToJob", None, apply_payload(job_id, true)).await;
    let application_id = body["data"]["application_id"].as_i64().unwrap();

    let (status, _) = post_action(
        &app,
        "deleteApplication",
        Some(&admin),
        json!({ "application_id": application_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_action(
        &app,
        "getApplicationSingle",
        Some(&admin),
        json!({ "job_id": job_id, "application_id": application_id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Pipeline entries cascade with the application.
    let (status, body) = post_action(
        &app,
        "getApplicationPipeline",
        Some(&admin),
        json!({ "application_id": application_id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("No activity"));

    let (status, _) = post_action(
        &app,
        "deleteApplication",
        Some(&admin),
        json!({ "application_id": application_id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn careers_listing_returns_published_jobs_and_facets() {
    let Some((app, state)) = setup().await else { return };
    let job_id = seed_job(&state).await;

    let (status, body) = post_action(
        &app,
        "getCareersListing",
        None,
        json!({ "filters": { "search": "Backend" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let jobs = body["data"]["jobs"].as_array().unwrap();
    assert!(jobs.iter().any(|j| j["id"].as_i64() == Some(job_id)));
    let departments = body["data"]["departments"].as_array().unwrap();
    assert!(departments
        .iter()
        .any(|d| d["name"] == json!("Engineering")));
    assert!(body["data"]["countries"]
        .as_array()
        .unwrap()
        .contains(&json!("DE")));

    // Draft jobs stay out of the public listing.
    let draft = state
        .job_service
        .create(CreateJobPayload {
            title: "Unannounced Role".to_string(),
            description: None,
            department_name: None,
            employment_type: None,
            country_code: None,
            address: None,
            vacancy_count: 1,
            salary_from: None,
            salary_to: None,
            currency: None,
            status: None,
            field_schema: json!([]),
        })
        .await
        .unwrap();
    let (_, body) = post_action(&app, "getCareersListing", None, json!({ "filters": {} })).await;
    assert!(!body["data"]["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .any(|j| j["id"].as_i64() == Some(draft.id)));
}

#[tokio::test]
async fn user_search_respects_keyword_and_exclusions() {
    let Some((app, state)) = setup().await else { return };
    let admin = make_token("administrator");

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let mut ids = Vec::new();
    for name in ["Greta Recruiter", "Greta Admin"] {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, 'recruiter') RETURNING id",
        )
        .bind(format!("{} {}", name, suffix))
        .bind(format!("{}.{}@example.com", name.replace(' ', "."), suffix))
        .fetch_one(&state.pool)
        .await
        .unwrap();
        ids.push(id);
    }

    let (_, body) = post_action(
        &app,
        "searchUser",
        Some(&admin),
        json!({ "keyword": suffix, "exclude": [ids[0]] }),
    )
    .await;
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"].as_i64(), Some(ids[1]));

    // Empty keyword still applies the exclusion set.
    let (_, body) = post_action(
        &app,
        "searchUser",
        Some(&admin),
        json!({ "keyword": "", "exclude": [ids[0], ids[1]] }),
    )
    .await;
    let users = body["data"]["users"].as_array().unwrap();
    assert!(!users.iter().any(|u| ids.contains(&u["id"].as_i64().unwrap())));
}

#[tokio::test]
async fn settings_are_saved_and_surface_in_bootstrap() {
    let Some((app, state)) = setup().await else { return };
    let admin = make_token("administrator");

    let (status, _) = post_action(
        &app,
        "saveSettings",
        Some(&admin),
        json!({ "settings": { "recruiter_email": "recruiter@acme.test" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        state.settings_service.recruiter_email().await.unwrap(),
        Some("recruiter@acme.test".to_string())
    );

    let request = Request::builder()
        .uri("/api/hrm/bootstrap")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["settings"]["recruiter_email"],
        json!("recruiter@acme.test")
    );
    assert!(body["colors"]["primary"].is_string());
    assert!(body["nonce"].is_string());
    assert_eq!(body["features"]["careers"], json!(true));
}

/// Accepts one HTTP request on the listener, answers 200, and returns the
/// JSON body it carried.
async fn capture_relay_request(listener: tokio::net::TcpListener) -> JsonValue {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (mut socket, _) = listener.accept().await.expect("relay accept");
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let body_start = loop {
        let n = socket.read(&mut chunk).await.expect("relay read");
        assert!(n > 0, "relay connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..body_start]).to_string();
    let content_length: usize = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .expect("content-length header");

    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await.expect("relay read");
        assert!(n > 0, "relay connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    socket
        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
        .await
        .expect("relay respond");

    serde_json::from_slice(&buf[body_start..body_start + content_length]).expect("relay body json")
}

#[tokio::test]
async fn finalize_notification_uses_recruiter_email_as_from_address() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let relay_url = format!("http://{}", listener.local_addr().unwrap());
    let captured = tokio::spawn(capture_relay_request(listener));

    let Some((app, state)) = setup_with(Some(relay_url)).await else { return };
    let job_id = seed_job(&state).await;

    state
        .settings_service
        .save_many(
            json!({ "recruiter_email": "recruiter@acme.test" })
                .as_object()
                .unwrap(),
        )
        .await
        .unwrap();

    let (status, _) = post_action(&app, "applyToJob", None, apply_payload(job_id, true)).await;
    assert_eq!(status, StatusCode::OK);

    let mail = tokio::time::timeout(std::time::Duration::from_secs(10), captured)
        .await
        .expect("notification reached the relay")
        .unwrap();

    // Without a per-message override, the sender falls back to the recruiter
    // address from settings instead of going out with no sender at all.
    assert_eq!(mail["to"], mail["from_address"]);
    assert_eq!(mail["from_address"].as_str().unwrap(), "recruiter@acme.test");
    assert!(mail["subject"].as_str().unwrap().starts_with("New application:"));
}
