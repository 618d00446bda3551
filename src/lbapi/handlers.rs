use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    achievements, auth,
    error::{ApiError, ApiResult},
    grader,
    lbapi::AppState,
    lbdb::MAX_LEADERBOARD,
    models::{
        LeaderboardEnvelope, MAX_POINTS_PER_UPDATE, NewUser, ProgressEnvelope, RegisterRequest,
        RegisterResponse, SignInRequest, UpdateAction, UpdateCommand, UpdateRequest, UserEnvelope,
        UserProfile,
    },
};

const DEFAULT_LEADERBOARD: usize = 10;

// Registration messages are shown to learners verbatim
const MISSING_FIELDS: &str = "กรุณากรอกข้อมูลให้ครบถ้วน";
const EMAIL_TAKEN: &str = "อีเมลนี้ถูกใช้งานแล้ว";
const REGISTER_FAILED: &str = "เกิดข้อผิดพลาดในการลงทะเบียน";
const REGISTERED: &str = "ลงทะเบียนสำเร็จ";

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        log::info!("[parse_body] Rejected request body: {rejection}");
        ApiError::BadRequest(rejection.body_text())
    })
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query.map(|Query(params)| params).map_err(|rejection| {
        log::info!("[parse_query] Rejected query string: {rejection}");
        ApiError::BadRequest(rejection.body_text())
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    user_id: Option<String>,
}

pub async fn get_progress(
    State(state): State<AppState>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> ApiResult<Json<ProgressEnvelope>> {
    let user_id = parse_query(query)?
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(String::from("userId is required")))?;

    let progress = state
        .db
        .query_progress(&user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("No progress found for user {user_id}")))?;

    Ok(Json(ProgressEnvelope { progress }))
}

pub async fn update_progress(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<ProgressEnvelope>> {
    let request = parse_body(payload)?;

    if request.user_id.trim().is_empty() || request.item_id.trim().is_empty() {
        return Err(ApiError::BadRequest(String::from("userId and itemId are required")));
    }

    if request.points.is_some_and(|points| points > MAX_POINTS_PER_UPDATE) {
        return Err(ApiError::BadRequest(format!(
            "points may not exceed {MAX_POINTS_PER_UPDATE} per update"
        )));
    }

    if request.action == UpdateAction::EarnAchievement
        && achievements::find(&request.item_id).is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Unknown achievement: {}",
            request.item_id
        )));
    }

    let command = UpdateCommand::new(request.action, request.item_id, request.points);
    let progress = state
        .db
        .apply_update(&request.user_id, &command)?
        .ok_or_else(|| ApiError::NotFound(format!("No such user: {}", request.user_id)))?;

    Ok(Json(ProgressEnvelope { progress }))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Ok(Json(request)) = payload else {
        return Err(ApiError::BadRequest(String::from(MISSING_FIELDS)));
    };

    let name = request.name.trim();
    let email = normalize_email(&request.email);
    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(String::from(MISSING_FIELDS)));
    }

    let registration_failed = |err: rusqlite::Error| {
        log::error!("[register] Could not register {email}: {err}");
        ApiError::Internal(String::from(REGISTER_FAILED))
    };

    if state
        .db
        .query_user_by_email(&email)
        .map_err(registration_failed)?
        .is_some()
    {
        return Err(ApiError::BadRequest(String::from(EMAIL_TAKEN)));
    }

    let password_hash = auth::hash_password(&request.password).map_err(|err| {
        log::error!("[register] Could not hash the password for {email}: {err}");
        ApiError::Internal(String::from(REGISTER_FAILED))
    })?;

    let new_user = NewUser {
        name: name.to_string(),
        email: email.clone(),
        password_hash: Some(password_hash),
    };

    // Someone may have taken the email between the check and the insert
    let user = state
        .db
        .insert_user(&new_user)
        .map_err(registration_failed)?
        .ok_or_else(|| ApiError::BadRequest(String::from(EMAIL_TAKEN)))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: String::from(REGISTERED),
            user: UserProfile::from(&user),
        }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<Json<UserEnvelope>> {
    let request = parse_body(payload)?;
    let invalid = || ApiError::Unauthorized(String::from(INVALID_CREDENTIALS));

    let user = state
        .db
        .query_user_by_email(&normalize_email(&request.email))?
        .ok_or_else(invalid)?;

    let Some(stored) = user.password_hash.as_deref() else {
        log::info!("[sign_in] {} has no password; they signed up through OAuth", user.email);
        return Err(invalid());
    };

    if !auth::verify_password(&request.password, stored) {
        log::info!("[sign_in] Wrong password for {}", user.email);
        return Err(invalid());
    }

    log::info!("[sign_in] {} signed in", user.email);
    Ok(Json(UserEnvelope { user: UserProfile::from(&user) }))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    limit: Option<usize>,
}

pub async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<Json<LeaderboardEnvelope>> {
    let limit = parse_query(query)?
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD)
        .clamp(1, MAX_LEADERBOARD);

    Ok(Json(LeaderboardEnvelope {
        leaderboard: state.db.query_leaderboard(limit)?,
    }))
}

pub async fn list_achievements() -> Json<Value> {
    Json(json!({ "achievements": achievements::CATALOG }))
}

pub async fn grade_exercise(
    payload: Result<Json<grader::Submission>, JsonRejection>,
) -> ApiResult<Json<grader::GradeReport>> {
    let submission = parse_body(payload)?;
    Ok(Json(grader::grade(&submission)))
}
