//! Gateway handlers: one chat turn plus the user-directory surface.
//!
//! The gateway owns the per-session transcripts; the pipeline itself only
//! ever sees the ordered texts of a user's outgoing messages.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dashmap::DashMap;
use mindmates_chat::ChatService;
use mindmates_core::{ChatError, ChatMessage, Role, User, UserDirectory};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
    pub directory: Arc<UserDirectory>,
    pub transcripts: Arc<DashMap<String, Vec<ChatMessage>>>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn chat_error(e: ChatError) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

fn storage_error(e: sled::Error) -> ApiError {
    chat_error(ChatError::Storage(e))
}

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("user {} not found", id) })),
    )
}

#[derive(serde::Deserialize)]
pub struct ChatTurnRequest {
    pub user_id: String,
    pub message: String,
}

/// Runs one chat turn. The session transcript supplies the ordered history
/// of the user's prior outgoing messages; the new message is appended to
/// the transcript whether or not the turn succeeds, matching how the UI
/// keeps the user's bubble visible on error.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatTurnRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history: Vec<String> = {
        let mut session = state.transcripts.entry(req.user_id.clone()).or_default();
        let history = session
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .collect();
        session.push(ChatMessage::now(Role::User, req.message.clone()));
        history
        // RefMut dropped here; never held across the await below.
    };

    let reply = state
        .service
        .send_message(&req.user_id, &history, &req.message)
        .await
        .map_err(chat_error)?;

    state
        .transcripts
        .entry(req.user_id.clone())
        .or_default()
        .push(ChatMessage::now(Role::Assistant, reply.clone()));

    Ok(Json(serde_json::json!({ "reply": reply })))
}

pub async fn transcript(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<ChatMessage>> {
    let messages = state
        .transcripts
        .get(&user_id)
        .map(|s| s.clone())
        .unwrap_or_default();
    Json(messages)
}

#[derive(serde::Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub pronouns: String,
    pub email: String,
    pub password: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if state.directory.find_by_email(&req.email).is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "email already registered" })),
        ));
    }
    let user = state
        .directory
        .create_user(&req.name, &req.pronouns, &req.email, &req.password)
        .map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .directory
        .get_user(&id)
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn tributes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state.directory.get_user(&id).ok_or_else(|| not_found(&id))?;
    let dominant = user.dominant_tribute().cloned();
    let tributes = user.mind_tributes.unwrap_or_default();
    Ok(Json(serde_json::json!({
        "tributes": tributes,
        "dominant": dominant,
    })))
}

pub async fn supporters(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<User>> {
    Json(state.directory.supporters(&id))
}

pub async fn supporting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<User>> {
    Json(state.directory.supporting(&id))
}

#[derive(serde::Deserialize)]
pub struct SetCredentialRequest {
    pub api_key: String,
}

pub async fn set_credential(
    State(state): State<AppState>,
    Json(req): Json<SetCredentialRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .directory
        .set_api_key(&req.api_key)
        .map_err(storage_error)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
