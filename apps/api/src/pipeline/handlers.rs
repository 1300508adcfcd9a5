//! Axum route handlers for the wizard pipeline.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export;
use crate::models::{Language, StudentProfile, Tier};
use crate::pipeline::session;
use crate::pipeline::state::{PipelineEvent, PipelineState, View};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub state: PipelineState,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: PipelineState,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    pub education: String,
    pub interests: String,
    pub skills: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub university: String,
    pub department: String,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    /// Position of the professor in the session's slate.
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub tier: Tier,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub view: View,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Language,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Creates a fresh wizard session on the Landing step.
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    let (session_id, created_at, pipeline) = state.sessions.create().await;
    Ok(Json(SessionCreatedResponse {
        session_id,
        created_at,
        state: pipeline,
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = state.sessions.snapshot(id).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/begin — Landing → Profile.
pub async fn handle_begin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::navigate(&state.sessions, id, PipelineEvent::Begin).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/cv
///
/// Multipart CV upload. Accepts a single PDF or plain-text file, extracts
/// its text, and merges ParseCV auto-fill into still-empty profile fields.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart upload: {e}")))?
        .ok_or_else(|| AppError::Validation("No file in upload".to_string()))?;

    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read document: {e}")))?;

    let pipeline = session::upload_cv(
        &state.sessions,
        state.gateway.as_ref(),
        id,
        &bytes,
        content_type.as_deref(),
    )
    .await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/profile — Profile → Search.
pub async fn handle_submit_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let profile = StudentProfile {
        name: request.name,
        education: request.education,
        interests: request.interests,
        skills: request.skills,
        cv_text: String::new(),
    };
    let pipeline =
        session::navigate(&state.sessions, id, PipelineEvent::ProfileSubmitted { profile }).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/search — Search → Results.
///
/// Runs discovery then matching. On failure the session stays on Search and
/// the error surfaces; the user may retry by resubmitting.
pub async fn handle_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::run_search(
        &state.sessions,
        state.gateway.as_ref(),
        id,
        request.university,
        request.department,
    )
    .await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/draft — Results → Draft for one professor.
pub async fn handle_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::open_draft(
        &state.sessions,
        state.gateway.as_ref(),
        id,
        request.index,
    )
    .await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/back — Draft → Results.
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::navigate(&state.sessions, id, PipelineEvent::BackToResults).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/home — any step → Landing.
pub async fn handle_home(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::navigate(&state.sessions, id, PipelineEvent::GoHome).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/view — overlay navigation.
pub async fn handle_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ViewRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::navigate(
        &state.sessions,
        id,
        PipelineEvent::ViewChanged { view: request.view },
    )
    .await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/language
pub async fn handle_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::navigate(
        &state.sessions,
        id,
        PipelineEvent::LanguageChanged {
            language: request.language,
        },
    )
    .await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// POST /api/v1/sessions/:id/bulk
///
/// Sequential per-tier draft generation. Returns once the whole tier has
/// been processed; per-item failures are visible only as statuses reverted
/// to idle.
pub async fn handle_bulk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let pipeline = session::bulk_generate(
        &state.sessions,
        state.gateway.as_ref(),
        id,
        request.tier,
    )
    .await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: pipeline,
    }))
}

/// GET /api/v1/sessions/:id/export/:tier
///
/// Word download for one tier. Refused unless every professor in the tier
/// already has a completed draft.
pub async fn handle_export(
    State(state): State<AppState>,
    Path((id, tier)): Path<(Uuid, u8)>,
) -> Result<impl IntoResponse, AppError> {
    let tier = Tier::try_from(tier).map_err(AppError::Validation)?;
    let pipeline = state.sessions.snapshot(id).await?;

    let document = export::export_tier(&pipeline.professors, tier)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::export_filename(tier)),
            ),
        ],
        document,
    ))
}
