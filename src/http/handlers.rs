use super::state::AppState;
use crate::pipeline::{ErrorKind, InputError, PipelineError, PipelineRequest};
use crate::session::SessionId;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Response header carrying the (possibly new) session id
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Multipart field holding the audio upload
const AUDIO_FIELD: &str = "file";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Conversation to continue (empty or absent starts a new one)
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

fn error_response(status: StatusCode, kind: ErrorKind, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message,
            kind: kind.as_str(),
        }),
    )
        .into_response()
}

fn pipeline_error_response(e: &PipelineError) -> Response {
    let status = match e.kind() {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::Collaborator => StatusCode::BAD_GATEWAY,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.kind(), e.to_string())
}

async fn read_audio_field(multipart: &mut Multipart) -> Result<Vec<u8>, InputError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| InputError::Unreadable(e.body_text()))?
    {
        if field.name() == Some(AUDIO_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| InputError::Unreadable(e.body_text()))?;
            return Ok(data.to_vec());
        }
    }

    Err(InputError::Unreadable(format!(
        "missing form field '{}'",
        AUDIO_FIELD
    )))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload?session=<id>
/// Run one conversation turn and answer with the spoken reply
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Response {
    let session_id = match SessionId::parse_optional(query.session.as_deref().unwrap_or_default()) {
        Ok(id) => id,
        Err(e) => return pipeline_error_response(&e.into()),
    };

    info!("Parsing multipart upload");

    let audio = match read_audio_field(&mut multipart).await {
        Ok(audio) => audio,
        Err(e) => {
            error!("Failed to read upload: {}", e);
            return pipeline_error_response(&e.into());
        }
    };

    let response = match state
        .pipeline
        .handle(PipelineRequest { session_id, audio })
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Conversation turn failed: {}", e);
            return pipeline_error_response(&e);
        }
    };

    info!(
        "Writing {} bytes of reply audio for session {}",
        response.audio.len(),
        response.session_id
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::HeaderName::from_static(SESSION_ID_HEADER),
                response.session_id.to_string(),
            ),
        ],
        response.audio,
    )
        .into_response()
}

/// GET /session/:session_id
/// Get the stored conversation history
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id: SessionId = match session_id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, ErrorKind::Input, format!("{}", e)),
    };

    match state.pipeline.store().get(Some(&session_id)).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            ErrorKind::Input,
            format!("Session {} not found", session_id),
        ),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Store, e.to_string())
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
