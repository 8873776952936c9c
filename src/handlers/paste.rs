use crate::{
    models::paste::{CreatePasteRequest, CreatePasteResponse, GetPasteResponse},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub async fn create_paste(
    State(state): State<AppState>,
    Json(req): Json<CreatePasteRequest>,
) -> Result<(StatusCode, Json<CreatePasteResponse>), crate::AppError> {
    let response = state.service.create_paste(&req)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GetPasteResponse>, crate::AppError> {
    Ok(Json(state.service.get_paste(&id)?))
}

pub async fn delete_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, crate::AppError> {
    state.service.delete_paste(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /:id with content negotiation: JSON when the Accept header asks for
/// it, raw text with metadata headers otherwise.
pub async fn get_raw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false);

    let paste = match state.service.get_paste(&id) {
        Ok(paste) => paste,
        Err(err) if wants_json => return err.into_response(),
        Err(err) => {
            let (status, message) = err.plain_parts();
            return (status, message).into_response();
        }
    };

    if wants_json {
        return Json(paste).into_response();
    }

    let mut response = (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        paste.content,
    )
        .into_response();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&paste.syntax_type) {
        headers.insert("x-syntax-type", value);
    }
    if let Ok(value) = HeaderValue::from_str(&paste.created_at) {
        headers.insert("x-created-at", value);
    }
    if let Some(expires_at) = &paste.expires_at {
        if let Ok(value) = HeaderValue::from_str(expires_at) {
            headers.insert("x-expires-at", value);
        }
    }

    response
}
