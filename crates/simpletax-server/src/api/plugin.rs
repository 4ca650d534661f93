//! Adapter between axum and the servlet request/response types.

use std::collections::BTreeMap;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::{header::HeaderName, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use simpletax_config::PLUGIN_BASE_PATH;
use simpletax_telemetry::{log_request_completed, log_request_rejected};

use super::router::AppState;

/// Any method on the plugin base path itself, with or without a trailing
/// slash.
pub async fn dispatch_base(State(state): State<AppState>, req: Request) -> Response {
    let path_info = req
        .uri()
        .path()
        .strip_prefix(PLUGIN_BASE_PATH)
        .unwrap_or_default()
        .to_string();
    serve_plugin(state, path_info, req).await
}

/// Any method below the plugin base path. `path` arrives percent-decoded.
pub async fn dispatch(
    State(state): State<AppState>,
    Path(path): Path<String>,
    req: Request,
) -> Response {
    serve_plugin(state, format!("/{path}"), req).await
}

async fn serve_plugin(state: AppState, path_info: String, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let method = parts.method.to_string();

    let bytes = match to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log_request_rejected!(method = %method, path = %path_info, error = %e, "unreadable request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = simpletax_config::Request {
        method: method.clone(),
        path: path_info.clone(),
        query: parts.uri.query().map(str::to_string),
        headers: to_servlet_headers(&parts.headers),
        // Non UTF-8 bodies are handed over as missing, which the servlet
        // rejects like any other invalid body.
        body: (!bytes.is_empty())
            .then(|| String::from_utf8(bytes.to_vec()).ok())
            .flatten(),
    };

    let servlet = state.servlet.clone();
    let tenants = state.tenants.clone();
    // Controllers may block on storage.
    let outcome =
        tokio::task::spawn_blocking(move || servlet.serve(&request, tenants.as_ref())).await;

    match outcome {
        Ok(resp) => {
            log_request_completed!(method = %method, path = %path_info, status = resp.status);
            to_axum_response(resp)
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path_info, error = %e, "servlet task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Header names come lower-cased from `http`; the first value of a repeated
/// header wins.
fn to_servlet_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    out
}

fn to_axum_response(resp: simpletax_config::Response) -> Response {
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::new(resp.body.map(Body::from).unwrap_or_else(Body::empty));
    *response.status_mut() = status;

    for (name, value) in resp.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid response header"),
        }
    }
    response
}
