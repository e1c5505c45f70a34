//! Response builders

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use super::request::ResponseFormat;
use crate::types::GateError;

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .unwrap_or_else(|_| fallback_response()),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            fallback_response()
        }
    }
}

pub fn html_response(status: StatusCode, html: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(html)))
        .unwrap_or_else(|_| fallback_response())
}

/// Error response in the caller's format
pub fn error_response(err: &GateError, format: ResponseFormat) -> Response<Full<Bytes>> {
    let status = err.status_code();
    match format {
        ResponseFormat::Json => json_response(
            status,
            &serde_json::json!({ "error": err.to_string() }),
        ),
        ResponseFormat::Html => html_response(
            status,
            format!(
                "<!DOCTYPE html><html><head><title>{code}</title></head>\
                 <body><h1>{code}</h1><p>{message}</p></body></html>",
                code = status,
                message = escape_html(&err.to_string()),
            ),
        ),
    }
}

fn fallback_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Escape text for HTML bodies and double-quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
