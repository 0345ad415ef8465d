//! Cross-origin checks for requests sent in CORS mode.

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::warn;
use url::Origin;

use crate::{HttpError, Request, Response};

/// `GET`, `HEAD` and `POST` never need a preflight.
pub fn is_simple_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::POST
}

/// Headers a page may send cross-origin without asking first.
pub fn is_simple_header(name: &HeaderName, value: &HeaderValue) -> bool {
    match name.as_str() {
        "accept" | "accept-language" | "content-language" => true,
        "content-type" => {
            let essence = value
                .to_str()
                .ok()
                .and_then(|v| v.split(';').next())
                .map(|v| v.trim().to_ascii_lowercase())
                .unwrap_or_default();
            matches!(
                essence.as_str(),
                "application/x-www-form-urlencoded" | "multipart/form-data" | "text/plain"
            )
        }
        _ => false,
    }
}

/// Header names that make `request` non-simple, lowercased and sorted.
pub fn unsafe_header_names(request: &Request) -> Vec<String> {
    let mut names: Vec<String> = request
        .headers
        .iter()
        .filter(|(name, value)| !is_simple_header(name, value))
        .map(|(name, _)| name.as_str().to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// A JSON post is not simple: its content type forces a preflight.
pub fn needs_preflight(request: &Request) -> bool {
    !is_simple_method(&request.method) || !unsafe_header_names(request).is_empty()
}

/// ASCII serialization of an origin, `null` when unknown or opaque.
pub fn serialize_origin(origin: Option<&Origin>) -> String {
    origin
        .map(|o| o.ascii_serialization())
        .unwrap_or_else(|| "null".to_string())
}

/// Headers for the `OPTIONS` preflight of `request`.
pub fn preflight_headers(request: &Request) -> Result<HeaderMap, HttpError> {
    let invalid = |e: http::header::InvalidHeaderValue| HttpError::InvalidRequest(e.to_string());

    let mut headers = HeaderMap::new();
    headers.insert(
        ORIGIN,
        HeaderValue::from_str(&serialize_origin(request.origin.as_ref())).map_err(invalid)?,
    );
    headers.insert(
        ACCESS_CONTROL_REQUEST_METHOD,
        HeaderValue::from_str(request.method.as_str()).map_err(invalid)?,
    );
    let names = unsafe_header_names(request);
    if !names.is_empty() {
        headers.insert(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_str(&names.join(",")).map_err(invalid)?,
        );
    }
    Ok(headers)
}

fn allows_origin(response: &Response, request: &Request) -> Result<(), HttpError> {
    let origin = serialize_origin(request.origin.as_ref());
    let allowed: Vec<&str> = response
        .headers
        .get_all(ACCESS_CONTROL_ALLOW_ORIGIN)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    match allowed.as_slice() {
        [value] if value.trim() == "*" || value.trim() == origin => Ok(()),
        [] => Err(HttpError::CorsRejected(format!(
            "no Access-Control-Allow-Origin header for {}",
            origin
        ))),
        _ => Err(HttpError::CorsRejected(format!(
            "Access-Control-Allow-Origin does not match {}",
            origin
        ))),
    }
}

fn list_contains(headers: &HeaderMap, name: HeaderName, item: &str, case_sensitive: bool) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|entry| {
            entry == "*"
                || if case_sensitive {
                    entry == item
                } else {
                    entry.eq_ignore_ascii_case(item)
                }
        })
}

/// Validate the preflight answer before sending the real request.
pub fn check_preflight(response: &Response, request: &Request) -> Result<(), HttpError> {
    if !response.is_success() {
        warn!(status = %response.status, url = %request.url, "CORS preflight refused");
        return Err(HttpError::CorsRejected(format!(
            "preflight answered {}",
            response.status
        )));
    }
    allows_origin(response, request)?;

    if !is_simple_method(&request.method)
        && !list_contains(
            &response.headers,
            ACCESS_CONTROL_ALLOW_METHODS,
            request.method.as_str(),
            true,
        )
    {
        return Err(HttpError::CorsRejected(format!(
            "method {} not allowed",
            request.method
        )));
    }

    for name in unsafe_header_names(request) {
        if !list_contains(&response.headers, ACCESS_CONTROL_ALLOW_HEADERS, &name, false) {
            return Err(HttpError::CorsRejected(format!("header {} not allowed", name)));
        }
    }
    Ok(())
}

/// Validate the real response's grant for the requesting origin.
pub fn check_response(response: &Response, request: &Request) -> Result<(), HttpError> {
    allows_origin(response, request).inspect_err(|_| {
        warn!(url = %request.url, "CORS response not readable by page");
    })
}
