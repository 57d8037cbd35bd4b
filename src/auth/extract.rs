//! Bearer token extraction from requests.

use axum::http::Request;

use crate::error::{BooklineError, Result};

/// Pull the bearer token out of a request's `Authorization` header.
///
/// Falls back to a `token` query parameter, which some webhook-style
/// callers use when they cannot set headers.
pub fn extract_bearer_token<B>(request: &Request<B>) -> Result<String> {
    if let Some(header) = request.headers().get(axum::http::header::AUTHORIZATION) {
        let value = header
            .to_str()
            .map_err(|_| BooklineError::authentication("Malformed Authorization header"))?;

        return match value.strip_prefix("Bearer ") {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(BooklineError::authentication(
                "Authorization header must be a bearer token",
            )),
        };
    }

    if let Some(query) = request.uri().query() {
        for pair in query.split('&') {
            if let Some(token) = pair.strip_prefix("token=") {
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
        }
    }

    Err(BooklineError::authentication("Missing authentication token"))
}

/// Read a single query parameter from a request URI.
pub fn query_param<B>(request: &Request<B>, name: &str) -> Option<String> {
    let query = request.uri().query()?;
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(|v| v.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(auth: Option<&str>, uri: &str) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extracts_bearer_header() {
        let req = request(Some("Bearer abc.def.ghi"), "/staff");
        assert_eq!(extract_bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_rejects_non_bearer_header() {
        let req = request(Some("Basic dXNlcjpwYXNz"), "/staff");
        assert!(extract_bearer_token(&req).is_err());
    }

    #[test]
    fn test_falls_back_to_query_param() {
        let req = request(None, "/staff?token=abc.def.ghi");
        assert_eq!(extract_bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_token() {
        let req = request(None, "/staff");
        assert!(extract_bearer_token(&req).is_err());
    }

    #[test]
    fn test_query_param() {
        let req = request(None, "/staff?organizationId=abc&x=1");
        assert_eq!(query_param(&req, "organizationId").unwrap(), "abc");
        assert!(query_param(&req, "missing").is_none());
    }
}
