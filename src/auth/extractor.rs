/// Credential extraction from the `Authorization` header
///
/// Scheme tokens are matched case-sensitively.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

/// Read `Authorization: Bearer <token>` and return the token.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    extract_with_prefix(headers, BEARER_PREFIX)
}

/// Read `Authorization: ApiKey <key>` and return the key.
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, AuthError> {
    extract_with_prefix(headers, API_KEY_PREFIX)
}

fn extract_with_prefix(headers: &HeaderMap, prefix: &str) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let credential = value
        .strip_prefix(prefix)
        .ok_or(AuthError::MalformedHeader)?
        .trim();

    if credential.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(credential.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_trims_remainder() {
        let headers = headers_with("Bearer   token-with-padding  ");
        assert_eq!(extract_bearer(&headers).unwrap(), "token-with-padding");
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), Err(AuthError::MissingHeader));
        assert_eq!(extract_api_key(&headers), Err(AuthError::MissingHeader));
    }

    #[test]
    fn test_malformed_bearer_headers() {
        for value in ["bearer token", "Basic dXNlcjpwYXNz", "BearerToken", "Bearer ", "ApiKey key"] {
            assert_eq!(
                extract_bearer(&headers_with(value)),
                Err(AuthError::MalformedHeader),
                "should reject {:?}",
                value
            );
        }
    }

    #[test]
    fn test_extract_api_key() {
        let headers = headers_with("ApiKey f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(
            extract_api_key(&headers).unwrap(),
            "f271c81ff7084ee5b99a5091b42d486e"
        );
    }

    #[test]
    fn test_api_key_rejects_bearer_scheme() {
        let headers = headers_with("Bearer f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(extract_api_key(&headers), Err(AuthError::MalformedHeader));
    }
}
