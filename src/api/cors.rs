//! Cross-origin resource sharing policy.
//!
//! Origins are matched exactly. A request from an unlisted origin is still
//! served; it just gets none of the `access-control-allow-*` headers, and
//! the browser does the blocking.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::Response;
use tower_http::cors::{AllowCredentials, AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::{Settings, WILDCARD};
use crate::error::CorsError;

/// Cross-origin options, validated into a [`CorsLayer`] by [`CorsPolicy::layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    /// Exact origins allowed to read responses.
    pub allowed_origins: Vec<String>,
    /// Whether credentials may accompany cross-origin requests.
    pub allow_credentials: bool,
    /// Allowed methods; a `*` entry allows all.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers; a `*` entry allows all.
    pub allowed_headers: Vec<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl CorsPolicy {
    /// Policy described by the configuration.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            allowed_origins: settings.cors_origins.clone(),
            allow_credentials: settings.cors_allow_credentials,
            allowed_methods: settings.cors_methods.clone(),
            allowed_headers: settings.cors_headers.clone(),
        }
    }

    /// Build the middleware layer.
    ///
    /// Browsers reject a literal `*` on credentialed requests, so with
    /// credentials enabled the method and header wildcards mirror whatever
    /// the preflight asked for.
    ///
    /// Pair it with [`strip_rejected_origin`] as the outer layer: tower-http
    /// still emits method and header grants for unlisted origins.
    pub fn layer(&self) -> Result<CorsLayer, CorsError> {
        let origins = self.origins()?;
        let credentials = match &origins {
            Some(list) if self.allow_credentials => {
                let list = list.clone();
                AllowCredentials::predicate(move |origin, _| list.contains(origin))
            }
            _ => AllowCredentials::from(self.allow_credentials),
        };

        Ok(CorsLayer::new()
            .allow_origin(match origins {
                Some(list) => AllowOrigin::list(list),
                None => AllowOrigin::any(),
            })
            .allow_credentials(credentials)
            .allow_methods(self.methods()?)
            .allow_headers(self.headers()?))
    }

    /// Exact origin list, or `None` for the wildcard.
    fn origins(&self) -> Result<Option<Vec<HeaderValue>>, CorsError> {
        if self.allowed_origins.is_empty() {
            return Err(CorsError::NoOrigins);
        }

        if is_wildcard(&self.allowed_origins) {
            if self.allow_credentials {
                return Err(CorsError::WildcardOriginWithCredentials);
            }
            return Ok(None);
        }

        let origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                let trimmed = origin.trim();
                if trimmed.is_empty() || trimmed.ends_with('/') {
                    return Err(CorsError::InvalidOrigin(origin.clone()));
                }
                HeaderValue::from_str(trimmed).map_err(|_| CorsError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(origins))
    }

    fn methods(&self) -> Result<AllowMethods, CorsError> {
        if is_wildcard(&self.allowed_methods) {
            return Ok(if self.allow_credentials {
                AllowMethods::mirror_request()
            } else {
                AllowMethods::any()
            });
        }

        let methods = self
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_uppercase().as_bytes())
                    .map_err(|_| CorsError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AllowMethods::list(methods))
    }

    fn headers(&self) -> Result<AllowHeaders, CorsError> {
        if is_wildcard(&self.allowed_headers) {
            return Ok(if self.allow_credentials {
                AllowHeaders::mirror_request()
            } else {
                AllowHeaders::any()
            });
        }

        let headers = self
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.trim().as_bytes())
                    .map_err(|_| CorsError::InvalidHeader(h.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AllowHeaders::list(headers))
    }
}

fn is_wildcard(entries: &[String]) -> bool {
    entries.iter().any(|e| e.trim() == WILDCARD)
}

/// Headers that grant something to the caller's origin.
const GRANT_HEADERS: [HeaderName; 5] = [
    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
    header::ACCESS_CONTROL_ALLOW_METHODS,
    header::ACCESS_CONTROL_ALLOW_HEADERS,
    header::ACCESS_CONTROL_EXPOSE_HEADERS,
    header::ACCESS_CONTROL_MAX_AGE,
];

/// Drop every CORS grant from a response whose origin was not allowed.
pub async fn strip_rejected_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    if !headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
        for name in GRANT_HEADERS {
            headers.remove(name);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_policy_builds() {
        let policy = CorsPolicy::default();
        assert_eq!(policy.allowed_origins, vec!["http://localhost:3000"]);
        assert!(policy.allow_credentials);
        assert!(policy.layer().is_ok());
    }

    #[test]
    fn wildcard_origin_with_credentials_is_rejected() {
        let policy = CorsPolicy {
            allowed_origins: vec!["*".to_string()],
            ..CorsPolicy::default()
        };
        assert_eq!(
            policy.layer().unwrap_err(),
            CorsError::WildcardOriginWithCredentials
        );
    }

    #[test]
    fn wildcard_origin_without_credentials_is_allowed() {
        let policy = CorsPolicy {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
            ..CorsPolicy::default()
        };
        assert!(policy.layer().is_ok());
    }

    #[test]
    fn malformed_options_are_rejected() {
        let policy = CorsPolicy {
            allowed_origins: vec!["http://bad\u{7f}origin".to_string()],
            ..CorsPolicy::default()
        };
        assert!(matches!(policy.layer(), Err(CorsError::InvalidOrigin(_))));

        let policy = CorsPolicy {
            allowed_origins: vec!["http://localhost:3000/".to_string()],
            ..CorsPolicy::default()
        };
        assert!(matches!(policy.layer(), Err(CorsError::InvalidOrigin(_))));

        let policy = CorsPolicy {
            allowed_methods: vec!["GE T".to_string()],
            ..CorsPolicy::default()
        };
        assert_eq!(
            policy.layer().unwrap_err(),
            CorsError::InvalidMethod("GE T".to_string())
        );

        let policy = CorsPolicy {
            allowed_headers: vec!["bad header".to_string()],
            ..CorsPolicy::default()
        };
        assert!(matches!(policy.layer(), Err(CorsError::InvalidHeader(_))));

        let policy = CorsPolicy {
            allowed_origins: Vec::new(),
            ..CorsPolicy::default()
        };
        assert_eq!(policy.layer().unwrap_err(), CorsError::NoOrigins);
    }

    #[tokio::test]
    async fn grants_removed_without_allow_origin() {
        let response = Response::builder()
            .header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, "DELETE")
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "x-custom")
            .header(header::VARY, "origin")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = strip_rejected_origin(response).await;

        let headers = response.headers();
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).is_none());
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).is_none());
        assert_eq!(headers[header::VARY], "origin");
    }

    #[tokio::test]
    async fn grants_kept_with_allow_origin() {
        let response = Response::builder()
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = strip_rejected_origin(response).await;

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[test]
    fn explicit_lists_build() {
        let policy = CorsPolicy {
            allowed_methods: vec!["get".to_string(), "POST".to_string()],
            allowed_headers: vec!["content-type".to_string(), "x-request-id".to_string()],
            ..CorsPolicy::default()
        };
        assert!(policy.layer().is_ok());
    }
}
