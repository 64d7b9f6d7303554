//! Maps HTTP headers to resolver input.

use axum::http::{HeaderMap, HeaderName};
use uuid::Uuid;

use crate::config::{ConfigError, HeaderConfig};
use crate::request::RequestMeta;

use super::ExtractMetadata;

/// Parsed names of the credential headers.
#[derive(Debug, Clone)]
pub struct HeaderNames {
    /// Telegram subject id.
    pub telegram_id: HeaderName,
    /// Browser bearer token.
    pub admin_token: HeaderName,
    /// Admin id claimed by the browser.
    pub admin_id: HeaderName,
    /// Incoming request id.
    pub request_id: HeaderName,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            telegram_id: HeaderName::from_static("x-telegram-id"),
            admin_token: HeaderName::from_static("x-admin-token"),
            admin_id: HeaderName::from_static("x-admin-id"),
            request_id: HeaderName::from_static("x-request-id"),
        }
    }
}

impl TryFrom<&HeaderConfig> for HeaderNames {
    type Error = ConfigError;

    fn try_from(config: &HeaderConfig) -> Result<Self, Self::Error> {
        let parse = |raw: &str| {
            HeaderName::try_from(raw.trim())
                .map_err(|_| ConfigError::Invalid(format!("{raw:?} is not a valid header name")))
        };
        Ok(Self {
            telegram_id: parse(&config.telegram_id)?,
            admin_token: parse(&config.admin_token)?,
            admin_id: parse(&config.admin_id)?,
            request_id: parse(&config.request_id)?,
        })
    }
}

/// The credential-relevant parts of one HTTP request.
///
/// Blank header values count as absent. Values are kept raw here and only
/// become `Tainted`/`Secret` when turned into a [`RequestMeta`].
///
/// # Examples
///
/// ```
/// use axum::http::HeaderMap;
/// use tutordesk_auth::web::{ExtractMetadata, HeaderNames, RequestAdapter};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-telegram-id", "42".parse().unwrap());
/// headers.insert("x-request-id", "req-7".parse().unwrap());
///
/// let adapter = RequestAdapter::from_headers(&headers, &HeaderNames::default());
/// let meta = adapter.extract_metadata();
///
/// assert_eq!(meta.request_id, "req-7");
/// assert!(meta.signals.telegram_id.is_some());
/// assert!(meta.signals.admin_token.is_none());
/// ```
#[derive(Clone)]
pub struct RequestAdapter {
    request_id: String,
    telegram_id: Option<String>,
    admin_token: Option<String>,
    admin_id: Option<String>,
}

impl RequestAdapter {
    /// Reads the configured headers. A missing request id gets a fresh UUID.
    pub fn from_headers(headers: &HeaderMap, names: &HeaderNames) -> Self {
        let request_id =
            header_value(headers, &names.request_id).unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            request_id,
            telegram_id: header_value(headers, &names.telegram_id),
            admin_token: header_value(headers, &names.admin_token),
            admin_id: header_value(headers, &names.admin_id),
        }
    }

    /// The propagated or generated request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl std::fmt::Debug for RequestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAdapter")
            .field("request_id", &self.request_id)
            .field("has_telegram_id", &self.telegram_id.is_some())
            .field("has_admin_token", &self.admin_token.is_some())
            .field("has_admin_id", &self.admin_id.is_some())
            .finish()
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self) -> RequestMeta {
        let mut meta = RequestMeta::new(self.request_id.clone());
        if let Some(v) = &self.telegram_id {
            meta = meta.with_telegram_id(v.clone());
        }
        if let Some(v) = &self.admin_token {
            meta = meta.with_admin_token(v.clone());
        }
        if let Some(v) = &self.admin_id {
            meta = meta.with_admin_id(v.clone());
        }
        meta
    }
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let raw = headers.get(name)?;
    let value = String::from_utf8_lossy(raw.as_bytes()).trim().to_owned();
    (!value.is_empty()).then_some(value)
}
