//! Backend contract: endpoint paths, bodies and the multipart chat form.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::{HttpError, HttpResult};
use crate::model::{ChatRoute, Credentials, OutgoingMessage};

pub const SIGNUP_PATH: &str = "/auth/signup";
pub const LOGIN_PATH: &str = "/auth/login";
pub const CHAT_SEND_PATH: &str = "/chat/send";
pub const HEALTH_PATH: &str = "/health";

pub const MESSAGE_FIELD: &str = "message";
pub const IMAGE_FIELD: &str = "image";
pub const IMAGE_FILE_NAME: &str = "upload.jpg";
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("session token cannot be sent as a header")]
    InvalidToken,
}

#[derive(Serialize)]
pub struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> From<&'a Credentials> for CredentialsBody<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            email: &credentials.email,
            password: &credentials.password,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub route: Option<ChatRoute>,
    #[serde(default)]
    pub image_prediction: Option<String>,
}

/// Failure body. `detail` is usually a string but validation errors arrive
/// as a list of objects.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthBody {
    pub status: String,
}

impl HealthBody {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// `base` joined with an absolute `path`, keeping any path prefix of `base`.
pub fn endpoint(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

/// `Authorization` header value for a stored token.
pub fn bearer(token: &SecretString) -> Result<String, RequestError> {
    let token = token.expose_secret();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(RequestError::InvalidToken);
    }
    Ok(format!("Bearer {token}"))
}

/// A response with a status, however the HTTP capability delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    /// Folds non-2xx errors back into a reply. What remains is a failure
    /// without any response.
    pub fn from_result(result: HttpResult) -> Result<Self, HttpError> {
        match result {
            Ok(mut response) => Ok(Self {
                status: u16::from(response.status()),
                body: response.take_body().unwrap_or_default(),
            }),
            Err(HttpError::Http { code, body, .. }) => Ok(Self {
                status: u16::from(code),
                body: body.unwrap_or_default(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Json(e.to_string()))
    }
}

/// An encoded `multipart/form-data` body for `/chat/send`: `message` only when
/// there is text, `image` only when an image was picked.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatForm {
    boundary: String,
    body: Vec<u8>,
}

impl ChatForm {
    pub fn encode(outgoing: &OutgoingMessage) -> Self {
        let mut boundary = new_boundary();
        while outgoing.image.as_ref().is_some_and(|image| {
            image
                .data
                .windows(boundary.len())
                .any(|w| w == boundary.as_bytes())
        }) {
            boundary = new_boundary();
        }
        Self::with_boundary(outgoing, boundary)
    }

    fn with_boundary(outgoing: &OutgoingMessage, boundary: String) -> Self {
        let mut body = Vec::new();
        if let Some(text) = &outgoing.text {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{MESSAGE_FIELD}\"\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(text.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        if let Some(image) = &outgoing.image {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{IMAGE_FIELD}\"; \
                     filename=\"{IMAGE_FILE_NAME}\"\r\nContent-Type: {IMAGE_CONTENT_TYPE}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&image.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        Self { boundary, body }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl std::fmt::Debug for ChatForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatForm")
            .field("boundary", &self.boundary)
            .field("len", &self.body.len())
            .finish()
    }
}

fn new_boundary() -> String {
    format!("arogya-{}", uuid::Uuid::new_v4().simple())
}
