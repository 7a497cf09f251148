#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::RequestError;
use crate::capabilities::{HttpError, KeyValueError, PickerError};
use crate::model::{Alert, AlertKind, ChatRoute, ConversationEntry, EntryKind, Origin, Screen, ServerStatus};

pub use crate::app::App;
pub use crate::capabilities::{Capabilities, Effect};
pub use crate::config::Config;
pub use crate::event::Event;
pub use crate::model::Model;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PICKER_QUALITY: f32 = 0.7;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
pub const TOKEN_KEY: &str = "token";

// User-facing strings. Shells show these verbatim.
pub const SIGNUP_FAILED: &str = "Signup failed";
pub const SIGNUP_SUCCEEDED: &str = "Signup successful, please login";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const SERVER_NOT_REACHABLE: &str = "Server not reachable";
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const EMPTY_COMPOSITION: &str = "Please enter a message or select an image";
pub const SESSION_NOT_SAVED: &str = "Could not save your session";
pub const THINKING_PLACEHOLDER: &str = "Thinking...";
pub const EMERGENCY_TITLE: &str = "Emergency";
pub const EMERGENCY_MESSAGE: &str =
    "If you are in danger or have a medical emergency, call your local emergency number now.";

// --- Errors ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Application,
    Transport,
    Storage,
    Picker,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTH_ERROR",
            Self::Application => "APPLICATION_ERROR",
            Self::Transport => "TRANSPORT_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Picker => "PICKER_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Text a shell shows for this error, either as an alert or as an
    /// assistant entry in the conversation.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Transport => SERVER_NOT_REACHABLE.into(),
            ErrorKind::Application => format!("Error: {}", self.message),
            ErrorKind::Validation
            | ErrorKind::Authentication
            | ErrorKind::Storage
            | ErrorKind::Picker => self.message.clone(),
        }
    }

    /// Every HTTP failure means the server could not be talked to, including
    /// a response body the client cannot read.
    #[must_use]
    pub fn from_http(error: &HttpError) -> Self {
        let cause = match error {
            HttpError::Http { .. } => "status",
            HttpError::Io(_) => "io",
            HttpError::Timeout => "timeout",
            _ => "client",
        };
        Self::new(ErrorKind::Transport, error.to_string()).with_context("cause", cause)
    }

    /// A request the core could not put together.
    #[must_use]
    pub fn from_request(error: &RequestError) -> Self {
        Self::new(ErrorKind::Transport, error.to_string()).with_context("cause", "request")
    }

    /// A non-2xx chat reply. Falls back to a generic message when the
    /// server sent no `detail`.
    #[must_use]
    pub fn from_detail(status: u16, detail: Option<String>) -> Self {
        Self::new(
            ErrorKind::Application,
            detail.unwrap_or_else(|| AUTHENTICATION_FAILED.to_string()),
        )
        .with_context("http_status", status.to_string())
    }

    #[must_use]
    pub fn from_picker(error: &PickerError) -> Self {
        Self::new(ErrorKind::Picker, error.to_string())
            .with_context("permission_denied", error.is_permission_error().to_string())
    }
}

impl From<KeyValueError> for AppError {
    fn from(e: KeyValueError) -> Self {
        let retryable = matches!(e, KeyValueError::Timeout);
        Self::new(ErrorKind::Storage, e.to_string())
            .with_context("retryable", retryable.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

// --- View ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryView {
    pub kind: EntryKind,
    pub content: String,
    pub origin: Origin,
    pub is_placeholder: bool,
}

impl EntryView {
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Text,
            content: text.into(),
            origin: Origin::Assistant,
            is_placeholder: true,
        }
    }
}

impl From<&ConversationEntry> for EntryView {
    fn from(entry: &ConversationEntry) -> Self {
        Self {
            kind: entry.kind,
            content: entry.content.clone(),
            origin: entry.origin,
            is_placeholder: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertView {
    pub title: String,
    pub message: String,
    pub kind: AlertKind,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            title: alert.title().to_string(),
            message: alert.message.clone(),
            kind: alert.kind,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenView {
    Auth {
        email: String,
        has_password: bool,
    },
    Home,
    Chat {
        entries: Vec<EntryView>,
        message: String,
        pending_image: Option<String>,
        is_loading: bool,
        can_send: bool,
        last_route: Option<ChatRoute>,
        image_prediction: Option<String>,
    },
    Emergency {
        title: String,
        message: String,
    },
}

impl ScreenView {
    pub fn screen(&self) -> Screen {
        match self {
            Self::Auth { .. } => Screen::Auth,
            Self::Home => Screen::Home,
            Self::Chat { .. } => Screen::Chat,
            Self::Emergency { .. } => Screen::Emergency,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub screen: ScreenView,
    pub alert: Option<AlertView>,
    pub server_status: ServerStatus,
}
