use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult, PickerResult};
use crate::config::Config;
use crate::model::{OutgoingMessage, Screen};

// --- Event enum: shell-facing variants first, capability responses boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Setup
    Configure(Box<Config>),

    // Navigation
    Navigate(Screen),

    // Auth
    EmailChanged(String),
    PasswordChanged(String),
    SignupRequested,
    LoginRequested,

    // Chat
    MessageChanged(String),
    PickImageRequested,
    SendRequested,

    // Misc
    DismissAlert,
    HealthCheckRequested,

    // Capability responses (core-internal, never sent by a shell)
    #[serde(skip)]
    SignupResponse(Box<HttpResult>),
    #[serde(skip)]
    LoginResponse(Box<HttpResult>),
    #[serde(skip)]
    TokenStored(Box<KvResult>),
    #[serde(skip)]
    ImagePicked(Box<PickerResult>),
    #[serde(skip)]
    TokenLoaded {
        outgoing: Box<OutgoingMessage>,
        result: Box<KvResult>,
    },
    #[serde(skip)]
    SendResponse(Box<HttpResult>),
    #[serde(skip)]
    HealthResponse(Box<HttpResult>),
}

impl Event {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::Configure(_) => "configure",
            Event::Navigate(_) => "navigate",
            Event::EmailChanged(_) => "email_changed",
            Event::PasswordChanged(_) => "password_changed",
            Event::SignupRequested => "signup_requested",
            Event::LoginRequested => "login_requested",
            Event::MessageChanged(_) => "message_changed",
            Event::PickImageRequested => "pick_image_requested",
            Event::SendRequested => "send_requested",
            Event::DismissAlert => "dismiss_alert",
            Event::HealthCheckRequested => "health_check_requested",
            Event::SignupResponse(_) => "signup_response",
            Event::LoginResponse(_) => "login_response",
            Event::TokenStored(_) => "token_stored",
            Event::ImagePicked(_) => "image_picked",
            Event::TokenLoaded { .. } => "token_loaded",
            Event::SendResponse(_) => "send_response",
            Event::HealthResponse(_) => "health_response",
        }
    }

    #[must_use]
    pub fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Event::Navigate(_)
                | Event::EmailChanged(_)
                | Event::PasswordChanged(_)
                | Event::SignupRequested
                | Event::LoginRequested
                | Event::MessageChanged(_)
                | Event::PickImageRequested
                | Event::SendRequested
                | Event::DismissAlert
                | Event::HealthCheckRequested
        )
    }
}
