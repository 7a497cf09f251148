use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

// Local URI of a picked image, as the shell's picker reported it.
typed_id!(ImageUri);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Auth,
    Home,
    Chat,
    Emergency,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Auth => "auth",
            Screen::Home => "home",
            Screen::Chat => "chat",
            Screen::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn clear(&mut self) {
        self.email.clear();
        self.password.clear();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Image,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

/// One line of the conversation, in the wire shape `{type, value, sender}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "value")]
    pub content: String,
    #[serde(rename = "sender")]
    pub origin: Origin,
}

impl ConversationEntry {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Text,
            content: text.into(),
            origin: Origin::User,
        }
    }

    pub fn user_image(uri: &ImageUri) -> Self {
        Self {
            kind: EntryKind::Image,
            content: uri.as_str().to_string(),
            origin: Origin::User,
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Text,
            content: text.into(),
            origin: Origin::Assistant,
        }
    }
}

/// Append-only log: entries are pushed, never edited or removed.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
}

impl Conversation {
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A picked image waiting to be sent.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub uri: ImageUri,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl PendingImage {
    pub fn new(uri: ImageUri, data: Vec<u8>) -> Self {
        Self { uri, data }
    }
}

impl fmt::Debug for PendingImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingImage")
            .field("uri", &self.uri)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// What the user is about to send.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    pub message: String,
    pub image: Option<PendingImage>,
}

impl Composition {
    /// Snapshot for sending, or `None` when there is nothing to send.
    pub fn outgoing(&self) -> Option<OutgoingMessage> {
        let trimmed = self.message.trim();
        let text = (!trimmed.is_empty()).then(|| trimmed.to_string());

        if text.is_none() && self.image.is_none() {
            return None;
        }

        Some(OutgoingMessage {
            text,
            image: self.image.clone(),
        })
    }

    pub fn clear(&mut self) {
        self.message.clear();
        self.image = None;
    }
}

/// A send in progress: trimmed text (if any) and the picked image (if any).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: Option<String>,
    pub image: Option<PendingImage>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            AlertKind::Success => "Success",
            AlertKind::Error => "Error",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

/// How the backend answered the last message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRoute {
    TextOnly,
    ImageOnly,
    ImageAndText,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LastReply {
    pub route: ChatRoute,
    pub image_prediction: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub config: Config,
    pub screen: Screen,
    #[serde(skip)]
    pub credentials: Credentials,

    // Chat
    pub conversation: Conversation,
    pub composition: Composition,
    pub is_loading: bool,
    pub last_reply: Option<LastReply>,

    pub alert: Option<Alert>,
    pub server_status: ServerStatus,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }
}
