//! Plain-text rendering of the view model.

use shared::model::{AlertKind, EntryKind, Origin, ServerStatus};
use shared::{AlertView, EntryView, ScreenView, ViewModel};

pub fn entry_line(entry: &EntryView) -> String {
    let who = match entry.origin {
        Origin::User => "you",
        Origin::Assistant => "arogya",
    };
    match entry.kind {
        EntryKind::Text => format!("{who}> {}", entry.content),
        EntryKind::Image => format!("{who}> [image {}]", entry.content),
    }
}

pub fn alert_line(alert: &AlertView) -> String {
    match alert.kind {
        AlertKind::Error => format!("! {}: {}", alert.title, alert.message),
        AlertKind::Success => format!("* {}: {}", alert.title, alert.message),
    }
}

pub fn status_line(status: ServerStatus) -> &'static str {
    match status {
        ServerStatus::Unknown => "server status unknown",
        ServerStatus::Reachable => "server is reachable",
        ServerStatus::Unreachable => "Server not reachable",
    }
}

/// Tracks how much of the conversation has been printed already.
#[derive(Debug, Default)]
pub struct Transcript {
    printed: usize,
}

impl Transcript {
    /// Lines for entries appended since the last call. The loading
    /// placeholder is never printed.
    pub fn new_lines(&mut self, view: &ViewModel) -> Vec<String> {
        let ScreenView::Chat { entries, .. } = &view.screen else {
            return Vec::new();
        };
        let settled: Vec<&EntryView> = entries.iter().filter(|e| !e.is_placeholder).collect();
        let lines = settled
            .iter()
            .skip(self.printed)
            .map(|e| entry_line(e))
            .collect();
        self.printed = settled.len();
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(entries: Vec<EntryView>) -> ViewModel {
        ViewModel {
            screen: ScreenView::Chat {
                entries,
                message: String::new(),
                pending_image: None,
                is_loading: false,
                can_send: false,
                last_route: None,
                image_prediction: None,
            },
            alert: None,
            server_status: ServerStatus::Unknown,
        }
    }

    fn text(origin: Origin, content: &str) -> EntryView {
        EntryView {
            kind: EntryKind::Text,
            content: content.into(),
            origin,
            is_placeholder: false,
        }
    }

    #[test]
    fn transcript_prints_each_entry_once() {
        let mut transcript = Transcript::default();
        let first = chat(vec![
            text(Origin::User, "hello"),
            EntryView::placeholder("Thinking..."),
        ]);
        assert_eq!(transcript.new_lines(&first), vec!["you> hello"]);

        let second = chat(vec![
            text(Origin::User, "hello"),
            text(Origin::Assistant, "Hi, how can I help?"),
        ]);
        assert_eq!(transcript.new_lines(&second), vec!["arogya> Hi, how can I help?"]);
        assert!(transcript.new_lines(&second).is_empty());
    }

    #[test]
    fn image_entries_show_their_uri() {
        let entry = EntryView {
            kind: EntryKind::Image,
            content: "file:///a.jpg".into(),
            origin: Origin::User,
            is_placeholder: false,
        };
        assert_eq!(entry_line(&entry), "you> [image file:///a.jpg]");
    }
}
