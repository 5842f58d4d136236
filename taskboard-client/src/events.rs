/// UI notification bus
///
/// Fire-and-forget events for whatever renders the client: success and
/// error toasts, hiding the intro, opening the card editor. Built on a
/// `tokio::sync::broadcast` channel, so every subscriber sees every event
/// sent after it subscribed. Sending with no subscriber is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

pub const DEFAULT_SUCCESS_HEADING: &str = "Done";
pub const DEFAULT_ERROR_HEADING: &str = "Error";

const CHANNEL_CAPACITY: usize = 64;

/// What the card editor is opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardAction {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    Success {
        heading: String,
        message: String,
    },
    Error {
        heading: String,
        message: String,
        details: Vec<String>,
    },
    HideInviteIntro,
    ShowCardManageModal {
        #[serde(rename = "formData")]
        form_data: serde_json::Value,
        action: CardAction,
    },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<UiEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.sender.subscribe()
    }

    fn emit(&self, event: UiEvent) {
        if self.sender.send(event).is_err() {
            debug!("UI event dropped, no subscribers");
        }
    }

    pub fn show_success(&self, heading: Option<&str>, message: &str) {
        self.emit(UiEvent::Success {
            heading: heading.unwrap_or(DEFAULT_SUCCESS_HEADING).to_string(),
            message: message.to_string(),
        });
    }

    pub fn show_error(&self, heading: Option<&str>, message: &str, details: Vec<String>) {
        self.emit(UiEvent::Error {
            heading: heading.unwrap_or(DEFAULT_ERROR_HEADING).to_string(),
            message: message.to_string(),
            details,
        });
    }

    pub fn hide_invite_intro(&self) {
        self.emit(UiEvent::HideInviteIntro);
    }

    pub fn show_card_manage_modal(&self, form_data: serde_json::Value, action: CardAction) {
        self.emit(UiEvent::ShowCardManageModal { form_data, action });
    }
}
