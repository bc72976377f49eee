pub mod render;
pub mod webhook;

pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::NotifyError;
use crate::types::{AtBatEvent, GameBattingLine, GameSnapshot, ScheduleEntry, TrackedPlayer};

/// Color / tone of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// A hit
    Positive,
    /// Any other at-bat result
    Negative,
    Info,
    Highlight,
}

impl Sentiment {
    /// RGB used by chat embeds.
    pub fn color(self) -> u32 {
        match self {
            Sentiment::Positive => 0x2E_CC_71,
            Sentiment::Negative => 0xE7_4C_3C,
            Sentiment::Info => 0x34_98_DB,
            Sentiment::Highlight => 0xF1_C4_0F,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Info => "info",
            Sentiment::Highlight => "highlight",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A rendered notification, independent of the chat platform.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub title: String,
    pub sentiment: Sentiment,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub footer: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Notification sink. Implementations only have to deliver a rendered
/// [`Message`]; the typed entry points render through [`render`].
///
/// Callers log failures and carry on. Nothing here is retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: Message) -> Result<(), NotifyError>;

    async fn post_at_bat(
        &self,
        player: &TrackedPlayer,
        event: &AtBatEvent,
        game: &GameSnapshot,
    ) -> Result<(), NotifyError> {
        self.deliver(render::at_bat(player, event, game)).await
    }

    async fn post_game_summary(
        &self,
        player: &TrackedPlayer,
        game: &GameSnapshot,
        line: &GameBattingLine,
    ) -> Result<(), NotifyError> {
        self.deliver(render::game_summary(player, game, line)).await
    }

    async fn post_daily_schedule(&self, entries: &[ScheduleEntry]) -> Result<(), NotifyError> {
        self.deliver(render::daily_schedule(entries)).await
    }
}

/// Writes messages to the log instead of a channel. Used when no webhook is
/// configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, message: Message) -> Result<(), NotifyError> {
        let fields = message
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.value))
            .collect::<Vec<_>>()
            .join(" | ");
        info!(
            event = "NOTIFY",
            sentiment = %message.sentiment,
            title = %message.title,
            "{} | {}{} | {}",
            message.title,
            message.description.as_deref().map(|d| format!("{d} | ")).unwrap_or_default(),
            fields,
            message.footer,
        );
        Ok(())
    }
}
