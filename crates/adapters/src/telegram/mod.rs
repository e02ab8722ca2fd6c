//! Telegram Bot API delivery adapter

use async_trait::async_trait;
use coupon_herald_domain::{ActionLink, DeliveryError, DeliveryPort, DeliveryReceipt};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Telegram delivery for posting to a channel as a bot
pub struct TelegramDelivery {
    client: Client,
    bot_token: SecretString,
    base_url: String,
    disable_notification: bool,
}

impl TelegramDelivery {
    pub fn new(bot_token: SecretString, timeout: Duration) -> Result<Self, DeliveryError> {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL.to_string(), timeout)
    }

    pub fn with_base_url(
        bot_token: SecretString,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Network(e.without_url().to_string()))?;

        Ok(Self {
            client,
            bot_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            disable_notification: false,
        })
    }

    /// Post silently (no notification sound for channel subscribers)
    pub fn silent(mut self, disable_notification: bool) -> Self {
        self.disable_notification = disable_notification;
        self
    }

    async fn call<T: Serialize + Sync>(
        &self,
        method: &str,
        request: &T,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let url = format!(
            "{}/bot{}/{}",
            self.base_url,
            self.bot_token.expose_secret(),
            method
        );

        // Errors are stripped of their URL: it embeds the bot token
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Network(e.without_url().to_string()))?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        interpret(method, status, parsed, &body)
    }
}

fn interpret(
    method: &str,
    status: StatusCode,
    parsed: Option<ApiResponse>,
    body: &str,
) -> Result<DeliveryReceipt, DeliveryError> {
    let description = parsed
        .as_ref()
        .and_then(|r| r.description.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = parsed
            .as_ref()
            .and_then(|r| r.parameters.as_ref())
            .and_then(|p| p.retry_after)
            .map(Duration::from_secs);
        return Err(DeliveryError::RateLimited(retry_after));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DeliveryError::Auth(description));
    }

    if !status.is_success() {
        return Err(DeliveryError::Api(format!(
            "{} failed with {}: {}",
            method, status, description
        )));
    }

    let Some(parsed) = parsed else {
        return Err(DeliveryError::Unconfirmed(format!(
            "{} returned an unreadable body",
            method
        )));
    };

    if !parsed.ok {
        return Err(DeliveryError::Api(format!("{} rejected: {}", method, description)));
    }

    let Some(message) = parsed.result else {
        return Err(DeliveryError::Unconfirmed(format!(
            "{} returned ok without a message",
            method
        )));
    };

    let url = message
        .chat
        .and_then(|chat| chat.username)
        .map(|username| format!("https://t.me/{}/{}", username, message.message_id));

    Ok(DeliveryReceipt {
        message_id: message.message_id.to_string(),
        url,
    })
}

#[derive(Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    disable_notification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_notification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    url: &'a str,
}

impl<'a> InlineKeyboardMarkup<'a> {
    fn single(action: &'a ActionLink) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: &action.label,
                url: &action.url,
            }]],
        }
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<Message>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct Message {
    message_id: i64,
    #[serde(default)]
    chat: Option<Chat>,
}

#[derive(Deserialize)]
struct Chat {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[async_trait]
impl DeliveryPort for TelegramDelivery {
    async fn send_media(
        &self,
        destination: &str,
        media: &str,
        caption: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let request = SendPhotoRequest {
            chat_id: destination,
            photo: media,
            caption,
            disable_notification: self.disable_notification,
            reply_markup: action.map(InlineKeyboardMarkup::single),
        };
        self.call("sendPhoto", &request).await
    }

    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let request = SendMessageRequest {
            chat_id: destination,
            text,
            disable_notification: self.disable_notification,
            reply_markup: action.map(InlineKeyboardMarkup::single),
        };
        self.call("sendMessage", &request).await
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
