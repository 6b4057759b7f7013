//! WhatsApp gateway client
//!
//! Talks to a wwebjs-style HTTP gateway: a thin REST wrapper over a
//! browser-automated WhatsApp Web session, addressed by `session` name.
//! Implements [`TransportClient`] for the Bridge's dynamic dispatch, plus
//! the session-lifecycle and contact-listing operations that are
//! WhatsApp-specific and never crossed by the Bridge.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use application::error::WhatSignalError;
use application::ports::{MediaPayload, SendTarget, SentMessage, TransportClient};
use domain::{MediaCategory, mask_tail};

/// WhatsApp gateway client errors, translated to [`WhatSignalError`] at the
/// `TransportClient` boundary.
#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway error: {status} - {body}")]
    Gateway { status: u16, body: String },

    #[error("missing configuration: {0}")]
    Configuration(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("media download failed: {0}")]
    MediaDownloadFailed(String),
}

impl From<WhatsAppError> for WhatSignalError {
    fn from(err: WhatsAppError) -> Self {
        match err {
            WhatsAppError::Request(e) => Self::Transport(e.to_string()),
            WhatsAppError::Gateway { status, body } if (500..600).contains(&status) => {
                Self::Transport(format!("gateway {status}: {body}"))
            },
            WhatsAppError::Gateway { status, body } => {
                Self::Protocol(format!("gateway {status}: {body}"))
            },
            WhatsAppError::Configuration(msg) => Self::Config(msg),
            WhatsAppError::SessionNotFound(session) => {
                Self::ChannelNotFound(format!("whatsapp session {session}"))
            },
            WhatsAppError::MediaDownloadFailed(msg) => Self::Transport(msg),
        }
    }
}

/// WhatsApp gateway client configuration.
#[derive(Debug, Clone)]
pub struct WhatsAppClientConfig {
    /// Base URL of the gateway, e.g. `http://localhost:3001`.
    pub api_base_url: String,
    /// Default session name used when an operation omits one.
    pub default_session: String,
    /// HTTP request timeout, in seconds.
    pub http_timeout_sec: u64,
}

impl Default for WhatsAppClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            default_session: "default".to_string(),
            http_timeout_sec: 30,
        }
    }
}

/// Current lifecycle state of a gateway session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Starting,
    ScanQrCode,
    Working,
    Failed,
    Stopped,
}

#[derive(Debug, Deserialize)]
struct SessionStatusResponse {
    status: SessionStatus,
}

/// A gateway-side contact-directory entry, as returned by contact listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayContact {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "pushname")]
    pub push_name: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub is_my_contact: bool,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct SendTextRequest<'a> {
    session: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Serialize)]
struct FileData<'a> {
    mimetype: &'a str,
    filename: &'a str,
    data: String,
}

#[derive(Serialize)]
struct SendMediaRequest<'a> {
    session: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    file: FileData<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Serialize)]
struct SendReactionRequest<'a> {
    session: &'a str,
    #[serde(rename = "messageId")]
    message_id: &'a str,
    reaction: &'a str,
}

#[derive(Serialize)]
struct DeleteMessageRequest<'a> {
    session: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    #[serde(rename = "messageId")]
    message_id: &'a str,
}

#[derive(Serialize)]
struct SendSeenRequest<'a> {
    session: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    #[serde(rename = "messageId")]
    message_id: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Client for the WhatsApp gateway's REST surface.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: Client,
    config: WhatsAppClientConfig,
}

impl WhatsAppClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base_url` is empty.
    pub fn new(config: WhatsAppClientConfig) -> Result<Self, WhatsAppError> {
        if config.api_base_url.is_empty() {
            return Err(WhatsAppError::Configuration(
                "api_base_url is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_sec))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url.trim_end_matches('/'))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<SendResponse, WhatsAppError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        handle_send_response(response).await
    }

    /// Start a gateway session.
    #[instrument(skip(self), fields(session = session))]
    pub async fn start_session(&self, session: &str) -> Result<(), WhatsAppError> {
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session}/start")))
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Stop a gateway session.
    #[instrument(skip(self), fields(session = session))]
    pub async fn stop_session(&self, session: &str) -> Result<(), WhatsAppError> {
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session}/stop")))
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Restart a gateway session.
    #[instrument(skip(self), fields(session = session))]
    pub async fn restart_session(&self, session: &str) -> Result<(), WhatsAppError> {
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session}/restart")))
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Fetch the current status of a gateway session.
    #[instrument(skip(self), fields(session = session))]
    pub async fn session_status(&self, session: &str) -> Result<SessionStatus, WhatsAppError> {
        let response = self
            .client
            .get(self.url(&format!("/api/sessions/{session}")))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let status: SessionStatusResponse = response.json().await?;
        Ok(status.status)
    }

    /// List contacts for a session, paginated.
    #[instrument(skip(self), fields(session = session, limit = limit, offset = offset))]
    pub async fn list_contacts(
        &self,
        session: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<GatewayContact>, WhatsAppError> {
        let response = self
            .client
            .get(self.url(&format!("/api/{session}/contacts")))
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Download media referenced by a webhook payload's `media.url`.
    #[instrument(skip(self), fields(url = %media_url))]
    pub async fn download_media(&self, media_url: &str) -> Result<Vec<u8>, WhatsAppError> {
        let response = self.client.get(media_url).send().await?;
        if !response.status().is_success() {
            return Err(WhatsAppError::MediaDownloadFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, WhatsAppError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body_text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<GatewayErrorResponse>(&body_text)
        .ok()
        .and_then(|e| e.message.or(e.error))
        .unwrap_or(body_text);
    Err(WhatsAppError::Gateway { status, body })
}

async fn handle_send_response(response: reqwest::Response) -> Result<SendResponse, WhatsAppError> {
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

fn media_endpoint(category: MediaCategory) -> Option<&'static str> {
    match category {
        MediaCategory::Image => Some("/api/sendImage"),
        MediaCategory::Video => Some("/api/sendVideo"),
        MediaCategory::Voice => Some("/api/sendVoice"),
        MediaCategory::Document => Some("/api/sendFile"),
        MediaCategory::Text => None,
    }
}

#[async_trait]
impl TransportClient for WhatsAppClient {
    #[instrument(skip(self, body), fields(chat_id = %mask_tail(target.chat_id.as_str(), 4)))]
    async fn send_text(&self, target: &SendTarget, body: &str) -> Result<SentMessage, WhatSignalError> {
        let request = SendTextRequest {
            session: &target.session_or_destination,
            chat_id: target.chat_id.as_str(),
            text: body,
            reply_to: target.quoted_message_id.as_deref(),
        };
        debug!(chat_id = %mask_tail(target.chat_id.as_str(), 4), "sending WhatsApp text");
        let response = self.post_json("/api/sendText", &request).await?;
        Ok(to_sent_message(response))
    }

    #[instrument(skip(self, media, caption), fields(chat_id = %mask_tail(target.chat_id.as_str(), 4), category = ?media.category))]
    async fn send_media(
        &self,
        target: &SendTarget,
        media: &MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, WhatSignalError> {
        let Some(endpoint) = media_endpoint(media.category) else {
            return Err(WhatSignalError::MediaType(format!(
                "cannot send {} as media",
                media.category
            )));
        };
        let request = SendMediaRequest {
            session: &target.session_or_destination,
            chat_id: target.chat_id.as_str(),
            file: FileData {
                mimetype: &media.mime_type,
                filename: &media.file_name,
                data: BASE64.encode(&media.bytes),
            },
            caption,
            reply_to: target.quoted_message_id.as_deref(),
        };
        debug!(chat_id = %mask_tail(target.chat_id.as_str(), 4), endpoint, "sending WhatsApp media");
        let response = self.post_json(endpoint, &request).await?;
        Ok(to_sent_message(response))
    }

    #[instrument(skip(self), fields(chat_id = %mask_tail(target.chat_id.as_str(), 4), message_id = %mask_tail(message_id, 4)))]
    async fn send_reaction(
        &self,
        target: &SendTarget,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WhatSignalError> {
        let request = SendReactionRequest {
            session: &target.session_or_destination,
            message_id,
            reaction: emoji,
        };
        self.post_json("/api/sendReaction", &request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(chat_id = %mask_tail(target.chat_id.as_str(), 4), message_id = %mask_tail(message_id, 4)))]
    async fn delete(&self, target: &SendTarget, message_id: &str) -> Result<(), WhatSignalError> {
        let request = DeleteMessageRequest {
            session: &target.session_or_destination,
            chat_id: target.chat_id.as_str(),
            message_id,
        };
        self.post_json("/api/deleteMessage", &request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(chat_id = %mask_tail(target.chat_id.as_str(), 4), message_id = %mask_tail(message_id, 4)))]
    async fn ack(&self, target: &SendTarget, message_id: &str) -> Result<(), WhatSignalError> {
        let request = SendSeenRequest {
            session: &target.session_or_destination,
            chat_id: target.chat_id.as_str(),
            message_id,
        };
        if let Err(e) = self.post_json("/api/sendSeen", &request).await {
            warn!(error = %e, "sendSeen failed, ignoring");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), WhatSignalError> {
        let response = self
            .client
            .get(self.url(&format!("/api/sessions/{}", self.config.default_session)))
            .send()
            .await
            .map_err(WhatsAppError::Request)?;
        ensure_success(response).await.map(|_| ()).map_err(Into::into)
    }
}

fn to_sent_message(response: SendResponse) -> SentMessage {
    SentMessage {
        message_id: response.id,
        timestamp: response.timestamp.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ChatId;

    fn test_config() -> WhatsAppClientConfig {
        WhatsAppClientConfig {
            api_base_url: "http://localhost:3001".to_string(),
            default_session: "personal".to_string(),
            http_timeout_sec: 30,
        }
    }

    #[test]
    fn client_creation_requires_base_url() {
        let config = WhatsAppClientConfig {
            api_base_url: String::new(),
            ..test_config()
        };
        assert!(matches!(
            WhatsAppClient::new(config),
            Err(WhatsAppError::Configuration(_))
        ));
    }

    #[test]
    fn client_creation_succeeds_with_valid_config() {
        assert!(WhatsAppClient::new(test_config()).is_ok());
    }

    #[test]
    fn url_joins_base_and_path_without_double_slash() {
        let client = WhatsAppClient::new(WhatsAppClientConfig {
            api_base_url: "http://localhost:3001/".to_string(),
            ..test_config()
        })
        .unwrap();
        assert_eq!(client.url("/api/sendText"), "http://localhost:3001/api/sendText");
    }

    #[test]
    fn media_endpoint_maps_each_category() {
        assert_eq!(media_endpoint(MediaCategory::Image), Some("/api/sendImage"));
        assert_eq!(media_endpoint(MediaCategory::Video), Some("/api/sendVideo"));
        assert_eq!(media_endpoint(MediaCategory::Voice), Some("/api/sendVoice"));
        assert_eq!(media_endpoint(MediaCategory::Document), Some("/api/sendFile"));
        assert_eq!(media_endpoint(MediaCategory::Text), None);
    }

    #[test]
    fn gateway_error_maps_5xx_to_transport() {
        let err: WhatSignalError = WhatsAppError::Gateway {
            status: 503,
            body: "busy".to_string(),
        }
        .into();
        assert!(matches!(err, WhatSignalError::Transport(_)));
    }

    #[test]
    fn gateway_error_maps_4xx_to_protocol() {
        let err: WhatSignalError = WhatsAppError::Gateway {
            status: 400,
            body: "bad request".to_string(),
        }
        .into();
        assert!(matches!(err, WhatSignalError::Protocol(_)));
    }

    #[test]
    fn session_not_found_maps_to_channel_not_found() {
        let err: WhatSignalError = WhatsAppError::SessionNotFound("biz".to_string()).into();
        assert!(matches!(err, WhatSignalError::ChannelNotFound(_)));
    }

    #[test]
    fn send_target_carries_chat_id() {
        let chat_id = ChatId::direct("+1234567890").unwrap();
        let target = SendTarget::new(chat_id.clone(), "personal".to_string());
        assert_eq!(target.chat_id, chat_id);
    }
}
