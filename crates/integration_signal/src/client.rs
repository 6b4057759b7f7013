//! Client for the signal-cli REST bridge
//!
//! Talks to a `signal-cli-rest-api`-style HTTP bridge: send, poll for
//! incoming envelopes, manage device linking, and fetch attachments.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Serialize;
use tracing::{instrument, warn};

use application::WhatSignalError;
use application::ports::{MediaPayload, SendTarget, SentMessage, TransportClient};
use domain::{ChatId, MediaCategory, mask_tail};

use crate::error::SignalError;
use crate::types::{
    Base64Attachment, DataMessage, DeleteRequest, Envelope, ReactionRequest, ReceiptKind, ReceiptRequest,
    ReceivedEnvelope, SendRequest, SendResponse,
};

#[derive(Debug, Clone)]
pub struct SignalClientConfig {
    /// Base URL of the signal-cli REST bridge, e.g. `http://localhost:8081`.
    pub rpc_url: String,
    /// The intermediary phone number the bridge operates as.
    pub intermediary_phone_number: String,
    /// Device name registered with the bridge during `initialize_device`.
    pub device_name: String,
    pub http_timeout_sec: u64,
    /// Hard cap on a single attachment download during `receive`.
    pub attachment_download_timeout_sec: u64,
}

impl Default for SignalClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8081".to_string(),
            intermediary_phone_number: String::new(),
            device_name: "whatsignal".to_string(),
            http_timeout_sec: 30,
            attachment_download_timeout_sec: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalClient {
    client: Client,
    config: SignalClientConfig,
}

impl SignalClient {
    /// # Errors
    /// Returns an error if `rpc_url`/`intermediary_phone_number` are empty
    /// or the underlying HTTP client fails to build.
    pub fn new(config: SignalClientConfig) -> Result<Self, SignalError> {
        if config.rpc_url.is_empty() {
            return Err(SignalError::Configuration("rpc_url is required".to_string()));
        }
        if config.intermediary_phone_number.is_empty() {
            return Err(SignalError::Configuration("intermediary_phone_number is required".to_string()));
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_sec))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.rpc_url.trim_end_matches('/'))
    }

    fn account(&self) -> &str {
        &self.config.intermediary_phone_number
    }

    /// Send a text or attachment message. `quote` is `(timestamp, author)`
    /// when replying.
    #[instrument(skip(self, message, attachments), fields(recipient = %mask_tail(recipient, 4)))]
    pub async fn send(
        &self,
        recipient: &str,
        message: &str,
        attachments: Vec<Base64Attachment>,
        quote: Option<(i64, String)>,
    ) -> Result<SendResponse, SignalError> {
        let (quote_timestamp, quote_author) = match quote {
            Some((ts, author)) => (Some(ts), Some(author)),
            None => (None, None),
        };
        let request = SendRequest {
            message: message.to_string(),
            number: self.account().to_string(),
            recipients: vec![recipient.to_string()],
            base64_attachments: attachments,
            text_mode: None,
            quote_timestamp,
            quote_author,
        };
        let response = self.client.post(self.url("/v2/send")).json(&request).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Poll for incoming envelopes. `timeout_seconds` of `0` returns
    /// immediately with whatever is already queued.
    #[instrument(skip(self), fields(timeout = timeout_seconds))]
    pub async fn receive(&self, timeout_seconds: u64) -> Result<Vec<Envelope>, SignalError> {
        let url = format!("{}?timeout={timeout_seconds}", self.url(&format!("/v1/receive/{}", self.account())));
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        let received: Vec<ReceivedEnvelope> = response.json().await?;
        Ok(received.into_iter().map(|r| r.envelope).collect())
    }

    /// Register this device with the bridge, requesting a QR code for
    /// linking under `device_name`. Returns the raw QR payload bytes.
    #[instrument(skip(self))]
    pub async fn initialize_device(&self) -> Result<Vec<u8>, SignalError> {
        let url = format!("{}?device_name={}", self.url("/v1/qrcodelink"), self.config.device_name);
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    #[instrument(skip(self))]
    pub async fn download_attachment(&self, attachment_id: &str) -> Result<Vec<u8>, SignalError> {
        let url = self.url(&format!("/v1/attachments/{attachment_id}"));
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(self.config.attachment_download_timeout_sec),
            self.client.get(url).send(),
        )
        .await
        .map_err(|_| SignalError::AttachmentDownloadFailed(format!("timed out fetching {attachment_id}")))??;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    #[instrument(skip(self))]
    pub async fn list_attachments(&self) -> Result<Vec<String>, SignalError> {
        let response = self.client.get(self.url("/v1/attachments")).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

fn recipient_number(chat_id: &ChatId) -> String {
    let raw = chat_id.as_str();
    let digits = raw.split('@').next().unwrap_or(raw);
    if chat_id.is_group() { digits.to_string() } else { format!("+{digits}") }
}

fn parse_timestamp(message_id: &str) -> Result<i64, SignalError> {
    message_id
        .parse::<i64>()
        .map_err(|_| SignalError::InvalidTimestamp(message_id.to_string()))
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SignalError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(SignalError::Bridge { status, body })
}

async fn post_discard<B: Serialize>(client: &Client, url: String, body: &B) -> Result<(), SignalError> {
    let response = client.post(url).json(body).send().await?;
    ensure_success(response).await?;
    Ok(())
}

#[async_trait]
impl TransportClient for SignalClient {
    async fn send_text(&self, target: &SendTarget, body: &str) -> Result<SentMessage, WhatSignalError> {
        let recipient = recipient_number(&target.chat_id);
        let quote = target
            .quoted_message_id
            .as_deref()
            .map(parse_timestamp)
            .transpose()?
            .map(|ts| (ts, self.account().to_string()));
        let response = self.send(&recipient, body, Vec::new(), quote).await?;
        Ok(to_sent_message(response))
    }

    async fn send_media(
        &self,
        target: &SendTarget,
        media: &MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, WhatSignalError> {
        if media.category == MediaCategory::Text {
            return Err(WhatSignalError::MediaType("text is not a media category".to_string()));
        }
        let recipient = recipient_number(&target.chat_id);
        let attachment = Base64Attachment {
            filename: media.file_name.clone(),
            content_type: media.mime_type.clone(),
            data: BASE64.encode(&media.bytes),
        };
        let quote = target
            .quoted_message_id
            .as_deref()
            .map(parse_timestamp)
            .transpose()?
            .map(|ts| (ts, self.account().to_string()));
        let response = self.send(&recipient, caption.unwrap_or(""), vec![attachment], quote).await?;
        Ok(to_sent_message(response))
    }

    async fn send_reaction(
        &self,
        target: &SendTarget,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WhatSignalError> {
        let recipient = recipient_number(&target.chat_id);
        let timestamp = parse_timestamp(message_id)?;
        // The relay always sends on Signal as the intermediary account, so the
        // target message of a mirrored reaction was authored by that account.
        let request = ReactionRequest {
            reaction: emoji.to_string(),
            recipient,
            target_author: self.account().to_string(),
            timestamp,
            remove: emoji.is_empty(),
        };
        let url = format!("{}/{}", self.url("/v1/reactions"), self.account());
        post_discard(&self.client, url, &request).await?;
        Ok(())
    }

    async fn delete(&self, target: &SendTarget, message_id: &str) -> Result<(), WhatSignalError> {
        let recipient = recipient_number(&target.chat_id);
        let timestamp = parse_timestamp(message_id)?;
        let url = self.url(&format!("/v1/messages/{}/{timestamp}", self.account()));
        let request = DeleteRequest { recipient };
        let response = self.client.delete(url).json(&request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn ack(&self, target: &SendTarget, message_id: &str) -> Result<(), WhatSignalError> {
        let recipient = recipient_number(&target.chat_id);
        let timestamp = match parse_timestamp(message_id) {
            Ok(ts) => ts,
            Err(e) => {
                warn!(error = %e, "could not parse Signal timestamp for read receipt");
                return Ok(());
            },
        };
        let request = ReceiptRequest { receipt_type: ReceiptKind::Read, recipient, timestamp };
        let url = format!("{}/{}", self.url("/v1/receipts"), self.account());
        if let Err(e) = post_discard(&self.client, url, &request).await {
            warn!(error = %e, "Signal read receipt failed, continuing");
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), WhatSignalError> {
        let response = self.client.get(self.url("/v1/about")).send().await.map_err(SignalError::Request)?;
        ensure_success(response).await?;
        Ok(())
    }
}

fn to_sent_message(response: SendResponse) -> SentMessage {
    SentMessage {
        message_id: response.message_id.unwrap_or_else(|| response.timestamp.to_string()),
        timestamp: response.timestamp,
    }
}

/// Reconstruct an already-known incoming data message into the raw
/// attachment list needed before it's translated and media is fetched.
#[must_use]
pub fn attachments_of(data: &DataMessage) -> &[crate::types::Attachment] {
    &data.attachments
}
