use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use super::{
    ChatTransport, DeliveredMessage, FilePayload, HistoryEntry, OutboundMessage, TransportError,
    TransportResult, Webhook,
};
use crate::engine::events::AttachmentRef;

/// REST client for the chat platform, authenticated with the service's
/// bot token. Every request carries the configured timeout so a stalled
/// platform call degrades into a per-destination failure.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> TransportResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::try_from(format!("Bearer {token}"))
            .map_err(|_| TransportError::Delivery("invalid platform token".into()))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Convert non-2xx responses into a typed error carrying the context.
    async fn check(
        response: reqwest::Response,
        context: &str,
    ) -> TransportResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                context: context.to_string(),
            })
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn list_webhooks(&self, channel_id: &str) -> TransportResult<Vec<Webhook>> {
        let response = self
            .client
            .get(self.url(&format!("/api/channels/{channel_id}/webhooks")))
            .send()
            .await?;
        Ok(Self::check(response, "list webhooks").await?.json().await?)
    }

    async fn create_webhook(&self, channel_id: &str, name: &str) -> TransportResult<Webhook> {
        let response = self
            .client
            .post(self.url(&format!("/api/channels/{channel_id}/webhooks")))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Ok(Self::check(response, "create webhook").await?.json().await?)
    }

    async fn send(
        &self,
        webhook: &Webhook,
        message: &OutboundMessage,
    ) -> TransportResult<DeliveredMessage> {
        let payload = json!({
            "content": message.content,
            "username": message.display_name,
            "avatar_url": message.avatar_url,
        });

        let mut form = Form::new().text("payload_json", payload.to_string());
        for file in &message.files {
            form = form.part(
                "files",
                Part::bytes(file.bytes.clone()).file_name(file.filename.clone()),
            );
        }

        let response = self
            .client
            .post(self.url(&format!("/api/webhooks/{}/{}", webhook.id, webhook.token)))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response, "execute webhook").await?.json().await?)
    }

    async fn fetch_recent_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> TransportResult<Vec<HistoryEntry>> {
        let response = self
            .client
            .get(self.url(&format!("/api/channels/{channel_id}/messages")))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Ok(Self::check(response, "fetch history").await?.json().await?)
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()> {
        let response = self
            .client
            .post(self.url(&format!(
                "/api/channels/{channel_id}/messages/{message_id}/reactions"
            )))
            .json(&json!({ "emoji": emoji }))
            .send()
            .await?;
        Self::check(response, "add reaction").await?;
        Ok(())
    }

    async fn list_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> TransportResult<Vec<String>> {
        let response = self
            .client
            .get(self.url(&format!(
                "/api/channels/{channel_id}/messages/{message_id}/reactions"
            )))
            .send()
            .await?;
        Ok(Self::check(response, "list reactions").await?.json().await?)
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> TransportResult<FilePayload> {
        let response = self.client.get(&attachment.url).send().await?;
        let bytes = Self::check(response, "fetch attachment")
            .await?
            .bytes()
            .await?;
        Ok(FilePayload {
            filename: attachment.filename.clone(),
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport =
            HttpTransport::new("http://localhost:8080/", "tok", Duration::from_secs(5)).unwrap();
        assert_eq!(
            transport.url("/api/channels/1/webhooks"),
            "http://localhost:8080/api/channels/1/webhooks"
        );
    }

    #[test]
    fn test_rejects_unprintable_token() {
        let result = HttpTransport::new("http://localhost", "bad\ntoken", Duration::from_secs(5));
        assert!(result.is_err());
    }
}
