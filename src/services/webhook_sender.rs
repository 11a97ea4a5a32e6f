use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::services::collaborators::{
    ApplicationNotice, EmailSender, InterviewNotice, NotificationSender, Recipient, StatusNotice,
};
use crate::utils::signature::{sign_payload, SIGNATURE_HEADER};
use crate::utils::time::now;

/// Posts signed JSON envelopes to an outbound webhook (a mailer relay or the
/// portal's in-app notification endpoint).
#[derive(Clone)]
pub struct WebhookSender {
    client: Client,
    url: String,
    secret: String,
    channel: &'static str,
}

impl WebhookSender {
    pub fn new(client: Client, url: String, secret: String, channel: &'static str) -> Self {
        info!(channel, url = %url, "Webhook delivery enabled");
        Self {
            client,
            url,
            secret,
            channel,
        }
    }

    pub fn email(client: Client, url: String, secret: String) -> Self {
        Self::new(client, url, secret, "email")
    }

    pub fn in_app(client: Client, url: String, secret: String) -> Self {
        Self::new(client, url, secret, "in_app")
    }

    async fn post<T: Serialize + Sync>(
        &self,
        event: &str,
        to: &Recipient,
        payload: &T,
    ) -> Result<()> {
        let body = serde_json::to_vec(&json!({
            "channel": self.channel,
            "event": event,
            "recipient": to,
            "payload": payload,
            "sent_at": now(),
        }))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(signature) = sign_payload(&self.secret, &body) {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!(
                "{} webhook returned {}: {}",
                self.channel, status, text
            )));
        }
        debug!(channel = self.channel, event, user_id = %to.user_id, "Webhook delivered");
        Ok(())
    }
}

#[async_trait]
impl EmailSender for WebhookSender {
    async fn application_received(&self, to: &Recipient, notice: &ApplicationNotice) -> Result<()> {
        self.post("application_received", to, notice).await
    }

    async fn status_updated(&self, to: &Recipient, notice: &StatusNotice) -> Result<()> {
        self.post("status_updated", to, notice).await
    }

    async fn interview_scheduled(&self, to: &Recipient, notice: &InterviewNotice) -> Result<()> {
        self.post("interview_scheduled", to, notice).await
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn application_received(&self, to: &Recipient, notice: &ApplicationNotice) -> Result<()> {
        self.post("application_received", to, notice).await
    }

    async fn status_updated(&self, to: &Recipient, notice: &StatusNotice) -> Result<()> {
        self.post("status_updated", to, notice).await
    }

    async fn interview_scheduled(&self, to: &Recipient, notice: &InterviewNotice) -> Result<()> {
        self.post("interview_scheduled", to, notice).await
    }
}

/// Used when a channel has no webhook configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSender;

#[async_trait]
impl EmailSender for NoopSender {
    async fn application_received(
        &self,
        _to: &Recipient,
        _notice: &ApplicationNotice,
    ) -> Result<()> {
        Ok(())
    }

    async fn status_updated(&self, _to: &Recipient, _notice: &StatusNotice) -> Result<()> {
        Ok(())
    }

    async fn interview_scheduled(&self, _to: &Recipient, _notice: &InterviewNotice) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for NoopSender {
    async fn application_received(
        &self,
        _to: &Recipient,
        _notice: &ApplicationNotice,
    ) -> Result<()> {
        Ok(())
    }

    async fn status_updated(&self, _to: &Recipient, _notice: &StatusNotice) -> Result<()> {
        Ok(())
    }

    async fn interview_scheduled(&self, _to: &Recipient, _notice: &InterviewNotice) -> Result<()> {
        Ok(())
    }
}
