use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::channels::ChannelAdapter;
use crate::error::NotifyError;
use crate::rendering::RenderedMessage;

/// SMTP delivery over TLS, via a pre-built transport shared across sends.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailChannel {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>, from: Mailbox, to: Mailbox) -> Self {
        EmailChannel { transport, from, to }
    }
}

#[async_trait]
impl ChannelAdapter for EmailChannel {
    async fn send(&self, rendered: &RenderedMessage) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(rendered.subject.clone())
            .body(rendered.text.clone())
            .map_err(|e| NotifyError::Render(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }
}
