use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("smtp send failed: {0}")]
    Smtp(String),

    #[error("http send failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook responded with status {0}")]
    WebhookStatus(u16),

    #[error("message rendering failed: {0}")]
    Render(String),
}
