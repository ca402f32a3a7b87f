mod email;
mod lark;
mod telegram;

pub use email::EmailChannel;
pub use lark::LarkChannel;
pub use telegram::TelegramChannel;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::rendering::RenderedMessage;

/// One downstream delivery mechanism. Implementations should report failure
/// through `Err` rather than panicking, but the dispatcher also isolates
/// each send in its own task, so a panic here is recorded as
/// `send_status=failed` rather than taking the dispatcher loop down.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    async fn send(&self, rendered: &RenderedMessage) -> Result<(), NotifyError>;
}
