use async_trait::async_trait;
use kernel::notifier::{Notification, Notifier};
use shared::error::AppResult;

/// Stand-in delivery sink. The chat transport supplies its own `Notifier`;
/// this one records the payload in the log stream.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        tracing::info!(?notification, "notification dispatched");
        Ok(())
    }
}
