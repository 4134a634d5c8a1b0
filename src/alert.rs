/// Blocking alerts
///
/// On the desktop these are native message boxes; tests swap in a recorder.

use futures::future::{BoxFuture, FutureExt};
use rfd::{AsyncMessageDialog, MessageButtons, MessageLevel};

use crate::state::data::{Alert, AlertLevel};

pub trait AlertPresenter: Send + Sync {
    /// Resolves once the user dismisses the alert
    fn present(&self, alert: Alert) -> BoxFuture<'static, ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DialogPresenter;

impl AlertPresenter for DialogPresenter {
    fn present(&self, alert: Alert) -> BoxFuture<'static, ()> {
        async move {
            let level = match alert.level {
                AlertLevel::Info => MessageLevel::Info,
                AlertLevel::Warning => MessageLevel::Warning,
                AlertLevel::Error => MessageLevel::Error,
            };

            let mut dialog = AsyncMessageDialog::new()
                .set_level(level)
                .set_title(alert.title.as_str())
                .set_buttons(MessageButtons::Ok);
            if let Some(body) = alert.body.as_deref() {
                dialog = dialog.set_description(body);
            }

            dialog.show().await;
        }
        .boxed()
    }
}
