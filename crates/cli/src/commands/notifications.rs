//! Notification commands.

use linemart_core::{NotificationId, NotificationKind};
use linemart_storefront::{AppError, AppShell};

use crate::output;

/// List notifications, optionally marking one or all read first.
pub async fn run(
    shell: &AppShell,
    mark_read: Option<NotificationId>,
    mark_all: bool,
) -> Result<(), AppError> {
    let customer = shell.customer();
    if let Some(id) = mark_read {
        customer.mark_notification_read(id).await?;
    } else if mark_all {
        customer.mark_all_notifications_read().await?;
    }

    let notifications = customer.notifications().await?;
    let unread = notifications.iter().filter(|n| !n.read).count();
    output::heading(&format!("Notifications ({unread} unread)"));
    for n in &notifications {
        let marker = if n.read { ' ' } else { '*' };
        let kind = match n.kind {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        output::line(format!(
            "{marker} {:>4}  [{kind}] {}  {}",
            n.id.as_i64(),
            n.message,
            n.time
        ));
    }
    Ok(())
}
