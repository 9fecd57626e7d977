use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::repo::UserStore;

/// Emitted after a successful grant redemption; one event per access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub owner_id: String,
}

/// Outbound mail boundary. The dispatcher only ever calls `send`; wiring a
/// real SMTP client stays out of the core.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Logs outbound mail instead of delivering it, like the placeholder
/// transporter the service ships with until real mail credentials exist.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, from: &str, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        info!(%from, %to, subject, "mail dispatched");
        Ok(())
    }
}

/// Tells a record owner their data was accessed. Owners that do not resolve
/// to a stored user are skipped silently, and transport failures are logged
/// and dropped; nothing here ever surfaces to the access request.
pub async fn notify_access(
    users: &Arc<dyn UserStore>,
    mailer: &Arc<dyn MailTransport>,
    from: &str,
    owner_id: &str,
) {
    let Ok(user_id) = Uuid::parse_str(owner_id) else {
        warn!(%owner_id, "access notification skipped: owner id is not a user id");
        return;
    };

    let user = match users.find_by_id(user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            debug!(%owner_id, "access notification skipped: no such user");
            return;
        }
        Err(e) => {
            error!(error = %e, %owner_id, "owner lookup failed");
            return;
        }
    };

    if let Err(e) = mailer
        .send(
            from,
            &user.email,
            "Access to your health data",
            "Your health data was accessed via a share code.",
        )
        .await
    {
        error!(error = %e, user_id = %user.id, "access notification failed");
    }
}

/// Drains access events on a background task so a slow or failing transport
/// never delays the request that triggered it.
pub fn spawn_worker(
    mut events: UnboundedReceiver<AccessEvent>,
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn MailTransport>,
    from: String,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            notify_access(&users, &mailer, &from, &event.owner_id).await;
        }
        debug!("access event channel closed, notification worker stopping");
    });
}
