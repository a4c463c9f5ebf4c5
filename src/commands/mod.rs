use crate::store::subscriptions::SubscriptionStore;

/// YouTube channel ids all start with this prefix.
pub const WATCHED_CHANNEL_PREFIX: &str = "UC";

/// Who should see the reply to a command. The chat-platform dispatch layer
/// maps `InvokerOnly` to an ephemeral response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyVisibility {
    Channel,
    InvokerOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommandReply {
    pub ok: bool,
    pub text: String,
    pub visibility: ReplyVisibility,
}

impl CommandReply {
    fn success(text: String) -> Self {
        Self {
            ok: true,
            text,
            visibility: ReplyVisibility::Channel,
        }
    }

    fn failure(text: String) -> Self {
        Self {
            ok: false,
            text,
            visibility: ReplyVisibility::InvokerOnly,
        }
    }
}

/// Validates and routes add/remove subscription requests. Every invocation
/// produces exactly one reply; store failures become a reply instead of
/// propagating.
#[derive(Clone)]
pub struct CommandAdapter {
    subscriptions: SubscriptionStore,
}

impl CommandAdapter {
    pub fn new(subscriptions: SubscriptionStore) -> Self {
        Self { subscriptions }
    }

    pub fn add_alert(
        &self,
        server_id: &str,
        destination_channel_id: &str,
        watched_channel_id: &str,
    ) -> CommandReply {
        if !watched_channel_id.starts_with(WATCHED_CHANNEL_PREFIX) {
            return CommandReply::failure(format!(
                "Invalid YouTube channel id; it must start with '{WATCHED_CHANNEL_PREFIX}'."
            ));
        }
        match self
            .subscriptions
            .add(server_id, destination_channel_id, watched_channel_id)
        {
            Ok(true) => CommandReply::success(format!(
                "Alerts for {watched_channel_id} added to this channel."
            )),
            Ok(false) => CommandReply::failure(format!(
                "{watched_channel_id} is already registered in this channel."
            )),
            Err(err) => {
                tracing::error!(
                    event = "command_store_failed",
                    command = "add_alert",
                    error = %err,
                    "subscription insert failed"
                );
                CommandReply::failure("Something went wrong; try again later.".to_string())
            }
        }
    }

    pub fn remove_alert(
        &self,
        destination_channel_id: &str,
        watched_channel_id: &str,
    ) -> CommandReply {
        match self
            .subscriptions
            .remove(destination_channel_id, watched_channel_id)
        {
            Ok(true) => CommandReply::success(format!(
                "Alerts for {watched_channel_id} removed from this channel."
            )),
            Ok(false) => CommandReply::failure(format!(
                "{watched_channel_id} is not registered in this channel."
            )),
            Err(err) => {
                tracing::error!(
                    event = "command_store_failed",
                    command = "remove_alert",
                    error = %err,
                    "subscription delete failed"
                );
                CommandReply::failure("Something went wrong; try again later.".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandAdapter, ReplyVisibility};
    use crate::store::db::SqliteStore;
    use crate::store::subscriptions::SubscriptionStore;

    fn adapter() -> (CommandAdapter, SubscriptionStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("tubewatch-cmd-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = SqliteStore::new(dir.join("subscriptions.db").to_string_lossy().to_string());
        store.touch().unwrap();
        let subscriptions = SubscriptionStore::new(store);
        (
            CommandAdapter::new(subscriptions.clone()),
            subscriptions,
            dir,
        )
    }

    #[test]
    fn add_alert_rejects_malformed_channel_id_without_writing() {
        let (adapter, subscriptions, dir) = adapter();
        let reply = adapter.add_alert("guild", "dest-1", "abc123");
        assert!(!reply.ok);
        assert_eq!(reply.visibility, ReplyVisibility::InvokerOnly);
        assert!(subscriptions.watched_channels().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn add_alert_reports_duplicates() {
        let (adapter, _, dir) = adapter();
        let first = adapter.add_alert("guild", "dest-1", "UCabc123");
        assert!(first.ok);
        assert_eq!(first.visibility, ReplyVisibility::Channel);
        let second = adapter.add_alert("guild", "dest-1", "UCabc123");
        assert!(!second.ok);
        assert_eq!(second.visibility, ReplyVisibility::InvokerOnly);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn remove_alert_reports_unknown_registration() {
        let (adapter, _, dir) = adapter();
        let missing = adapter.remove_alert("dest-1", "UCabc123");
        assert!(!missing.ok);

        adapter.add_alert("guild", "dest-1", "UCabc123");
        let removed = adapter.remove_alert("dest-1", "UCabc123");
        assert!(removed.ok);
        assert_eq!(removed.visibility, ReplyVisibility::Channel);
        std::fs::remove_dir_all(&dir).ok();
    }
}
