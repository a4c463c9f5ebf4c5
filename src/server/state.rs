use crate::commands::CommandAdapter;
use crate::store::subscriptions::SubscriptionStore;

#[derive(Clone)]
pub struct AppState {
    pub commands: CommandAdapter,
    pub subscriptions: SubscriptionStore,
}
