use std::sync::Arc;

use masjid_events::EventBus;

use crate::config::ServerConfig;

/// Handler state. Cloned per request, so everything heavy sits behind `Arc`
/// (the sqlx pool is already reference-counted).
#[derive(Clone)]
pub struct AppState {
    pub pool: masjid_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Handlers publish here after their transaction commits; the
    /// notification dispatcher is the usual receiver.
    pub event_bus: Arc<EventBus>,
}
