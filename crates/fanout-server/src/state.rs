use fanout_core::Coordinator;
use fanout_store::Store;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub coordinator: Coordinator<Store>,
}
