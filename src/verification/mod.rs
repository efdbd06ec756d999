pub mod api;
pub mod poller;
pub mod reconcile;
pub mod session;
