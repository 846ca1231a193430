//! User-facing notification ledger and its best-effort dispatch queue.

pub mod dispatcher;
pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use dispatcher::{run_worker, Notifier};
pub use models::{Notification, NotificationDraft, NotificationKind};
pub use routes::router;
