pub mod auth;
pub mod collector;
pub mod context;
pub mod dwell;
pub mod tracker;

pub use auth::{AuthManager, PendingRegistration};
pub use collector::{Collector, SnapshotSink};
pub use context::{ClickEvent, SessionContext, Snapshot};
pub use dwell::DwellClock;
pub use tracker::{SessionTracker, TrackerConfig, UiEvent};
