pub mod roster;
pub mod tables;

pub use roster::UserStore;
pub use tables::{FinalReviewRecord, TableStore, TrackingRecord};
