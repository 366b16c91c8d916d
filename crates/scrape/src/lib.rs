pub mod client;
pub mod poll;

pub use client::{JobHandle, ScrapeClient};
pub use poll::{poll_until_terminal, PollPolicy, RunStatus};
