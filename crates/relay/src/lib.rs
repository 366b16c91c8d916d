pub mod client;
pub mod server;

pub use client::RelayClient;
pub use server::{router, serve};
