pub mod auth_cmd;
pub mod compare_cmd;
pub mod onboard;
pub mod relay_cmd;
pub mod session_cmd;
pub mod status;
pub mod summarize_cmd;
pub mod users;
