// Handlers are registered by full path so `generate_handler!` can find each command's macro.
pub mod auth;
pub mod settings;
pub mod updates;
