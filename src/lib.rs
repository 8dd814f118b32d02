mod app;
mod commands;
mod credential;
mod github;
mod notifications;
mod oauth;
mod redact;
mod refresh;
mod settings;
mod state;
mod tint;
mod tray;
pub mod types;
mod updater;
mod windows;

pub fn run() {
    app::run();
}
