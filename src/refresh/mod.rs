mod fetch;
mod policy;
mod refresh_loop;

pub use refresh_loop::spawn_refresh_loop;

pub(crate) use fetch::missing_token_snapshot;
