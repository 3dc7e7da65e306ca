pub mod cli;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod record;
pub mod scorer;
pub mod session;
pub mod store;
pub mod terminal;
