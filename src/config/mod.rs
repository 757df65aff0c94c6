/// Database configuration and connection management
pub mod database;

/// Organization and payment page seeding from config.toml
pub mod seed;

/// HTTP listener configuration from environment variables
pub mod server;
