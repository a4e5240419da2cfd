pub mod buddy;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod memory;
pub mod mood;
pub mod prompt;
pub mod provider;
pub mod segment;
pub mod store;
pub mod types;
