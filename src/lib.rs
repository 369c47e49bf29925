//! MetalPost Library
//!
//! Scheduled precious-metals content pipeline: price cache, news relevance
//! filtering, post generation and publishing.

pub mod config;
pub mod content;
pub mod cycle;
pub mod error;
pub mod http;
pub mod llm;
pub mod news;
pub mod persistence;
pub mod prices;
pub mod publisher;
pub mod relevance;
pub mod settings;
pub mod types;

#[cfg(feature = "server")]
pub mod server;
