//! Elasticsearch client implementation for searchlayer.
//!
//! This crate provides an HTTP implementation of the `StoreClient` trait on top of `reqwest`,
//! sending compiled queries to an Elasticsearch cluster as `filtered` queries.
//!
//! To use this client, include the `elasticsearch` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! searchlayer = { version = "x.y.z", features = ["elasticsearch"] }
//! ```
//!
//! # Features
//!
//! - **Filter translation** - Native filter trees rendered into the filter DSL
//! - **Index bootstrap** - The configured index is created on first connect when missing
//! - **Bulk writes** - Inserts and raw bulk operations go through the `_bulk` endpoint
//! - **Environment configuration** - [`ConnectionConfig::from_env`] reads `SEARCHLAYER_ES_*`
//!
//! # Example
//!
//! ```ignore
//! use searchlayer::{client::StoreClientBuilder, elasticsearch::{ConnectionConfig, ElasticsearchClient}};
//! use searchlayer::store::SearchStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ElasticsearchClient::builder(ConnectionConfig::from_env())
//!         .build()
//!         .await?;
//!     let index = client.index_name().to_string();
//!     let store = SearchStore::new(client, index);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_elasticsearch;

pub mod client;
pub mod config;
mod translator;
mod wire;

pub use client::{ElasticsearchClient, ElasticsearchClientBuilder};
pub use config::ConnectionConfig;
