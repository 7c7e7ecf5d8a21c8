//! Main searchlayer crate providing a unified interface to schemaless search stores.
//!
//! This crate is the primary entry point for users of the searchlayer framework. It re-exports
//! the core types and functionality from the sub-crates and provides access to the available
//! store clients.
//!
//! # Features
//!
//! - **Criteria compiler** - Store-agnostic filter criteria compiled into native search filters
//! - **CRUD orchestration** - Find, insert, update, destroy, count and bulk over any client
//! - **Typed models** - `#[derive(Model)]` binds a serde struct to a collection
//! - **Multiple clients** - In-memory and Elasticsearch clients behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use searchlayer::{prelude::*, memory::InMemoryClient};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Model)]
//! #[model(identity = "Ticket")]
//! pub struct Ticket {
//!     #[model(primary_key)]
//!     pub id: Option<String>,
//!     pub title: String,
//!     pub priority: i64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SearchStore::new(InMemoryClient::builder().build().await?, "app");
//!     let tickets = store.typed_collection::<Ticket>();
//!
//!     tickets
//!         .insert_one(&Ticket { id: None, title: "Printer on fire".into(), priority: 5 })
//!         .await?;
//!
//!     // Criteria can be built from JSON...
//!     let urgent = tickets
//!         .find(&Criteria::from_value(json!({ "where": { "priority": { ">=": 4 } } }))?)
//!         .await?;
//!
//!     // ...or with the builder.
//!     let printers = tickets
//!         .find(
//!             &Criteria::builder()
//!                 .filter(Where::contains("title", "printer"))
//!                 .sort("priority", SortDirection::Desc)
//!                 .limit(10)
//!                 .build(),
//!         )
//!         .await?;
//!
//!     println!("{urgent:?} {printers:?}");
//!
//!     store.shutdown().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Clients
//!
//! - [`memory`] - In-memory client for development and testing
//! - `elasticsearch` - Elasticsearch client over HTTP (requires the `elasticsearch` feature)

#[allow(unused_extern_crates)]
extern crate self as searchlayer;

pub mod prelude;

pub use searchlayer_core::{
    client, collection, compiler, config, criteria, document, error, native, normalizer, page, schema, store,
};
pub use searchlayer_macros::Model;

// Re-exported for implementing `StoreClient` and building records.
pub use async_trait::async_trait;
pub use serde_json;

/// In-memory store client.
pub mod memory {
    pub use searchlayer_memory::{InMemoryClient, InMemoryClientBuilder};
}

/// Elasticsearch store client.
///
/// This module is only available when the `elasticsearch` feature is enabled.
#[cfg(feature = "elasticsearch")]
pub mod elasticsearch {
    pub use searchlayer_elasticsearch::{ConnectionConfig, ElasticsearchClient, ElasticsearchClientBuilder};
}
