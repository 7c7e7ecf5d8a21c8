//! In-memory search store client for searchlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreClient` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development,
//! tests and small data sets.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Schemaless records** - Stores JSON records per index and type
//! - **Filter evaluation** - Terms, ranges, patterns and boolean combinators, plus sort and windows
//! - **Metric aggregations** - Sum, average, min and max over the matched records
//! - **Raw searches** - Filter-only bodies in the Elasticsearch search DSL
//!
//! # Quick Start
//!
//! ```ignore
//! use searchlayer::{prelude::*, memory::InMemoryClient};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Model)]
//! #[model(identity = "ticket")]
//! pub struct Ticket {
//!     pub id: Option<String>,
//!     pub title: String,
//!     pub priority: i64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InMemoryClient::builder().build().await?;
//!     let store = SearchStore::new(client, "app");
//!     let tickets = store.typed_collection::<Ticket>();
//!
//!     tickets
//!         .insert_one(&Ticket { id: None, title: "Printer on fire".into(), priority: 5 })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_memory;

mod dsl;
mod evaluator;
pub mod store;

pub use store::{InMemoryClient, InMemoryClientBuilder};
