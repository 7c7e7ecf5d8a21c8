//! A criteria-to-query compiler and CRUD layer for schemaless search stores.
//!
//! This crate is the core of the searchlayer project and provides:
//!
//! - **Criteria model** ([`criteria`]) - Store-agnostic filters, sort, window and aggregations
//! - **Query compiler** ([`compiler`]) - Translation of criteria into native filter trees
//! - **Native filter tree** ([`native`]) - The compiled representation and its visitor
//! - **Document normalizer** ([`normalizer`]) - Schema-aware coercion and identifier renaming
//! - **Store client abstraction** ([`client`]) - The trait implemented by store drivers
//! - **Collections interface** ([`collection`]) - Find, insert, update, destroy, count and bulk
//! - **Search store** ([`store`]) - Entry point binding a client to an index
//! - **Schemas** ([`schema`]) - Collection definitions and their normalization
//! - **Error handling** ([`error`]) - Error types and result types
//! - **Pagination** ([`page`]) - Page windows over search results
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::criteria::Criteria;
//! use searchlayer_core::schema::{Attribute, AttributeType, CollectionDefinition, Schema};
//! use searchlayer_core::store::SearchStore;
//! use serde_json::json;
//!
//! let store = SearchStore::new(client, "app");
//! let tickets = store.collection(CollectionDefinition::new(
//!     "Ticket",
//!     Schema::new().with("priority", Attribute::new(AttributeType::Integer)),
//! ));
//!
//! let urgent = tickets
//!     .find(&Criteria::from_value(json!({ "where": { "priority": { ">=": "4" } } }))?)
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as searchlayer_core;

pub mod client;
pub mod collection;
pub mod compiler;
pub mod config;
pub mod criteria;
pub mod document;
pub mod error;
pub mod native;
pub mod normalizer;
pub mod page;
pub mod schema;
pub mod store;
