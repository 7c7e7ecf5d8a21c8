//! Main search store interface.
//!
//! A [`SearchStore`] owns one [`StoreClient`] and the name of the index all of its collections
//! live in. Collections are cheap views that borrow the client.
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::store::SearchStore;
//!
//! let store = SearchStore::new(client, "app");
//! let tickets = store.typed_collection::<Ticket>();
//! ```

use crate::{
    client::StoreClient,
    collection::{Collection, TypedCollection},
    config::CollectionOptions,
    document::Model,
    error::SearchLayerResult,
    schema::CollectionDefinition,
};

/// Entry point binding a store client to an index.
#[derive(Debug)]
pub struct SearchStore<C: StoreClient> {
    client: C,
    index: String,
    options: CollectionOptions,
}

impl<C: StoreClient> SearchStore<C> {
    /// Creates a store for `index`, with default collection options.
    pub fn new(client: C, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            options: CollectionOptions::default(),
        }
    }

    /// Sets the options every collection of this store starts with.
    pub fn with_options(mut self, options: CollectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Opens the collection described by `definition`.
    ///
    /// The definition is normalized first (see [`CollectionDefinition::normalize`]).
    pub fn collection<'a>(&'a self, definition: CollectionDefinition) -> Collection<'a, C> {
        Collection::new(self.index.clone(), definition.normalize(), &self.client)
            .with_options(self.options)
    }

    /// Opens the collection of the model `M`.
    pub fn typed_collection<'a, M: Model>(&'a self) -> TypedCollection<'a, C, M> {
        TypedCollection::new(self.collection(M::definition()))
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Shuts the client down.
    ///
    /// # Errors
    ///
    /// Returns the client's shutdown error.
    pub async fn shutdown(self) -> SearchLayerResult<()> {
        self.client.shutdown().await?;

        Ok(())
    }
}
