//! # docstore - embedded document store
//!
//! An in-process document store with the client model of a document
//! database: documents are JSON-like [collection::Document]s grouped in
//! collections and addressed by keys such as `products/1-A`.
//!
//! ## Key Features
//!
//! - **Sessions**: unit of work with an identity cache, change tracking,
//!   reference includes and optimistic concurrency on commit
//! - **Atomic batches**: every write goes through one serialized, all or
//!   nothing batch; readers see the last committed snapshot
//! - **Bulk loading**: bounded, chunked ingestion on a background flusher
//! - **Queries**: filters, sorting, paging, projection and full-text search,
//!   served by field and full-text indexes when available
//! - **Attachments**: named binary blobs stored alongside documents
//!
//! ## Quick Start
//!
//! ```rust
//! use docstore::{doc, DocStore};
//! use docstore::filter::field;
//!
//! let store = DocStore::builder().open().unwrap();
//!
//! let mut session = store.open_session();
//! let category = session.store("Categories", doc! { Name: "Databases" }).unwrap();
//! session
//!     .store("Products", doc! { Name: "RavenDB", Category: (category.clone()), UnitsInStock: 10 })
//!     .unwrap();
//! session.commit().unwrap();
//!
//! let in_stock = store
//!     .query("Products")
//!     .filter(field("UnitsInStock").gt(5))
//!     .to_vec()
//!     .unwrap();
//! assert_eq!(in_stock.len(), 1);
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - documents, keys and key generation
//! - [`common`] - values, tokenizer, sort order and locking helpers
//! - [`errors`] - error types and result definitions
//! - [`filter`] - query filters
//! - [`index`] - index descriptors
//! - [`store`] - the document store, batches and attachments
//! - [`query`] - queries, cursors and query statistics
//! - [`session`] - sessions and entity mapping
//! - [`bulk`] - bulk loading
//! - [`docstore`] - the store facade
//! - [`docstore_builder`] / [`docstore_config`] - configuration

pub mod bulk;
pub mod collection;
pub mod common;
pub mod docstore;
pub mod docstore_builder;
pub mod docstore_config;
pub mod errors;
pub mod filter;
pub mod index;
pub mod query;
pub mod session;
pub mod store;

pub use crate::docstore::DocStore;
pub use crate::docstore_builder::DocStoreBuilder;

#[cfg(test)]
mod tests {
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}
