//! Record store: the game catalog, held in a Qdrant collection.
//!
//! Each game is one point. The payload carries the record fields (and `game_id`); the
//! optional named vector carries the `"<name> <developer>"` embedding written by
//! [`crate::indexer`].

pub mod client;
pub mod error;
pub mod mock;
pub mod model;


pub use client::{CatalogWriter, QdrantRecordStore, RecordStore};
pub use error::StoreError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockRecordStore, cosine_similarity};
pub use model::{CatalogPoint, GameRecord, RECORD_ID_FIELD, VectorQuery, name_matches};
