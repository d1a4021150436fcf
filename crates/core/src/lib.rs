pub mod catalog;
pub mod entry;
pub mod error;
pub mod export;
pub mod fields;
pub mod ids;
pub mod owned;

pub use catalog::{
    Card, CardSet, Catalog, CatalogIndex, OwnershipRecord, Parallel, Product, Tag, TagVocabulary,
};
pub use entry::{EntryAction, EntryTags, NewPendingEntry, PendingEntry};
pub use error::CoreError;
pub use export::{ExportChange, ExportDocument, EXPORT_FORMAT_VERSION};
pub use fields::{LockField, TagKind};
pub use ids::*;
pub use owned::{CardKey, OwnedAggregate, OwnedSummary, build_owned_aggregate};
