//! Review workflow for generated queries.
//!
//! - `kb`: knowledge-base documents the citations point into
//! - `item`: review items, classifications and partial updates
//! - `store`: the on-disk review file
//! - `filters`: filtering, stats and navigation
//! - `session`: the object tying them together

pub mod error;
pub mod filters;
pub mod item;
pub mod kb;
pub mod session;
pub mod store;

pub use error::ReviewError;
pub use filters::{
    filtered_indices, next_index, next_pending, prev_index, FilterOptions, ReviewFilters, ReviewStats,
    StatusFilter,
};
pub use item::{Classification, ItemPatch, ReviewItem, ReviewStatus};
pub use kb::{strip_front_matter, KnowledgeBase};
pub use session::{OpenOutcome, ReviewSession, SessionInfo};
pub use store::{ItemSource, LoadMode, LoadOutcome, ReviewFile, REVIEW_FILE_NAME};
