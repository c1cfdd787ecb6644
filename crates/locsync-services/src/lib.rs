//! High-level orchestration layer over the lower-level crates.
//! Exposes the project state, the resolution engine and its collaborators
//! to the CLI.

pub mod health;
pub mod project;
pub mod recommend;
pub mod resolve;
pub mod search;
pub mod storage;

pub use locsync_consistency::{ConsistencyReport, InconsistencyGroup, Variation};
pub use locsync_core::{Asset, DocumentKind, LocSyncError, Result, Segment, SegmentStatus};

pub use health::{health_check, HealthFilter};
pub use project::Project;
pub use recommend::{HttpRecommender, Recommendation, Recommender};
pub use resolve::{ApplyOutcome, ResolutionEngine, SuggestionEvent};
pub use search::search;
pub use storage::{FileStorage, MemoryStorage, Storage, ASSETS_KEY};
