//! State module for tracking pagination progress
//!
//! # Components
//!
//! - `CollectionBudget`: how many comments/replies may still be admitted for one anchor
//! - `PaginationStep` / `StopReason`: the step outcome and terminal states of a traversal
//! - `ThreadKind`: whether comments or replies are being paginated

mod budget;
mod pagination_state;

// Re-export main types
pub use budget::CollectionBudget;
pub use pagination_state::{PaginationPhase, PaginationStep, StopReason, ThreadKind};
