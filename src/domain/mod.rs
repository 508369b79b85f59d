//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod classifier;
pub mod entities;
pub mod error;
pub mod navigation;

pub use arena::{DetachReason, Detached, Forest, Node, Role};
pub use classifier::{ForestOrder, TreeClassifier, UnresolvedPolicy};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use generational_arena::Index;
pub use navigation::{Mode, Navigator, Tap};
