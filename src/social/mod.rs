//! Social collaborators: episodic memory and pairwise relationships

pub mod memory;
pub mod relationship;

pub use memory::{MemoryEvent, MemoryLog};
pub use relationship::{Relationship, RelationshipCategory, RelationshipTable};
