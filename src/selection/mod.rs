//! Negative-sample selection: registry snapshot, per-type state, split rules
//! and the summary derived from them.
//!
//! Everything here is synchronous and free of I/O apart from
//! [`registry::JsonFileSource`], so the accounting rules can be exercised
//! directly in tests.

pub mod defaults;
pub mod registry;
pub mod split;
pub mod state;
pub mod summary;


pub use defaults::{DefaultResolver, PerLineDefaults};
pub use registry::{LineCountRegistry, LineCountSource, RegistryError};
pub use split::{SplitField, SplitGroup, SplitGroups, SplitPercentages};
pub use state::{LineRow, SelectionError, SelectionMode, SelectionState, TypeSelection};
pub use summary::{SplitCounts, Summary, TypeSummary, compute};
