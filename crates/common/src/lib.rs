//! Shared value types used across the god's ray workspace.

mod types;

pub use types::{Color, NodeId, Transform};
