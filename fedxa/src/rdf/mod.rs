//! Term model shared by the federation layer.
//!
//! Local code refers to terms by [`NodeId`]; remote servers exchange global
//! [`Node`]s. The [`NodePool`] converts between the two.

mod constraint;
mod node;
mod node_pool;
mod statements;
mod triple;

pub use constraint::*;
pub use node::*;
pub use node_pool::*;
pub use statements::*;
pub use triple::*;
