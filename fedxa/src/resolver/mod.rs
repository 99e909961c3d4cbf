//! Federation of remote graphs behind a single transactional resolver.

mod config;
mod delegate;
mod factory;
mod federation_resolver;
mod graph;
mod resolution;

pub use config::*;
pub use delegate::*;
pub use factory::*;
pub use federation_resolver::*;
pub use resolution::*;
