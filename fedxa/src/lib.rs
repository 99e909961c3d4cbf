//! # fedxa - Federated Graph Resolution with XA Coordination
//!
//! fedxa lets a single transaction read and write graphs held by several
//! independently operated remote database servers, and commit or roll back
//! all of that work atomically.
//!
//! ## Key Features
//!
//! - **Resource coordinator**: presents every remote participant of a
//!   transaction as one XA resource to an outer transaction manager
//! - **Full verb set**: start, end, suspend and resume, prepare, one-phase and
//!   two-phase commit, rollback, forget and recover
//! - **Outcome reconciliation**: partial failures and heuristic outcomes of
//!   individual participants are folded into one XA result
//! - **Federation**: constraints and updates are routed to the server owning
//!   the graph, enlisting that server on first use
//! - **Session pooling**: remote sessions are reused across transactions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fedxa::rdf::{MemoryNodePool, NodePool};
//! use fedxa::resolver::FederationBuilder;
//! use fedxa::xa::{EndFlags, StartFlags, Xid, XaResourceProvider};
//!
//! let factory = FederationBuilder::new()
//!     .node_pool(NodePool::new(MemoryNodePool::new()))
//!     .session_factory_finder(finder)
//!     .build()?;
//! let resolver = factory.new_resolver(true)?;
//! let coordinator = resolver.coordinator();
//!
//! let xid = Xid::generate();
//! coordinator.start(&xid, StartFlags::NoFlags)?;
//! let rows = resolver.resolve(&constraint)?;
//! coordinator.end(&xid, EndFlags::Success)?;
//! coordinator.prepare(&xid)?;
//! coordinator.commit(&xid, false)?;
//! ```
//!
//! ## Modules
//!
//! - [`xa`]: XA codes, xids, the participant contract and the coordinator
//! - [`rdf`]: terms, constraints and the node pool
//! - [`session`]: remote sessions and the session pool
//! - [`resolver`]: configuration, resolver factory, resolver and delegate
//! - [`errors`]: error types and result aliases
//! - [`common`]: constants and shared utilities

pub mod common;
pub mod errors;
pub mod rdf;
pub mod resolver;
pub mod session;
pub mod xa;
