//! Remote sessions and the pool that caches them across transactions.

mod remote_session;
mod session_pool;

pub use remote_session::*;
pub use session_pool::*;
