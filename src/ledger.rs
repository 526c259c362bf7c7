// Thin re-export module: the pool is the ledger's only state, the handler the
// only thing that mutates it.

pub mod handler;
pub mod pool;

pub use handler::*;
pub use pool::*;
