//! Business logic over the persistent store, one module per aggregate.
//!
//! Functions take `&TodoDb` explicitly — the boundary layer owns the context
//! object (`state::AppState`) and passes the store in, rather than the core
//! reaching for ambient state.

pub mod settings;
pub mod statistics;
pub mod subtasks;
pub mod todos;
