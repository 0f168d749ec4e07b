//! Bookshelf application library
//!
//! Feature modules plus the bootstrap that wires them to the connection pool
//! and the HTTP server.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::serve;
pub use modules::*;
