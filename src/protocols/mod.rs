//! Protocol implementations.
//!
//! - `http`: the HTTP/1.1 echo service driven by the server's connection
//!   tasks.

pub mod http;
