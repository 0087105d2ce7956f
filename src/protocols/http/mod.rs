//! HTTP/1.1 echo protocol.
//!
//! Every request, whatever its method or target, is answered with
//! `200 OK` and a body identical to the request body:
//!
//! ```text
//! Request:  POST /anything HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world
//! Response: HTTP/1.1 200 OK\r\ncontent-length: 11\r\ndate: ...\r\n\r\nhello world
//! ```
//!
//! Request framing is handled by hyper's HTTP/1 connection driver:
//! `Content-Length`, `Transfer-Encoding: chunked`, or no body at all.
//! The response is built only after the whole request body is received.
//! Malformed requests get `400 Bad Request` and the connection is closed.

pub mod handler;

pub use handler::handle_connection;
