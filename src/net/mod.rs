//! TLS consumers of the provisioned chain.
//!
//! [`config`] turns the server certificate and key into rustls
//! configurations; [`handshake`] proves the chain works end to end.

pub mod config;
pub mod handshake;
