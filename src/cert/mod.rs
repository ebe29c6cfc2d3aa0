//! Certificate operations.
//!
//! The development chain has two levels: a self-signed CA ([`ca`]) and a
//! server certificate issued from a CSR ([`request`], [`signing`]).

pub mod builder;
pub mod ca;
pub mod inspect;
pub mod loader;
pub mod request;
pub mod serial;
pub mod signing;
pub mod verify;
