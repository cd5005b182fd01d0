//! PAE Quest daemon library - exposes the router for testing.

pub mod routes;
pub mod server;
