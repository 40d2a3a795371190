//! Companion backend: a stub HTTP server answering the client's demo call.

pub mod app;
