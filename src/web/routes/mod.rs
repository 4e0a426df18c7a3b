//! Route definitions for the web server.

pub mod api;
