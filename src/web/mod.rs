//! archviz HTTP API
//!
//! JSON endpoints for repository facts and call-graph queries.

pub mod server;
