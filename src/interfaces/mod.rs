//! Outer surfaces exposing the routing core.

pub mod http;
