//! HTTP coordinator: URL submission and read-side aggregation over the shared store.

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
