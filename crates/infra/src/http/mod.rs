//! HTTP client shared by outbound integrations.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
