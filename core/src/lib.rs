//! API client core for the open market product service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and offers an async
//! `ProductService` that runs those round-trips through a `Transport`.
//!
//! # Design
//! - `MarketClient` is stateless; it holds only the base URL and a
//!   wire-compatibility flag.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Partial updates carry only the fields the caller set; see `payload`.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod payload;
pub mod service;
pub mod transport;
pub mod types;

pub use client::{decode_detail, decode_list, MarketClient};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use payload::{build_create_payload, build_partial_update_payload, Payload};
pub use service::ProductService;
pub use tokio_util::sync::CancellationToken;
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Currency, ImageRef, ImageUpload, PartialProductDraft, ProductDetail, ProductDraft,
    ProductResponse, ProductSummary, ServerError,
};
