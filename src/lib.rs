//! Content aggregation core for a blog/portfolio site whose posts live in a
//! remote, cursor-paged document store.
//!
//! The crate reconstructs a locally consistent collection of published posts
//! from the upstream API ([`application::posts::PostService`]), deduplicates
//! upstream calls within one render pass
//! ([`application::scope::RequestScope`]), and builds an in-memory full-text
//! index with tag faceting over the aggregated collection
//! ([`application::search::SearchService`]).
//!
//! Rendering, routing, and syndication are external collaborators: they call
//! the read APIs exposed here and format the results themselves.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
