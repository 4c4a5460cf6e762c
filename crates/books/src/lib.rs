//! Client for the upstream Books accounting API.
//!
//! Wraps the OAuth refresh-token dance and the upstream's response
//! conventions behind typed operations. The client owns its token cache;
//! construct one per configured upstream and share it behind an `Arc`.

mod assets;
mod client;
mod error;

pub use assets::{AssetPayloadError, FixedAssetInput, build_asset_payload};
pub use client::{BooksClient, CreateAssetError};
pub use error::UpstreamError;
