mod client;
mod error;
mod types;

pub use client::WikiClient;
pub use error::ApiError;
pub use types::{Article, Feed, Page};
