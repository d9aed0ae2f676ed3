//! # pagecache
//!
//! Bounded recency cache for page contents.
//!
//! ## Architecture
//! - **Entry store**: AHash map from key to arena slot (O(1) lookup)
//! - **Order index**: doubly linked recency list over an index arena
//!   (O(1) promote, insert and least-recently-used eviction)
//!
//! The cache is single-threaded and in-memory. Mutating operations take
//! `&mut self`; callers sharing a cache across threads wrap the whole
//! structure in one lock.

#![warn(missing_docs)]

mod cache;
mod error;
mod order;
mod stats;

pub use cache::{Iter, Keys, RecencyCache};
pub use error::{Error, Result};
pub use stats::CacheStats;
