//! # Storage Traits
//!
//! This module defines the storage abstraction trait that allows different
//! durable key-value backends to be used interchangeably by the period
//! engine.

use anyhow::Result;
use async_trait::async_trait;

/// Trait defining the interface for durable key-value storage.
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the engine to work with different backends (JSON files on
/// desktop, a platform key-value store elsewhere) without modification.
///
/// Every call is a suspension point: other engine operations may be
/// interleaved while a read or write is in flight, so callers must not
/// assume a read-then-write sequence is atomic.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` if present. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
