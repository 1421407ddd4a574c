//! Limits and constraints for schema processing
//!
//! Recursive schemas accept data of any depth, so the nesting of incoming
//! data and the size of declaration files are bounded here to prevent
//! resource exhaustion.

use crate::error::{Error, Result};
use serde_json::Value;

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting depth of data handed to a root serializer
    ///
    /// Validation and serialization recurse once per level, so the default
    /// stays within what a 2 MB thread stack handles in a debug build.
    pub max_depth: usize,

    /// Maximum size of a declaration document in bytes
    pub max_document_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_document_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 64,
            max_document_size: 1024 * 1024, // 1 MB
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    ///
    /// Deep data needs a thread with a correspondingly large stack.
    pub fn permissive() -> Self {
        Self {
            max_depth: 100_000,
            max_document_size: 1024 * 1024 * 1024, // 1 GB
        }
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check if a nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "data depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check the nesting depth of a JSON value
    pub fn check_value(&self, value: &Value) -> Result<()> {
        self.check_depth(depth_of(value))
    }

    /// Check if a declaration document is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        if size > self.max_document_size {
            Err(Error::LimitExceeded(format!(
                "document size {} bytes exceeds maximum {} bytes",
                size, self.max_document_size
            )))
        } else {
            Ok(())
        }
    }
}

/// Nesting depth of a JSON value; scalars have depth 0
pub fn depth_of(value: &Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(value, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        max = max.max(depth);
        match value {
            Value::Array(items) => stack.extend(items.iter().map(|v| (v, depth + 1))),
            Value::Object(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
            _ => {}
        }
    }
    max
}
