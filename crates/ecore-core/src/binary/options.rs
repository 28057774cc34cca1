use serde::{Deserialize, Serialize};

/// Nesting limit for object values. Each level costs a few stack frames on
/// both sides, so the default stays well inside a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Starting size of the output buffer; it doubles when full.
    pub initial_capacity: usize,
    /// Write the IDs that a resource's ID manager holds for its objects.
    pub write_object_ids: bool,
    /// Maximum nesting of object values.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 4096,
            write_object_ids: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Replace proxies with their targets while decoding when the resource
    /// set can find them.
    pub resolve_proxies: bool,
    /// Maximum nesting of object values.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            resolve_proxies: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
