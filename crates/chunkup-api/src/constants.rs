//! API path constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version segment
pub const API_VERSION: &str = "v0";

/// Versioned prefix every upload route is mounted under
pub const API_PREFIX: &str = "/api/v0";

/// Where the generated OpenAPI document is served
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Multipart framing allowance on top of the chunk payload limit
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_base_plus_version() {
        assert_eq!(API_PREFIX, format!("{}/{}", API_BASE, API_VERSION));
    }
}
