//! Value normalization shared by the loader and the inspector
//!
//! The spec and the live system spell some values differently
//! (`xsmall` vs `X-Small`, `TRUE` vs `true`). Both sides pass through here
//! so the diff engine can compare strings literally.

/// Normalize a scalar attribute value
pub fn normalize_value(key: &str, value: &str) -> String {
    let value = value.trim();
    if key == "warehouse_size" {
        return value.to_lowercase().replace(['-', '_', ' '], "");
    }
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        return value.to_lowercase();
    }
    value.to_string()
}
