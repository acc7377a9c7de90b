use subtle::ConstantTimeEq;

/// Header carrying the shared secret on hook calls from the platform.
pub const HOOK_SECRET_HEADER: &str = "x-hook-secret";

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a presented secret against the configured one. A missing header or
/// an empty configured secret never matches.
pub fn secret_matches(presented: Option<&str>, expected: &str) -> bool {
    match presented {
        Some(presented) if !expected.is_empty() => constant_time_compare(presented, expected),
        _ => false,
    }
}
