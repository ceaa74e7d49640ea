use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks.
/// The `require_api_key` middleware runs every `x-api-key` header a
/// client sends through this before letting a mutation proceed.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
