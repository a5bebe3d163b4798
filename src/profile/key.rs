use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "profile:";
// Truncated digest keeps the map key short; 16 base64 chars (~96 bits) is far
// beyond the collision risk that matters for a per-process cache.
const KEY_DIGEST_CHARS: usize = 16;

/// Derive the cache key for a credential.
///
/// The raw token never becomes a map key; only a truncated digest does, so
/// cached state holds no secret material verbatim. Deterministic: all requests
/// carrying the same token share one cache line.
#[must_use]
pub fn cache_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let encoded = Base64UrlUnpadded::encode_string(&digest);
    format!("{KEY_PREFIX}{}", &encoded[..KEY_DIGEST_CHARS])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        assert_eq!(cache_key("token-a"), cache_key("token-a"));
        assert_ne!(cache_key("token-a"), cache_key("token-b"));
    }

    #[test]
    fn test_cache_key_does_not_contain_the_token() {
        let key = cache_key("super-secret-bearer-token");
        assert!(!key.contains("super-secret"));
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + KEY_DIGEST_CHARS);
    }
}
