use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verify the `X-Helius-Signature` header: hex-encoded HMAC-SHA256 over the
/// raw request body. Returns `false` for a missing secret, missing header,
/// length mismatch, or any bit-flipped digest; comparison is constant-time
/// over the hex strings so a timing side-channel can't leak how many
/// leading bytes matched.
pub fn verify_helius_signature(secret: Option<&str>, header: Option<&str>, body: &[u8]) -> bool {
    let (Some(secret), Some(header)) = (secret, header) else {
        return false;
    };
    if secret.is_empty() || header.is_empty() {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    if expected.len() != header.len() {
        return false;
    }
    expected.as_bytes().ct_eq(header.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"events":[]}"#;
        let sig = sign("s3cr3t", body);
        assert!(verify_helius_signature(Some("s3cr3t"), Some(&sig), body));
    }

    #[test]
    fn missing_secret_fails() {
        let body = b"payload";
        let sig = sign("s3cr3t", body);
        assert!(!verify_helius_signature(None, Some(&sig), body));
    }

    #[test]
    fn missing_header_fails() {
        assert!(!verify_helius_signature(Some("s3cr3t"), None, b"payload"));
    }

    #[test]
    fn length_mismatch_fails() {
        assert!(!verify_helius_signature(Some("s3cr3t"), Some("abcd"), b"payload"));
    }

    #[test]
    fn bit_flipped_digest_fails() {
        let body = b"payload";
        let mut sig = sign("s3cr3t", body);
        sig.replace_range(0..1, if &sig[0..1] == "a" { "b" } else { "a" });
        assert!(!verify_helius_signature(Some("s3cr3t"), Some(&sig), body));
    }
}
