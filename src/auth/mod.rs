
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::policy::AuthKind;

type HmacSha1 = Hmac<Sha1>;

/// Message authentication for the non-AEAD transforms.
pub(crate) enum Auth {
    Null,
    HmacSha1 { signer: HmacSha1, tag_len: usize },
}

impl Auth {
    pub(crate) fn new(kind: AuthKind, session_auth_key: &[u8], tag_len: usize) -> Result<Self> {
        match kind {
            AuthKind::Null => Ok(Auth::Null),
            AuthKind::HmacSha1 => {
                let signer = HmacSha1::new_from_slice(session_auth_key)
                    .map_err(|e| Error::Other(e.to_string()))?;
                Ok(Auth::HmacSha1 { signer, tag_len })
            }
        }
    }

    pub(crate) fn tag_len(&self) -> usize {
        match self {
            Auth::Null => 0,
            Auth::HmacSha1 { tag_len, .. } => *tag_len,
        }
    }

    /// https://tools.ietf.org/html/rfc3711#section-4.2
    /// The HMAC SHALL be applied to the session authentication key and M,
    /// i.e. HMAC(k_a, M), and the output truncated to the n_tag left-most bits.
    /// For SRTP, M is the authenticated portion followed by the roc; for SRTCP,
    /// M runs up to and including the ESRTCP word. Neither includes the MKI.
    pub(crate) fn generate_tag(&self, message: &[&[u8]], tag: &mut [u8]) {
        if let Auth::HmacSha1 { signer, tag_len } = self {
            let mut signer = signer.clone();
            for part in message {
                signer.update(part);
            }
            let full = signer.finalize().into_bytes();
            tag[..*tag_len].copy_from_slice(&full[..*tag_len]);
        }
    }

    /// We use a constant time comparison to prevent timing attacks.
    pub(crate) fn verify_tag(&self, message: &[&[u8]], actual_tag: &[u8]) -> bool {
        match self {
            Auth::Null => actual_tag.is_empty(),
            Auth::HmacSha1 { tag_len, .. } => {
                if actual_tag.len() != *tag_len {
                    return false;
                }
                let mut expected_tag = [0u8; 20];
                self.generate_tag(message, &mut expected_tag);
                actual_tag.ct_eq(&expected_tag[..*tag_len]).unwrap_u8() == 1
            }
        }
    }
}
