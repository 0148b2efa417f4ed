pub(crate) mod cipher_aead_aes_gcm;
pub(crate) mod cipher_aes_cm;
pub(crate) mod cipher_null;

#[cfg(test)]
mod cipher_test;

use crate::error::Result;

///NOTE: Auth tag and AEAD auth tag are placed at the different position in SRTCP
///
///In non-AEAD cipher, the authentication tag is placed *after* the ESRTCP word
///(Encrypted-flag and SRTCP index) and the optional MKI.
///
///> AES_128_CM_HMAC_SHA1_80
///> | RTCP Header | Encrypted payload |E| SRTCP Index | MKI | Auth tag |
///>                                                         |----------|
///>                                                          ^
///>                                                          authTagLen=10
///
///In AEAD cipher, the AEAD authentication tag is embedded in the ciphertext.
///It is *before* the ESRTCP word (Encrypted-flag and SRTCP index).
///
///> AEAD_AES_128_GCM
///> | RTCP Header | Encrypted payload | AEAD auth tag |E| SRTCP Index | MKI |
///>                                   |---------------|
///>                                    ^
///>                                    aeadAuthTagLen=16
///
///See https://tools.ietf.org/html/rfc7714 for the full specifications.

/// Identifies the packet a keystream or nonce is generated for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PacketIndex {
    Rtp {
        ssrc: u32,
        roc: u32,
        sequence_number: u16,
    },
    Rtcp {
        ssrc: u32,
        srtcp_index: u32,
    },
}

/// Cipher represents a implementation of one
/// of the SRTP Specific ciphers.
pub(crate) trait Cipher: Send + Sync {
    /// Get AEAD auth tag length of the cipher, zero for plain stream ciphers.
    fn aead_auth_tag_len(&self) -> usize;

    /// Encrypts `payload` in place. AEAD ciphers authenticate `aad` as well and
    /// write their tag to `tag`; other ciphers ignore both.
    fn encrypt(
        &self,
        index: &PacketIndex,
        aad: &[u8],
        payload: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()>;

    /// Decrypts `payload` in place. AEAD ciphers leave `payload` untouched when
    /// the tag does not verify.
    fn decrypt(&self, index: &PacketIndex, aad: &[u8], payload: &mut [u8], tag: &[u8])
        -> Result<()>;

    fn is_aead(&self) -> bool {
        self.aead_auth_tag_len() > 0
    }
}
