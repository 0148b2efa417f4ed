#[cfg(test)]
mod protection_profile_test;

use crate::error::{Error, Result};
use crate::policy::{
    CryptoPolicy, AEAD_AUTH_TAG_LEN, AEAD_SALT_LEN, AES_128_KEY_LEN, AES_256_KEY_LEN,
    AES_CM_SALT_LEN,
};

/// ProtectionProfile specifies Cipher and AuthTag details, similar to TLS cipher suite.
/// Values are the DTLS-SRTP identifiers from RFC 5764 and RFC 7714.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ProtectionProfile {
    #[default]
    Aes128CmHmacSha1_80 = 0x0001,
    Aes128CmHmacSha1_32 = 0x0002,
    NullHmacSha1_80 = 0x0005,
    NullHmacSha1_32 = 0x0006,
    AeadAes128Gcm = 0x0007,
    AeadAes256Gcm = 0x0008,
}

impl ProtectionProfile {
    pub fn key_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_80
            | ProtectionProfile::Aes128CmHmacSha1_32
            | ProtectionProfile::NullHmacSha1_80
            | ProtectionProfile::NullHmacSha1_32
            | ProtectionProfile::AeadAes128Gcm => AES_128_KEY_LEN,
            ProtectionProfile::AeadAes256Gcm => AES_256_KEY_LEN,
        }
    }

    pub fn salt_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_80
            | ProtectionProfile::Aes128CmHmacSha1_32
            | ProtectionProfile::NullHmacSha1_80
            | ProtectionProfile::NullHmacSha1_32 => AES_CM_SALT_LEN,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => AEAD_SALT_LEN,
        }
    }

    pub fn rtp_auth_tag_len(&self) -> usize {
        self.rtp_policy().auth_tag_len
    }

    /// The 32-bit variants still use an 80-bit tag for RTCP.
    pub fn rtcp_auth_tag_len(&self) -> usize {
        self.rtcp_policy().auth_tag_len
    }

    pub fn aead_auth_tag_len(&self) -> usize {
        match *self {
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => {
                AEAD_AUTH_TAG_LEN
            }
            _ => 0,
        }
    }

    pub fn rtp_policy(&self) -> CryptoPolicy {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_80 => CryptoPolicy::aes_cm_128_hmac_sha1_80(),
            ProtectionProfile::Aes128CmHmacSha1_32 => CryptoPolicy::aes_cm_128_hmac_sha1_32(),
            ProtectionProfile::NullHmacSha1_80 => CryptoPolicy::null_cipher_hmac_sha1_80(),
            ProtectionProfile::NullHmacSha1_32 => CryptoPolicy::null_cipher_hmac_sha1_32(),
            ProtectionProfile::AeadAes128Gcm => CryptoPolicy::aes_gcm_128_16_auth(),
            ProtectionProfile::AeadAes256Gcm => CryptoPolicy::aes_gcm_256_16_auth(),
        }
    }

    pub fn rtcp_policy(&self) -> CryptoPolicy {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_32 => CryptoPolicy::aes_cm_128_hmac_sha1_80(),
            ProtectionProfile::NullHmacSha1_32 => CryptoPolicy::null_cipher_hmac_sha1_80(),
            profile => profile.rtp_policy(),
        }
    }
}

impl TryFrom<u16> for ProtectionProfile {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0x0001 => Ok(ProtectionProfile::Aes128CmHmacSha1_80),
            0x0002 => Ok(ProtectionProfile::Aes128CmHmacSha1_32),
            0x0005 => Ok(ProtectionProfile::NullHmacSha1_80),
            0x0006 => Ok(ProtectionProfile::NullHmacSha1_32),
            0x0007 => Ok(ProtectionProfile::AeadAes128Gcm),
            0x0008 => Ok(ProtectionProfile::AeadAes256Gcm),
            _ => Err(Error::NoSuchSrtpProfile(value)),
        }
    }
}
