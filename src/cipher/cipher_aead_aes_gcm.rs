use aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::{AesGcm, KeyInit};

use super::{Cipher, PacketIndex};
use crate::error::{Error, Result};
use crate::policy::{AEAD_AUTH_TAG_LEN, AEAD_SALT_LEN};

/// AEAD Cipher based on AES.
pub(crate) struct CipherAeadAesGcm<AES> {
    cipher: AesGcm<AES, U12>,
    session_salt: [u8; AEAD_SALT_LEN],
}

impl<AES> CipherAeadAesGcm<AES>
where
    AesGcm<AES, U12>: AeadInPlace + KeyInit,
{
    pub(crate) fn new(session_key: &[u8], session_salt: &[u8]) -> Result<Self> {
        let cipher = AesGcm::<AES, U12>::new_from_slice(session_key)
            .map_err(|e| Error::Other(e.to_string()))?;
        let session_salt = session_salt
            .try_into()
            .map_err(|_| Error::Other(format!("AEAD salt must be len {AEAD_SALT_LEN}")))?;

        Ok(CipherAeadAesGcm {
            cipher,
            session_salt,
        })
    }

    /// The 12-octet IV used by AES-GCM SRTP is formed by first concatenating
    /// 2 octets of zeroes, the 4-octet SSRC, the 4-octet rollover counter
    /// (ROC), and the 2-octet sequence number (SEQ).  The resulting 12-octet
    /// value is then XORed to the 12-octet salt to form the 12-octet IV.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-8.1
    ///
    /// SRTCP uses 2 octets of zeroes, the SSRC, 2 more octets of zeroes, a
    /// cleared bit and the 31-bit SRTCP index instead.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-9.1
    pub(crate) fn initialization_vector(&self, index: &PacketIndex) -> [u8; 12] {
        let mut iv = [0u8; 12];
        match *index {
            PacketIndex::Rtp {
                ssrc,
                roc,
                sequence_number,
            } => {
                iv[2..6].copy_from_slice(&ssrc.to_be_bytes());
                iv[6..10].copy_from_slice(&roc.to_be_bytes());
                iv[10..12].copy_from_slice(&sequence_number.to_be_bytes());
            }
            PacketIndex::Rtcp { ssrc, srtcp_index } => {
                iv[2..6].copy_from_slice(&ssrc.to_be_bytes());
                iv[8..12].copy_from_slice(&(srtcp_index & 0x7FFF_FFFF).to_be_bytes());
            }
        }

        for (v, s) in iv.iter_mut().zip(&self.session_salt) {
            *v ^= s;
        }

        iv
    }
}

impl<AES> Cipher for CipherAeadAesGcm<AES>
where
    AES: Send + Sync,
    AesGcm<AES, U12>: AeadInPlace + KeyInit,
{
    fn aead_auth_tag_len(&self) -> usize {
        AEAD_AUTH_TAG_LEN
    }

    fn encrypt(
        &self,
        index: &PacketIndex,
        aad: &[u8],
        payload: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()> {
        if tag.len() != AEAD_AUTH_TAG_LEN {
            return Err(Error::BufferSmall);
        }

        let nonce = self.initialization_vector(index);
        let computed = self
            .cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), aad, payload)
            .map_err(|_| Error::AlgoFail)?;
        tag.copy_from_slice(&computed);

        Ok(())
    }

    fn decrypt(
        &self,
        index: &PacketIndex,
        aad: &[u8],
        payload: &mut [u8],
        tag: &[u8],
    ) -> Result<()> {
        if tag.len() != AEAD_AUTH_TAG_LEN {
            return Err(Error::AuthFail);
        }

        let nonce = self.initialization_vector(index);
        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&nonce),
                aad,
                payload,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| Error::AuthFail)
    }
}
