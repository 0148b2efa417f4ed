use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};

use super::{Cipher, PacketIndex};
use crate::error::{Error, Result};
use crate::key_derivation::*;
use crate::policy::{AES_128_KEY_LEN, AES_256_KEY_LEN, AES_CM_SALT_LEN};

/// Keystream positioned at the start of one packet.
pub(crate) enum AesCmKeystream {
    Aes128(Aes128Ctr),
    Aes256(Aes256Ctr),
}

impl AesCmKeystream {
    pub(crate) fn apply(&mut self, buf: &mut [u8]) {
        match self {
            AesCmKeystream::Aes128(stream) => stream.apply_keystream(buf),
            AesCmKeystream::Aes256(stream) => stream.apply_keystream(buf),
        }
    }

    /// Returns the next `len` keystream bytes.
    pub(crate) fn output(&mut self, len: usize) -> Vec<u8> {
        let mut keystream = vec![0u8; len];
        self.apply(&mut keystream);
        keystream
    }
}

/// AES in counter mode (RFC 3711 4.1.1, RFC 6188), used for payloads and for
/// RFC 6904 header extension encryption.
pub(crate) struct CipherAesCm {
    session_key: Vec<u8>,
    session_salt: [u8; AES_CM_SALT_LEN],
}

impl CipherAesCm {
    /// `session_salt` may be shorter than 14 bytes; it is zero padded.
    pub(crate) fn new(session_key: &[u8], session_salt: &[u8]) -> Result<Self> {
        if session_key.len() != AES_128_KEY_LEN && session_key.len() != AES_256_KEY_LEN {
            return Err(Error::SrtpMasterKeyLength(
                AES_128_KEY_LEN,
                session_key.len(),
            ));
        }
        if session_salt.len() > AES_CM_SALT_LEN {
            return Err(Error::BadParam);
        }

        let mut salt = [0u8; AES_CM_SALT_LEN];
        salt[..session_salt.len()].copy_from_slice(session_salt);

        Ok(CipherAesCm {
            session_key: session_key.to_vec(),
            session_salt: salt,
        })
    }

    pub(crate) fn keystream(&self, index: &PacketIndex) -> AesCmKeystream {
        let counter = match *index {
            PacketIndex::Rtp {
                ssrc,
                roc,
                sequence_number,
            } => generate_counter(sequence_number, roc, ssrc, &self.session_salt),
            PacketIndex::Rtcp { ssrc, srtcp_index } => generate_counter(
                (srtcp_index & 0xFFFF) as u16,
                srtcp_index >> 16,
                ssrc,
                &self.session_salt,
            ),
        };

        let nonce = GenericArray::from_slice(&counter);
        if self.session_key.len() == AES_256_KEY_LEN {
            let key = GenericArray::from_slice(&self.session_key);
            AesCmKeystream::Aes256(Aes256Ctr::new(key, nonce))
        } else {
            let key = GenericArray::from_slice(&self.session_key);
            AesCmKeystream::Aes128(Aes128Ctr::new(key, nonce))
        }
    }
}

impl Cipher for CipherAesCm {
    fn aead_auth_tag_len(&self) -> usize {
        0
    }

    fn encrypt(
        &self,
        index: &PacketIndex,
        _aad: &[u8],
        payload: &mut [u8],
        _tag: &mut [u8],
    ) -> Result<()> {
        self.keystream(index).apply(payload);
        Ok(())
    }

    fn decrypt(
        &self,
        index: &PacketIndex,
        _aad: &[u8],
        payload: &mut [u8],
        _tag: &[u8],
    ) -> Result<()> {
        self.keystream(index).apply(payload);
        Ok(())
    }
}
