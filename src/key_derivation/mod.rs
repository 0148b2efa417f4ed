
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};

use crate::error::{Error, Result};
use crate::policy::{AES_128_KEY_LEN, AES_256_KEY_LEN, AES_CM_SALT_LEN};

pub(crate) const LABEL_SRTP_ENCRYPTION: u8 = 0x00;
pub(crate) const LABEL_SRTP_AUTHENTICATION_TAG: u8 = 0x01;
pub(crate) const LABEL_SRTP_SALT: u8 = 0x02;
pub(crate) const LABEL_SRTCP_ENCRYPTION: u8 = 0x03;
pub(crate) const LABEL_SRTCP_AUTHENTICATION_TAG: u8 = 0x04;
pub(crate) const LABEL_SRTCP_SALT: u8 = 0x05;
pub(crate) const LABEL_SRTP_HEADER_ENCRYPTION: u8 = 0x06;
pub(crate) const LABEL_SRTP_HEADER_SALT: u8 = 0x07;

pub(crate) type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
pub(crate) type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Kdf is the AES-CM pseudo random function of RFC 3711 keyed with one master key.
///
/// Master key material up to 30 bytes runs AES-128, anything longer AES-256. Master
/// salts shorter than 14 bytes (AEAD profiles) are zero padded.
pub(crate) struct Kdf {
    master_key: Vec<u8>,
    master_salt: Vec<u8>,
}

impl Kdf {
    pub(crate) fn new(key_material: &[u8]) -> Result<Self> {
        let key_len = if key_material.len() > AES_128_KEY_LEN + AES_CM_SALT_LEN {
            AES_256_KEY_LEN
        } else {
            AES_128_KEY_LEN
        };
        if key_material.len() < key_len || key_material.len() > key_len + AES_CM_SALT_LEN {
            return Err(Error::SrtpMasterKeyLength(
                key_len + AES_CM_SALT_LEN,
                key_material.len(),
            ));
        }

        Ok(Kdf {
            master_key: key_material[..key_len].to_vec(),
            master_salt: key_material[key_len..].to_vec(),
        })
    }

    pub(crate) fn derive(&self, label: u8, out_len: usize) -> Result<Vec<u8>> {
        aes_cm_key_derivation(label, &self.master_key, &self.master_salt, 0, out_len)
    }
}

/// https://tools.ietf.org/html/rfc3711#section-4.3.3
/// x = (key_id XOR master_salt), where key_id = label || r with r = index DIV kdr.
/// The PRF output for x is the AES-CM keystream with IV = x * 2^16.
pub(crate) fn aes_cm_key_derivation(
    label: u8,
    master_key: &[u8],
    master_salt: &[u8],
    index_over_kdr: usize,
    out_len: usize,
) -> Result<Vec<u8>> {
    if index_over_kdr != 0 {
        // 24-bit "index DIV kdr" would be XORed into bytes 8..14 of the IV.
        return Err(Error::Other("index_over_kdr > 0 is not supported yet".to_owned()));
    }
    if master_salt.len() > AES_CM_SALT_LEN {
        return Err(Error::Other(format!(
            "SRTP salt must be at most len {AES_CM_SALT_LEN}, got {}",
            master_salt.len()
        )));
    }

    let mut iv = [0u8; 16];
    iv[..master_salt.len()].copy_from_slice(master_salt);
    iv[7] ^= label;

    let mut out = vec![0u8; out_len];
    let nonce = GenericArray::from_slice(&iv);
    match master_key.len() {
        AES_128_KEY_LEN => {
            let key = GenericArray::from_slice(master_key);
            Aes128Ctr::new(key, nonce).apply_keystream(&mut out);
        }
        AES_256_KEY_LEN => {
            let key = GenericArray::from_slice(master_key);
            Aes256Ctr::new(key, nonce).apply_keystream(&mut out);
        }
        n => return Err(Error::SrtpMasterKeyLength(AES_128_KEY_LEN, n)),
    }

    Ok(out)
}

/// Generate IV https://tools.ietf.org/html/rfc3711#section-4.1.1
/// where the 128-bit integer value IV SHALL be defined by the SSRC, the
/// SRTP packet index i, and the SRTP session salting key k_s, as below.
/// - ROC = a 32-bit unsigned rollover counter (roc), which records how many
///   times the 16-bit RTP sequence number has been reset to zero after
///   passing through 65,535
///
/// i = 2^16 * roc + SEQ
/// IV = (salt*2 ^ 16) | (ssrc*2 ^ 64) | (i*2 ^ 16)
pub(crate) fn generate_counter(
    sequence_number: u16,
    rollover_counter: u32,
    ssrc: u32,
    session_salt: &[u8],
) -> [u8; 16] {
    let mut counter = [0u8; 16];

    counter[4..8].copy_from_slice(&ssrc.to_be_bytes());
    counter[8..12].copy_from_slice(&rollover_counter.to_be_bytes());
    counter[12..14].copy_from_slice(&sequence_number.to_be_bytes());

    for (c, s) in counter.iter_mut().zip(session_salt) {
        *c ^= s;
    }

    counter
}
