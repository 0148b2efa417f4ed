use super::{Cipher, PacketIndex};
use crate::error::Result;

/// Identity transform used by policies without confidentiality.
pub(crate) struct CipherNull;

impl Cipher for CipherNull {
    fn aead_auth_tag_len(&self) -> usize {
        0
    }

    fn encrypt(&self, _: &PacketIndex, _: &[u8], _: &mut [u8], _: &mut [u8]) -> Result<()> {
        Ok(())
    }

    fn decrypt(&self, _: &PacketIndex, _: &[u8], _: &mut [u8], _: &[u8]) -> Result<()> {
        Ok(())
    }
}
