#[cfg(test)]
mod srtp_test;

pub(crate) mod key_limit;
pub mod srtcp;
pub mod srtp;

use std::sync::Arc;

use aes::{Aes128, Aes256};

use crate::auth::Auth;
use crate::cipher::cipher_aead_aes_gcm::CipherAeadAesGcm;
use crate::cipher::cipher_aes_cm::CipherAesCm;
use crate::cipher::cipher_null::CipherNull;
use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::key_derivation::*;
use crate::policy::{CipherKind, CryptoPolicy, MasterKey, Policy, SecurityServices, Ssrc};
use crate::replay_detector::{ReplayCheck, ReplayDetector};
use key_limit::{KeyLimit, KeyLimitEvent};

const SEQ_NUM_MEDIAN: u64 = 1 << 15;
const SEQ_NUM_MAX: u64 = 1 << 16;
const MAX_ROC: u64 = 0xFFFF_FFFF;

pub(crate) const SRTCP_INDEX_LEN: usize = 4;
pub(crate) const MAX_SRTCP_INDEX: u32 = 0x7FFF_FFFF;
const SRTCP_REPLAY_WINDOW_SIZE: usize = 128;

/// Which way a stream has been used so far.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Unknown,
    Outbound,
    Inbound,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A stream was used for both protect and unprotect.
    SsrcCollision,
    /// The master key is close to its usage limit.
    KeySoftLimit,
    /// The master key reached its usage limit, packets are rejected.
    KeyHardLimit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SrtpEvent {
    pub ssrc: u32,
    pub kind: EventKind,
}

/// Session keys derived from one master key.
pub(crate) struct DerivedKeys {
    pub(crate) mki_id: Vec<u8>,
    pub(crate) rtp_cipher: Box<dyn Cipher>,
    pub(crate) rtp_xtn_hdr_cipher: Option<CipherAesCm>,
    pub(crate) rtp_auth: Auth,
    pub(crate) rtcp_cipher: Box<dyn Cipher>,
    pub(crate) rtcp_auth: Auth,
    /// Shared by every stream spawned with these keys.
    pub(crate) key_limit: KeyLimit,
}

impl DerivedKeys {
    pub(crate) fn new(master_key: &MasterKey, policy: &Policy) -> Result<Self> {
        let kdf = Kdf::new(&master_key.key)?;

        let rtp_cipher = new_cipher(
            &kdf,
            &policy.rtp,
            LABEL_SRTP_ENCRYPTION,
            LABEL_SRTP_SALT,
        )?;
        let rtcp_cipher = new_cipher(
            &kdf,
            &policy.rtcp,
            LABEL_SRTCP_ENCRYPTION,
            LABEL_SRTCP_SALT,
        )?;

        // RFC 6904 always uses AES-CM, also next to GCM.
        let rtp_xtn_hdr_cipher =
            if policy.enc_xtn_hdr.is_empty() || policy.rtp.cipher == CipherKind::Null {
                None
            } else {
                let key = kdf.derive(LABEL_SRTP_HEADER_ENCRYPTION, policy.rtp.cipher.base_key_len())?;
                let salt = kdf.derive(LABEL_SRTP_HEADER_SALT, policy.rtp.cipher.salt_len())?;
                Some(CipherAesCm::new(&key, &salt)?)
            };

        let rtp_auth = new_auth(&kdf, &policy.rtp, LABEL_SRTP_AUTHENTICATION_TAG)?;
        let rtcp_auth = new_auth(&kdf, &policy.rtcp, LABEL_SRTCP_AUTHENTICATION_TAG)?;

        // MKI ids are ignored unless the policy sends them.
        let mki_id = if policy.use_mki {
            master_key.mki_id.clone()
        } else {
            vec![]
        };

        Ok(DerivedKeys {
            mki_id,
            rtp_cipher,
            rtp_xtn_hdr_cipher,
            rtp_auth,
            rtcp_cipher,
            rtcp_auth,
            key_limit: KeyLimit::default(),
        })
    }

    /// Length of the RTP authentication tag, AEAD or HMAC.
    pub(crate) fn rtp_tag_len(&self) -> usize {
        self.rtp_cipher.aead_auth_tag_len() + self.rtp_auth.tag_len()
    }

    pub(crate) fn rtcp_tag_len(&self) -> usize {
        self.rtcp_cipher.aead_auth_tag_len() + self.rtcp_auth.tag_len()
    }
}

fn new_cipher(
    kdf: &Kdf,
    policy: &CryptoPolicy,
    key_label: u8,
    salt_label: u8,
) -> Result<Box<dyn Cipher>> {
    if policy.cipher == CipherKind::Null {
        return Ok(Box::new(CipherNull));
    }

    let key = kdf.derive(key_label, policy.cipher.base_key_len())?;
    let salt = kdf.derive(salt_label, policy.cipher.salt_len())?;

    let cipher: Box<dyn Cipher> = match policy.cipher {
        CipherKind::AesGcm128 => Box::new(CipherAeadAesGcm::<Aes128>::new(&key, &salt)?),
        CipherKind::AesGcm256 => Box::new(CipherAeadAesGcm::<Aes256>::new(&key, &salt)?),
        _ => Box::new(CipherAesCm::new(&key, &salt)?),
    };
    Ok(cipher)
}

fn new_auth(kdf: &Kdf, policy: &CryptoPolicy, label: u8) -> Result<Auth> {
    if policy.cipher.is_aead() {
        return Auth::new(policy.auth, &[], 0);
    }
    let key = kdf.derive(label, policy.auth_key_len)?;
    Auth::new(policy.auth, &key, policy.auth_tag_len)
}

/// Estimates the 48-bit packet index of `sequence_number` relative to the
/// highest index seen so far (RFC 3711 3.3.1). Until the highest index passes
/// 2^15 the sequence number itself is used.
pub(crate) fn estimate_index(latest: u64, sequence_number: u16) -> u64 {
    let seq = u64::from(sequence_number);
    if latest <= SEQ_NUM_MEDIAN {
        return seq;
    }

    let local_roc = latest >> 16;
    let local_seq = latest & (SEQ_NUM_MAX - 1);
    let roc = if local_seq < SEQ_NUM_MEDIAN {
        if seq > local_seq && seq - local_seq > SEQ_NUM_MEDIAN {
            local_roc - 1
        } else {
            local_roc
        }
    } else if local_seq - SEQ_NUM_MEDIAN > seq {
        (local_roc + 1) & MAX_ROC
    } else {
        local_roc
    };

    (roc << 16) | seq
}

/// Extended sequence number state of the RTP direction.
#[derive(Debug, Clone)]
pub(crate) struct SrtpState {
    pub(crate) replay_detector: ReplayDetector,
    /// ROC set out of band, applied to the next packet ahead of the window.
    pub(crate) pending_roc: Option<u32>,
}

impl SrtpState {
    fn new(window_size: usize) -> Self {
        SrtpState {
            replay_detector: ReplayDetector::new(window_size),
            pending_roc: None,
        }
    }

    /// The pending ROC once set ahead of the committed one, else the committed ROC.
    pub(crate) fn roc(&self) -> u32 {
        let committed = (self.replay_detector.latest() >> 16) as u32;
        match self.pending_roc {
            Some(roc) if roc > committed => roc,
            _ => committed,
        }
    }

    /// Returns the estimated index and whether it came from the pending ROC.
    pub(crate) fn estimate(&self, sequence_number: u16) -> (u64, bool) {
        if let Some(roc) = self.pending_roc {
            let index = (u64::from(roc) << 16) | u64::from(sequence_number);
            if index > self.replay_detector.latest() {
                return (index, true);
            }
        }
        (
            estimate_index(self.replay_detector.latest(), sequence_number),
            false,
        )
    }

    pub(crate) fn check(&self, index: u64, from_pending_roc: bool) -> ReplayCheck {
        if from_pending_roc {
            ReplayCheck::Ok
        } else {
            self.replay_detector.check(index)
        }
    }

    /// An index from the pending ROC is always ahead of the window, so
    /// accepting it keeps the history that is still in range.
    pub(crate) fn commit(&mut self, index: u64) {
        self.replay_detector.accept(index);
        self.pending_roc = None;

        log::trace!(
            "srtp committed index {} (roc {})",
            index,
            self.replay_detector.latest() >> 16
        );
    }
}

/// SRTCP index state.
#[derive(Debug, Clone)]
pub(crate) struct SrtcpState {
    /// Last index sent.
    pub(crate) srtcp_index: u32,
    pub(crate) replay_detector: ReplayDetector,
}

impl Default for SrtcpState {
    fn default() -> Self {
        SrtcpState {
            srtcp_index: 0,
            replay_detector: ReplayDetector::new(SRTCP_REPLAY_WINDOW_SIZE),
        }
    }
}

/// Context represents a SRTP cryptographic context for a single SSRC, or the
/// template streams for wildcard SSRCs are cloned from.
pub struct Context {
    ssrc: u32,
    direction: Direction,
    keys: Arc<Vec<DerivedKeys>>,

    rtp_services: SecurityServices,
    rtcp_services: SecurityServices,
    use_mki: bool,
    mki_size: usize,
    window_size: usize,
    allow_repeat_tx: bool,
    enc_xtn_hdr: Vec<u8>,
    use_cryptex: bool,

    srtp: SrtpState,
    srtcp: SrtcpState,
}

impl Context {
    /// Validates `policy` and derives the session keys of every master key.
    pub fn new(policy: &Policy) -> Result<Context> {
        policy.validate()?;

        let keys = policy
            .keys
            .iter()
            .map(|key| DerivedKeys::new(key, policy))
            .collect::<Result<Vec<_>>>()?;

        let (ssrc, direction) = match policy.ssrc {
            Ssrc::Specific(ssrc) => (ssrc, Direction::Unknown),
            Ssrc::AnyOutbound => (0, Direction::Outbound),
            Ssrc::AnyInbound => (0, Direction::Inbound),
        };
        let window_size = policy.replay_window_size();

        Ok(Context {
            ssrc,
            direction,
            keys: Arc::new(keys),
            rtp_services: policy.rtp.services,
            rtcp_services: policy.rtcp.services,
            use_mki: policy.use_mki,
            mki_size: policy.mki_size,
            window_size,
            allow_repeat_tx: policy.allow_repeat_tx,
            enc_xtn_hdr: policy.enc_xtn_hdr.clone(),
            use_cryptex: policy.use_cryptex,
            srtp: SrtpState::new(window_size),
            srtcp: SrtcpState::default(),
        })
    }

    /// Clones a template for `ssrc`. Keys are shared, sequence state starts fresh.
    pub(crate) fn spawn(&self, ssrc: u32) -> Context {
        log::trace!("srtp spawning stream {} from template", ssrc);

        Context {
            ssrc,
            direction: self.direction,
            keys: Arc::clone(&self.keys),
            rtp_services: self.rtp_services,
            rtcp_services: self.rtcp_services,
            use_mki: self.use_mki,
            mki_size: self.mki_size,
            window_size: self.window_size,
            allow_repeat_tx: self.allow_repeat_tx,
            enc_xtn_hdr: self.enc_xtn_hdr.clone(),
            use_cryptex: self.use_cryptex,
            srtp: SrtpState::new(self.window_size),
            srtcp: SrtcpState::default(),
        }
    }

    /// Builds the replacement of this stream for an updated policy. Keys are
    /// derived anew while ROC, replay windows, SRTCP index and direction
    /// carry over.
    pub(crate) fn rekey(&self, policy: &Policy) -> Result<Context> {
        if policy.use_mki != self.use_mki || policy.mki_size != self.mki_size {
            return Err(Error::PolicyMismatch);
        }

        let mut context = Context::new(policy)?;
        context.ssrc = self.ssrc;
        context.direction = self.direction;
        context.srtp = self.srtp.clone();
        context.srtcp = self.srtcp.clone();
        Ok(context)
    }

    /// Like [`Context::rekey`], with keys shared with an already rekeyed template.
    pub(crate) fn rekey_from_template(&self, template: &Context) -> Context {
        let mut context = template.spawn(self.ssrc);
        context.direction = self.direction;
        context.srtp = self.srtp.clone();
        context.srtcp = self.srtcp.clone();
        context
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn use_mki(&self) -> bool {
        self.use_mki
    }

    pub fn mki_size(&self) -> usize {
        self.mki_size
    }

    pub(crate) fn shares_keys_with(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys)
    }

    /// Records the first use of the stream; a use in the opposite direction
    /// is reported as an SSRC collision.
    pub(crate) fn observe_direction(&mut self, direction: Direction, events: &mut Vec<SrtpEvent>) {
        if self.direction == direction {
            return;
        }
        if self.direction == Direction::Unknown {
            self.direction = direction;
            return;
        }

        log::warn!(
            "srtp ssrc collision on stream {}: {:?} stream used {:?}",
            self.ssrc,
            self.direction,
            direction
        );
        events.push(SrtpEvent {
            ssrc: self.ssrc,
            kind: EventKind::SsrcCollision,
        });
    }

    /// roc returns SRTP rollover counter value of the stream.
    pub fn roc(&self) -> u32 {
        self.srtp.roc()
    }

    /// set_roc sets the ROC used for the next packet ahead of the current index.
    pub fn set_roc(&mut self, roc: u32) {
        self.srtp.pending_roc = Some(roc);
    }

    /// index returns the last sent SRTCP index.
    pub fn srtcp_index(&self) -> u32 {
        self.srtcp.srtcp_index
    }

    /// Keys used to protect with `mki_index`; without MKI the first key is used.
    pub(crate) fn protect_keys(&self, mki_index: usize) -> Result<usize> {
        if !self.use_mki {
            return Ok(0);
        }
        if mki_index >= self.keys.len() {
            return Err(Error::BadParam);
        }
        Ok(mki_index)
    }

    /// Finds the master key whose MKI matches `mki`. Unknown MKIs are reported
    /// like a failed tag check.
    pub(crate) fn unprotect_keys(&self, mki: &[u8]) -> Result<usize> {
        if !self.use_mki {
            return Ok(0);
        }
        self.keys
            .iter()
            .position(|keys| keys.mki_id == mki)
            .ok_or(Error::AuthFail)
    }

    /// Trailer added by protect_rtp with the given key, None if the key does not exist.
    pub(crate) fn rtp_trailer_len(&self, mki_index: usize) -> Option<usize> {
        let index = self.protect_keys(mki_index).ok()?;
        Some(self.keys[index].rtp_tag_len() + self.mki_size)
    }

    pub(crate) fn rtcp_trailer_len(&self, mki_index: usize) -> Option<usize> {
        let index = self.protect_keys(mki_index).ok()?;
        Some(self.keys[index].rtcp_tag_len() + SRTCP_INDEX_LEN + self.mki_size)
    }

    /// Every master key of a stream shares the same transforms, so the
    /// trailer length of an inbound packet does not depend on its MKI.
    pub(crate) fn rtp_unprotect_trailer_len(&self) -> usize {
        self.keys[0].rtp_tag_len() + self.mki_size
    }

    pub(crate) fn rtcp_unprotect_trailer_len(&self) -> usize {
        self.keys[0].rtcp_tag_len() + SRTCP_INDEX_LEN + self.mki_size
    }

    fn check_key_limit(&self, key_index: usize, events: &mut Vec<SrtpEvent>) -> Result<()> {
        if self.keys[key_index].key_limit.check() == KeyLimitEvent::HardLimit {
            log::warn!("srtp key usage hard limit reached on stream {}", self.ssrc);
            events.push(SrtpEvent {
                ssrc: self.ssrc,
                kind: EventKind::KeyHardLimit,
            });
            return Err(Error::KeyExpired);
        }
        Ok(())
    }

    fn update_key_limit(&self, key_index: usize, events: &mut Vec<SrtpEvent>) {
        if self.keys[key_index].key_limit.update() == KeyLimitEvent::SoftLimit {
            log::warn!("srtp key usage soft limit reached on stream {}", self.ssrc);
            events.push(SrtpEvent {
                ssrc: self.ssrc,
                kind: EventKind::KeySoftLimit,
            });
        }
    }
}
