
use crate::error::{Error, Result};

/// Maximum number of master keys a single stream may carry.
pub const MAX_MASTER_KEYS: usize = 16;
/// Maximum MKI length in bytes.
pub const MAX_MKI_LEN: usize = 128;
/// Replay window size used when a policy leaves `window_size` at zero.
pub const DEFAULT_WINDOW_SIZE: usize = 128;

pub(crate) const AES_128_KEY_LEN: usize = 16;
pub(crate) const AES_256_KEY_LEN: usize = 32;
pub(crate) const AES_CM_SALT_LEN: usize = 14;
pub(crate) const AEAD_SALT_LEN: usize = 12;
pub(crate) const AEAD_AUTH_TAG_LEN: usize = 16;
pub(crate) const HMAC_SHA1_KEY_LEN: usize = 20;
pub(crate) const HMAC_SHA1_MAX_TAG_LEN: usize = 20;

/// Security services applied to one direction of traffic (RTP or RTCP).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SecurityServices {
    #[default]
    None,
    Conf,
    Auth,
    ConfAndAuth,
}

impl SecurityServices {
    pub fn confidentiality(&self) -> bool {
        matches!(self, SecurityServices::Conf | SecurityServices::ConfAndAuth)
    }

    pub fn authentication(&self) -> bool {
        matches!(self, SecurityServices::Auth | SecurityServices::ConfAndAuth)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CipherKind {
    Null,
    AesIcm128,
    AesIcm256,
    AesGcm128,
    AesGcm256,
}

impl CipherKind {
    pub fn is_aead(&self) -> bool {
        matches!(self, CipherKind::AesGcm128 | CipherKind::AesGcm256)
    }

    /// Length of the AES key, without salt.
    pub(crate) fn base_key_len(&self) -> usize {
        match self {
            CipherKind::Null => 0,
            CipherKind::AesIcm128 | CipherKind::AesGcm128 => AES_128_KEY_LEN,
            CipherKind::AesIcm256 | CipherKind::AesGcm256 => AES_256_KEY_LEN,
        }
    }

    pub(crate) fn salt_len(&self) -> usize {
        match self {
            CipherKind::Null => 0,
            CipherKind::AesIcm128 | CipherKind::AesIcm256 => AES_CM_SALT_LEN,
            CipherKind::AesGcm128 | CipherKind::AesGcm256 => AEAD_SALT_LEN,
        }
    }

    /// Amount of master key material (key followed by salt) consumed by this cipher.
    /// The null cipher still runs the AES-128 key derivation.
    pub(crate) fn master_key_len(&self) -> usize {
        match self {
            CipherKind::Null => AES_128_KEY_LEN + AES_CM_SALT_LEN,
            kind => kind.base_key_len() + kind.salt_len(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthKind {
    Null,
    HmacSha1,
}

/// CryptoPolicy describes the transform applied to either RTP or RTCP packets.
///
/// `cipher_key_len` includes the salt. For AEAD ciphers `auth` is [`AuthKind::Null`]
/// and `auth_tag_len` is the length of the AEAD tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CryptoPolicy {
    pub cipher: CipherKind,
    pub cipher_key_len: usize,
    pub auth: AuthKind,
    pub auth_key_len: usize,
    pub auth_tag_len: usize,
    pub services: SecurityServices,
}

impl Default for CryptoPolicy {
    fn default() -> Self {
        CryptoPolicy::rtp_default()
    }
}

impl CryptoPolicy {
    /// AES_CM_128_HMAC_SHA1_80
    pub const fn rtp_default() -> Self {
        CryptoPolicy {
            cipher: CipherKind::AesIcm128,
            cipher_key_len: 30,
            auth: AuthKind::HmacSha1,
            auth_key_len: 20,
            auth_tag_len: 10,
            services: SecurityServices::ConfAndAuth,
        }
    }

    pub const fn rtcp_default() -> Self {
        CryptoPolicy::rtp_default()
    }

    pub const fn aes_cm_128_hmac_sha1_80() -> Self {
        CryptoPolicy::rtp_default()
    }

    /// Not for RTCP, RFC 3711 requires an 80-bit tag there.
    pub const fn aes_cm_128_hmac_sha1_32() -> Self {
        CryptoPolicy {
            auth_tag_len: 4,
            ..CryptoPolicy::rtp_default()
        }
    }

    pub const fn aes_cm_128_null_auth() -> Self {
        CryptoPolicy {
            cipher: CipherKind::AesIcm128,
            cipher_key_len: 30,
            auth: AuthKind::Null,
            auth_key_len: 0,
            auth_tag_len: 0,
            services: SecurityServices::Conf,
        }
    }

    pub const fn null_cipher_hmac_sha1_80() -> Self {
        CryptoPolicy {
            cipher: CipherKind::Null,
            cipher_key_len: 30,
            auth: AuthKind::HmacSha1,
            auth_key_len: 20,
            auth_tag_len: 10,
            services: SecurityServices::Auth,
        }
    }

    pub const fn null_cipher_hmac_sha1_32() -> Self {
        CryptoPolicy {
            auth_tag_len: 4,
            ..CryptoPolicy::null_cipher_hmac_sha1_80()
        }
    }

    pub const fn null_cipher_null_auth() -> Self {
        CryptoPolicy {
            cipher: CipherKind::Null,
            cipher_key_len: 30,
            auth: AuthKind::Null,
            auth_key_len: 0,
            auth_tag_len: 0,
            services: SecurityServices::None,
        }
    }

    pub const fn aes_cm_256_hmac_sha1_80() -> Self {
        CryptoPolicy {
            cipher: CipherKind::AesIcm256,
            cipher_key_len: 46,
            ..CryptoPolicy::rtp_default()
        }
    }

    pub const fn aes_cm_256_hmac_sha1_32() -> Self {
        CryptoPolicy {
            auth_tag_len: 4,
            ..CryptoPolicy::aes_cm_256_hmac_sha1_80()
        }
    }

    pub const fn aes_cm_256_null_auth() -> Self {
        CryptoPolicy {
            cipher: CipherKind::AesIcm256,
            cipher_key_len: 46,
            ..CryptoPolicy::aes_cm_128_null_auth()
        }
    }

    pub const fn aes_gcm_128_16_auth() -> Self {
        CryptoPolicy {
            cipher: CipherKind::AesGcm128,
            cipher_key_len: 28,
            auth: AuthKind::Null,
            auth_key_len: 0,
            auth_tag_len: AEAD_AUTH_TAG_LEN,
            services: SecurityServices::ConfAndAuth,
        }
    }

    pub const fn aes_gcm_256_16_auth() -> Self {
        CryptoPolicy {
            cipher: CipherKind::AesGcm256,
            cipher_key_len: 44,
            ..CryptoPolicy::aes_gcm_128_16_auth()
        }
    }

    /// Authentication only, meant for SRTCP.
    pub const fn aes_gcm_128_16_only_auth() -> Self {
        CryptoPolicy {
            services: SecurityServices::Auth,
            ..CryptoPolicy::aes_gcm_128_16_auth()
        }
    }

    pub const fn aes_gcm_256_16_only_auth() -> Self {
        CryptoPolicy {
            services: SecurityServices::Auth,
            ..CryptoPolicy::aes_gcm_256_16_auth()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.cipher != CipherKind::Null && self.cipher_key_len != self.cipher.master_key_len() {
            return Err(Error::BadParam);
        }

        if self.cipher.is_aead() {
            if self.auth != AuthKind::Null
                || self.auth_tag_len != AEAD_AUTH_TAG_LEN
                || !self.services.authentication()
            {
                return Err(Error::BadParam);
            }
            return Ok(());
        }

        match self.auth {
            AuthKind::Null => {
                if self.auth_tag_len != 0 || self.auth_key_len != 0 || self.services.authentication()
                {
                    return Err(Error::BadParam);
                }
            }
            AuthKind::HmacSha1 => {
                if self.auth_tag_len == 0
                    || self.auth_tag_len > HMAC_SHA1_MAX_TAG_LEN
                    || self.auth_key_len == 0
                    || self.auth_key_len > HMAC_SHA1_KEY_LEN
                    || !self.services.authentication()
                {
                    return Err(Error::BadParam);
                }
            }
        }

        Ok(())
    }
}

/// Selects which SSRC(s) a policy applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Ssrc {
    /// A single, known SSRC.
    Specific(u32),
    /// Any SSRC seen in unprotect calls; installs a template.
    AnyInbound,
    /// Any SSRC seen in protect calls; installs a template.
    AnyOutbound,
}

/// MasterKey is key material (cipher key followed by salt) with its MKI.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MasterKey {
    pub key: Vec<u8>,
    pub mki_id: Vec<u8>,
}

impl MasterKey {
    pub fn new(key: &[u8]) -> Self {
        MasterKey {
            key: key.to_vec(),
            mki_id: vec![],
        }
    }

    pub fn with_mki(key: &[u8], mki_id: &[u8]) -> Self {
        MasterKey {
            key: key.to_vec(),
            mki_id: mki_id.to_vec(),
        }
    }
}

/// Policy configures one stream, or a template for wildcard SSRCs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub ssrc: Ssrc,
    pub rtp: CryptoPolicy,
    pub rtcp: CryptoPolicy,
    pub keys: Vec<MasterKey>,
    pub use_mki: bool,
    pub mki_size: usize,
    /// Replay window size in packets, 0 selects [`DEFAULT_WINDOW_SIZE`].
    pub window_size: usize,
    /// Allow the sender to protect the same index more than once.
    pub allow_repeat_tx: bool,
    /// Header extension ids encrypted per RFC 6904.
    pub enc_xtn_hdr: Vec<u8>,
    /// Encrypt CSRCs and header extensions per RFC 9335.
    pub use_cryptex: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            ssrc: Ssrc::Specific(0),
            rtp: CryptoPolicy::rtp_default(),
            rtcp: CryptoPolicy::rtcp_default(),
            keys: vec![],
            use_mki: false,
            mki_size: 0,
            window_size: 0,
            allow_repeat_tx: false,
            enc_xtn_hdr: vec![],
            use_cryptex: false,
        }
    }
}

impl Policy {
    /// Creates a policy with the default AES_CM_128_HMAC_SHA1_80 transforms and a
    /// single master key.
    pub fn new(ssrc: Ssrc, key: &[u8]) -> Self {
        Policy {
            ssrc,
            keys: vec![MasterKey::new(key)],
            ..Default::default()
        }
    }

    /// Master key material length required by the RTP and RTCP transforms.
    pub fn master_key_len(&self) -> usize {
        self.rtp
            .cipher
            .master_key_len()
            .max(self.rtcp.cipher.master_key_len())
    }

    pub(crate) fn replay_window_size(&self) -> usize {
        if self.window_size == 0 {
            DEFAULT_WINDOW_SIZE
        } else {
            self.window_size
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.rtp.validate()?;
        self.rtcp.validate()?;

        if self.keys.is_empty() || self.keys.len() > MAX_MASTER_KEYS {
            return Err(Error::BadParam);
        }

        if self.window_size != 0 && !(64..0x8000).contains(&self.window_size) {
            return Err(Error::BadParam);
        }

        if self.use_mki {
            if self.mki_size == 0 || self.mki_size > MAX_MKI_LEN {
                return Err(Error::BadParam);
            }
        } else if self.mki_size != 0 {
            return Err(Error::BadParam);
        }

        let key_len = self.master_key_len();
        for key in &self.keys {
            if key.key.len() != key_len {
                return Err(Error::SrtpMasterKeyLength(key_len, key.key.len()));
            }
            if self.use_mki && key.mki_id.len() != self.mki_size {
                return Err(Error::BadParam);
            }
        }

        Ok(())
    }
}
