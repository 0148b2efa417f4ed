
use crate::error::{Error, Result};
use crate::policy::{MasterKey, Policy, Ssrc};
use crate::protection_profile::ProtectionProfile;

pub const LABEL_EXTRACTOR_DTLS_SRTP: &str = "EXTRACTOR-dtls_srtp";

/// KeyingMaterialExporter allows package SRTP to extract keying material
pub trait KeyingMaterialExporter {
    fn export_keying_material(&self, label: &str, context: &[u8], length: usize)
        -> Result<Vec<u8>>;
}

/// SessionKeys bundles the keys required to setup an SRTP session
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub local_master_key: Vec<u8>,
    pub local_master_salt: Vec<u8>,
    pub remote_master_key: Vec<u8>,
    pub remote_master_salt: Vec<u8>,
}

impl SessionKeys {
    /// Splits RFC 5764 section 4.2 keying material, laid out as
    /// client_write_key | server_write_key | client_write_salt | server_write_salt.
    pub fn from_keying_material(
        keying_material: &[u8],
        profile: ProtectionProfile,
        is_client: bool,
    ) -> Result<Self> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();
        let expected = (key_len * 2) + (salt_len * 2);
        if keying_material.len() != expected {
            return Err(Error::SrtpMasterKeyLength(expected, keying_material.len()));
        }

        let mut offset = 0;
        let client_write_key = keying_material[offset..offset + key_len].to_vec();
        offset += key_len;

        let server_write_key = keying_material[offset..offset + key_len].to_vec();
        offset += key_len;

        let client_write_salt = keying_material[offset..offset + salt_len].to_vec();
        offset += salt_len;

        let server_write_salt = keying_material[offset..offset + salt_len].to_vec();

        Ok(if is_client {
            SessionKeys {
                local_master_key: client_write_key,
                local_master_salt: client_write_salt,
                remote_master_key: server_write_key,
                remote_master_salt: server_write_salt,
            }
        } else {
            SessionKeys {
                local_master_key: server_write_key,
                local_master_salt: server_write_salt,
                remote_master_key: client_write_key,
                remote_master_salt: client_write_salt,
            }
        })
    }
}

/// Config is used to configure a session.
/// You can provide either a KeyingMaterialExporter to export keys
/// or directly pass the keys themselves.
/// After a Config is passed to a session it must not be modified.
#[derive(Default, Debug, Clone)]
pub struct Config {
    pub keys: SessionKeys,
    pub profile: ProtectionProfile,
    /// Replay window for the remote policy, 0 selects the default.
    pub replay_window_size: usize,
}

impl Config {
    /// ExtractSessionKeysFromDTLS allows setting the Config SessionKeys by
    /// extracting them from DTLS. This behavior is defined in RFC5764:
    /// https://tools.ietf.org/html/rfc5764
    pub fn extract_session_keys_from_dtls(
        &mut self,
        exporter: &impl KeyingMaterialExporter,
        is_client: bool,
    ) -> Result<()> {
        let length = (self.profile.key_len() * 2) + (self.profile.salt_len() * 2);
        let keying_material =
            exporter.export_keying_material(LABEL_EXTRACTOR_DTLS_SRTP, &[], length)?;

        self.keys = SessionKeys::from_keying_material(&keying_material, self.profile, is_client)?;
        Ok(())
    }

    /// Policy protecting everything this side sends.
    pub fn local_policy(&self) -> Policy {
        self.policy(
            Ssrc::AnyOutbound,
            &self.keys.local_master_key,
            &self.keys.local_master_salt,
        )
    }

    /// Policy unprotecting everything the peer sends.
    pub fn remote_policy(&self) -> Policy {
        self.policy(
            Ssrc::AnyInbound,
            &self.keys.remote_master_key,
            &self.keys.remote_master_salt,
        )
    }

    fn policy(&self, ssrc: Ssrc, master_key: &[u8], master_salt: &[u8]) -> Policy {
        Policy {
            ssrc,
            rtp: self.profile.rtp_policy(),
            rtcp: self.profile.rtcp_policy(),
            keys: vec![MasterKey::new(&[master_key, master_salt].concat())],
            window_size: self.replay_window_size,
            ..Default::default()
        }
    }
}
