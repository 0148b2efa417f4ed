use super::*;

#[test]
fn test_profile_lengths() {
    let cases = [
        (ProtectionProfile::Aes128CmHmacSha1_80, 16, 14, 10, 10, 0),
        (ProtectionProfile::Aes128CmHmacSha1_32, 16, 14, 4, 10, 0),
        (ProtectionProfile::NullHmacSha1_80, 16, 14, 10, 10, 0),
        (ProtectionProfile::NullHmacSha1_32, 16, 14, 4, 10, 0),
        (ProtectionProfile::AeadAes128Gcm, 16, 12, 16, 16, 16),
        (ProtectionProfile::AeadAes256Gcm, 32, 12, 16, 16, 16),
    ];

    for (profile, key_len, salt_len, rtp_tag, rtcp_tag, aead_tag) in cases {
        assert_eq!(profile.key_len(), key_len, "{profile:?} key length");
        assert_eq!(profile.salt_len(), salt_len, "{profile:?} salt length");
        assert_eq!(profile.rtp_auth_tag_len(), rtp_tag, "{profile:?} rtp tag");
        assert_eq!(profile.rtcp_auth_tag_len(), rtcp_tag, "{profile:?} rtcp tag");
        assert_eq!(profile.aead_auth_tag_len(), aead_tag, "{profile:?} aead tag");

        assert_eq!(
            profile.key_len() + profile.salt_len(),
            profile.rtp_policy().cipher.master_key_len(),
            "{profile:?} master key material"
        );
        assert!(profile.rtp_policy().validate().is_ok());
        assert!(profile.rtcp_policy().validate().is_ok());
    }
}

#[test]
fn test_profile_from_u16() -> Result<()> {
    for profile in [
        ProtectionProfile::Aes128CmHmacSha1_80,
        ProtectionProfile::Aes128CmHmacSha1_32,
        ProtectionProfile::NullHmacSha1_80,
        ProtectionProfile::NullHmacSha1_32,
        ProtectionProfile::AeadAes128Gcm,
        ProtectionProfile::AeadAes256Gcm,
    ] {
        assert_eq!(ProtectionProfile::try_from(profile as u16)?, profile);
    }

    assert_eq!(
        ProtectionProfile::try_from(0x0003),
        Err(Error::NoSuchSrtpProfile(0x0003))
    );

    Ok(())
}
