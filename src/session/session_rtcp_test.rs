use super::session_test::*;
use super::*;
use crate::policy::{CryptoPolicy, MasterKey};

#[test]
fn test_validate_srtcp_aes_cm_hmac_sha1_80() -> Result<()> {
    let ciphertext = decode(
        "81c8000bcafebabe\
         7128035be487b9bdbef89041f977a5a8\
         80000001\
         993e08cd54d6c1230798",
    );
    check_rtcp_vector(
        &default_policy(Ssrc::Specific(SSRC)),
        &rtcp_packet(SSRC),
        &ciphertext,
        0,
    )
}

#[test]
fn test_validate_srtcp_with_mki() -> Result<()> {
    let ciphertext = decode(
        "81c8000bcafebabe\
         7128035be487b9bdbef89041f977a5a8\
         80000001\
         e1f97a0d\
         993e08cd54d6c1230798",
    );
    check_rtcp_vector(
        &mki_policy(Ssrc::Specific(SSRC)),
        &rtcp_packet(SSRC),
        &ciphertext,
        0,
    )
}

#[test]
fn test_validate_srtcp_null_cipher_hmac_sha1_80() -> Result<()> {
    let policy = Policy {
        rtp: CryptoPolicy::null_cipher_hmac_sha1_80(),
        rtcp: CryptoPolicy::null_cipher_hmac_sha1_80(),
        ..default_policy(Ssrc::Specific(SSRC))
    };
    let mut ciphertext = rtcp_packet(SSRC);
    ciphertext.extend_from_slice(&decode("00000001fe88c7fdfd37ebce615d"));

    check_rtcp_vector(&policy, &rtcp_packet(SSRC), &ciphertext, 0)
}

#[test]
fn test_validate_srtcp_aes_gcm() -> Result<()> {
    let ciphertext = decode(
        "81c8000bcafebabe\
         c98b8b5df0392a55852b6c21ac8e7025\
         c52c6fbea2b3b446ea31123ba88ce61e\
         80000001",
    );
    check_rtcp_vector(
        &gcm_policy(Ssrc::Specific(SSRC)),
        &rtcp_packet(SSRC),
        &ciphertext,
        0,
    )
}

#[test]
fn test_validate_srtcp_aes_gcm_with_mki() -> Result<()> {
    let policy = Policy {
        keys: vec![
            MasterKey::with_mki(&test_key_gcm(), &TEST_MKI),
            MasterKey::with_mki(&test_key_gcm(), &TEST_MKI_2),
        ],
        use_mki: true,
        mki_size: 4,
        ..gcm_policy(Ssrc::Specific(SSRC))
    };
    let ciphertext = decode(
        "81c8000bcafebabe\
         c98b8b5df0392a55852b6c21ac8e7025\
         c52c6fbea2b3b446ea31123ba88ce61e\
         80000001\
         e1f97a0d",
    );

    check_rtcp_vector(&policy, &rtcp_packet(SSRC), &ciphertext, 0)
}

#[test]
fn test_srtcp_index_increments() -> Result<()> {
    let mut sender = Session::new(vec![default_policy(Ssrc::AnyOutbound)])?;
    let mut receiver = Session::new(vec![default_policy(Ssrc::AnyInbound)])?;

    for expected_index in 1u32..=3 {
        let encrypted = protect_rtcp(&mut sender, &rtcp_packet(SSRC), 0)?;
        let word = &encrypted[24..28];
        assert_eq!(word, &(expected_index | 0x8000_0000).to_be_bytes()[..]);
        assert_eq!(unprotect_rtcp(&mut receiver, &encrypted)?, rtcp_packet(SSRC));
    }
    assert_eq!(
        sender.streams().get(SSRC).map(Context::srtcp_index),
        Some(3)
    );

    Ok(())
}

#[test]
fn test_srtcp_replay_and_tamper() -> Result<()> {
    for policy in [
        default_policy(Ssrc::Specific(SSRC)),
        gcm_policy(Ssrc::Specific(SSRC)),
    ] {
        let mut sender = Session::new(vec![policy.clone()])?;
        let mut receiver = Session::new(vec![policy])?;

        let encrypted = protect_rtcp(&mut sender, &rtcp_packet(SSRC), 0)?;

        let mut tampered = encrypted.clone();
        tampered[10] ^= 0x01;
        assert_eq!(unprotect_rtcp(&mut receiver, &tampered), Err(Error::AuthFail));

        unprotect_rtcp(&mut receiver, &encrypted)?;
        assert_eq!(
            unprotect_rtcp(&mut receiver, &encrypted),
            Err(Error::ReplayFail)
        );
    }

    Ok(())
}

#[test]
fn test_srtcp_short_packets() -> Result<()> {
    let mut session = Session::new(vec![default_policy(Ssrc::Specific(SSRC))])?;

    let mut buf = [0x81, 0xc8, 0x00, 0x0b, 0xca, 0xfe, 0xba];
    assert_eq!(
        session.protect_rtcp_in_place(&mut buf, 7, 0),
        Err(Error::BadParam),
        "shorter than a RTCP header"
    );

    let mut encrypted = protect_rtcp(&mut session, &rtcp_packet(SSRC), 0)?;
    let mut receiver = Session::new(vec![default_policy(Ssrc::Specific(SSRC))])?;
    encrypted.truncate(8 + 13);
    let len = encrypted.len();
    assert_eq!(
        receiver.unprotect_rtcp_in_place(&mut encrypted, len),
        Err(Error::BadParam),
        "shorter than header and trailer"
    );

    Ok(())
}
