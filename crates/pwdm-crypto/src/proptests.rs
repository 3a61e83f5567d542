use proptest::prelude::*;

use crate::encoding::{from_base64, UNCOMPRESSED_POINT_TAG};
use crate::envelope::{self, envelope_len, split_envelope, EnvelopeRecipient, HEADER_LEN};
use crate::guardian::KeyPairGuardian;
use crate::test_support::{pair_a, pair_b};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn envelope_length_follows_padding(plaintext in ".{0,200}") {
        let recipient = EnvelopeRecipient::generate();
        let sealed = envelope::encrypt(&plaintext, &recipient.public_key()).unwrap();
        let bytes = from_base64(&sealed).unwrap();

        prop_assert_eq!(bytes.len(), envelope_len(plaintext.len()));
        prop_assert_eq!(bytes[0], UNCOMPRESSED_POINT_TAG);
        prop_assert!(bytes.len() > HEADER_LEN);
    }

    #[test]
    fn envelope_opens_for_recipient(plaintext in any::<String>()) {
        let recipient = EnvelopeRecipient::generate();
        let sealed = envelope::encrypt(&plaintext, &recipient.public_key()).unwrap();
        prop_assert_eq!(recipient.decrypt(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn envelopes_never_repeat(plaintext in "[a-zA-Z0-9]{0,32}") {
        let recipient = EnvelopeRecipient::generate().public_key();
        let first = envelope::encrypt(&plaintext, &recipient).unwrap();
        let second = envelope::encrypt(&plaintext, &recipient).unwrap();
        prop_assert_ne!(&first, &second);

        let a = split_envelope(&first).unwrap();
        let b = split_envelope(&second).unwrap();
        prop_assert_ne!(a.ephemeral_point, b.ephemeral_point);
        prop_assert_ne!(a.iv, b.iv);
    }

    #[test]
    fn split_never_panics_on_garbage(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let encoded = crate::encoding::to_base64(&bytes);
        let _ = split_envelope(&encoded);
    }
}

#[derive(Debug, Clone)]
enum GuardianOp {
    PublicA,
    PublicB,
    PrivateA,
    PrivateB,
    PrivateGarbage(String),
    Clear,
    Reverify,
}

fn guardian_op() -> impl Strategy<Value = GuardianOp> {
    prop_oneof![
        Just(GuardianOp::PublicA),
        Just(GuardianOp::PublicB),
        Just(GuardianOp::PrivateA),
        Just(GuardianOp::PrivateB),
        ".{0,40}".prop_map(GuardianOp::PrivateGarbage),
        Just(GuardianOp::Clear),
        Just(GuardianOp::Reverify),
    ]
}

fn public_for_private(private_pem: &str) -> &'static str {
    if private_pem == pair_a().private_pem.trim() {
        &pair_a().public_pem
    } else {
        &pair_b().public_pem
    }
}

proptest! {
    // Every op signs with a 2048-bit key; keep the case count small.
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn guardian_never_holds_unproven_key(ops in proptest::collection::vec(guardian_op(), 1..12)) {
        let mut g = KeyPairGuardian::new();

        for op in ops {
            let result = match op {
                GuardianOp::PublicA => { g.set_public_key(pair_a().public_pem.clone()); None }
                GuardianOp::PublicB => { g.set_public_key(pair_b().public_pem.clone()); None }
                GuardianOp::PrivateA => Some(g.set_private_key(&pair_a().private_pem)),
                GuardianOp::PrivateB => Some(g.set_private_key(&pair_b().private_pem)),
                GuardianOp::PrivateGarbage(text) => Some(g.set_private_key(&text)),
                GuardianOp::Clear => { g.clear_private_key(); None }
                GuardianOp::Reverify => { g.reverify(); None }
            };

            // A failed set leaves nothing behind, whatever was held before.
            if let Some(Err(_)) = result {
                prop_assert!(g.private_key_pem().is_none());
            }
            if let Some(Ok(())) = result {
                prop_assert!(g.is_matched());
            }

            prop_assert_eq!(g.is_matched(), g.private_key_pem().is_some());
            if let Some(private) = g.private_key_pem() {
                prop_assert_eq!(g.public_key_pem(), public_for_private(private));
            }
        }
    }
}
