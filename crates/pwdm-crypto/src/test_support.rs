//! Shared RSA fixtures. Key generation is slow, so each pair is made once per test binary.

use std::sync::OnceLock;

use ::rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use ::rsa::pkcs8::LineEnding;
use ::rsa::RsaPublicKey;

use crate::rsa::{generate_key_pair, parse_private_key, DEFAULT_KEY_BITS};

pub(crate) struct TestPair {
    pub private_pem: String,
    pub public_pem: String,
    pub private_pkcs1_pem: String,
    pub public_pkcs1_pem: String,
}

fn make_pair() -> TestPair {
    let generated = generate_key_pair(DEFAULT_KEY_BITS).expect("key generation");
    let private = parse_private_key(&generated.private_pem).expect("generated key parses");
    let private_pkcs1_pem = private
        .to_pkcs1_pem(LineEnding::LF)
        .expect("pkcs1 private encoding")
        .to_string();
    let public_pkcs1_pem = RsaPublicKey::from(&private)
        .to_pkcs1_pem(LineEnding::LF)
        .expect("pkcs1 public encoding");

    TestPair {
        private_pem: generated.private_pem.to_string(),
        public_pem: generated.public_pem,
        private_pkcs1_pem,
        public_pkcs1_pem,
    }
}

pub(crate) fn pair_a() -> &'static TestPair {
    static PAIR: OnceLock<TestPair> = OnceLock::new();
    PAIR.get_or_init(make_pair)
}

pub(crate) fn pair_b() -> &'static TestPair {
    static PAIR: OnceLock<TestPair> = OnceLock::new();
    PAIR.get_or_init(make_pair)
}
