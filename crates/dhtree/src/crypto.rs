use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

pub const PUBLIC_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

/// Fixed-size ed25519 public key. Doubles as a node's address in the tree
/// and in the key space.
pub type PublicKey = [u8; PUBLIC_KEY_SIZE];

/// Fixed-size ed25519 signature.
pub type Sig = [u8; SIGNATURE_SIZE];

/// Cryptographic identity: holds signing key and derived public key.
pub(crate) struct Crypto {
    pub signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Crypto {
    pub fn new(signing_key: SigningKey) -> Self {
        let public_key: PublicKey = signing_key.verifying_key().to_bytes();
        Self {
            signing_key,
            public_key,
        }
    }

    /// Verify a signature from the given public key.
    pub fn verify(key: &PublicKey, message: &[u8], sig: &Sig) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(key) else {
            return false;
        };
        let signature = Signature::from_bytes(sig);
        verifying_key.verify(message, &signature).is_ok()
    }

    /// Sign a message with an arbitrary signing key.
    pub fn sign_with_key(key: &SigningKey, message: &[u8]) -> Sig {
        key.sign(message).to_bytes()
    }
}

/// Strict total order over keys: unsigned lexicographic byte comparison.
///
/// Root election prefers the *greater* key under this order.
pub fn key_less(a: &PublicKey, b: &PublicKey) -> bool {
    a < b
}

/// Cyclic betweenness on the key ring.
///
/// True iff walking the ring upwards from `first` reaches `second` strictly
/// before `third`. False whenever any two arguments are equal.
pub fn dht_ordered(first: &PublicKey, second: &PublicKey, third: &PublicKey) -> bool {
    let less12 = key_less(first, second);
    let less23 = key_less(second, third);
    let less31 = key_less(third, first);
    (less12 && less23) || (less23 && less31) || (less31 && less12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::OsRng;

    fn key(b: u8) -> PublicKey {
        [b; PUBLIC_KEY_SIZE]
    }

    #[test]
    fn sign_and_verify() {
        let crypto = Crypto::new(SigningKey::generate(&mut OsRng));
        let sig = Crypto::sign_with_key(&crypto.signing_key, b"hello tree");
        assert!(Crypto::verify(&crypto.public_key, b"hello tree", &sig));
    }

    #[test]
    fn verify_wrong_message_fails() {
        let crypto = Crypto::new(SigningKey::generate(&mut OsRng));
        let sig = Crypto::sign_with_key(&crypto.signing_key, b"correct");
        assert!(!Crypto::verify(&crypto.public_key, b"wrong", &sig));
    }

    #[test]
    fn verify_wrong_key_fails() {
        let crypto1 = Crypto::new(SigningKey::generate(&mut OsRng));
        let crypto2 = Crypto::new(SigningKey::generate(&mut OsRng));
        let sig = Crypto::sign_with_key(&crypto1.signing_key, b"test");
        assert!(!Crypto::verify(&crypto2.public_key, b"test", &sig));
    }

    #[test]
    fn key_less_is_lexicographic() {
        let mut a = key(0);
        let mut b = key(0);
        a[0] = 1;
        b[31] = 0xff;
        assert!(key_less(&b, &a));
        assert!(!key_less(&a, &b));
        assert!(!key_less(&a, &a));
    }

    #[test]
    fn dht_ordered_basic() {
        let (a, b, c) = (key(1), key(2), key(3));
        assert!(dht_ordered(&a, &b, &c));
        assert!(dht_ordered(&b, &c, &a));
        assert!(dht_ordered(&c, &a, &b));
        assert!(!dht_ordered(&a, &c, &b));
        assert!(!dht_ordered(&a, &a, &b));
        assert!(!dht_ordered(&a, &b, &b));
        assert!(!dht_ordered(&a, &b, &a));
    }

    proptest! {
        #[test]
        fn key_less_irreflexive_and_total(
            a in prop::array::uniform32(any::<u8>()),
            b in prop::array::uniform32(any::<u8>()),
        ) {
            prop_assert!(!key_less(&a, &a));
            if a != b {
                prop_assert!(key_less(&a, &b) ^ key_less(&b, &a));
            } else {
                prop_assert!(!key_less(&a, &b) && !key_less(&b, &a));
            }
        }

        #[test]
        fn key_less_transitive(
            a in prop::array::uniform32(0u8..3),
            b in prop::array::uniform32(0u8..3),
            c in prop::array::uniform32(0u8..3),
        ) {
            if key_less(&a, &b) && key_less(&b, &c) {
                prop_assert!(key_less(&a, &c));
            }
        }

        #[test]
        fn dht_ordered_orientation(
            a in prop::array::uniform32(any::<u8>()),
            b in prop::array::uniform32(any::<u8>()),
            c in prop::array::uniform32(any::<u8>()),
        ) {
            prop_assume!(a != b && b != c && a != c);
            // Rotations agree; reversing the orientation flips the answer.
            prop_assert_eq!(dht_ordered(&a, &b, &c), dht_ordered(&b, &c, &a));
            prop_assert_eq!(dht_ordered(&a, &b, &c), dht_ordered(&c, &a, &b));
            prop_assert!(dht_ordered(&a, &b, &c) ^ dht_ordered(&a, &c, &b));
        }

        #[test]
        fn dht_ordered_false_on_equal_pair(
            a in prop::array::uniform32(any::<u8>()),
            b in prop::array::uniform32(any::<u8>()),
        ) {
            prop_assert!(!dht_ordered(&a, &a, &b));
            prop_assert!(!dht_ordered(&a, &b, &a));
            prop_assert!(!dht_ordered(&b, &a, &a));
        }
    }
}
