//! Property-based tests for the signature verifier.
//!
//! These tests use proptest to verify invariants across a wide range of
//! inputs, helping to catch edge cases that unit tests might miss.

use proptest::prelude::*;

use checkout_api::signature::{compute_signature, payment_message, verify};

fn secret_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

fn message_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn round_trip_always_verifies(msg in message_strategy(), secret in secret_strategy()) {
        let sig = compute_signature(&msg, &secret);
        prop_assert!(verify(&msg, &secret, &sig));
    }

    #[test]
    fn flipping_any_signature_byte_fails(
        msg in message_strategy(),
        secret in secret_strategy(),
        index in 0usize..64,
    ) {
        let sig = compute_signature(&msg, &secret);
        let mut tampered: Vec<u8> = sig.as_bytes().to_vec();
        let i = index % tampered.len();
        tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).unwrap();
        prop_assume!(tampered != sig);
        prop_assert!(!verify(&msg, &secret, &tampered));
    }

    #[test]
    fn different_secrets_never_cross_verify(
        msg in message_strategy(),
        secret_a in secret_strategy(),
        secret_b in secret_strategy(),
    ) {
        prop_assume!(secret_a != secret_b);
        let sig = compute_signature(&msg, &secret_a);
        prop_assert!(!verify(&msg, &secret_b, &sig));
    }

    #[test]
    fn digest_is_lowercase_hex_of_fixed_width(
        msg in message_strategy(),
        secret in secret_strategy(),
    ) {
        let sig = compute_signature(&msg, &secret);
        prop_assert_eq!(sig.len(), 64);
        prop_assert!(sig.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn payment_message_separates_ids(
        order_id in "[a-z0-9_]{1,32}",
        payment_id in "[a-z0-9_]{1,32}",
    ) {
        let msg = payment_message(&order_id, &payment_id);
        let (left, right) = msg.split_once('|').unwrap();
        prop_assert_eq!(left, order_id);
        prop_assert_eq!(right, payment_id);
    }
}
