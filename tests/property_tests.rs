//! Property-based and golden-vector tests for the signer
//!
//! These tests verify invariants hold under random keys, digests and
//! transaction shapes.

use proptest::prelude::*;
use rand::RngCore;

use ckb_signer::address::{self, Network};
use ckb_signer::config::BuilderLimits;
use ckb_signer::crypto::{
    ckb_hash, legacy_prefixed_hash, personalized_hash, Hash, KeyManager, RecoverableSignature,
    SigningAlgorithm,
};
use ckb_signer::tx::{
    CellDep, CellInput, CellOutput, HashType, OutPoint, Script, Transaction, TransactionBuilder,
    WitnessArgs,
};
use ckb_signer::Error;

fn secret_one() -> [u8; 32] {
    let mut secret = [0u8; 32];
    secret[31] = 1;
    secret
}

/// Nonzero scalar well below the curve order
fn valid_secret() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>()).prop_map(|mut s| {
        s[0] &= 0x7f;
        s[31] |= 0x01;
        s
    })
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Compressed public keys always carry a parity prefix
    #[test]
    fn prop_public_key_is_compressed(secret in valid_secret()) {
        let keys = KeyManager::from_secret(&secret, SigningAlgorithm::Native).unwrap();
        let public_key = keys.public_key().unwrap();
        prop_assert!(public_key[0] == 0x02 || public_key[0] == 0x03);
    }

    /// The recovery id reproduces the signer's public key
    #[test]
    fn prop_signature_recovers_public_key(
        secret in valid_secret(),
        digest in prop::array::uniform32(any::<u8>())
    ) {
        let keys = KeyManager::from_secret(&secret, SigningAlgorithm::Native).unwrap();
        let digest = Hash(digest);
        let signature = keys.sign(&digest).unwrap();

        prop_assert!(signature.recovery_id() <= 1);
        prop_assert_eq!(signature.recover_public_key(&digest).unwrap(), keys.public_key().unwrap());
    }

    /// Signing is deterministic
    #[test]
    fn prop_signing_deterministic(
        secret in valid_secret(),
        digest in prop::array::uniform32(any::<u8>())
    ) {
        let keys = KeyManager::from_secret(&secret, SigningAlgorithm::BitcoinStyle).unwrap();
        let digest = Hash(digest);
        prop_assert_eq!(keys.sign(&digest).unwrap(), keys.sign(&digest).unwrap());
    }

    /// Hashes are pure and sensitive to every input byte
    #[test]
    fn prop_hash_avalanche(
        message in prop::collection::vec(any::<u8>(), 1..256),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255u8
    ) {
        let mut altered = message.clone();
        let i = position.index(altered.len());
        altered[i] ^= flip;

        prop_assert_eq!(ckb_hash(&message), ckb_hash(&message));
        prop_assert_ne!(ckb_hash(&message), ckb_hash(&altered));
        prop_assert_eq!(legacy_prefixed_hash(&message), legacy_prefixed_hash(&message));
        prop_assert_ne!(legacy_prefixed_hash(&message), legacy_prefixed_hash(&altered));
    }

    /// Encoded addresses carry a checksum consistent with their data
    #[test]
    fn prop_address_checksum_consistent(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let text = address::encode("ckb", &payload).unwrap();
        prop_assert_eq!(text.len(), address::encoded_len("ckb", &payload));
        let (prefix, decoded) = address::decode(&text).unwrap();
        prop_assert_eq!(prefix, "ckb");
        prop_assert_eq!(decoded, payload);
    }

    /// Cell entities survive the binary layout unchanged
    #[test]
    fn prop_cell_roundtrip(
        tx_hash in prop::array::uniform32(any::<u8>()),
        index in any::<u32>(),
        since in any::<u64>(),
        capacity in any::<u64>(),
        args in prop::collection::vec(any::<u8>(), 0..80),
        with_type in any::<bool>()
    ) {
        let out_point = OutPoint::new(Hash(tx_hash), index);
        prop_assert_eq!(OutPoint::from_slice(&out_point.to_bytes()).unwrap(), out_point);

        let input = CellInput::with_since(out_point, since);
        prop_assert_eq!(CellInput::from_slice(&input.to_bytes()).unwrap(), input);

        let lock = Script::new(Hash(tx_hash), HashType::Data2, args.clone());
        prop_assert_eq!(Script::from_slice(&lock.to_bytes().unwrap()).unwrap(), lock.clone());

        let mut output = CellOutput::new(capacity, lock.clone());
        if with_type {
            output = output.with_type(lock);
        }
        prop_assert_eq!(CellOutput::from_slice(&output.to_bytes().unwrap()).unwrap(), output);
    }

    /// Building the same transaction twice gives the same digest
    #[test]
    fn prop_signing_digest_stable(inputs in 1usize..=8, outputs in 1usize..=8) {
        let lock = Script::secp256k1_blake160(&[0x5a; 20]);
        let build = || {
            let mut builder = TransactionBuilder::default();
            builder.add_cell_dep(CellDep::secp256k1_dep_group(Network::Mainnet)).unwrap();
            for i in 0..inputs {
                builder.add_input(CellInput::new(OutPoint::new(Hash([i as u8; 32]), i as u32))).unwrap();
            }
            for i in 0..outputs {
                builder.add_output(CellOutput::new(i as u64 * 100, lock.clone()), vec![i as u8; i]).unwrap();
            }
            builder
        };
        prop_assert_eq!(build().signing_digest().unwrap(), build().signing_digest().unwrap());
    }
}

// ============================================================================
// GOLDEN VECTORS
// ============================================================================

#[test]
fn test_secret_one_public_key() {
    let keys = KeyManager::from_secret(&secret_one(), SigningAlgorithm::Native).unwrap();
    assert_eq!(
        hex::encode(keys.public_key().unwrap()),
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
    );
}

#[test]
fn test_secret_one_identity_hash() {
    let keys = KeyManager::from_secret(&secret_one(), SigningAlgorithm::Native).unwrap();
    assert_eq!(
        hex::encode(keys.identity_hash().unwrap()),
        "75178f34549c5fe9cd1a0c57aebd01e7ddf9249e"
    );
}

#[test]
fn test_secret_one_address() {
    let keys = KeyManager::from_secret(&secret_one(), SigningAlgorithm::Native).unwrap();
    assert_eq!(
        keys.address(Network::Mainnet).unwrap(),
        "ckb1qzda0cr08m85hc8jlnfp3zer7xulejywt49kt2rr0vthywaa50xwsqt4z78ng4yutl5u6xsv27ht6q08mhujf8sy3yulh"
    );
    assert_eq!(
        keys.address(Network::Testnet).unwrap(),
        "ckt1qzda0cr08m85hc8jlnfp3zer7xulejywt49kt2rr0vthywaa50xwsqt4z78ng4yutl5u6xsv27ht6q08mhujf8s2r0n40"
    );
}

#[test]
fn test_personalization_tag() {
    assert_eq!(personalized_hash(b"abc", b"ckb-default-hash"), ckb_hash(b"abc"));
}

// ============================================================================
// LIFECYCLE AND END-TO-END TESTS
// ============================================================================

/// Random keys through the full load / sign / wipe cycle
#[test]
fn test_random_key_lifecycle() {
    let mut rng = rand::thread_rng();
    for _ in 0..16 {
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);

        let mut keys = KeyManager::new();
        if keys.load(&secret, SigningAlgorithm::EthereumStyle).is_err() {
            // out-of-range scalar; must leave nothing behind
            assert!(keys.is_wiped());
            continue;
        }
        let digest = ckb_hash(&secret);
        let signature = keys.sign(&digest).unwrap();
        assert_eq!(signature.recover_public_key(&digest).unwrap(), keys.public_key().unwrap());

        keys.wipe();
        assert!(keys.is_wiped());
        assert_eq!(keys.public_key(), Err(Error::NotReady));
        assert_eq!(keys.identity_hash(), Err(Error::NotReady));
        assert_eq!(keys.sign(&digest), Err(Error::NotReady));
    }
}

/// Build, sign, serialize and parse back a two-input transfer
#[test]
fn test_end_to_end_transfer() {
    let keys = KeyManager::from_secret(&secret_one(), SigningAlgorithm::Native).unwrap();
    let recipient = Script::secp256k1_blake160(&[0x33; 20]);

    let mut builder = TransactionBuilder::new(BuilderLimits::default());
    builder
        .add_cell_dep(CellDep::secp256k1_dep_group(Network::Testnet)).unwrap()
        .add_input(CellInput::new(OutPoint::new(Hash([0x01; 32]), 0))).unwrap()
        .add_input(CellInput::new(OutPoint::new(Hash([0x02; 32]), 1))).unwrap()
        .add_output(CellOutput::new(20_000_000_000, recipient), Vec::new()).unwrap()
        .add_output(CellOutput::new(9_999_900_000, keys.default_lock_script().unwrap()), Vec::new()).unwrap();

    let bytes = builder.sign_to_bytes(&keys).unwrap();
    let tx = Transaction::from_slice(&bytes).unwrap();

    assert_eq!(tx.raw.version, 0);
    assert_eq!(tx.raw.inputs.len(), 2);
    assert_eq!(tx.raw.outputs_data, vec![Vec::<u8>::new(), Vec::new()]);
    assert!(tx.raw.header_deps.is_empty());
    assert_eq!(tx.to_bytes().unwrap(), bytes);

    let witness = WitnessArgs::from_slice(&tx.witnesses[0]).unwrap();
    let mut signature = [0u8; 65];
    signature.copy_from_slice(witness.lock.as_deref().unwrap());
    let recovered = RecoverableSignature(signature)
        .recover_public_key(&builder.signing_digest().unwrap())
        .unwrap();
    assert_eq!(recovered, keys.public_key().unwrap());
}

/// Ethereum-style keys sign the prefixed digest, not the raw sighash
#[test]
fn test_ethereum_style_signs_prefixed_digest() {
    let keys = KeyManager::from_secret(&secret_one(), SigningAlgorithm::EthereumStyle).unwrap();
    let mut builder = TransactionBuilder::default();
    builder
        .add_input(CellInput::new(OutPoint::new(Hash([0x07; 32]), 0))).unwrap()
        .add_output(CellOutput::new(1, keys.default_lock_script().unwrap()), Vec::new()).unwrap();

    let tx = builder.sign(&keys).unwrap();
    let witness = WitnessArgs::from_slice(&tx.witnesses[0]).unwrap();
    let mut signature = [0u8; 65];
    signature.copy_from_slice(witness.lock.as_deref().unwrap());

    let sighash = builder.signing_digest().unwrap();
    let prefixed = legacy_prefixed_hash(sighash.as_bytes());
    let recovered = RecoverableSignature(signature)
        .recover_public_key(&prefixed)
        .unwrap();
    assert_eq!(recovered, keys.public_key().unwrap());
}

/// Exceeding the input limit fails without touching existing state
#[test]
fn test_input_capacity_exceeded() {
    let limits = BuilderLimits::from_json(r#"{ "max_inputs": 1 }"#).unwrap();
    let mut builder = TransactionBuilder::new(limits);
    builder.add_input(CellInput::new(OutPoint::new(Hash([1; 32]), 0))).unwrap();
    let digest = builder.signing_digest().unwrap();

    let result = builder.add_input(CellInput::new(OutPoint::new(Hash([2; 32]), 0)));
    assert!(matches!(result, Err(Error::CapacityExceeded { collection: "inputs", max: 1 })));
    assert_eq!(builder.input_count(), 1);
    assert_eq!(builder.signing_digest().unwrap(), digest);
}

// ============================================================================
// CONSENSUS ENCODING GOLDEN VECTORS
// ============================================================================

/// Serialized body of the transaction built by [`golden_builder`]
const GOLDEN_RAW_TX: &str = concat!(
    "040200001c00000020000000490000006d000000c9000000ec0100000000000001000000f8de3bb47d055cdf",
    "460d93a2a6e1b05f7432f9777c8c474abf4eec1d4aee5d370000000001010000002222222222222222222222",
    "2222222222222222222222222222222222222222220200000000000000000000000101010101010101010101",
    "0101010101010101010101010101010101010101010000000064000000000000200202020202020202020202",
    "02020202020202020202020202020202020202020201000000230100000c000000c2000000b6000000100000",
    "00180000006100000000c817a804000000490000001000000030000000310000009bd7e06f3ecf4be0f2fcd2",
    "188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8011400000075178f34549c5fe9cd1a0c57aebd01e7ddf9",
    "249e550000001000000030000000310000004444444444444444444444444444444444444444444444444444",
    "4444444444440120000000555555555555555555555555555555555555555555555555555555555555555561",
    "000000100000001800000061000000605d0a5402000000490000001000000030000000310000009bd7e06f3e",
    "cf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce80114000000333333333333333333333333",
    "3333333333333333180000000c0000001400000004000000deadbeef00000000",
);

const GOLDEN_TX_HASH: &str = "6f2e21f5e81a9c783aa04c082024044e7440a1797b3f1a6c59f80a838c3efc3e";

const GOLDEN_SIGNING_DIGEST: &str = "efd7437de29e9f0a3d6ce6f0b7d552d8fdadf789bc7f4c6613b21a968148d4a3";

/// Full envelope with witness 0 holding `01 || 5a * 64`
const GOLDEN_TX: &str = concat!(
    "7c0200000c00000010020000040200001c00000020000000490000006d000000c9000000ec01000000000000",
    "01000000f8de3bb47d055cdf460d93a2a6e1b05f7432f9777c8c474abf4eec1d4aee5d370000000001010000",
    "0022222222222222222222222222222222222222222222222222222222222222220200000000000000000000",
    "0001010101010101010101010101010101010101010101010101010101010101010000000064000000000000",
    "20020202020202020202020202020202020202020202020202020202020202020201000000230100000c0000",
    "00c2000000b600000010000000180000006100000000c817a804000000490000001000000030000000310000",
    "009bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8011400000075178f34549c",
    "5fe9cd1a0c57aebd01e7ddf9249e550000001000000030000000310000004444444444444444444444444444",
    "4444444444444444444444444444444444440120000000555555555555555555555555555555555555555555",
    "555555555555555555555561000000100000001800000061000000605d0a5402000000490000001000000030",
    "000000310000009bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce80114000000",
    "3333333333333333333333333333333333333333180000000c0000001400000004000000deadbeef00000000",
    "6c0000000c00000065000000550000005500000010000000550000005500000041000000015a5a5a5a5a5a5a",
    "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
    "5a5a5a5a5a5a5a5a5a5a5a5a5a03000000010203",
);

/// One cell dep, one header dep, two inputs (one time-locked), one typed
/// output with data, one plain output and an extra witness
fn golden_builder() -> TransactionBuilder {
    let mut identity = [0u8; 20];
    hex::decode_to_slice("75178f34549c5fe9cd1a0c57aebd01e7ddf9249e", &mut identity).unwrap();
    let type_script = Script::new(Hash([0x44; 32]), HashType::Type, vec![0x55; 32]);

    let mut builder = TransactionBuilder::default();
    builder
        .add_cell_dep(CellDep::secp256k1_dep_group(Network::Testnet))
        .unwrap()
        .add_header_dep(Hash([0x22; 32]))
        .unwrap()
        .add_input(CellInput::new(OutPoint::new(Hash([0x01; 32]), 0)))
        .unwrap()
        .add_input(CellInput::with_since(
            OutPoint::new(Hash([0x02; 32]), 1),
            0x2000_0000_0000_0064,
        ))
        .unwrap()
        .add_output(
            CellOutput::new(20_000_000_000, Script::secp256k1_blake160(&identity))
                .with_type(type_script),
            vec![0xde, 0xad, 0xbe, 0xef],
        )
        .unwrap()
        .add_output(
            CellOutput::new(9_999_900_000, Script::secp256k1_blake160(&[0x33; 20])),
            Vec::new(),
        )
        .unwrap()
        .add_witness(vec![0x01, 0x02, 0x03])
        .unwrap();
    builder
}

#[test]
fn test_golden_raw_transaction_bytes() {
    let raw = golden_builder().raw_transaction();
    assert_eq!(hex::encode(raw.to_bytes().unwrap()), GOLDEN_RAW_TX);
}

#[test]
fn test_golden_tx_hash() {
    assert_eq!(golden_builder().tx_hash().unwrap().to_hex(), GOLDEN_TX_HASH);
}

#[test]
fn test_golden_signing_digest() {
    assert_eq!(golden_builder().signing_digest().unwrap().to_hex(), GOLDEN_SIGNING_DIGEST);
}

#[test]
fn test_golden_transaction_envelope() {
    let signature = RecoverableSignature::from_parts(1, &[0x5a; 64]);
    let tx = golden_builder().finalize(&signature).unwrap();
    let bytes = tx.to_bytes().unwrap();
    assert_eq!(hex::encode(&bytes), GOLDEN_TX);
    assert_eq!(Transaction::from_slice(&bytes).unwrap(), tx);
}
