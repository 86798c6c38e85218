//! CKB signer demo
//!
//! Loads a hex secret, prints the key's identity and default-lock address as
//! JSON and, when asked to, signs a self-transfer of one cell.
//!
//! Usage: ckb-signer <secret-hex> [--testnet] [--spend <tx_hash>:<index> --capacity <shannons>]
//!
//! Set `CKB_SIGNER_LOG` (error, warn, info, debug, trace) to change verbosity.

use std::env;

use log::{debug, info, LevelFilter};
use serde_json::json;
use zeroize::Zeroizing;

use ckb_signer::address::Network;
use ckb_signer::config::BuilderLimits;
use ckb_signer::crypto::{Hash, KeyManager, SigningAlgorithm};
use ckb_signer::tx::{CellDep, CellInput, CellOutput, OutPoint, TransactionBuilder};

/// Flat fee deducted from the spent cell, in shannons
const DEMO_FEE: u64 = 100_000;

struct Args {
    secret: Zeroizing<Vec<u8>>,
    network: Network,
    spend: Option<(OutPoint, u64)>,
}

fn parse_out_point(text: &str) -> Result<OutPoint, Box<dyn std::error::Error>> {
    let (hash, index) = text.split_once(':').ok_or("expected <tx_hash>:<index>")?;
    Ok(OutPoint::new(Hash::from_hex(hash)?, index.parse()?))
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let secret_hex = Zeroizing::new(args.next().ok_or("missing secret key argument")?);
    let secret = Zeroizing::new(hex::decode(secret_hex.trim_start_matches("0x"))?);

    let mut network = Network::Mainnet;
    let mut out_point = None;
    let mut capacity = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--testnet" => network = Network::Testnet,
            "--spend" => out_point = Some(parse_out_point(&args.next().ok_or("missing out point")?)?),
            "--capacity" => capacity = Some(args.next().ok_or("missing capacity")?.parse::<u64>()?),
            other => return Err(format!("unknown argument: {}", other).into()),
        }
    }

    let spend = match (out_point, capacity) {
        (Some(out_point), Some(capacity)) => Some((out_point, capacity)),
        (None, None) => None,
        _ => return Err("--spend and --capacity must be given together".into()),
    };

    Ok(Args {
        secret,
        network,
        spend,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let level = env::var("CKB_SIGNER_LOG")
        .ok()
        .and_then(|l| l.parse().ok())
        .unwrap_or(LevelFilter::Info);
    simplelog::SimpleLogger::init(level, simplelog::Config::default())?;

    let args = parse_args()?;
    let keys = KeyManager::from_secret(&args.secret, SigningAlgorithm::Native)?;
    let address = keys.address(args.network)?;
    info!("Loaded key for {}", address);

    let mut report = json!({
        "public_key": format!("0x{}", hex::encode(keys.public_key()?)),
        "lock_arg": format!("0x{}", hex::encode(keys.identity_hash()?)),
        "address": address,
    });

    if let Some((out_point, capacity)) = args.spend {
        let change = capacity
            .checked_sub(DEMO_FEE)
            .ok_or("capacity does not cover the fee")?;

        let mut builder = TransactionBuilder::new(BuilderLimits::default());
        builder
            .add_cell_dep(CellDep::secp256k1_dep_group(args.network))?
            .add_input(CellInput::new(out_point))?
            .add_output(CellOutput::new(change, keys.default_lock_script()?), Vec::new())?;

        debug!("Signing self-transfer of {} shannons", change);
        let tx = builder.sign(&keys)?;
        report["tx_hash"] = json!(tx.hash()?.to_string());
        report["transaction"] = tx.to_json();
        report["size"] = json!(tx.to_bytes()?.len());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
