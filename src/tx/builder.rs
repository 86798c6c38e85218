//! Transaction assembly and signing
//!
//! The builder holds every collection up to the limits it was created with.
//! An addition past a limit fails with [`Error::CapacityExceeded`] and leaves
//! the builder untouched.
//!
//! Signing digest:
//! ```text
//! tx_hash   = ckb_hash(raw_transaction)
//! sighash   = ckb_hash(tx_hash || len(w0) || w0 || len(w1) || w1 || ...)
//! ```
//! where `w0` is the placeholder `WitnessArgs` (65 zero bytes in `lock`) and
//! lengths are u64 little-endian.

use log::debug;

use crate::config::BuilderLimits;
use crate::crypto::{CkbHasher, Hash, KeyManager, RecoverableSignature};
use crate::error::{Error, Result};
use crate::tx::{CellDep, CellInput, CellOutput, RawTransaction, Transaction, WitnessArgs};

/// Bounded transaction builder
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    limits: BuilderLimits,
    cell_deps: Vec<CellDep>,
    header_deps: Vec<Hash>,
    inputs: Vec<CellInput>,
    outputs: Vec<CellOutput>,
    outputs_data: Vec<Vec<u8>>,
    /// Witnesses from index 1 on; index 0 is reserved for the signature
    extra_witnesses: Vec<Vec<u8>>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new(BuilderLimits::default())
    }
}

fn ensure_room(len: usize, max: usize, collection: &'static str) -> Result<()> {
    if len >= max {
        return Err(Error::CapacityExceeded { collection, max });
    }
    Ok(())
}

impl TransactionBuilder {
    pub fn new(limits: BuilderLimits) -> Self {
        Self {
            limits,
            cell_deps: Vec::new(),
            header_deps: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            outputs_data: Vec::new(),
            extra_witnesses: Vec::new(),
        }
    }

    pub fn add_cell_dep(&mut self, cell_dep: CellDep) -> Result<&mut Self> {
        ensure_room(self.cell_deps.len(), self.limits.max_cell_deps, "cell deps")?;
        self.cell_deps.push(cell_dep);
        Ok(self)
    }

    pub fn add_header_dep(&mut self, block_hash: Hash) -> Result<&mut Self> {
        ensure_room(self.header_deps.len(), self.limits.max_header_deps, "header deps")?;
        self.header_deps.push(block_hash);
        Ok(self)
    }

    pub fn add_input(&mut self, input: CellInput) -> Result<&mut Self> {
        ensure_room(self.inputs.len(), self.limits.max_inputs, "inputs")?;
        self.inputs.push(input);
        Ok(self)
    }

    /// Add an output together with its data blob (may be empty)
    pub fn add_output(&mut self, output: CellOutput, data: Vec<u8>) -> Result<&mut Self> {
        ensure_room(self.outputs.len(), self.limits.max_outputs, "outputs")?;
        self.outputs.push(output);
        self.outputs_data.push(data);
        Ok(self)
    }

    /// Append a witness after the signature slot
    pub fn add_witness(&mut self, witness: Vec<u8>) -> Result<&mut Self> {
        ensure_room(
            1 + self.extra_witnesses.len(),
            self.limits.max_witnesses,
            "witnesses",
        )?;
        self.extra_witnesses.push(witness);
        Ok(self)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Snapshot of the transaction body (version 0)
    pub fn raw_transaction(&self) -> RawTransaction {
        RawTransaction {
            version: 0,
            cell_deps: self.cell_deps.clone(),
            header_deps: self.header_deps.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            outputs_data: self.outputs_data.clone(),
        }
    }

    pub fn tx_hash(&self) -> Result<Hash> {
        self.raw_transaction().hash()
    }

    /// Digest the signature commits to
    pub fn signing_digest(&self) -> Result<Hash> {
        let tx_hash = self.tx_hash()?;
        let placeholder = WitnessArgs::placeholder().to_bytes()?;

        let mut hasher = CkbHasher::new();
        hasher.update(tx_hash.as_bytes());
        hasher.update(&(placeholder.len() as u64).to_le_bytes());
        hasher.update(&placeholder);
        for witness in &self.extra_witnesses {
            hasher.update(&(witness.len() as u64).to_le_bytes());
            hasher.update(witness);
        }
        let digest = hasher.finalize();

        debug!("tx hash {} signing digest {}", tx_hash, digest);
        Ok(digest)
    }

    /// Wrap an externally produced signature into the final transaction
    pub fn finalize(&self, signature: &RecoverableSignature) -> Result<Transaction> {
        let mut witnesses = Vec::new();
        witnesses.try_reserve_exact(1 + self.extra_witnesses.len())?;
        witnesses.push(WitnessArgs::with_signature(signature).to_bytes()?);
        witnesses.extend(self.extra_witnesses.iter().cloned());

        Ok(Transaction {
            raw: self.raw_transaction(),
            witnesses,
        })
    }

    /// Compute the digest, sign it with the loaded key and assemble the transaction
    pub fn sign(&self, keys: &KeyManager) -> Result<Transaction> {
        if self.inputs.is_empty() {
            return Err(Error::InvalidParameter("transaction has no inputs"));
        }
        let digest = self.signing_digest()?;
        let signature = keys.sign_transaction_digest(&digest)?;
        let tx = self.finalize(&signature)?;
        debug!(
            "signed transaction with {} inputs, {} outputs, recovery id {}",
            self.inputs.len(),
            self.outputs.len(),
            signature.recovery_id()
        );
        Ok(tx)
    }

    /// Sign and serialize; the returned buffer is ready for broadcast
    pub fn sign_to_bytes(&self, keys: &KeyManager) -> Result<Vec<u8>> {
        let bytes = self.sign(keys)?.to_bytes()?;
        debug!("serialized transaction, {} bytes", bytes.len());
        Ok(bytes)
    }
}
