//! Transaction entities and their molecule encodings
//!
//! Every entity serializes with `to_bytes()` and parses back with
//! `from_slice()`. Parsing exists so encodings can be checked field by field.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::address::Network;
use crate::constants::*;
use crate::crypto::{ckb_hash, Hash, RecoverableSignature};
use crate::error::{Error, Result};
use crate::tx::molecule;

fn array32(data: &[u8]) -> Result<[u8; 32]> {
    data.try_into().map_err(|_| Error::Malformed("expected 32 bytes"))
}

fn le_u32(data: &[u8]) -> Result<u32> {
    let raw: [u8; 4] = data.try_into().map_err(|_| Error::Malformed("expected u32"))?;
    Ok(u32::from_le_bytes(raw))
}

fn le_u64(data: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = data.try_into().map_err(|_| Error::Malformed("expected u64"))?;
    Ok(u64::from_le_bytes(raw))
}

fn hex0x(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn quantity(n: u64) -> String {
    format!("{:#x}", n)
}

/// How a script's `code_hash` is matched against cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum HashType {
    Data = 0x00,
    Type = 0x01,
    Data1 = 0x02,
    Data2 = 0x04,
}

impl TryFrom<u8> for HashType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(HashType::Data),
            0x01 => Ok(HashType::Type),
            0x02 => Ok(HashType::Data1),
            0x04 => Ok(HashType::Data2),
            _ => Err(Error::Malformed("unknown hash type")),
        }
    }
}

/// Lock or type predicate: `table { code_hash, hash_type, args: Bytes }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub code_hash: Hash,
    pub hash_type: HashType,
    pub args: Vec<u8>,
}

impl Script {
    pub fn new(code_hash: Hash, hash_type: HashType, args: Vec<u8>) -> Self {
        Self {
            code_hash,
            hash_type,
            args,
        }
    }

    /// Default single-signature lock guarding `identity`
    pub fn secp256k1_blake160(identity: &[u8; IDENTITY_HASH_SIZE]) -> Self {
        Self {
            code_hash: Hash(SECP256K1_BLAKE160_CODE_HASH),
            hash_type: HashType::Type,
            args: identity.to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let args = molecule::bytes(&self.args)?;
        molecule::table(&[
            &self.code_hash.0[..],
            &[self.hash_type as u8][..],
            &args[..],
        ])
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let fields = molecule::read_table(data, 3)?;
        let hash_type = match fields[1] {
            [byte] => HashType::try_from(*byte)?,
            _ => return Err(Error::Malformed("hash type must be one byte")),
        };
        Ok(Self {
            code_hash: Hash(array32(fields[0])?),
            hash_type,
            args: molecule::read_bytes(fields[2])?.to_vec(),
        })
    }

    /// Script hash as referenced by type ids and lock hashes
    pub fn hash(&self) -> Result<Hash> {
        Ok(ckb_hash(&self.to_bytes()?))
    }

    pub fn to_json(&self) -> Value {
        json!({
            "code_hash": self.code_hash.to_string(),
            "hash_type": self.hash_type,
            "args": hex0x(&self.args),
        })
    }
}

/// Pointer to a cell: `struct { tx_hash: Byte32, index: Uint32 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub const SIZE: usize = 36;

    pub fn new(tx_hash: Hash, index: u32) -> Self {
        Self { tx_hash, index }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..32].copy_from_slice(&self.tx_hash.0);
        out[32..].copy_from_slice(&self.index.to_le_bytes());
        out
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() != Self::SIZE {
            return Err(Error::Malformed("out point must be 36 bytes"));
        }
        Ok(Self {
            tx_hash: Hash(array32(&data[..32])?),
            index: le_u32(&data[32..])?,
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "tx_hash": self.tx_hash.to_string(),
            "index": quantity(u64::from(self.index)),
        })
    }
}

/// Spend of a cell: `struct { since: Uint64, previous_output: OutPoint }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInput {
    pub since: u64,
    pub previous_output: OutPoint,
}

impl CellInput {
    pub const SIZE: usize = 44;

    /// Input without any time lock
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            since: 0,
            previous_output,
        }
    }

    pub fn with_since(previous_output: OutPoint, since: u64) -> Self {
        Self {
            since,
            previous_output,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..8].copy_from_slice(&self.since.to_le_bytes());
        out[8..].copy_from_slice(&self.previous_output.to_bytes());
        out
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() != Self::SIZE {
            return Err(Error::Malformed("cell input must be 44 bytes"));
        }
        Ok(Self {
            since: le_u64(&data[..8])?,
            previous_output: OutPoint::from_slice(&data[8..])?,
        })
    }
}

/// How a cell dep is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DepType {
    Code = 0x00,
    DepGroup = 0x01,
}

/// Code dependency: `struct { out_point: OutPoint, dep_type: byte }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDep {
    pub out_point: OutPoint,
    pub dep_type: DepType,
}

impl CellDep {
    pub const SIZE: usize = 37;

    pub fn new(out_point: OutPoint, dep_type: DepType) -> Self {
        Self { out_point, dep_type }
    }

    /// Dep group carrying the default lock's code and its secp256k1 tables
    pub fn secp256k1_dep_group(network: Network) -> Self {
        let tx_hash = match network {
            Network::Mainnet => MAINNET_SECP256K1_DEP_TX_HASH,
            Network::Testnet => TESTNET_SECP256K1_DEP_TX_HASH,
        };
        Self::new(OutPoint::new(Hash(tx_hash), 0), DepType::DepGroup)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..OutPoint::SIZE].copy_from_slice(&self.out_point.to_bytes());
        out[OutPoint::SIZE] = self.dep_type as u8;
        out
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() != Self::SIZE {
            return Err(Error::Malformed("cell dep must be 37 bytes"));
        }
        let dep_type = match data[OutPoint::SIZE] {
            0x00 => DepType::Code,
            0x01 => DepType::DepGroup,
            _ => return Err(Error::Malformed("unknown dep type")),
        };
        Ok(Self {
            out_point: OutPoint::from_slice(&data[..OutPoint::SIZE])?,
            dep_type,
        })
    }
}

/// Created cell: `table { capacity: Uint64, lock: Script, type_: ScriptOpt }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellOutput {
    /// Capacity in shannons
    pub capacity: u64,
    pub lock: Script,
    pub type_: Option<Script>,
}

impl CellOutput {
    pub fn new(capacity: u64, lock: Script) -> Self {
        Self {
            capacity,
            lock,
            type_: None,
        }
    }

    pub fn with_type(mut self, type_: Script) -> Self {
        self.type_ = Some(type_);
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let lock = self.lock.to_bytes()?;
        let type_ = molecule::option(self.type_.as_ref().map(Script::to_bytes).transpose()?);
        molecule::table(&[&self.capacity.to_le_bytes()[..], &lock[..], &type_[..]])
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let fields = molecule::read_table(data, 3)?;
        Ok(Self {
            capacity: le_u64(fields[0])?,
            lock: Script::from_slice(fields[1])?,
            type_: molecule::read_option(fields[2])
                .map(Script::from_slice)
                .transpose()?,
        })
    }
}

/// Transaction body covered by the transaction hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub version: u32,
    pub cell_deps: Vec<CellDep>,
    pub header_deps: Vec<Hash>,
    pub inputs: Vec<CellInput>,
    pub outputs: Vec<CellOutput>,
    pub outputs_data: Vec<Vec<u8>>,
}

impl RawTransaction {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cell_deps: Vec<[u8; CellDep::SIZE]> =
            self.cell_deps.iter().map(CellDep::to_bytes).collect();
        let header_deps: Vec<[u8; 32]> = self.header_deps.iter().map(|h| h.0).collect();
        let inputs: Vec<[u8; CellInput::SIZE]> =
            self.inputs.iter().map(CellInput::to_bytes).collect();
        let outputs = self
            .outputs
            .iter()
            .map(CellOutput::to_bytes)
            .collect::<Result<Vec<_>>>()?;
        let outputs_data = self
            .outputs_data
            .iter()
            .map(|d| molecule::bytes(d))
            .collect::<Result<Vec<_>>>()?;

        molecule::table(&[
            self.version.to_le_bytes().to_vec(),
            molecule::fixvec(&cell_deps)?,
            molecule::fixvec(&header_deps)?,
            molecule::fixvec(&inputs)?,
            molecule::dynvec(&outputs)?,
            molecule::dynvec(&outputs_data)?,
        ])
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let fields = molecule::read_table(data, 6)?;
        Ok(Self {
            version: le_u32(fields[0])?,
            cell_deps: molecule::read_fixvec(fields[1], CellDep::SIZE)?
                .into_iter()
                .map(CellDep::from_slice)
                .collect::<Result<_>>()?,
            header_deps: molecule::read_fixvec(fields[2], 32)?
                .into_iter()
                .map(|h| array32(h).map(Hash))
                .collect::<Result<_>>()?,
            inputs: molecule::read_fixvec(fields[3], CellInput::SIZE)?
                .into_iter()
                .map(CellInput::from_slice)
                .collect::<Result<_>>()?,
            outputs: molecule::read_dynvec(fields[4])?
                .into_iter()
                .map(CellOutput::from_slice)
                .collect::<Result<_>>()?,
            outputs_data: molecule::read_dynvec(fields[5])?
                .into_iter()
                .map(|d| molecule::read_bytes(d).map(<[u8]>::to_vec))
                .collect::<Result<_>>()?,
        })
    }

    /// Transaction hash
    pub fn hash(&self) -> Result<Hash> {
        Ok(ckb_hash(&self.to_bytes()?))
    }
}

/// Witness layout: `table { lock: BytesOpt, input_type: BytesOpt, output_type: BytesOpt }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessArgs {
    pub lock: Option<Vec<u8>>,
    pub input_type: Option<Vec<u8>>,
    pub output_type: Option<Vec<u8>>,
}

impl WitnessArgs {
    /// Lock field of 65 zero bytes, hashed in place of the signature
    pub fn placeholder() -> Self {
        Self::with_signature(&RecoverableSignature::placeholder())
    }

    pub fn with_signature(signature: &RecoverableSignature) -> Self {
        Self {
            lock: Some(signature.to_bytes().to_vec()),
            input_type: None,
            output_type: None,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let encode = |field: &Option<Vec<u8>>| -> Result<Vec<u8>> {
            Ok(molecule::option(
                field.as_deref().map(molecule::bytes).transpose()?,
            ))
        };
        molecule::table(&[
            encode(&self.lock)?,
            encode(&self.input_type)?,
            encode(&self.output_type)?,
        ])
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let fields = molecule::read_table(data, 3)?;
        let decode = |field: &[u8]| -> Result<Option<Vec<u8>>> {
            molecule::read_option(field)
                .map(|f| molecule::read_bytes(f).map(<[u8]>::to_vec))
                .transpose()
        };
        Ok(Self {
            lock: decode(fields[0])?,
            input_type: decode(fields[1])?,
            output_type: decode(fields[2])?,
        })
    }
}

/// Signed transaction: `table { raw: RawTransaction, witnesses: BytesVec }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub raw: RawTransaction,
    pub witnesses: Vec<Vec<u8>>,
}

impl Transaction {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let witnesses = self
            .witnesses
            .iter()
            .map(|w| molecule::bytes(w))
            .collect::<Result<Vec<_>>>()?;
        molecule::table(&[self.raw.to_bytes()?, molecule::dynvec(&witnesses)?])
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let fields = molecule::read_table(data, 2)?;
        Ok(Self {
            raw: RawTransaction::from_slice(fields[0])?,
            witnesses: molecule::read_dynvec(fields[1])?
                .into_iter()
                .map(|w| molecule::read_bytes(w).map(<[u8]>::to_vec))
                .collect::<Result<_>>()?,
        })
    }

    /// Transaction hash (witnesses are not covered)
    pub fn hash(&self) -> Result<Hash> {
        self.raw.hash()
    }

    /// JSON in the shape the node's `send_transaction` RPC accepts
    pub fn to_json(&self) -> Value {
        let raw = &self.raw;
        json!({
            "version": quantity(u64::from(raw.version)),
            "cell_deps": raw.cell_deps.iter().map(|d| json!({
                "out_point": d.out_point.to_json(),
                "dep_type": d.dep_type,
            })).collect::<Vec<_>>(),
            "header_deps": raw.header_deps.iter().map(Hash::to_string).collect::<Vec<_>>(),
            "inputs": raw.inputs.iter().map(|i| json!({
                "since": quantity(i.since),
                "previous_output": i.previous_output.to_json(),
            })).collect::<Vec<_>>(),
            "outputs": raw.outputs.iter().map(|o| json!({
                "capacity": quantity(o.capacity),
                "lock": o.lock.to_json(),
                "type": o.type_.as_ref().map(Script::to_json),
            })).collect::<Vec<_>>(),
            "outputs_data": raw.outputs_data.iter().map(|d| hex0x(d)).collect::<Vec<_>>(),
            "witnesses": self.witnesses.iter().map(|w| hex0x(w)).collect::<Vec<_>>(),
        })
    }
}
