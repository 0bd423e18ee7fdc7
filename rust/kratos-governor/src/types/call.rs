// Call - Privileged actions carried by proposals and timelock operations
//
// Identifiers are derived from the exact call batch, so any change to a
// target, value, payload or description yields a different id.

use super::account::Address;
use super::primitives::{Balance, Hash, DOMAIN_PROPOSAL, DOMAIN_TIMELOCK_OPERATION};
use serde::{Deserialize, Serialize};

/// Four-byte function selector at the start of a payload
pub type Selector = [u8; 4];

/// Selector of a function signature such as `releaseFunds()`
pub fn selector(signature: &str) -> Selector {
    let digest = blake3::hash(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest.as_bytes()[..4]);
    out
}

/// Hash of a human-readable proposal description
pub fn description_hash(description: &str) -> Hash {
    Hash::hash(description.as_bytes())
}

/// A single privileged call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub value: Balance,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: Balance, payload: Vec<u8>) -> Self {
        Self { target, value, payload }
    }

    /// Build a call from a selector and already-encoded arguments
    pub fn with_selector(target: Address, value: Balance, sel: Selector, args: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(4 + args.len());
        payload.extend_from_slice(&sel);
        payload.extend_from_slice(args);
        Self { target, value, payload }
    }

    /// Split the payload into selector and arguments
    pub fn selector(&self) -> Option<(Selector, &[u8])> {
        if self.payload.len() < 4 {
            return None;
        }
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&self.payload[..4]);
        Some((sel, &self.payload[4..]))
    }
}

/// Why parallel call arrays were rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("no targets")]
    Empty,

    #[error("length mismatch: {targets} targets, {values} values, {payloads} payloads")]
    LengthMismatch {
        targets: usize,
        values: usize,
        payloads: usize,
    },
}

/// Ordered, non-empty list of calls executed as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallBatch {
    calls: Vec<Call>,
}

impl CallBatch {
    /// Zip the parallel target/value/payload arrays used by the external interface
    pub fn from_parts(
        targets: &[Address],
        values: &[Balance],
        payloads: &[Vec<u8>],
    ) -> Result<Self, BatchError> {
        if targets.len() != values.len() || targets.len() != payloads.len() {
            return Err(BatchError::LengthMismatch {
                targets: targets.len(),
                values: values.len(),
                payloads: payloads.len(),
            });
        }
        if targets.is_empty() {
            return Err(BatchError::Empty);
        }

        let calls = targets
            .iter()
            .zip(values)
            .zip(payloads)
            .map(|((target, value), payload)| Call::new(*target, *value, payload.clone()))
            .collect();

        Ok(Self { calls })
    }

    pub fn from_calls(calls: Vec<Call>) -> Result<Self, BatchError> {
        if calls.is_empty() {
            return Err(BatchError::Empty);
        }
        Ok(Self { calls })
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Canonical encoding: u64-LE count, then per call the 32-byte target,
    /// u128-LE value, u64-LE payload length and payload bytes
    fn encode_into(&self, hasher: &mut blake3::Hasher) {
        hasher.update(&(self.calls.len() as u64).to_le_bytes());
        for call in &self.calls {
            hasher.update(call.target.as_bytes());
            hasher.update(&call.value.to_le_bytes());
            hasher.update(&(call.payload.len() as u64).to_le_bytes());
            hasher.update(&call.payload);
        }
    }

    /// Proposal identifier. Identical batch and description always give the
    /// same id, which makes proposal creation idempotent.
    pub fn proposal_id(&self, description_hash: &Hash) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN_PROPOSAL);
        self.encode_into(&mut hasher);
        hasher.update(description_hash.as_bytes());
        Hash::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Timelock operation identifier
    pub fn operation_id(&self, predecessor: Option<&Hash>, salt: &Hash) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN_TIMELOCK_OPERATION);
        self.encode_into(&mut hasher);
        match predecessor {
            Some(pred) => {
                hasher.update(&[1u8]);
                hasher.update(pred.as_bytes());
            }
            None => {
                hasher.update(&[0u8]);
                hasher.update(Hash::ZERO.as_bytes());
            }
        }
        hasher.update(salt.as_bytes());
        Hash::from_bytes(*hasher.finalize().as_bytes())
    }
}

/// Serde helper writing byte payloads as 0x-prefixed hex
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
