/// Transaction types for EpochLedger
use crate::crypto::{KeyPair, PublicKey, VerifyingKey};
use crate::error::LedgerError;
use sha2::{Digest, Sha256};
use std::fmt;

pub type TxHash = [u8; 32];

/// Monetary value of an output. Signed so that a negative output can be
/// represented and rejected.
pub type Amount = i64;

/// Reference to one output of one transaction: (producing tx hash, output index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utxo {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl Utxo {
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.tx_hash), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Hash of the transaction whose output is being spent
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    /// Signature over `Transaction::signable_message` for this input's position
    pub signature: Option<Vec<u8>>,
}

impl TxInput {
    pub fn new(prev_tx_hash: TxHash, output_index: u32) -> Self {
        TxInput {
            prev_tx_hash,
            output_index,
            signature: None,
        }
    }

    /// The UTXO this input claims.
    pub fn utxo(&self) -> Utxo {
        Utxo::new(self.prev_tx_hash, self.output_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TxOutput<K = PublicKey> {
    pub value: Amount,
    /// The key whose signature is required to spend this output
    pub owner: K,
}

impl<K> TxOutput<K> {
    pub fn new(value: Amount, owner: K) -> Self {
        TxOutput { value, owner }
    }
}

/// An ordered list of inputs and outputs. The identity of a transaction is
/// its `hash()`; outputs it creates are keyed by `(hash, position)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction<K = PublicKey> {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput<K>>,
}

impl<K> Default for Transaction<K> {
    fn default() -> Self {
        Transaction {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl<K: VerifyingKey> Transaction<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transaction with no inputs and a single output, used to mint the
    /// outputs an initial pool is seeded with.
    pub fn coinbase(value: Amount, owner: K) -> Self {
        let mut tx = Self::new();
        tx.add_output(value, owner);
        tx
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn add_input(&mut self, prev_tx_hash: TxHash, output_index: u32) -> &mut Self {
        self.inputs.push(TxInput::new(prev_tx_hash, output_index));
        self
    }

    pub fn add_output(&mut self, value: Amount, owner: K) -> &mut Self {
        self.outputs.push(TxOutput::new(value, owner));
        self
    }

    /// Removes the input at `index`, returning it if it existed.
    pub fn remove_input(&mut self, index: usize) -> Option<TxInput> {
        if index < self.inputs.len() {
            Some(self.inputs.remove(index))
        } else {
            None
        }
    }

    /// Removes the first input claiming `utxo`.
    pub fn remove_input_utxo(&mut self, utxo: &Utxo) -> Option<TxInput> {
        let position = self.inputs.iter().position(|input| input.utxo() == *utxo)?;
        Some(self.inputs.remove(position))
    }

    pub fn add_signature(&mut self, signature: Vec<u8>, index: usize) -> Result<(), LedgerError> {
        let input_count = self.inputs.len();
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            LedgerError::CryptoError(format!(
                "Cannot sign input {}: transaction has {} inputs",
                index, input_count
            ))
        })?;
        input.signature = Some(signature);
        Ok(())
    }

    pub fn input_utxo(&self, index: usize) -> Option<Utxo> {
        self.inputs.get(index).map(TxInput::utxo)
    }

    /// The UTXO that output `index` becomes once this transaction is accepted.
    pub fn output_utxo(&self, index: usize) -> Option<Utxo> {
        if index < self.outputs.len() {
            u32::try_from(index)
                .ok()
                .map(|position| Utxo::new(self.hash(), position))
        } else {
            None
        }
    }

    /// The bytes the signature of input `index` must cover: that input's
    /// claimed output followed by every output of the transaction. Signature
    /// bytes are never included. `None` if `index` is out of range.
    pub fn signable_message(&self, index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(index)?;
        let mut message = Vec::new();
        message.extend_from_slice(&input.prev_tx_hash);
        message.extend_from_slice(&input.output_index.to_le_bytes());
        for output in &self.outputs {
            message.extend_from_slice(&output.value.to_le_bytes());
            message.extend_from_slice(&output.owner.key_bytes());
        }
        Some(message)
    }

    /// Calculate the hash of this transaction, signatures included.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update((self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.prev_tx_hash);
            hasher.update(input.output_index.to_le_bytes());
            match &input.signature {
                Some(signature) => {
                    hasher.update([1u8]);
                    hasher.update((signature.len() as u64).to_le_bytes());
                    hasher.update(signature);
                }
                None => hasher.update([0u8]),
            }
        }
        hasher.update((self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            let key = output.owner.key_bytes();
            hasher.update(output.value.to_le_bytes());
            hasher.update((key.len() as u64).to_le_bytes());
            hasher.update(&key);
        }
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }
}

impl Transaction<PublicKey> {
    /// Signs input `index` with `keypair`.
    pub fn sign_input(&mut self, keypair: &KeyPair, index: usize) -> Result<(), LedgerError> {
        let message = self.signable_message(index).ok_or_else(|| {
            LedgerError::CryptoError(format!(
                "Cannot sign input {}: transaction has {} inputs",
                index,
                self.inputs.len()
            ))
        })?;
        let signature = keypair.sign(&message)?;
        self.add_signature(signature.to_vec(), index)
    }
}
