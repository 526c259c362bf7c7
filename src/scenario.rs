//! Hand-written epochs for replaying against a fresh ledger
//!
//! Keys are named by seed strings (see [`KeyPair::from_seed`]) and
//! transactions by labels, so a whole epoch can be written in TOML:
//!
//! ```toml
//! [[genesis]]
//! label = "g0"
//! owner = "alice"
//! value = 10
//!
//! [[genesis]]
//! label = "g1"
//! outputs = [{ owner = "bob", value = 5 }, { owner = "bob", value = 5 }]
//!
//! [[epoch]]
//! label = "t1"
//! inputs = [{ from = "g0", index = 0, signer = "alice" }]
//! outputs = [{ owner = "bob", value = 10 }]
//! ```
//!
//! Every genesis label is its own transaction, even when two entries mint the
//! same outputs. Epoch entries that build the same signed transaction share
//! one hash and display under the first label.

use crate::crypto::{KeyPair, PublicKey};
use crate::error::LedgerError;
use crate::ledger::UtxoPool;
use crate::transaction::{Amount, Transaction, TxHash, Utxo};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default)]
    pub genesis: Vec<GenesisEntry>,
    #[serde(default)]
    pub epoch: Vec<TxEntry>,
}

/// Outputs the initial pool starts with: either a single `owner`/`value`
/// pair or a list of `outputs`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GenesisEntry {
    pub label: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub value: Option<Amount>,
    #[serde(default)]
    pub outputs: Vec<OutputEntry>,
}

impl GenesisEntry {
    fn minted(&self) -> Result<Vec<OutputEntry>, LedgerError> {
        let mut outputs = Vec::with_capacity(self.outputs.len() + 1);
        match (&self.owner, self.value) {
            (Some(owner), Some(value)) => outputs.push(OutputEntry {
                owner: owner.clone(),
                value,
            }),
            (None, None) => {}
            _ => {
                return Err(LedgerError::ScenarioError(format!(
                    "Genesis '{}' needs both owner and value",
                    self.label
                )))
            }
        }
        outputs.extend(self.outputs.iter().cloned());
        if outputs.is_empty() {
            return Err(LedgerError::ScenarioError(format!(
                "Genesis '{}' mints nothing",
                self.label
            )));
        }
        Ok(outputs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TxEntry {
    pub label: String,
    #[serde(default)]
    pub inputs: Vec<InputEntry>,
    #[serde(default)]
    pub outputs: Vec<OutputEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InputEntry {
    /// Label of the genesis entry or epoch transaction being spent
    pub from: String,
    pub index: u32,
    /// Seed of the key signing this input; omitted means unsigned
    #[serde(default)]
    pub signer: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputEntry {
    pub owner: String,
    pub value: Amount,
}

/// A scenario turned into real, signed transactions.
#[derive(Debug, Clone)]
pub struct BuiltScenario {
    pub pool: UtxoPool,
    pub candidates: Vec<Transaction>,
    candidate_labels: Vec<String>,
    labels: HashMap<TxHash, String>,
    owners: HashMap<PublicKey, String>,
}

impl BuiltScenario {
    /// Label of the genesis entry or epoch transaction with this hash.
    pub fn label_of(&self, tx_hash: &TxHash) -> Option<&str> {
        self.labels.get(tx_hash).map(String::as_str)
    }

    /// Label of the candidate at `position` in the epoch.
    pub fn label_at(&self, position: usize) -> Option<&str> {
        self.candidate_labels.get(position).map(String::as_str)
    }

    /// Seed name of the key, if the scenario mentions it.
    pub fn owner_name(&self, key: &PublicKey) -> Option<&str> {
        self.owners.get(key).map(String::as_str)
    }

    /// `label:index` when the producing transaction is known, the raw UTXO otherwise.
    pub fn describe(&self, utxo: &Utxo) -> String {
        match self.label_of(&utxo.tx_hash) {
            Some(label) => format!("{}:{}", label, utxo.index),
            None => utxo.to_string(),
        }
    }
}

impl Scenario {
    pub fn from_toml_str(source: &str) -> Result<Self, LedgerError> {
        toml::from_str(source).map_err(|e| LedgerError::ScenarioError(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            LedgerError::ScenarioError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Derives keys, mints the genesis pool and signs the epoch's transactions.
    ///
    /// Epoch inputs may reference genesis labels or any epoch label, including
    /// ones that appear later, so out-of-order chains can be expressed.
    pub fn build(&self) -> Result<BuiltScenario, LedgerError> {
        let mut keys: HashMap<String, KeyPair> = HashMap::new();
        let mut owners: HashMap<PublicKey, String> = HashMap::new();
        let mut key_for = |seed: &str| -> Result<KeyPair, LedgerError> {
            if let Some(keypair) = keys.get(seed) {
                return Ok(keypair.clone());
            }
            let keypair = KeyPair::from_seed(seed)?;
            owners.insert(keypair.public_key(), seed.to_string());
            keys.insert(seed.to_string(), keypair.clone());
            Ok(keypair)
        };

        let mut hashes: HashMap<String, TxHash> = HashMap::new();
        let mut labels: HashMap<TxHash, String> = HashMap::new();
        let mut pool = UtxoPool::new();

        for entry in &self.genesis {
            let mut coinbase: Transaction = Transaction::new();
            for output in entry.minted()? {
                coinbase.add_output(output.value, key_for(&output.owner)?.public_key());
            }
            let hash = genesis_hash(&entry.label, &coinbase);
            register_label(&mut hashes, &mut labels, &entry.label, hash)?;
            for (index, output) in (0u32..).zip(coinbase.outputs) {
                pool.add_utxo(Utxo::new(hash, index), output);
            }
        }

        // Hashes cover signatures and signatures cover the referenced hashes,
        // so transactions are built in dependency order.
        let order = self.dependency_order(&hashes)?;
        let mut built: Vec<Option<Transaction>> = vec![None; self.epoch.len()];
        for position in order {
            let entry = &self.epoch[position];
            let mut tx: Transaction = Transaction::new();
            for input in &entry.inputs {
                let prev = hashes.get(&input.from).ok_or_else(|| {
                    LedgerError::ScenarioError(format!(
                        "Transaction '{}' spends unknown label '{}'",
                        entry.label, input.from
                    ))
                })?;
                tx.add_input(*prev, input.index);
            }
            for output in &entry.outputs {
                tx.add_output(output.value, key_for(&output.owner)?.public_key());
            }
            for (index, input) in entry.inputs.iter().enumerate() {
                if let Some(signer) = &input.signer {
                    tx.sign_input(&key_for(signer)?, index)?;
                }
            }
            let hash = tx.hash();
            debug!(label = %entry.label, tx = %tx.hash_str(), "scenario transaction built");
            register_label(&mut hashes, &mut labels, &entry.label, hash)?;
            built[position] = Some(tx);
        }

        let candidates = built.into_iter().flatten().collect();
        let candidate_labels = self.epoch.iter().map(|entry| entry.label.clone()).collect();
        Ok(BuiltScenario {
            pool,
            candidates,
            candidate_labels,
            labels,
            owners,
        })
    }

    /// Positions of epoch entries such that every entry comes after the epoch
    /// entries it spends from.
    fn dependency_order(&self, genesis: &HashMap<String, TxHash>) -> Result<Vec<usize>, LedgerError> {
        let positions: HashMap<&str, usize> = self
            .epoch
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.label.as_str(), position))
            .collect();

        let mut order = Vec::with_capacity(self.epoch.len());
        let mut state = vec![Visit::New; self.epoch.len()];
        for start in 0..self.epoch.len() {
            self.visit(start, &positions, genesis, &mut state, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        position: usize,
        positions: &HashMap<&str, usize>,
        genesis: &HashMap<String, TxHash>,
        state: &mut [Visit],
        order: &mut Vec<usize>,
    ) -> Result<(), LedgerError> {
        match state[position] {
            Visit::Done => return Ok(()),
            Visit::InProgress => {
                return Err(LedgerError::ScenarioError(format!(
                    "Transaction '{}' depends on itself",
                    self.epoch[position].label
                )))
            }
            Visit::New => {}
        }
        state[position] = Visit::InProgress;
        for input in &self.epoch[position].inputs {
            if genesis.contains_key(&input.from) {
                continue;
            }
            match positions.get(input.from.as_str()) {
                Some(&dependency) => self.visit(dependency, positions, genesis, state, order)?,
                None => {
                    return Err(LedgerError::ScenarioError(format!(
                        "Transaction '{}' spends unknown label '{}'",
                        self.epoch[position].label, input.from
                    )))
                }
            }
        }
        state[position] = Visit::Done;
        order.push(position);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    InProgress,
    Done,
}

fn register_label(
    hashes: &mut HashMap<String, TxHash>,
    labels: &mut HashMap<TxHash, String>,
    label: &str,
    hash: TxHash,
) -> Result<(), LedgerError> {
    if hashes.contains_key(label) {
        return Err(LedgerError::ScenarioError(format!(
            "Label '{}' is used more than once",
            label
        )));
    }
    hashes.insert(label.to_string(), hash);
    labels.entry(hash).or_insert_with(|| label.to_string());
    Ok(())
}

/// Genesis outputs are keyed by their label, so identical mints stay distinct.
fn genesis_hash(label: &str, coinbase: &Transaction) -> TxHash {
    let mut hasher = Sha256::new();
    hasher.update(b"genesis");
    hasher.update((label.len() as u64).to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update(coinbase.hash());
    hasher.finalize().into()
}
