use crate::crypto::PublicKey;
use crate::transaction::{TxOutput, Utxo};
use std::collections::HashMap;

/// The set of outputs currently available to be spent, keyed by the UTXO that
/// names them.
///
/// `Clone` is a deep copy: a cloned pool shares no state with the original.
#[derive(Debug, Clone, PartialEq)]
pub struct UtxoPool<K = PublicKey> {
    utxos: HashMap<Utxo, TxOutput<K>>,
}

impl<K> Default for UtxoPool<K> {
    fn default() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }
}

impl<K> UtxoPool<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outputs(outputs: impl IntoIterator<Item = (Utxo, TxOutput<K>)>) -> Self {
        Self {
            utxos: outputs.into_iter().collect(),
        }
    }

    /// Adds (or replaces) the output named by `utxo`.
    pub fn add_utxo(&mut self, utxo: Utxo, output: TxOutput<K>) {
        self.utxos.insert(utxo, output);
    }

    pub fn remove_utxo(&mut self, utxo: &Utxo) -> Option<TxOutput<K>> {
        self.utxos.remove(utxo)
    }

    pub fn get_tx_output(&self, utxo: &Utxo) -> Option<&TxOutput<K>> {
        self.utxos.get(utxo)
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    /// Every UTXO in the pool, sorted so the result is stable across runs.
    pub fn all_utxos(&self) -> Vec<Utxo> {
        let mut utxos: Vec<Utxo> = self.utxos.keys().copied().collect();
        utxos.sort();
        utxos
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &TxOutput<K>)> {
        self.utxos.iter()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Sum of every output value in the pool.
    pub fn total_value(&self) -> i128 {
        self.utxos.values().map(|output| i128::from(output.value)).sum()
    }
}

impl<K: PartialEq> UtxoPool<K> {
    /// Sum of the outputs spendable by `owner`.
    pub fn balance_of(&self, owner: &K) -> i128 {
        self.utxos
            .values()
            .filter(|output| output.owner == *owner)
            .map(|output| i128::from(output.value))
            .sum()
    }
}

impl<K> From<HashMap<Utxo, TxOutput<K>>> for UtxoPool<K> {
    fn from(utxos: HashMap<Utxo, TxOutput<K>>) -> Self {
        Self { utxos }
    }
}
