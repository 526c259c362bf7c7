/// Validation logic for transactions separated from type definitions
use crate::crypto::VerifyingKey;
use crate::ledger::UtxoPool;
use crate::transaction::types::{Transaction, Utxo};
use std::collections::HashSet;
use thiserror::Error;

/// Why a candidate was rejected. Only ever logged; callers see a bool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum RejectReason {
    #[error("input {index} claims {utxo}, which is not in the pool")]
    MissingUtxo { index: usize, utxo: Utxo },

    #[error("input {index} is unsigned or its signature does not verify")]
    BadSignature { index: usize },

    #[error("input {index} claims {utxo} a second time")]
    DuplicateInput { index: usize, utxo: Utxo },

    #[error("output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: i64 },

    #[error("outputs total {outputs} exceeds inputs total {inputs}")]
    ValueCreated { inputs: i128, outputs: i128 },
}

impl<K: VerifyingKey> Transaction<K> {
    /// Returns true if
    /// (1) every output claimed by the inputs is in `pool`,
    /// (2) every input's signature verifies under the claimed output's owner,
    /// (3) no UTXO is claimed more than once,
    /// (4) every output value is non-negative, and
    /// (5) the claimed input values cover the output values.
    pub fn is_valid(&self, pool: &UtxoPool<K>) -> bool {
        self.check(pool).is_ok()
    }

    pub(crate) fn check(&self, pool: &UtxoPool<K>) -> Result<(), RejectReason> {
        let mut claimed: HashSet<Utxo> = HashSet::with_capacity(self.inputs.len());
        let mut total_input: i128 = 0;

        for (index, input) in self.inputs.iter().enumerate() {
            let utxo = input.utxo();

            let spent = pool
                .get_tx_output(&utxo)
                .ok_or(RejectReason::MissingUtxo { index, utxo })?;

            if !claimed.insert(utxo) {
                return Err(RejectReason::DuplicateInput { index, utxo });
            }

            let authorized = match (&input.signature, self.signable_message(index)) {
                (Some(signature), Some(message)) => spent.owner.verify(&message, signature),
                _ => false,
            };
            if !authorized {
                return Err(RejectReason::BadSignature { index });
            }

            total_input += i128::from(spent.value);
        }

        let mut total_output: i128 = 0;
        for (index, output) in self.outputs.iter().enumerate() {
            if output.value < 0 {
                return Err(RejectReason::NegativeOutput {
                    index,
                    value: output.value,
                });
            }
            total_output += i128::from(output.value);
        }

        // The surplus is an implicit fee and is not credited anywhere.
        if total_output > total_input {
            return Err(RejectReason::ValueCreated {
                inputs: total_input,
                outputs: total_output,
            });
        }

        Ok(())
    }
}

/// Checks `tx` against `pool` without modifying it.
pub fn is_valid<K: VerifyingKey>(pool: &UtxoPool<K>, tx: &Transaction<K>) -> bool {
    tx.is_valid(pool)
}
