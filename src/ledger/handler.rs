use crate::crypto::{PublicKey, VerifyingKey};
use crate::ledger::pool::UtxoPool;
use crate::transaction::{Transaction, Utxo};
use tracing::{debug, info};

/// Owns the ledger's current pool and applies epochs of candidate
/// transactions to it.
///
/// `handle_txs` takes `&mut self`, so epochs on one handler never overlap.
/// Callers sharing a handler across threads wrap it in a mutex.
#[derive(Debug, Clone)]
pub struct TxHandler<K = PublicKey> {
    pool: UtxoPool<K>,
}

impl<K: VerifyingKey> TxHandler<K> {
    /// Creates a handler over a private copy of `pool`; later changes to
    /// either pool are not visible in the other.
    pub fn new(pool: &UtxoPool<K>) -> Self {
        Self { pool: pool.clone() }
    }

    /// Checks `tx` against the current pool.
    pub fn is_valid_tx(&self, tx: &Transaction<K>) -> bool {
        tx.is_valid(&self.pool)
    }

    /// Processes one epoch in the order given and returns the accepted
    /// transactions.
    ///
    /// Each candidate is checked against the pool as left by the candidates
    /// accepted before it, so a transaction may spend outputs created earlier
    /// in the same epoch, and of two candidates spending the same output only
    /// the first one is kept. Rejected candidates leave no trace.
    pub fn handle_txs(&mut self, candidates: &[Transaction<K>]) -> Vec<Transaction<K>> {
        let mut accepted = Vec::new();

        for tx in candidates {
            if self.accept_tx(tx) {
                accepted.push(tx.clone());
            }
        }

        info!(
            candidates = candidates.len(),
            accepted = accepted.len(),
            pool_size = self.pool.len(),
            "epoch processed"
        );
        accepted
    }

    /// Applies a single candidate if it is valid against the current pool.
    /// Returns whether it was accepted; `handle_txs` is this, in order, over
    /// every candidate of the epoch.
    pub fn accept_tx(&mut self, tx: &Transaction<K>) -> bool {
        match tx.check(&self.pool) {
            Ok(()) => {
                self.apply(tx);
                true
            }
            Err(reason) => {
                debug!(tx = %tx.hash_str(), %reason, "candidate rejected");
                false
            }
        }
    }

    /// Spends the inputs of an already validated transaction and adds its outputs.
    fn apply(&mut self, tx: &Transaction<K>) {
        for input in &tx.inputs {
            self.pool.remove_utxo(&input.utxo());
        }
        let tx_hash = tx.hash();
        for (index, output) in (0u32..).zip(tx.outputs.iter()) {
            self.pool.add_utxo(Utxo::new(tx_hash, index), output.clone());
        }
    }

    /// Read-only view of the current pool.
    pub fn pool(&self) -> &UtxoPool<K> {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool<K> {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::transaction::TxOutput;

    fn keys() -> (KeyPair, KeyPair, KeyPair) {
        (
            KeyPair::from_seed("alice").unwrap(),
            KeyPair::from_seed("bob").unwrap(),
            KeyPair::from_seed("carol").unwrap(),
        )
    }

    fn genesis_pool(value: i64, owner: &KeyPair) -> (UtxoPool, Utxo) {
        let genesis = Transaction::coinbase(value, owner.public_key());
        let utxo = Utxo::new(genesis.hash(), 0);
        let mut pool = UtxoPool::new();
        pool.add_utxo(utxo, TxOutput::new(value, owner.public_key()));
        (pool, utxo)
    }

    fn pay(utxo: Utxo, signer: &KeyPair, value: i64, to: &KeyPair) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(utxo.tx_hash, utxo.index);
        tx.add_output(value, to.public_key());
        tx.sign_input(signer, 0).unwrap();
        tx
    }

    #[test]
    fn test_handler_copies_the_pool() {
        let (alice, bob, _) = keys();
        let (mut pool, utxo) = genesis_pool(10, &alice);
        let handler = TxHandler::new(&pool);

        pool.remove_utxo(&utxo);
        assert!(handler.pool().contains(&utxo));
        assert!(handler.is_valid_tx(&pay(utxo, &alice, 10, &bob)));
    }

    #[test]
    fn test_is_valid_tx_does_not_mutate() {
        let (alice, bob, _) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let handler = TxHandler::new(&pool);

        let tx = pay(utxo, &alice, 10, &bob);
        assert!(handler.is_valid_tx(&tx));
        assert!(handler.is_valid_tx(&tx));
        assert_eq!(handler.pool(), &pool);
    }

    #[test]
    fn test_accepted_tx_moves_outputs() {
        let (alice, bob, _) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let mut handler = TxHandler::new(&pool);

        let tx = pay(utxo, &alice, 10, &bob);
        let accepted = handler.handle_txs(std::slice::from_ref(&tx));

        assert_eq!(accepted, vec![tx.clone()]);
        assert!(!handler.pool().contains(&utxo));
        let created = handler.pool().get_tx_output(&Utxo::new(tx.hash(), 0)).unwrap();
        assert_eq!(created.value, 10);
        assert_eq!(created.owner, bob.public_key());
    }

    #[test]
    fn test_conflicting_spend_first_wins() {
        let (alice, bob, carol) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let t1 = pay(utxo, &alice, 10, &bob);
        let t2 = pay(utxo, &alice, 10, &carol);

        let mut forward = TxHandler::new(&pool);
        assert_eq!(forward.handle_txs(&[t1.clone(), t2.clone()]), vec![t1.clone()]);

        let mut backward = TxHandler::new(&pool);
        assert_eq!(backward.handle_txs(&[t2.clone(), t1.clone()]), vec![t2.clone()]);

        assert!(forward.pool().contains(&Utxo::new(t1.hash(), 0)));
        assert!(!forward.pool().contains(&Utxo::new(t2.hash(), 0)));
        assert_eq!(forward.pool().len(), 1);
    }

    #[test]
    fn test_invalid_candidates_have_no_effect() {
        let (alice, bob, _) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let mut handler = TxHandler::new(&pool);

        let overspend = pay(utxo, &alice, 11, &bob);
        let forged = pay(utxo, &bob, 10, &bob);
        let accepted = handler.handle_txs(&[overspend, forged]);

        assert!(accepted.is_empty());
        assert_eq!(handler.pool(), &pool);
    }

    #[test]
    fn test_chain_within_epoch() {
        let (alice, bob, carol) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let t1 = pay(utxo, &alice, 10, &bob);
        let t2 = pay(Utxo::new(t1.hash(), 0), &bob, 9, &carol);

        let mut handler = TxHandler::new(&pool);
        assert_eq!(handler.handle_txs(&[t1.clone(), t2.clone()]).len(), 2);
        assert_eq!(handler.pool().all_utxos(), vec![Utxo::new(t2.hash(), 0)]);
    }

    #[test]
    fn test_child_before_parent_is_rejected() {
        let (alice, bob, carol) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let t1 = pay(utxo, &alice, 10, &bob);
        let t2 = pay(Utxo::new(t1.hash(), 0), &bob, 9, &carol);

        let mut handler = TxHandler::new(&pool);
        assert_eq!(handler.handle_txs(&[t2, t1.clone()]), vec![t1]);
    }

    #[test]
    fn test_accept_tx_matches_epoch_processing() {
        let (alice, bob, carol) = keys();
        let (pool, utxo) = genesis_pool(10, &alice);
        let t1 = pay(utxo, &alice, 10, &bob);
        let t2 = pay(Utxo::new(t1.hash(), 0), &bob, 9, &carol);
        let candidates = vec![t2.clone(), t1.clone(), t1.clone(), t2.clone()];

        let mut one_by_one = TxHandler::new(&pool);
        let verdicts: Vec<bool> = candidates.iter().map(|tx| one_by_one.accept_tx(tx)).collect();
        assert_eq!(verdicts, vec![false, true, false, true]);

        let mut batched = TxHandler::new(&pool);
        assert_eq!(batched.handle_txs(&candidates), vec![t1, t2]);
        assert_eq!(batched.pool(), one_by_one.pool());
    }

    #[test]
    fn test_empty_epoch() {
        let (alice, _, _) = keys();
        let (pool, _) = genesis_pool(10, &alice);
        let mut handler = TxHandler::new(&pool);

        assert!(handler.handle_txs(&[]).is_empty());
        assert_eq!(handler.into_pool(), pool);
    }
}
