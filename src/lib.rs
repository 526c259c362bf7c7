//! EpochLedger - a UTXO ledger core that validates and applies epochs of
//! signed transactions
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`transaction`] - Transaction types, hashing, signable payloads and the
//!   single-transaction validity rules
//! - [`ledger`] - The unspent-output pool and the epoch handler that mutates it
//!
//! ## Cryptography
//! - [`crypto`] - The verification capability and secp256k1 keys
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`scenario`] - Epochs written by hand in TOML
//! - [`cli`] - CLI utilities
//!
//! An epoch is processed greedily in the order given: each candidate is
//! checked against the pool as left by the candidates accepted before it.
//!
//! ```
//! use epochledger::crypto::KeyPair;
//! use epochledger::ledger::{TxHandler, UtxoPool};
//! use epochledger::transaction::{Transaction, Utxo};
//!
//! let alice = KeyPair::from_seed("alice").unwrap();
//! let bob = KeyPair::from_seed("bob").unwrap();
//!
//! let genesis = Transaction::coinbase(10, alice.public_key());
//! let mut pool = UtxoPool::new();
//! pool.add_utxo(Utxo::new(genesis.hash(), 0), genesis.outputs[0].clone());
//!
//! let mut tx = Transaction::new();
//! tx.add_input(genesis.hash(), 0);
//! tx.add_output(7, bob.public_key());
//! tx.sign_input(&alice, 0).unwrap();
//!
//! let mut handler = TxHandler::new(&pool);
//! assert_eq!(handler.handle_txs(&[tx.clone(), tx]).len(), 1);
//! assert_eq!(handler.pool().total_value(), 7);
//! ```

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod ledger;
pub mod transaction;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
pub mod scenario;
