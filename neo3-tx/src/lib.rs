//! Transaction assembly, signing, and broadcasting for Neo N3.
//!
//! The [`TransactionBuilder`] collects a script, signers, and attributes,
//! consults a [`NodeClient`] for fee estimation, and produces a signed,
//! broadcastable [`Transaction`]. The witness model (scopes, rules,
//! conditions) lives here as well.

pub mod account;
pub mod attribute;
pub mod builder;
pub mod client;
pub mod error;
pub mod models;
pub mod signer;
pub mod transaction;
pub mod witness;
pub mod witness_rule;
pub mod witness_scope;

pub use account::Account;
pub use attribute::{OracleResponseCode, TransactionAttribute};
pub use builder::{FeePolicy, TransactionBuilder};
pub use client::NodeClient;
pub use error::{TransactionError, TransactionResult};
pub use models::{
    ApplicationLog, Block, BlockTransaction, InvocationResult, RawTransactionResponse, StackItem,
    VmState,
};
pub use signer::{Signer, SignerAuth};
pub use transaction::Transaction;
pub use witness::Witness;
pub use witness_rule::{WitnessAction, WitnessCondition, WitnessRule};
pub use witness_scope::WitnessScope;

/// A transaction holds at most this many attributes, signers included.
pub const MAX_TRANSACTION_ATTRIBUTES: usize = 16;

/// Upper bound on the sub-items of a signer (contracts, groups, rules).
pub const MAX_SIGNER_SUBITEMS: usize = 16;
