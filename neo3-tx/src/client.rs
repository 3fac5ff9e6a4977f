//! The node surface consumed by the transaction builder.

use async_trait::async_trait;
use futures::stream::BoxStream;

use neo3_types::{ContractParameter, ECPublicKey, Hash160, Hash256};

use crate::error::TransactionResult;
use crate::models::{ApplicationLog, Block, InvocationResult, RawTransactionResponse};
use crate::signer::Signer;

/// The default cap on how far in the future `valid_until_block` may lie.
pub const DEFAULT_MAX_VALID_UNTIL_BLOCK_INCREMENT: u32 = 5760;

/// A JSON-RPC Neo node as seen by the transaction builder.
///
/// Implementations own the transport; the builder only sequences calls.
/// All methods are individually cancellable: the builder mutates its own
/// state only after a call returns successfully.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Executes a script in a test invocation and returns its result.
    async fn invoke_script(
        &self,
        script_base64: &str,
        signers: &[Signer],
    ) -> TransactionResult<InvocationResult>;

    /// Invokes a contract method in a test invocation.
    async fn invoke_function(
        &self,
        contract: &Hash160,
        method: &str,
        params: &[ContractParameter],
        signers: &[Signer],
    ) -> TransactionResult<InvocationResult>;

    /// Computes the network fee of a serialized transaction.
    async fn calculate_network_fee(&self, tx_base64: &str) -> TransactionResult<u64>;

    /// The current block height.
    async fn get_block_count(&self) -> TransactionResult<u32>;

    /// The current committee members.
    async fn get_committee(&self) -> TransactionResult<Vec<ECPublicKey>>;

    /// Broadcasts a serialized transaction.
    async fn send_raw_transaction(
        &self,
        tx_base64: &str,
    ) -> TransactionResult<RawTransactionResponse>;

    /// The application log of an executed transaction, if present.
    async fn get_application_log(
        &self,
        tx_hash: &Hash256,
    ) -> TransactionResult<Option<ApplicationLog>>;

    /// A block by index.
    async fn get_block(&self, index: u32, verbose: bool) -> TransactionResult<Block>;

    /// A stream of blocks starting at `from_index`, catching up to the
    /// chain tip and then following new blocks.
    async fn subscribe_blocks(
        &self,
        from_index: u32,
    ) -> TransactionResult<BoxStream<'static, Block>>;

    /// The network magic included in signatures.
    fn network_magic(&self) -> u32;

    /// The protocol's cap on `valid_until_block` relative to the current
    /// height.
    fn max_valid_until_block_increment(&self) -> u32 {
        DEFAULT_MAX_VALID_UNTIL_BLOCK_INCREMENT
    }
}
