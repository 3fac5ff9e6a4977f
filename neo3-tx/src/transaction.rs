//! The Neo transaction and its post-broadcast observers.

use base64::Engine;
use futures::future::ready;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use neo3_io::{
    var_size_bytes, var_size_list, BinaryWriter, IoError, IoResult, MemoryReader, Serializable,
};
use neo3_types::hash::sha256;
use neo3_types::{Hash160, Hash256};

use crate::attribute::TransactionAttribute;
use crate::client::NodeClient;
use crate::error::{TransactionError, TransactionResult};
use crate::models::{ApplicationLog, RawTransactionResponse};
use crate::signer::Signer;
use crate::witness::Witness;
use crate::MAX_TRANSACTION_ATTRIBUTES;

/// Maximum byte length of a transaction script.
pub const MAX_TRANSACTION_SCRIPT_LEN: usize = 65535;

/// The transaction version emitted by this toolkit.
pub const CURRENT_TX_VERSION: u8 = 0;

/// A Neo transaction.
///
/// Instances come out of the builder unsigned, gain witnesses through
/// signing, and become trackable once sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub version: u8,
    pub nonce: u32,
    pub system_fee: i64,
    pub network_fee: i64,
    pub valid_until_block: u32,
    pub signers: Vec<Signer>,
    pub attributes: Vec<TransactionAttribute>,
    pub script: Vec<u8>,
    pub witnesses: Vec<Witness>,
    /// The chain height recorded when the transaction was sent; tracking
    /// replays blocks from here.
    block_count_when_sent: Option<u32>,
}

impl Transaction {
    /// Assembles a transaction from its parts. Used by the builder;
    /// invariants are validated there.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        version: u8,
        nonce: u32,
        system_fee: i64,
        network_fee: i64,
        valid_until_block: u32,
        signers: Vec<Signer>,
        attributes: Vec<TransactionAttribute>,
        script: Vec<u8>,
    ) -> Self {
        Self {
            version,
            nonce,
            system_fee,
            network_fee,
            valid_until_block,
            signers,
            attributes,
            script,
            witnesses: Vec::new(),
            block_count_when_sent: None,
        }
    }

    /// The first signer, who pays the fees.
    pub fn sender(&self) -> Option<&Hash160> {
        self.signers.first().map(Signer::script_hash)
    }

    /// Appends a witness. Witness order must match signer order.
    pub fn add_witness(&mut self, witness: Witness) {
        self.witnesses.push(witness);
    }

    /// Serializes everything but the witness list.
    pub fn to_array_without_witnesses(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.size());
        self.serialize_unsigned(&mut writer);
        writer.into_bytes()
    }

    fn serialize_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.version);
        writer.write_u32(self.nonce);
        writer.write_i64(self.system_fee);
        writer.write_i64(self.network_fee);
        writer.write_u32(self.valid_until_block);
        writer.write_serializable_list(&self.signers);
        writer.write_serializable_list(&self.attributes);
        writer.write_var_bytes(&self.script);
    }

    /// The transaction hash: SHA-256 over the witness-free serialization.
    pub fn hash(&self) -> Hash256 {
        Hash256::from_array(sha256(self.to_array_without_witnesses()))
    }

    /// The data signed by witnesses: the network magic in little-endian
    /// followed by the transaction hash.
    pub fn get_hash_data(&self, network_magic: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + 32);
        data.extend_from_slice(&network_magic.to_le_bytes());
        data.extend_from_slice(&sha256(self.to_array_without_witnesses()));
        data
    }

    /// Broadcasts the transaction.
    ///
    /// Fails if the witness count does not match the signer count. On
    /// success the current block height is recorded for [`track`].
    ///
    /// [`track`]: Self::track
    pub async fn send(
        &mut self,
        client: &dyn NodeClient,
    ) -> TransactionResult<RawTransactionResponse> {
        if self.witnesses.len() != self.signers.len() {
            return Err(TransactionError::config(
                "the transaction does not have the same number of signers and witnesses",
            ));
        }
        let raw = base64::engine::general_purpose::STANDARD.encode(self.to_array());
        let height = client.get_block_count().await?;
        debug!(hash = %self.hash(), height, "sending transaction");
        let response = client.send_raw_transaction(&raw).await?;
        self.block_count_when_sent = Some(height);
        Ok(response)
    }

    /// The block height recorded at send time.
    pub fn block_count_when_sent(&self) -> Option<u32> {
        self.block_count_when_sent
    }

    /// A cold stream yielding the index of the block that includes this
    /// transaction, then completing.
    ///
    /// Each call re-subscribes from the height recorded at send time, so
    /// every subscriber sees the same sequence. Fails if the transaction
    /// has not been sent.
    pub async fn track(
        &self,
        client: &dyn NodeClient,
    ) -> TransactionResult<BoxStream<'static, u32>> {
        let from = self.block_count_when_sent.ok_or_else(|| {
            TransactionError::state(
                "cannot subscribe before transaction has been sent",
            )
        })?;
        let tx_hash = self.hash();
        let blocks = client.subscribe_blocks(from).await?;
        let stream = blocks
            .filter_map(move |block| {
                let found = block.transactions.iter().any(|tx| tx.hash == tx_hash);
                ready(found.then_some(block.index))
            })
            .take(1)
            .boxed();
        Ok(stream)
    }

    /// Fetches the application log of the executed transaction.
    ///
    /// Returns `None` while the transaction is not yet (or never was)
    /// persisted. Fails if the transaction has not been sent.
    pub async fn application_log(
        &self,
        client: &dyn NodeClient,
    ) -> TransactionResult<Option<ApplicationLog>> {
        if self.block_count_when_sent.is_none() {
            return Err(TransactionError::state(
                "cannot fetch the application log before transaction has been sent",
            ));
        }
        client.get_application_log(&self.hash()).await
    }
}

impl Serializable for Transaction {
    fn size(&self) -> usize {
        1 + 4
            + 8
            + 8
            + 4
            + var_size_list(&self.signers)
            + var_size_list(&self.attributes)
            + var_size_bytes(&self.script)
            + var_size_list(&self.witnesses)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        self.serialize_unsigned(writer);
        writer.write_serializable_list(&self.witnesses);
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        let version = reader.read_u8("tx version")?;
        let nonce = reader.read_u32("tx nonce")?;
        let system_fee = reader.read_i64("tx system fee")?;
        let network_fee = reader.read_i64("tx network fee")?;
        let valid_until_block = reader.read_u32("tx valid until block")?;

        let signers_offset = reader.position();
        let signers = Signer::deserialize_list(reader, "tx signers", MAX_TRANSACTION_ATTRIBUTES)?;
        if signers.is_empty() {
            return Err(IoError::invalid_data(
                "tx signers",
                signers_offset,
                "a transaction requires at least one signer",
            ));
        }
        let max_attrs = MAX_TRANSACTION_ATTRIBUTES - signers.len();
        let attributes =
            TransactionAttribute::deserialize_list(reader, "tx attributes", max_attrs)?;

        let script_offset = reader.position();
        let script = reader.read_var_bytes("tx script", MAX_TRANSACTION_SCRIPT_LEN)?;
        if script.is_empty() {
            return Err(IoError::invalid_data(
                "tx script",
                script_offset,
                "a transaction requires a non-empty script",
            ));
        }
        let witnesses =
            Witness::deserialize_list(reader, "tx witnesses", MAX_TRANSACTION_ATTRIBUTES)?;

        Ok(Self {
            version,
            nonce,
            system_fee,
            network_fee,
            valid_until_block,
            signers,
            attributes,
            script,
            witnesses,
            block_count_when_sent: None,
        })
    }
}
