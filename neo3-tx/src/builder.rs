//! The transaction builder: from script and signers to a signed payload.

use base64::Engine;
use rand::Rng;
use std::str::FromStr;
use tracing::debug;

use neo3_script::VerificationScript;
use neo3_types::{ContractParameter, Hash160};

use crate::attribute::TransactionAttribute;
use crate::client::NodeClient;
use crate::error::{TransactionError, TransactionResult};
use crate::signer::{Signer, SignerAuth};
use crate::transaction::{Transaction, CURRENT_TX_VERSION, MAX_TRANSACTION_SCRIPT_LEN};
use crate::witness::Witness;
use crate::MAX_TRANSACTION_ATTRIBUTES;

/// The native GAS token, queried for fee-coverage checks.
const GAS_TOKEN_HASH: &str = "0xd2a4cff31913016155e38e474a2c06d08be276cf";

/// What to do when the sender cannot cover the fees.
///
/// The consumer and supplier forms are mutually exclusive; the second
/// setter call fails instead of silently replacing the first.
pub enum FeePolicy {
    /// No check is performed.
    Default,
    /// Called with `(fees, balance)`; the build continues.
    Consumer(Box<dyn Fn(i64, i64) + Send + Sync>),
    /// Supplies the error the build fails with.
    Supplier(Box<dyn Fn() -> TransactionError + Send + Sync>),
}

/// Assembles, fee-estimates, and signs transactions against a node.
pub struct TransactionBuilder<'a> {
    client: &'a dyn NodeClient,
    version: u8,
    nonce: Option<u32>,
    valid_until_block: Option<u32>,
    signers: Vec<Signer>,
    attributes: Vec<TransactionAttribute>,
    additional_network_fee: u64,
    additional_system_fee: u64,
    script: Option<Vec<u8>>,
    fee_policy: FeePolicy,
}

impl std::fmt::Debug for FeePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("FeePolicy::Default"),
            Self::Consumer(_) => f.write_str("FeePolicy::Consumer"),
            Self::Supplier(_) => f.write_str("FeePolicy::Supplier"),
        }
    }
}

impl std::fmt::Debug for TransactionBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("version", &self.version)
            .field("nonce", &self.nonce)
            .field("valid_until_block", &self.valid_until_block)
            .field("signers", &self.signers)
            .field("attributes", &self.attributes)
            .field("additional_network_fee", &self.additional_network_fee)
            .field("additional_system_fee", &self.additional_system_fee)
            .field("script", &self.script.as_ref().map(hex::encode))
            .field("fee_policy", &self.fee_policy)
            .finish()
    }
}

impl<'a> TransactionBuilder<'a> {
    /// Creates a builder working against the given node.
    pub fn new(client: &'a dyn NodeClient) -> Self {
        Self {
            client,
            version: CURRENT_TX_VERSION,
            nonce: None,
            valid_until_block: None,
            signers: Vec::new(),
            attributes: Vec::new(),
            additional_network_fee: 0,
            additional_system_fee: 0,
            script: None,
            fee_policy: FeePolicy::Default,
        }
    }

    /// Sets the transaction version. Defaults to 0.
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Sets the nonce. Defaults to a random value at build time.
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sets the height until which the transaction stays valid. Defaults
    /// to the maximum the protocol allows, relative to the current
    /// height.
    pub fn valid_until_block(mut self, height: u32) -> Self {
        self.valid_until_block = Some(height);
        self
    }

    /// Sets the invocation script.
    pub fn script(mut self, script: Vec<u8>) -> Self {
        self.script = Some(script);
        self
    }

    /// Replaces the signer list. The first signer is the sender.
    pub fn signers(mut self, signers: Vec<Signer>) -> TransactionResult<Self> {
        for (i, a) in signers.iter().enumerate() {
            if signers[i + 1..]
                .iter()
                .any(|b| b.script_hash() == a.script_hash())
            {
                return Err(TransactionError::config(format!(
                    "cannot add multiple signers concerning the same account {}",
                    a.script_hash()
                )));
            }
        }
        self.check_attribute_budget(signers.len(), self.attributes.len())?;
        self.signers = signers;
        Ok(self)
    }

    /// Adds attributes. `HighPriority` is deduplicated.
    pub fn attributes(
        mut self,
        attributes: Vec<TransactionAttribute>,
    ) -> TransactionResult<Self> {
        let mut new_attributes = self.attributes.clone();
        for attribute in attributes {
            if attribute.is_high_priority()
                && new_attributes.iter().any(TransactionAttribute::is_high_priority)
            {
                continue;
            }
            new_attributes.push(attribute);
        }
        self.check_attribute_budget(self.signers.len(), new_attributes.len())?;
        self.attributes = new_attributes;
        Ok(self)
    }

    fn check_attribute_budget(
        &self,
        signer_count: usize,
        attribute_count: usize,
    ) -> TransactionResult<()> {
        if signer_count + attribute_count > MAX_TRANSACTION_ATTRIBUTES {
            return Err(TransactionError::config(format!(
                "a transaction cannot have more than {MAX_TRANSACTION_ATTRIBUTES} attributes \
                 (including signers)"
            )));
        }
        Ok(())
    }

    /// Adds a fixed amount on top of the estimated network fee.
    pub fn additional_network_fee(mut self, fee: u64) -> Self {
        self.additional_network_fee = fee;
        self
    }

    /// Adds a fixed amount on top of the estimated system fee.
    pub fn additional_system_fee(mut self, fee: u64) -> Self {
        self.additional_system_fee = fee;
        self
    }

    /// Moves the signer with the given account to the front, making it
    /// the sender.
    pub fn first_signer(mut self, account: &Hash160) -> TransactionResult<Self> {
        if self.signers.iter().any(Signer::is_fee_only) {
            return Err(TransactionError::state(
                "this transaction contains a signer with fee-only witness scope that will cover \
                 the fees",
            ));
        }
        let position = self
            .signers
            .iter()
            .position(|s| s.script_hash() == account)
            .ok_or_else(|| {
                TransactionError::state(format!(
                    "could not find a signer with script hash {account}"
                ))
            })?;
        let signer = self.signers.remove(position);
        self.signers.insert(0, signer);
        Ok(self)
    }

    /// Runs the consumer with `(fees, balance)` when the sender cannot
    /// cover the fees. Mutually exclusive with
    /// [`throw_if_sender_cannot_cover_fees`](Self::throw_if_sender_cannot_cover_fees).
    pub fn do_if_sender_cannot_cover_fees(
        mut self,
        consumer: impl Fn(i64, i64) + Send + Sync + 'static,
    ) -> TransactionResult<Self> {
        if matches!(self.fee_policy, FeePolicy::Supplier(_)) {
            return Err(TransactionError::state(
                "cannot handle a consumer for this case, since an exception supplier is already \
                 set",
            ));
        }
        self.fee_policy = FeePolicy::Consumer(Box::new(consumer));
        Ok(self)
    }

    /// Fails the build with the supplied error when the sender cannot
    /// cover the fees. Mutually exclusive with
    /// [`do_if_sender_cannot_cover_fees`](Self::do_if_sender_cannot_cover_fees).
    pub fn throw_if_sender_cannot_cover_fees(
        mut self,
        supplier: impl Fn() -> TransactionError + Send + Sync + 'static,
    ) -> TransactionResult<Self> {
        if matches!(self.fee_policy, FeePolicy::Consumer(_)) {
            return Err(TransactionError::state(
                "cannot handle a supplier for this case, since a consumer is already set",
            ));
        }
        self.fee_policy = FeePolicy::Supplier(Box::new(supplier));
        Ok(self)
    }

    /// The configured signers.
    pub fn get_signers(&self) -> &[Signer] {
        &self.signers
    }

    /// Runs the configured script in a test invocation without building.
    pub async fn call_invoke_script(&self) -> TransactionResult<crate::models::InvocationResult> {
        let script = self.script.as_ref().filter(|s| !s.is_empty()).ok_or_else(|| {
            TransactionError::config(
                "cannot make an 'invokescript' call without the script being set",
            )
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(script);
        self.client.invoke_script(&encoded, &self.signers).await
    }

    /// Builds an unsigned transaction, filling nonce, validity window,
    /// and both fees.
    pub async fn build(&self) -> TransactionResult<Transaction> {
        let script = self.script.clone().filter(|s| !s.is_empty()).ok_or_else(|| {
            TransactionError::config("cannot build a transaction without a script")
        })?;
        if script.len() > MAX_TRANSACTION_SCRIPT_LEN {
            return Err(TransactionError::config(format!(
                "the script is larger than the maximum of {MAX_TRANSACTION_SCRIPT_LEN} bytes"
            )));
        }
        if self.signers.is_empty() {
            return Err(TransactionError::state(
                "cannot create a transaction without signers",
            ));
        }
        if self
            .attributes
            .iter()
            .any(TransactionAttribute::is_high_priority)
        {
            self.ensure_sender_is_committee_member().await?;
        }

        let nonce = match self.nonce {
            Some(nonce) => nonce,
            None => rand::thread_rng().gen(),
        };
        let valid_until_block = match self.valid_until_block {
            Some(height) => height,
            None => {
                let current = self.client.get_block_count().await?;
                current + self.client.max_valid_until_block_increment() - 1
            }
        };

        let system_fee = self.estimate_system_fee(&script).await?;
        let network_fee = self
            .estimate_network_fee(nonce, valid_until_block, &script, system_fee)
            .await?;

        if !matches!(self.fee_policy, FeePolicy::Default) {
            self.check_fee_coverage(system_fee, network_fee).await?;
        }

        debug!(system_fee, network_fee, valid_until_block, "built transaction");
        Ok(Transaction::new(
            self.version,
            nonce,
            system_fee,
            network_fee,
            valid_until_block,
            self.signers.clone(),
            self.attributes.clone(),
            script,
        ))
    }

    async fn estimate_system_fee(&self, script: &[u8]) -> TransactionResult<i64> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(script);
        let result = self.client.invoke_script(&encoded, &self.signers).await?;
        if result.has_state_fault() {
            let message = result
                .exception
                .unwrap_or_else(|| "no exception message".to_string());
            return Err(TransactionError::VmFault(message));
        }
        let consumed = result.gas_consumed_value().ok_or_else(|| {
            TransactionError::UnexpectedResult(format!(
                "gas consumption '{}' is not an integer",
                result.gas_consumed
            ))
        })?;
        Ok(consumed + self.additional_system_fee as i64)
    }

    async fn estimate_network_fee(
        &self,
        nonce: u32,
        valid_until_block: u32,
        script: &[u8],
        system_fee: i64,
    ) -> TransactionResult<i64> {
        // A throwaway transaction with correctly sized placeholder
        // witnesses gives the node the exact byte shape to price.
        let mut tx = Transaction::new(
            self.version,
            nonce,
            system_fee,
            0,
            valid_until_block,
            self.signers.clone(),
            self.attributes.clone(),
            script.to_vec(),
        );
        for signer in &self.signers {
            tx.add_witness(Self::placeholder_witness(signer)?);
        }
        let raw = base64::engine::general_purpose::STANDARD
            .encode(neo3_io::Serializable::to_array(&tx));
        let fee = self.client.calculate_network_fee(&raw).await?;
        Ok(fee as i64 + self.additional_network_fee as i64)
    }

    fn placeholder_witness(signer: &Signer) -> TransactionResult<Witness> {
        match signer.auth() {
            SignerAuth::Contract(params) => Witness::contract_witness(params),
            SignerAuth::Account(account) => {
                let verification = account.verification_script().cloned().ok_or_else(|| {
                    TransactionError::config(format!(
                        "cannot estimate the network fee for account {} without a verification \
                         script",
                        account.address()
                    ))
                })?;
                Witness::dummy_witness(verification)
            }
        }
    }

    async fn check_fee_coverage(&self, system_fee: i64, network_fee: i64) -> TransactionResult<()> {
        let sender = match self.signers.first() {
            Some(signer) => *signer.script_hash(),
            None => return Ok(()),
        };
        let fees = system_fee + network_fee;
        let balance = self.gas_balance_of(&sender).await?;
        if fees <= balance {
            return Ok(());
        }
        match &self.fee_policy {
            FeePolicy::Consumer(consumer) => {
                consumer(fees, balance);
                Ok(())
            }
            FeePolicy::Supplier(supplier) => Err(supplier()),
            FeePolicy::Default => Ok(()),
        }
    }

    async fn gas_balance_of(&self, account: &Hash160) -> TransactionResult<i64> {
        let gas_token = Hash160::from_str(GAS_TOKEN_HASH)
            .map_err(|e| TransactionError::config(e.to_string()))?;
        let result = self
            .client
            .invoke_function(
                &gas_token,
                "balanceOf",
                &[ContractParameter::hash160(*account)],
                &[],
            )
            .await?;
        result
            .first_stack_item()
            .and_then(|item| item.as_integer())
            .ok_or_else(|| {
                TransactionError::UnexpectedResult(
                    "balanceOf did not return an integer stack item".to_string(),
                )
            })
    }

    async fn ensure_sender_is_committee_member(&self) -> TransactionResult<()> {
        let sender = self.signers.first().ok_or_else(|| {
            TransactionError::state("cannot create a transaction without signers")
        })?;
        let committee = self.client.get_committee().await?;

        // A committee member signing directly.
        let single_sig_hashes = committee
            .iter()
            .map(|key| VerificationScript::from_public_key(key).script_hash());
        if single_sig_hashes
            .into_iter()
            .any(|hash| &hash == sender.script_hash())
        {
            return Ok(());
        }
        // A multi-sig sender containing a committee member.
        if let SignerAuth::Account(account) = sender.auth() {
            if let Some(script) = account.verification_script() {
                if script.is_multi_sig() {
                    let keys = script.public_keys()?;
                    if keys.iter().any(|key| committee.contains(key)) {
                        return Ok(());
                    }
                }
            }
        }
        Err(TransactionError::state(
            "only committee members can send transactions with high priority",
        ))
    }

    /// Builds and signs the transaction with every key-holding signer.
    ///
    /// Contract signers receive their parameter-push witness. Multi-sig
    /// signers are rejected: their witnesses must be assembled
    /// explicitly. Witness order follows signer order.
    pub async fn sign(&self) -> TransactionResult<Transaction> {
        let mut tx = self.build().await?;
        let hash_data = tx.get_hash_data(self.client.network_magic());

        let mut signing_accounts = 0usize;
        let mut witnesses = Vec::with_capacity(self.signers.len());
        for signer in &self.signers {
            match signer.auth() {
                SignerAuth::Contract(params) => {
                    witnesses.push(Witness::contract_witness(params)?);
                }
                SignerAuth::Account(account) => {
                    signing_accounts += 1;
                    if account.is_multi_sig() {
                        return Err(TransactionError::state(
                            "transactions with multi-sig signers cannot be signed automatically",
                        ));
                    }
                    let key_pair = account.key_pair().ok_or_else(|| {
                        TransactionError::MissingPrivateKey {
                            address: account.address(),
                        }
                    })?;
                    witnesses.push(Witness::create(&hash_data, key_pair)?);
                }
            }
        }
        if signing_accounts == 0 {
            return Err(TransactionError::config(
                "the transaction requires at least one signing account",
            ));
        }
        for witness in witnesses {
            tx.add_witness(witness);
        }
        Ok(tx)
    }
}
