//! End-to-end builder tests against a scripted mock node.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use neo3_script::ScriptBuilder;
use neo3_tx::{
    Account, ApplicationLog, Block, BlockTransaction, InvocationResult, NodeClient,
    RawTransactionResponse, Signer, Transaction, TransactionAttribute, TransactionBuilder,
    TransactionError, TransactionResult, VmState, Witness,
};
use neo3_types::{ContractParameter, ECKeyPair, ECPublicKey, Hash160, Hash256};

const ACCOUNT1_KEY: &str = "e6e919577dd7b8e97805151c05ae07ff4f752654d6d8797597aca989c02c4cb3";
const ACCOUNT2_KEY: &str = "b4b2b579cac270125259f08a5f414e9235817e7637b9a66cfeb3b77d90c8e7f9";
const NEO_TOKEN: &str = "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5";

fn account1() -> Account {
    Account::from_key_pair(
        ECKeyPair::from_private_key(&hex::decode(ACCOUNT1_KEY).unwrap()).unwrap(),
    )
}

fn account2() -> Account {
    Account::from_key_pair(
        ECKeyPair::from_private_key(&hex::decode(ACCOUNT2_KEY).unwrap()).unwrap(),
    )
}

fn symbol_script() -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    builder
        .contract_call(&Hash160::from_str(NEO_TOKEN).unwrap(), "symbol", &[])
        .unwrap();
    builder.into_bytes()
}

/// A node client replaying canned responses.
struct MockClient {
    invoke_result: InvocationResult,
    network_fee: u64,
    block_count: u32,
    committee: Vec<ECPublicKey>,
    balance: i64,
    blocks: Vec<Block>,
    application_log: Option<ApplicationLog>,
    sent: Mutex<Vec<String>>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            invoke_result: InvocationResult {
                script: None,
                state: VmState::Halt,
                gas_consumed: "984060".to_string(),
                exception: None,
                stack: Vec::new(),
            },
            network_fee: 1_230_610,
            block_count: 1000,
            committee: Vec::new(),
            balance: 1_000_000,
            blocks: Vec::new(),
            application_log: None,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NodeClient for MockClient {
    async fn invoke_script(
        &self,
        _script_base64: &str,
        _signers: &[Signer],
    ) -> TransactionResult<InvocationResult> {
        Ok(self.invoke_result.clone())
    }

    async fn invoke_function(
        &self,
        _contract: &Hash160,
        method: &str,
        _params: &[ContractParameter],
        _signers: &[Signer],
    ) -> TransactionResult<InvocationResult> {
        assert_eq!(method, "balanceOf");
        Ok(InvocationResult {
            script: None,
            state: VmState::Halt,
            gas_consumed: "10".to_string(),
            exception: None,
            stack: vec![neo3_tx::StackItem {
                item_type: "Integer".to_string(),
                value: Some(serde_json::json!(self.balance.to_string())),
            }],
        })
    }

    async fn calculate_network_fee(&self, _tx_base64: &str) -> TransactionResult<u64> {
        Ok(self.network_fee)
    }

    async fn get_block_count(&self) -> TransactionResult<u32> {
        Ok(self.block_count)
    }

    async fn get_committee(&self) -> TransactionResult<Vec<ECPublicKey>> {
        Ok(self.committee.clone())
    }

    async fn send_raw_transaction(
        &self,
        tx_base64: &str,
    ) -> TransactionResult<RawTransactionResponse> {
        self.sent.lock().unwrap().push(tx_base64.to_string());
        Ok(RawTransactionResponse {
            hash: Hash256::from_str(
                "0x830816f0c801bcabf919dfa1a90d7b9a4f867482cb4d18d0631a5aa6daefab6a",
            )
            .unwrap(),
        })
    }

    async fn get_application_log(
        &self,
        _tx_hash: &Hash256,
    ) -> TransactionResult<Option<ApplicationLog>> {
        Ok(self.application_log.clone())
    }

    async fn get_block(&self, index: u32, _verbose: bool) -> TransactionResult<Block> {
        self.blocks
            .iter()
            .find(|b| b.index == index)
            .cloned()
            .ok_or_else(|| TransactionError::client("unknown block"))
    }

    async fn subscribe_blocks(
        &self,
        from_index: u32,
    ) -> TransactionResult<BoxStream<'static, Block>> {
        let blocks: Vec<Block> = self
            .blocks
            .iter()
            .filter(|b| b.index >= from_index)
            .cloned()
            .collect();
        Ok(futures::stream::iter(blocks).boxed())
    }

    fn network_magic(&self) -> u32 {
        769
    }
}

#[tokio::test]
async fn builds_with_explicit_nonce() {
    let client = MockClient::default();
    for nonce in [0u32, 1, u32::MAX] {
        let tx = TransactionBuilder::new(&client)
            .valid_until_block(1)
            .script(vec![1, 2, 3])
            .signers(vec![Signer::called_by_entry(account1())])
            .unwrap()
            .nonce(nonce)
            .build()
            .await
            .unwrap();
        assert_eq!(tx.nonce, nonce);
    }
}

#[tokio::test]
async fn fails_without_signers() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .valid_until_block(100)
        .script(vec![1, 2, 3])
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("without signers"));
}

#[tokio::test]
async fn rejects_duplicate_signers() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .signers(vec![
            Signer::global(account1()),
            Signer::called_by_entry(account1()),
        ])
        .unwrap_err();
    assert!(err.to_string().contains("concerning the same account"));
}

#[tokio::test]
async fn overriding_signers_replaces_the_list() {
    let client = MockClient::default();
    let builder = TransactionBuilder::new(&client)
        .signers(vec![Signer::global(account1())])
        .unwrap()
        .signers(vec![Signer::called_by_entry(account2())])
        .unwrap();
    assert_eq!(builder.get_signers().len(), 1);
    assert_eq!(
        builder.get_signers()[0].script_hash(),
        account2().script_hash()
    );
}

#[tokio::test]
async fn high_priority_requires_committee_sender() {
    let mut client = MockClient::default();
    client.committee = vec![account1().key_pair().unwrap().public_key().clone()];

    // Committee member: accepted.
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .attributes(vec![TransactionAttribute::HighPriority])
        .unwrap()
        .signers(vec![Signer::none(account1())])
        .unwrap()
        .build()
        .await
        .unwrap();
    assert_eq!(tx.attributes.len(), 1);

    // Non-member: rejected.
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .attributes(vec![TransactionAttribute::HighPriority])
        .unwrap()
        .signers(vec![Signer::none(account2())])
        .unwrap()
        .build()
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("only committee members can send transactions with high priority"));
}

#[tokio::test]
async fn high_priority_accepts_multi_sig_with_committee_member() {
    let mut client = MockClient::default();
    client.committee = vec![account1().key_pair().unwrap().public_key().clone()];

    let multi_sig = Account::multi_sig(
        &[
            account2().key_pair().unwrap().public_key().clone(),
            account1().key_pair().unwrap().public_key().clone(),
        ],
        1,
    )
    .unwrap();

    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .attributes(vec![TransactionAttribute::HighPriority])
        .unwrap()
        .signers(vec![Signer::none(multi_sig)])
        .unwrap()
        .build()
        .await
        .unwrap();
    assert_eq!(tx.attributes.len(), 1);
}

#[tokio::test]
async fn high_priority_is_added_only_once() {
    let mut client = MockClient::default();
    client.committee = vec![account1().key_pair().unwrap().public_key().clone()];

    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::none(account1())])
        .unwrap()
        .attributes(vec![TransactionAttribute::HighPriority])
        .unwrap()
        .attributes(vec![TransactionAttribute::HighPriority])
        .unwrap()
        .build()
        .await
        .unwrap();
    assert_eq!(tx.attributes.len(), 1);
}

#[tokio::test]
async fn attribute_budget_counts_signers() {
    let client = MockClient::default();
    let mut attributes = Vec::new();
    for _ in 0..16 {
        attributes.push(TransactionAttribute::OracleResponse {
            id: 1,
            code: neo3_tx::OracleResponseCode::Success,
            result: vec![],
        });
    }
    // 16 attributes alone exceed the budget once a signer is added.
    let err = TransactionBuilder::new(&client)
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .attributes(attributes)
        .unwrap_err();
    assert!(err.to_string().contains("cannot have more than 16 attributes"));
}

#[tokio::test]
async fn valid_until_block_defaults_to_max_increment() {
    let client = MockClient::default();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::none(account1())])
        .unwrap()
        .build()
        .await
        .unwrap();
    assert_eq!(tx.valid_until_block, 1000 + 5760 - 1);
}

#[tokio::test]
async fn fees_are_filled_from_the_node() {
    let client = MockClient::default();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::none(account1())])
        .unwrap()
        .valid_until_block(1000)
        .build()
        .await
        .unwrap();
    assert_eq!(tx.system_fee, 984_060);
    assert_eq!(tx.network_fee, 1_230_610);
}

#[tokio::test]
async fn additional_network_fee_is_added() {
    let client = MockClient::default();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::none(account1())])
        .unwrap()
        .additional_network_fee(2000)
        .build()
        .await
        .unwrap();
    assert_eq!(tx.network_fee, 1_230_610 + 2000);
}

#[tokio::test]
async fn vm_fault_propagates_the_exception_text() {
    let mut client = MockClient::default();
    client.invoke_result.state = VmState::Fault;
    client.invoke_result.exception =
        Some("Value was either too large or too small for an Int32.".to_string());

    let err = TransactionBuilder::new(&client)
        .script(vec![0x0c, 0x00])
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .build()
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("Value was either too large or too small for an Int32."));
}

#[tokio::test]
async fn signing_without_private_key_fails() {
    let client = MockClient::default();
    let watch_only = Account::from_address(&account1().address()).unwrap();
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::none(Account::from_public_key(
            // Watch-only with a known verification script so fee
            // estimation succeeds and signing is what fails.
            account1().key_pair().unwrap().public_key(),
        ))])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::MissingPrivateKey { .. }));
    assert!(err.to_string().contains(&watch_only.address()));
}

#[tokio::test]
async fn multi_sig_signers_are_not_auto_signed() {
    let client = MockClient::default();
    let multi_sig = Account::multi_sig(
        &[account1().key_pair().unwrap().public_key().clone()],
        1,
    )
    .unwrap();
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::none(multi_sig)])
        .unwrap()
        .sign()
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("multi-sig signers cannot be signed automatically"));
}

#[tokio::test]
async fn contract_only_signers_cannot_sign_alone() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::contract_called_by_entry(
            *Account::create().unwrap().script_hash(),
            vec![],
        )])
        .unwrap()
        .sign()
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("requires at least one signing account"));
}

#[tokio::test]
async fn signs_with_every_account_signer() {
    let client = MockClient::default();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![
            Signer::called_by_entry(account1()),
            Signer::called_by_entry(account2()),
        ])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();

    assert_eq!(tx.witnesses.len(), 2);
    let hash_data = tx.get_hash_data(769);
    for (witness, account) in tx.witnesses.iter().zip([account1(), account2()]) {
        let signature = &witness.invocation.script()[2..];
        assert!(account
            .key_pair()
            .unwrap()
            .public_key()
            .verify_signature(&hash_data, signature)
            .unwrap());
    }
}

#[tokio::test]
async fn contract_signer_gets_parameter_witness() {
    let client = MockClient::default();
    let contract_hash = Hash160::from_str("0xe87819d005b730645050f89073a4cd7bf5f6bd3c").unwrap();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![
            Signer::contract_global(
                contract_hash,
                vec![
                    ContractParameter::string("iamgroot"),
                    ContractParameter::integer(2),
                ],
            ),
            Signer::called_by_entry(account1()),
        ])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();

    let mut expected = ScriptBuilder::new();
    expected.push_string("iamgroot");
    expected.push_int(2);
    let expected_witness = Witness::new(
        neo3_script::InvocationScript::from_bytes_raw(expected.into_bytes()),
        neo3_script::VerificationScript::new(),
    );
    assert!(tx.witnesses.contains(&expected_witness));
}

#[tokio::test]
async fn send_requires_matching_witness_count() {
    let client = MockClient::default();
    let mut tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(1000)
        .build()
        .await
        .unwrap();
    let err = tx.send(&client).await.unwrap_err();
    assert!(err
        .to_string()
        .contains("same number of signers and witnesses"));
}

#[tokio::test]
async fn first_signer_reorders_the_list() {
    let client = MockClient::default();
    let s1 = Signer::global(account1());
    let s2 = Signer::called_by_entry(account2());
    let builder = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![s1.clone(), s2.clone()])
        .unwrap()
        .first_signer(s2.script_hash())
        .unwrap();
    assert_eq!(builder.get_signers()[0].script_hash(), s2.script_hash());
    assert_eq!(builder.get_signers()[1].script_hash(), s1.script_hash());
}

#[tokio::test]
async fn first_signer_rejects_fee_only_scope() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![
            Signer::none(account1()),
            Signer::called_by_entry(account2()),
        ])
        .unwrap()
        .first_signer(account2().script_hash())
        .unwrap_err();
    assert!(err.to_string().contains("fee-only witness scope"));
}

#[tokio::test]
async fn first_signer_requires_presence() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::global(account1())])
        .unwrap()
        .first_signer(account2().script_hash())
        .unwrap_err();
    assert!(err.to_string().contains("could not find a signer"));
}

#[tokio::test]
async fn consumer_runs_when_sender_cannot_cover_fees() {
    let client = MockClient::default(); // balance 1_000_000 < fees
    let called = Arc::new(AtomicBool::new(false));
    let called_clone = Arc::clone(&called);

    TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(2_000_000)
        .do_if_sender_cannot_cover_fees(move |fees, balance| {
            assert_eq!(fees, 984_060 + 1_230_610);
            assert_eq!(balance, 1_000_000);
            called_clone.store(true, Ordering::SeqCst);
        })
        .unwrap()
        .build()
        .await
        .unwrap();
    assert!(called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn supplier_error_fails_the_build() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(2_000_000)
        .throw_if_sender_cannot_cover_fees(|| {
            TransactionError::state("test throwIfSenderCannotCoverFees")
        })
        .unwrap()
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("test throwIfSenderCannotCoverFees"));
}

#[tokio::test]
async fn fee_policy_setters_are_mutually_exclusive() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .throw_if_sender_cannot_cover_fees(|| TransactionError::state("x"))
        .unwrap()
        .do_if_sender_cannot_cover_fees(|_, _| {})
        .unwrap_err();
    assert!(err.to_string().contains("supplier is already set"));

    let err = TransactionBuilder::new(&client)
        .do_if_sender_cannot_cover_fees(|_, _| {})
        .unwrap()
        .throw_if_sender_cannot_cover_fees(|| TransactionError::state("x"))
        .unwrap_err();
    assert!(err.to_string().contains("consumer is already set"));
}

#[tokio::test]
async fn invoke_script_requires_a_script() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client)
        .call_invoke_script()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("'invokescript' call"));
}

#[tokio::test]
async fn build_requires_a_script() {
    let client = MockClient::default();
    let err = TransactionBuilder::new(&client).build().await.unwrap_err();
    assert!(err.to_string().contains("script"));
}

fn block(index: u32, tx_hashes: &[Hash256]) -> Block {
    Block {
        hash: Hash256::zero(),
        index,
        transactions: tx_hashes
            .iter()
            .map(|h| BlockTransaction { hash: *h })
            .collect(),
    }
}

#[tokio::test]
async fn tracking_yields_the_containing_block() {
    let client = MockClient::default();
    let mut tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .nonce(0)
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();

    let mut tracking_client = MockClient::default();
    tracking_client.blocks = vec![
        block(1000, &[]),
        block(1001, &[]),
        block(1002, &[tx.hash()]),
    ];

    tx.send(&tracking_client).await.unwrap();
    let stream = tx.track(&tracking_client).await.unwrap();
    let indexes: Vec<u32> = stream.collect().await;
    assert_eq!(indexes, vec![1002]);

    // Cold stream: a second subscription replays the same sequence.
    let stream = tx.track(&tracking_client).await.unwrap();
    let indexes: Vec<u32> = stream.collect().await;
    assert_eq!(indexes, vec![1002]);
}

#[tokio::test]
async fn tracking_before_send_fails() {
    let client = MockClient::default();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .nonce(0)
        .signers(vec![Signer::none(account1())])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();

    let err = tx.track(&client).await.err().unwrap();
    assert!(err
        .to_string()
        .contains("before transaction has been sent"));
}

#[tokio::test]
async fn application_log_after_send() {
    let mut client = MockClient::default();
    let log_txid =
        Hash256::from_str("0xeb52f99ae5cf923d8905bdd91c4160e2207d20c0cb42f8062f31c6743770e4d1")
            .unwrap();
    client.application_log = Some(ApplicationLog {
        transaction_id: log_txid,
        executions: vec![],
    });

    let mut tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();

    tx.send(&client).await.unwrap();
    let log = tx.application_log(&client).await.unwrap().unwrap();
    assert_eq!(log.transaction_id, log_txid);
}

#[tokio::test]
async fn application_log_before_send_fails() {
    let client = MockClient::default();
    let tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();

    let err = tx.application_log(&client).await.unwrap_err();
    assert!(err
        .to_string()
        .contains("before transaction has been sent"));
}

#[tokio::test]
async fn sent_transaction_round_trips_on_the_wire() {
    let client = MockClient::default();
    let mut tx = TransactionBuilder::new(&client)
        .script(symbol_script())
        .signers(vec![Signer::called_by_entry(account1())])
        .unwrap()
        .valid_until_block(1000)
        .sign()
        .await
        .unwrap();
    tx.send(&client).await.unwrap();

    let sent = client.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    use base64::Engine;
    let raw = base64::engine::general_purpose::STANDARD
        .decode(&sent[0])
        .unwrap();
    let parsed: Transaction = neo3_io::Serializable::from_bytes(&raw).unwrap();
    assert_eq!(parsed.hash(), tx.hash());
    assert_eq!(parsed.witnesses.len(), 1);
}
