//! JSON models of the node responses consumed by the builder.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use neo3_types::Hash256;

/// The VM halt state of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "HALT")]
    Halt,
    #[serde(rename = "FAULT")]
    Fault,
    #[serde(rename = "BREAK")]
    Break,
}

/// The result of `invokescript` / `invokefunction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(default)]
    pub script: Option<String>,
    pub state: VmState,
    #[serde(rename = "gasconsumed")]
    pub gas_consumed: String,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub stack: Vec<StackItem>,
}

impl InvocationResult {
    /// Whether the VM faulted.
    pub fn has_state_fault(&self) -> bool {
        self.state == VmState::Fault
    }

    /// Parses the consumed GAS as an integer fraction.
    pub fn gas_consumed_value(&self) -> Option<i64> {
        self.gas_consumed.parse().ok()
    }

    /// The first stack entry, where most single-value results live.
    pub fn first_stack_item(&self) -> Option<&StackItem> {
        self.stack.first()
    }
}

/// A typed JSON stack item from an invocation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl StackItem {
    /// Interprets an `Integer` item.
    pub fn as_integer(&self) -> Option<i64> {
        match self.value.as_ref()? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Interprets a `Boolean` item.
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_ref()?.as_bool()
    }

    /// Interprets a `ByteString` item (Base64 in JSON).
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        use base64::Engine;
        let text = self.value.as_ref()?.as_str()?;
        base64::engine::general_purpose::STANDARD.decode(text).ok()
    }
}

/// A block header plus its transaction hashes, as returned verbose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub hash: Hash256,
    pub index: u32,
    #[serde(rename = "tx", default)]
    pub transactions: Vec<BlockTransaction>,
}

/// A transaction entry inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTransaction {
    pub hash: Hash256,
}

/// The receipt of `sendrawtransaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionResponse {
    pub hash: Hash256,
}

/// The execution log of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationLog {
    #[serde(rename = "txid")]
    pub transaction_id: Hash256,
    #[serde(default)]
    pub executions: Vec<Execution>,
}

/// One execution trigger inside an application log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub trigger: String,
    #[serde(rename = "vmstate")]
    pub vm_state: VmState,
    #[serde(rename = "gasconsumed")]
    pub gas_consumed: String,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub stack: Vec<StackItem>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// A notification emitted during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub contract: String,
    #[serde(rename = "eventname")]
    pub event_name: String,
    #[serde(default)]
    pub state: Option<StackItem>,
}
