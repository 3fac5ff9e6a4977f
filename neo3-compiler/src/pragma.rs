//! The pragma map: compiler directives keyed by fully qualified symbol.
//!
//! Source-level annotations (`@Syscall`, `@Instruction`, `@ContractHash`,
//! `@Struct`, event markers, manifest configuration) are delivered to the
//! compiler as entries in this map. Class-level pragmas key on
//! `pkg.Class`; method-level pragmas key on `pkg.Class#method`.

use std::collections::HashMap;

use neo3_script::{InteropService, OpCode};
use neo3_types::Hash160;

/// Manifest configuration attached to the contract class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestPragma {
    /// The contract name; the class's simple name when absent.
    pub name: Option<String>,
    pub supported_standards: Vec<String>,
    /// `(contract-or-group-or-*, methods-or-*)` pairs.
    pub permissions: Vec<(String, Vec<String>)>,
    /// `(pubkey-hex, base64-signature)` pairs.
    pub groups: Vec<(String, String)>,
    pub trusts: Vec<String>,
}

/// The effect a pragma has on compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum PragmaEffect {
    /// Calls to the annotated method inline the given syscalls.
    Syscall(Vec<InteropService>),
    /// Calls to the annotated method inline the given opcodes with
    /// their operand bytes.
    Opcodes(Vec<(OpCode, Vec<u8>)>),
    /// The annotated class fronts a deployed contract; static calls to
    /// it become `System.Contract.Call` invocations of the given hash.
    ContractCall(Hash160),
    /// The annotated class is a by-value struct.
    Struct,
    /// The annotated class is an event type; static fields of it become
    /// manifest events fired via `System.Runtime.Notify`.
    Event,
    /// Overrides the display name of a single event field
    /// (`pkg.Class#field`).
    EventDisplayName(String),
    /// The annotated method is the contract's verification entry point.
    OnVerification,
    /// The annotated method is read-only (`safe` in the ABI).
    Safe,
    /// Manifest configuration on the contract class.
    Manifest(ManifestPragma),
}

/// All pragmas of a compilation, keyed by fully qualified symbol.
#[derive(Debug, Clone, Default)]
pub struct Pragmas {
    map: HashMap<String, Vec<PragmaEffect>>,
}

impl Pragmas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an effect to a class (`pkg.Class`), a method
    /// (`pkg.Class#method`), or a field (`pkg.Class#field`).
    pub fn add(&mut self, symbol: impl Into<String>, effect: PragmaEffect) -> &mut Self {
        self.map.entry(symbol.into()).or_default().push(effect);
        self
    }

    /// All effects attached to a symbol.
    pub fn effects(&self, symbol: &str) -> &[PragmaEffect] {
        self.map.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The effects attached to a method of a class.
    pub fn method_effects(&self, class: &str, method: &str) -> &[PragmaEffect] {
        self.map
            .get(&format!("{class}#{method}"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the class carries the `Struct` pragma.
    pub fn is_struct(&self, class: &str) -> bool {
        self.effects(class)
            .iter()
            .any(|e| matches!(e, PragmaEffect::Struct))
    }

    /// Whether the class carries the `Event` pragma.
    pub fn is_event_type(&self, class: &str) -> bool {
        self.effects(class)
            .iter()
            .any(|e| matches!(e, PragmaEffect::Event))
    }

    /// The contract hash of a `ContractCall` class, if present.
    pub fn contract_hash(&self, class: &str) -> Option<&Hash160> {
        self.effects(class).iter().find_map(|e| match e {
            PragmaEffect::ContractCall(hash) => Some(hash),
            _ => None,
        })
    }

    /// The manifest configuration of the contract class, if present.
    pub fn manifest(&self, class: &str) -> Option<&ManifestPragma> {
        self.effects(class).iter().find_map(|e| match e {
            PragmaEffect::Manifest(pragma) => Some(pragma),
            _ => None,
        })
    }

    /// The display-name override of an event field, if present.
    pub fn event_display_name(&self, class: &str, field: &str) -> Option<&str> {
        self.map
            .get(&format!("{class}#{field}"))
            .and_then(|effects| {
                effects.iter().find_map(|e| match e {
                    PragmaEffect::EventDisplayName(name) => Some(name.as_str()),
                    _ => None,
                })
            })
    }
}
