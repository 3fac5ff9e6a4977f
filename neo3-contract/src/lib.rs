//! The NEF executable container and the contract manifest model.

pub mod call_flags;
pub mod error;
pub mod manifest;
pub mod method_token;
pub mod nef;

pub use call_flags::CallFlags;
pub use error::{ContractError, ContractResult};
pub use manifest::{
    ContractAbi, ContractEvent, ContractGroup, ContractManifest, ContractMethod,
    ContractParameterDef, ContractPermission,
};
pub use method_token::MethodToken;
pub use nef::NefFile;
