//! Permissions granted to a contract call.

use bitflags::bitflags;

bitflags! {
    /// The operations a called contract is allowed to perform.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CallFlags: u8 {
        /// No permissions.
        const NONE = 0b0000_0000;
        /// The called contract may read states.
        const READ_STATES = 0b0000_0001;
        /// The called contract may write states.
        const WRITE_STATES = 0b0000_0010;
        /// The called contract may invoke another contract.
        const ALLOW_CALL = 0b0000_0100;
        /// The called contract may publish notifications.
        const ALLOW_NOTIFY = 0b0000_1000;
    }
}

impl CallFlags {
    /// Read and write states.
    pub const STATES: CallFlags = CallFlags::READ_STATES.union(CallFlags::WRITE_STATES);
    /// Read states and call other contracts.
    pub const READ_ONLY: CallFlags = CallFlags::READ_STATES.union(CallFlags::ALLOW_CALL);
    /// All permissions.
    pub const ALL: CallFlags = CallFlags::STATES
        .union(CallFlags::ALLOW_CALL)
        .union(CallFlags::ALLOW_NOTIFY);

    /// Parses a flags byte, rejecting undefined bits.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::from_bits(byte)
    }

    /// The raw flags byte.
    pub fn byte(self) -> u8 {
        self.bits()
    }
}
