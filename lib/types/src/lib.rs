mod block;
pub use block::{Block, BlockError, ContractSubmission, ProcessedTx, RewardEntry, StateChange};

mod id;
pub use id::BlockId;

pub mod standards;

/// Checks whether a string has the shape of a Lamden account address:
/// exactly 64 characters, all of them hex digits.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 64 && address.bytes().all(|b| b.is_ascii_hexdigit())
}
