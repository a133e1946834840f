pub mod filter;
pub mod identity;
pub mod serde_helpers;
