// Governance base types
// Principle: Minimal, auditable, durable

pub mod primitives;
pub mod account;
pub mod call;

pub use primitives::*;
pub use account::*;
pub use call::*;
