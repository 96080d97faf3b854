//! repository operations

pub mod add;
pub mod checkout;
pub mod verify;

pub use add::{add, AddOutcome};
pub use checkout::checkout;
pub use verify::{verify, VerifyReport};
