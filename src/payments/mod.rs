//! Payment requests for the Premium upgrade.

pub mod desk;
pub mod ledger;

pub use desk::{PaymentDesk, PaymentStats, MIN_PHONE_LEN};
pub use ledger::{PaymentLedger, PaymentMethod, PaymentRequest, PaymentStatus};
