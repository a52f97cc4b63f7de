pub mod amount;
pub mod bank;
pub mod ids;
pub mod loan;
pub mod member;
pub mod payment;
pub mod savings;
pub mod timestamp;
pub mod withdrawal;
