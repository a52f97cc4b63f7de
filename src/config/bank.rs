use serde::{Deserialize, Serialize};

/// The cooperative's own collection account, shown to members when they
/// make transfers. Display-only; nothing in the ledger reads it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BankDisplayConfig {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
}

impl Default for BankDisplayConfig {
    fn default() -> Self {
        BankDisplayConfig {
            account_name: "Umoja Savings Cooperative".to_string(),
            account_number: "0100004521833".to_string(),
            bank_name: "Cooperative Bank".to_string(),
        }
    }
}
