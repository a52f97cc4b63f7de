use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Disbursement destination supplied by the member. Display-only metadata;
/// the actual transfer happens outside the system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
}

impl BankDetails {
    pub fn validate(&self) -> Result<()> {
        if self.account_name.trim().is_empty() {
            return Err(Error::IncompleteBankDetails { field: "account_name" });
        }
        if self.account_number.trim().is_empty() {
            return Err(Error::IncompleteBankDetails { field: "account_number" });
        }
        if self.bank_name.trim().is_empty() {
            return Err(Error::IncompleteBankDetails { field: "bank_name" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_fields() {
        let details = BankDetails {
            account_name: "A Member".to_string(),
            account_number: "  ".to_string(),
            bank_name: "Coop Bank".to_string(),
        };
        assert!(matches!(
            details.validate(),
            Err(Error::IncompleteBankDetails { field: "account_number" })
        ));
    }
}
