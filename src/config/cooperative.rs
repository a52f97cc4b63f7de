use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CooperativeConfig {
    /// One-time fee gating member activation, in minor units.
    pub registration_fee_minor: i64,
    pub currency: String,
}

impl CooperativeConfig {
    pub fn registration_fee(&self) -> Amount {
        Amount::from_minor(self.registration_fee_minor)
    }
}

impl Default for CooperativeConfig {
    fn default() -> Self {
        CooperativeConfig {
            registration_fee_minor: 500_000,  // KES 5,000.00
            currency: "KES".to_string(),
        }
    }
}
