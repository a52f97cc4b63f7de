use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub, Neg};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(i64);  // Signed amount in minor currency units (cents)

impl Amount {
    pub fn from_minor(value: i64) -> Self {
        Amount(value)
    }

    pub fn to_minor(&self) -> i64 {
        self.0
    }

    pub fn zero() -> Self {
        Amount(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Self {
        Amount(self.0.abs())
    }

    /// Never report a negative aggregate, even over inconsistent data.
    pub fn floor_zero(&self) -> Self {
        if self.0 < 0 { Amount(0) } else { *self }
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
