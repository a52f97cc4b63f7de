use uuid::Uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-level identity of a document, independent of which collection it
/// lives in. Typed ids share the underlying UUID so lookups stay stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(DocumentId(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok($name(Uuid::parse_str(s)?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for DocumentId {
            fn from(id: $name) -> DocumentId {
                DocumentId(id.0)
            }
        }
    };
}

define_id_type!(MemberId);
define_id_type!(EntryId);
define_id_type!(LoanId);
define_id_type!(PaymentId);
define_id_type!(WithdrawalId);
define_id_type!(FileId);
