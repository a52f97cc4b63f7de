use serde::{Deserialize, Serialize};

use crate::types::ids::MemberId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Member {
    pub id: MemberId,
    pub membership_number: String,
    pub status: MemberStatus,
    pub role: MemberRole,
    pub joined_at: Timestamp,
    pub activated_at: Option<Timestamp>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    Member,
    Admin,
}

impl Member {
    /// New signups start Pending; only a confirmed registration payment
    /// moves them to Active.
    pub fn new(membership_number: String) -> Self {
        Member {
            id: MemberId::new(),
            membership_number,
            status: MemberStatus::Pending,
            role: MemberRole::Member,
            joined_at: Timestamp::now(),
            activated_at: None,
        }
    }

    pub fn can_transact(&self) -> bool {
        self.status == MemberStatus::Active
    }
}
