use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a requisition item.
///
/// Stored and serialized as `PENDING`, `APPROVED` or `REJECTED`. Input also
/// accepts the lowercase spelling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[sea_orm(string_value = "PENDING")]
    #[serde(alias = "pending")]
    Pending,

    #[sea_orm(string_value = "APPROVED")]
    #[serde(alias = "approved")]
    Approved,

    #[sea_orm(string_value = "REJECTED")]
    #[serde(alias = "rejected")]
    Rejected,
}

impl ItemStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether this item is still awaiting a decision. Only such items take
    /// part in bulk status updates.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Transition policy for single-item status changes.
    ///
    /// Permissive mode accepts every transition, including reopening a decided
    /// item. Strict mode only lets a pending item be decided; re-setting the
    /// current status is always accepted.
    #[must_use]
    pub const fn can_transition_to(self, next: Self, strict: bool) -> bool {
        if !strict || self.is_pending() {
            return true;
        }

        matches!(
            (self, next),
            (Self::Approved, Self::Approved) | (Self::Rejected, Self::Rejected)
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown item status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::Approved).unwrap(),
            "\"APPROVED\""
        );
        let parsed: ItemStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, ItemStatus::Rejected);
        assert!(serde_json::from_str::<ItemStatus>("\"cancelled\"").is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PENDING".parse::<ItemStatus>(), Ok(ItemStatus::Pending));
        assert_eq!(" approved ".parse::<ItemStatus>(), Ok(ItemStatus::Approved));
        assert!("done".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn test_permissive_policy_allows_reopening() {
        for from in ItemStatus::ALL {
            for to in ItemStatus::ALL {
                assert!(from.can_transition_to(to, false));
            }
        }
    }

    #[test]
    fn test_strict_policy() {
        use ItemStatus::{Approved, Pending, Rejected};

        assert!(Pending.can_transition_to(Approved, true));
        assert!(Pending.can_transition_to(Rejected, true));
        assert!(Approved.can_transition_to(Approved, true));

        assert!(!Approved.can_transition_to(Pending, true));
        assert!(!Approved.can_transition_to(Rejected, true));
        assert!(!Rejected.can_transition_to(Approved, true));
    }
}
