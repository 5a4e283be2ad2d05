use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of an executed opportunity. Forward-only:
/// pending -> purchased -> sold -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Purchased,
    Sold,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Purchased => "purchased",
            TransactionStatus::Sold => "sold",
            TransactionStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(TransactionStatus::Pending),
            "purchased" => Some(TransactionStatus::Purchased),
            "sold" => Some(TransactionStatus::Sold),
            "completed" => Some(TransactionStatus::Completed),
            _ => None,
        }
    }

    /// Only the next step in the chain is a legal transition.
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Purchased)
                | (TransactionStatus::Purchased, TransactionStatus::Sold)
                | (TransactionStatus::Sold, TransactionStatus::Completed)
        )
    }
}

/// An opportunity the caller chose to execute, persisted for its whole
/// status lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub product_name: String,
    pub source_platform: String,
    pub target_platform: String,
    pub source_price: f64,
    pub target_price: f64,
    /// USD actually committed to the purchase (capped by the budget ledger).
    pub amount_usd: f64,
    pub expected_profit: f64,
    pub roi_percentage: f64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Purchased,
            TransactionStatus::Sold,
            TransactionStatus::Completed,
        ] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TransactionStatus::parse("cancelled"), None);
    }

    #[test]
    fn lifecycle_is_forward_only() {
        use TransactionStatus::*;
        assert!(Pending.can_advance_to(Purchased));
        assert!(Purchased.can_advance_to(Sold));
        assert!(Sold.can_advance_to(Completed));

        assert!(!Pending.can_advance_to(Sold));
        assert!(!Purchased.can_advance_to(Pending));
        assert!(!Completed.can_advance_to(Pending));
        assert!(!Pending.can_advance_to(Pending));
    }
}
