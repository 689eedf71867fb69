//! Rider payout types (banks, account verification, withdrawals)

use serde::{Deserialize, Serialize};

/// Bank as listed by the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
}

/// A payout destination account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub account_number: String,
    pub bank_code: String,
    /// Resolved by account verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// One withdrawal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: Option<String>,
    pub rider_id: String,
    /// Amount in naira
    pub amount: f64,
    pub status: WithdrawalStatus,
    pub account: PayoutAccount,
    /// Unix millis
    pub created_at: i64,
}

/// Initiate withdrawal payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub rider_id: String,
    pub amount: f64,
    pub account: PayoutAccount,
}
