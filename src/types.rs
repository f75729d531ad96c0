use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a guarantor
pub type GuarantorId = Uuid;

/// loan status as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// accepting payments
    Active,
    /// interest, guarantor advance and repayable total all met
    Completed,
}

/// ledger entry categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryCategory {
    LoanInterest,
    GuarantorReimbursement,
    PrincipalReduction,
}

impl EntryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCategory::LoanInterest => "loan-interest",
            EntryCategory::GuarantorReimbursement => "guarantor-reimbursement",
            EntryCategory::PrincipalReduction => "principal-reduction",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LoanStatus::Active).unwrap(), "\"active\"");
        assert_eq!(serde_json::to_string(&LoanStatus::Completed).unwrap(), "\"completed\"");
    }

    #[test]
    fn test_category_names_match_serde() {
        for category in [
            EntryCategory::LoanInterest,
            EntryCategory::GuarantorReimbursement,
            EntryCategory::PrincipalReduction,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }
}
