use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, MONEY_DP};
use crate::errors::{LoanError, Result};
use crate::types::GuarantorId;

/// a loan never has more guarantors than this
pub const MAX_GUARANTORS: usize = 3;

/// guarantor terms fixed at origination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuarantorShare {
    pub guarantor_id: GuarantorId,
    pub name: String,
    /// account credited with reimbursements
    pub account_id: String,
    /// share of the advance, 0 < percentage <= 100
    pub percentage: Decimal,
}

impl GuarantorShare {
    pub fn new(name: impl Into<String>, account_id: impl Into<String>, percentage: Decimal) -> Self {
        Self {
            guarantor_id: Uuid::new_v4(),
            name: name.into(),
            account_id: account_id.into(),
            percentage,
        }
    }
}

/// what a guarantor put in and what has come back so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuarantorPosition {
    pub share: GuarantorShare,
    pub contributed: Money,
    pub reimbursed: Money,
}

impl GuarantorPosition {
    pub fn remaining_owed(&self) -> Money {
        self.contributed.saturating_sub(self.reimbursed)
    }

    pub fn is_repaid(&self) -> bool {
        self.reimbursed.reaches(self.contributed)
    }
}

/// one guarantor's slice of a reimbursement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuarantorCredit {
    pub guarantor_id: GuarantorId,
    pub account_id: String,
    pub amount: Money,
}

/// guarantors of one loan and how much each is still owed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GuarantorRegistry {
    positions: Vec<GuarantorPosition>,
}

impl GuarantorRegistry {
    /// split `advance` across `shares`; the last guarantor absorbs rounding
    pub fn new(advance: Money, shares: Vec<GuarantorShare>) -> Result<Self> {
        validate_shares(advance, &shares)?;

        let mut positions = Vec::with_capacity(shares.len());
        let mut allotted = Money::ZERO;
        let last = shares.len().saturating_sub(1);

        for (i, share) in shares.into_iter().enumerate() {
            let contributed = if i == last {
                advance - allotted
            } else {
                floor_share(advance, share.percentage)
            };
            allotted += contributed;
            positions.push(GuarantorPosition {
                share,
                contributed,
                reimbursed: Money::ZERO,
            });
        }

        Ok(Self { positions })
    }

    pub fn positions(&self) -> &[GuarantorPosition] {
        &self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn total_contributed(&self) -> Money {
        self.positions.iter().map(|p| p.contributed).sum()
    }

    pub fn total_reimbursed(&self) -> Money {
        self.positions.iter().map(|p| p.reimbursed).sum()
    }

    pub fn total_owed(&self) -> Money {
        self.positions.iter().map(|p| p.remaining_owed()).sum()
    }

    pub fn position(&self, guarantor_id: GuarantorId) -> Option<&GuarantorPosition> {
        self.positions.iter().find(|p| p.share.guarantor_id == guarantor_id)
    }

    /// split a reimbursement across guarantors by their share of the advance
    ///
    /// Each guarantor is capped at what they are still owed. Cents lost to
    /// rounding, and anything a capped guarantor could not take, go to the
    /// remaining guarantors in registry order.
    pub fn distribute(&self, amount: Money) -> Result<Vec<GuarantorCredit>> {
        if amount.is_negative() {
            return Err(LoanError::CalculationError {
                message: format!("cannot distribute negative reimbursement {}", amount),
            });
        }
        if amount.is_zero() {
            return Ok(Vec::new());
        }

        let owed = self.total_owed();
        if amount > owed {
            return Err(LoanError::CalculationError {
                message: format!("reimbursement {} exceeds guarantor debt {}", amount, owed),
            });
        }

        let mut allocations: Vec<Money> = self
            .positions
            .iter()
            .map(|p| floor_share(amount, p.share.percentage).min(p.remaining_owed()))
            .collect();

        let mut residual = amount - allocations.iter().copied().sum::<Money>();
        for (position, allocated) in self.positions.iter().zip(allocations.iter_mut()) {
            if residual.is_zero() {
                break;
            }
            let room = position.remaining_owed().saturating_sub(*allocated);
            let extra = residual.min(room);
            *allocated += extra;
            residual -= extra;
        }

        Ok(self
            .positions
            .iter()
            .zip(allocations)
            .filter(|(_, amount)| amount.is_positive())
            .map(|(position, amount)| GuarantorCredit {
                guarantor_id: position.share.guarantor_id,
                account_id: position.share.account_id.clone(),
                amount,
            })
            .collect())
    }

    /// registry after the given credits have been paid out
    pub fn apply_credits(&self, credits: &[GuarantorCredit]) -> Result<Self> {
        let mut next = self.clone();

        for credit in credits {
            let position = next
                .positions
                .iter_mut()
                .find(|p| p.share.guarantor_id == credit.guarantor_id)
                .ok_or_else(|| LoanError::CalculationError {
                    message: format!("unknown guarantor {}", credit.guarantor_id),
                })?;

            if credit.amount > position.remaining_owed() {
                return Err(LoanError::CalculationError {
                    message: format!(
                        "credit {} exceeds {} still owed to guarantor {}",
                        credit.amount,
                        position.remaining_owed(),
                        credit.guarantor_id
                    ),
                });
            }
            position.reimbursed += credit.amount;
        }

        Ok(next)
    }
}

fn floor_share(amount: Money, percentage: Decimal) -> Money {
    let raw = amount.as_decimal() * percentage / Decimal::ONE_HUNDRED;
    Money::from_decimal(raw.round_dp_with_strategy(MONEY_DP, RoundingStrategy::ToZero))
}

fn validate_shares(advance: Money, shares: &[GuarantorShare]) -> Result<()> {
    if shares.len() > MAX_GUARANTORS {
        return Err(LoanError::InvalidGuarantorShares {
            message: format!("at most {} guarantors, got {}", MAX_GUARANTORS, shares.len()),
        });
    }

    if shares.is_empty() {
        if advance.is_positive() {
            return Err(LoanError::InvalidGuarantorShares {
                message: format!("advance of {} needs at least one guarantor", advance),
            });
        }
        return Ok(());
    }

    if let Some(share) = shares.iter().find(|s| s.percentage <= Decimal::ZERO) {
        return Err(LoanError::InvalidGuarantorShares {
            message: format!("{} has non-positive share {}", share.name, share.percentage),
        });
    }

    let total: Decimal = shares.iter().map(|s| s.percentage).sum();
    if total != Decimal::ONE_HUNDRED {
        return Err(LoanError::InvalidGuarantorShares {
            message: format!("shares sum to {}%, expected 100%", total),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sixty_forty() -> GuarantorRegistry {
        GuarantorRegistry::new(
            Money::from_major(500),
            vec![
                GuarantorShare::new("alice", "ACC-A", dec!(60)),
                GuarantorShare::new("bob", "ACC-B", dec!(40)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_contributions_follow_percentages() {
        let registry = sixty_forty();

        assert_eq!(registry.positions()[0].contributed, Money::from_major(300));
        assert_eq!(registry.positions()[1].contributed, Money::from_major(200));
        assert_eq!(registry.total_owed(), Money::from_major(500));
    }

    #[test]
    fn test_proportional_split() {
        let registry = sixty_forty();
        let credits = registry.distribute(Money::from_major(250)).unwrap();

        assert_eq!(credits.len(), 2);
        assert_eq!(credits[0].amount, Money::from_major(150));
        assert_eq!(credits[0].account_id, "ACC-A");
        assert_eq!(credits[1].amount, Money::from_major(100));
        assert_eq!(credits[1].account_id, "ACC-B");
    }

    #[test]
    fn test_rounding_residual_lands_on_first_guarantor() {
        let registry = GuarantorRegistry::new(
            Money::from_major(300),
            vec![
                GuarantorShare::new("a", "ACC-A", dec!(33.34)),
                GuarantorShare::new("b", "ACC-B", dec!(33.33)),
                GuarantorShare::new("c", "ACC-C", dec!(33.33)),
            ],
        )
        .unwrap();

        let credits = registry.distribute(Money::from(dec!(0.10))).unwrap();
        let total: Money = credits.iter().map(|c| c.amount).sum();

        assert_eq!(total, Money::from(dec!(0.10)));
        assert_eq!(credits[0].amount, Money::from(dec!(0.04)));
    }

    #[test]
    fn test_capped_guarantor_overflow_goes_to_others() {
        let registry = sixty_forty();
        // bob already fully repaid, alice owed 100
        let registry = registry
            .apply_credits(&[
                GuarantorCredit {
                    guarantor_id: registry.positions()[0].share.guarantor_id,
                    account_id: "ACC-A".to_string(),
                    amount: Money::from_major(200),
                },
                GuarantorCredit {
                    guarantor_id: registry.positions()[1].share.guarantor_id,
                    account_id: "ACC-B".to_string(),
                    amount: Money::from_major(200),
                },
            ])
            .unwrap();

        let credits = registry.distribute(Money::from_major(100)).unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].account_id, "ACC-A");
        assert_eq!(credits[0].amount, Money::from_major(100));

        let repaid = registry.apply_credits(&credits).unwrap();
        assert!(repaid.positions().iter().all(|p| p.is_repaid()));
        assert_eq!(repaid.total_owed(), Money::ZERO);
    }

    #[test]
    fn test_distribute_more_than_owed_fails() {
        let registry = sixty_forty();
        assert!(registry.distribute(Money::from_major(501)).is_err());
        assert!(registry.distribute(Money::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_share_validation() {
        let too_many = (0..4)
            .map(|i| GuarantorShare::new(format!("g{}", i), "ACC", dec!(25)))
            .collect();
        assert!(GuarantorRegistry::new(Money::from_major(500), too_many).is_err());

        let short = vec![GuarantorShare::new("a", "ACC-A", dec!(90))];
        assert!(GuarantorRegistry::new(Money::from_major(500), short).is_err());

        let zero = vec![
            GuarantorShare::new("a", "ACC-A", dec!(100)),
            GuarantorShare::new("b", "ACC-B", dec!(0)),
        ];
        assert!(GuarantorRegistry::new(Money::from_major(500), zero).is_err());

        assert!(GuarantorRegistry::new(Money::from_major(500), Vec::new()).is_err());
        assert!(GuarantorRegistry::new(Money::ZERO, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_last_guarantor_absorbs_rounding() {
        let registry = GuarantorRegistry::new(
            Money::from(dec!(100.01)),
            vec![
                GuarantorShare::new("a", "ACC-A", dec!(50)),
                GuarantorShare::new("b", "ACC-B", dec!(50)),
            ],
        )
        .unwrap();

        assert_eq!(registry.positions()[0].contributed, Money::from(dec!(50.00)));
        assert_eq!(registry.positions()[1].contributed, Money::from(dec!(50.01)));
        assert_eq!(registry.total_contributed(), Money::from(dec!(100.01)));
    }
}
