use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::guarantors::{GuarantorRegistry, GuarantorShare};
use crate::state::LoanLedgerState;

/// loan terms fixed at origination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// flat rate charged once on the principal
    #[serde(default)]
    pub interest_rate: Rate,
    /// explicit repayable total; overrides `interest_rate` when present
    #[serde(default)]
    pub total_repayable: Option<Money>,
    #[serde(default)]
    pub guarantor_advance: Money,
    #[serde(default)]
    pub guarantors: Vec<GuarantorShare>,
}

impl LoanTerms {
    /// flat-rate loan without a guarantor
    pub fn flat_rate(principal: Money, interest_rate: Rate) -> Self {
        Self {
            principal,
            interest_rate,
            total_repayable: None,
            guarantor_advance: Money::ZERO,
            guarantors: Vec::new(),
        }
    }

    /// flat-rate loan with a single guarantor fronting `advance`
    pub fn guaranteed(
        principal: Money,
        interest_rate: Rate,
        advance: Money,
        guarantor: GuarantorShare,
    ) -> Self {
        Self {
            principal,
            interest_rate,
            total_repayable: None,
            guarantor_advance: advance,
            guarantors: vec![GuarantorShare {
                percentage: Decimal::ONE_HUNDRED,
                ..guarantor
            }],
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let terms: LoanTerms = serde_json::from_str(json)?;
        terms.validate()?;
        Ok(terms)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// principal plus flat interest, unless given explicitly
    pub fn total_repayable(&self) -> Result<Money> {
        if let Some(total) = self.total_repayable {
            return Ok(total);
        }
        self.principal
            .checked_share(self.interest_rate)
            .and_then(|interest| self.principal.checked_add(interest))
            .ok_or_else(|| LoanError::CalculationError {
                message: format!(
                    "total repayable overflows for principal {} at {}",
                    self.principal, self.interest_rate
                ),
            })
    }

    pub fn total_interest_due(&self) -> Result<Money> {
        Ok(self.total_repayable()? - self.principal)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interest_rate.is_negative() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("interest rate cannot be negative: {}", self.interest_rate),
            });
        }
        self.initial_state()?;
        self.registry()?;
        Ok(())
    }

    pub fn initial_state(&self) -> Result<LoanLedgerState> {
        LoanLedgerState::originate(self.principal, self.total_repayable()?, self.guarantor_advance)
    }

    pub fn registry(&self) -> Result<GuarantorRegistry> {
        GuarantorRegistry::new(self.guarantor_advance, self.guarantors.clone())
    }
}
