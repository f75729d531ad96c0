use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{GuarantorId, LoanId};

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        principal: Money,
        total_repayable: Money,
        guarantor_advance: Money,
        timestamp: DateTime<Utc>,
    },
    LoanCompleted {
        loan_id: LoanId,
        total_paid: Money,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        loan_id: LoanId,
        amount: Money,
        applied_to_interest: Money,
        applied_to_guarantor: Money,
        applied_to_principal: Money,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRejected {
        loan_id: LoanId,
        amount: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    OverpaymentClamped {
        loan_id: LoanId,
        requested: Money,
        applied: Money,
        excess: Money,
        timestamp: DateTime<Utc>,
    },

    // guarantor events
    GuarantorReimbursed {
        loan_id: LoanId,
        guarantor_id: GuarantorId,
        amount: Money,
        remaining_owed: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanOriginated { loan_id, .. }
            | Event::LoanCompleted { loan_id, .. }
            | Event::PaymentReceived { loan_id, .. }
            | Event::PaymentRejected { loan_id, .. }
            | Event::OverpaymentClamped { loan_id, .. }
            | Event::GuarantorReimbursed { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
