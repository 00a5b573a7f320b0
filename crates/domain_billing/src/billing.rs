//! Billing events
//!
//! A billing is one association-wide charging event: the annual road fee,
//! an extra charge for maintenance work, or some other one-off cost. Its
//! total amount is split across all properties at issuance.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Amount, BillingId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;

/// Category of a billing event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    /// The recurring annual fee
    AnnualFee,
    /// A one-off extra charge
    ExtraCharge,
    /// Anything else
    Other,
}

impl BillingType {
    /// Returns the canonical string form used in the database and at the API
    /// boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingType::AnnualFee => "ANNUAL_FEE",
            BillingType::ExtraCharge => "EXTRA_CHARGE",
            BillingType::Other => "OTHER",
        }
    }
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANNUAL_FEE" => Ok(BillingType::AnnualFee),
            "EXTRA_CHARGE" => Ok(BillingType::ExtraCharge),
            "OTHER" => Ok(BillingType::Other),
            other => Err(BillingError::InvalidBillingType(other.to_string())),
        }
    }
}

/// An association-wide charging event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Billing {
    /// Unique identifier
    pub id: BillingId,
    /// Calendar year the billing belongs to
    pub year: i32,
    /// Free-text description shown on invoices
    pub description: String,
    /// Total amount to split across all properties
    pub total_amount: Amount,
    /// Optional extra charge, allocated by the same weights
    pub extra_charge: Option<Amount>,
    /// Date the billing was issued
    pub issue_date: NaiveDate,
    /// Due date copied onto every invoice at issuance
    pub due_date: NaiveDate,
    /// Category tag
    pub billing_type: BillingType,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// Data for creating a billing; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewBilling {
    pub year: i32,
    pub description: String,
    pub total_amount: Amount,
    pub extra_charge: Option<Amount>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub billing_type: BillingType,
}

impl Billing {
    /// Applies an update payload in place
    ///
    /// Once invoices exist for this billing, changing the amounts without
    /// regenerating the invoices leaves them stale. That guard is the
    /// caller's responsibility.
    pub fn apply(&mut self, details: NewBilling) {
        self.year = details.year;
        self.description = details.description;
        self.total_amount = details.total_amount;
        self.extra_charge = details.extra_charge;
        self.issue_date = details.issue_date;
        self.due_date = details.due_date;
        self.billing_type = details.billing_type;
        self.updated_at = Some(Utc::now());
    }
}
