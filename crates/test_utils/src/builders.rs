//! Test Data Builders
//!
//! Builder patterns for constructing test entities with sensible defaults,
//! so tests only spell out the fields they actually care about.

use chrono::NaiveDate;
use core_kernel::{Amount, PropertyId, ShareRatio};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use domain_billing::{BillingType, NewBilling, Property};

/// Builder for billing drafts
pub struct BillingBuilder {
    year: i32,
    description: String,
    total_amount: Amount,
    extra_charge: Option<Amount>,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    billing_type: BillingType,
}

impl Default for BillingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingBuilder {
    /// Creates a builder with default values: the 2025 annual fee, due at
    /// the end of March
    pub fn new() -> Self {
        Self {
            year: 2025,
            description: "Annual road fee 2025".to_string(),
            total_amount: Amount::new(dec!(17000)),
            extra_charge: None,
            issue_date: date(2025, 3, 1),
            due_date: date(2025, 3, 31),
            billing_type: BillingType::AnnualFee,
        }
    }

    /// Sets the year
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the total amount
    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total_amount = Amount::new(total);
        self
    }

    /// Sets the extra charge
    pub fn with_extra_charge(mut self, extra: Decimal) -> Self {
        self.extra_charge = Some(Amount::new(extra));
        self
    }

    /// Sets the issue date
    pub fn with_issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = date;
        self
    }

    /// Sets the due date
    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = date;
        self
    }

    /// Sets the billing type
    pub fn with_type(mut self, billing_type: BillingType) -> Self {
        self.billing_type = billing_type;
        self
    }

    /// Builds the billing draft
    pub fn build(self) -> NewBilling {
        NewBilling {
            year: self.year,
            description: self.description,
            total_amount: self.total_amount,
            extra_charge: self.extra_charge,
            issue_date: self.issue_date,
            due_date: self.due_date,
            billing_type: self.billing_type,
        }
    }
}

/// Builder for properties
pub struct PropertyBuilder {
    id: PropertyId,
    designation: String,
    share_ratio: Decimal,
    address: String,
}

impl Default for PropertyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBuilder {
    /// Creates a builder with default values
    pub fn new() -> Self {
        Self {
            id: PropertyId::new(1),
            designation: "Aspvik 1:1".to_string(),
            share_ratio: dec!(1.000),
            address: "Aspviksvagen 1".to_string(),
        }
    }

    /// Sets the property id
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = PropertyId::new(id);
        self
    }

    /// Sets the designation
    pub fn with_designation(mut self, designation: impl Into<String>) -> Self {
        self.designation = designation.into();
        self
    }

    /// Sets the ownership share
    pub fn with_share(mut self, share: Decimal) -> Self {
        self.share_ratio = share;
        self
    }

    /// Sets the street address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Builds the property
    ///
    /// # Panics
    ///
    /// Panics if the configured share is not positive.
    pub fn build(self) -> Property {
        Property {
            id: self.id,
            designation: self.designation,
            share_ratio: ShareRatio::new(self.share_ratio).expect("test share must be positive"),
            address: self.address,
            main_contact: None,
        }
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}
