//! In-memory implementations of the persistence ports
//!
//! These adapters back the domain service tests without a database. They
//! mimic the SQL adapters' contract: ids are assigned on insert, the
//! per-year sequence counter only advances when the batch insert succeeds,
//! and duplicate invoice numbers or references are rejected as conflicts.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use core_kernel::{BillingId, InvoiceId, PaymentId, PropertyId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use domain_billing::{
    Billing, BillingStore, Invoice, InvoiceStatus, InvoiceStore, NewBilling, NewInvoice,
    NewPayment, Payment, PaymentStore, Property, PropertyStore, StoreError,
};

/// In-memory billing store
#[derive(Default)]
pub struct InMemoryBillings {
    rows: Mutex<HashMap<i64, Billing>>,
    next_id: AtomicI64,
}

impl InMemoryBillings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillings {
    async fn find(&self, id: BillingId) -> Result<Option<Billing>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id.value()).cloned())
    }

    async fn list_by_year(&self, year: i32) -> Result<Vec<Billing>, StoreError> {
        let mut billings: Vec<Billing> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.year == year)
            .cloned()
            .collect();
        billings.sort_by_key(|b| b.id);
        Ok(billings)
    }

    async fn insert(&self, billing: NewBilling) -> Result<Billing, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Billing {
            id: BillingId::new(id),
            year: billing.year,
            description: billing.description,
            total_amount: billing.total_amount,
            extra_charge: billing.extra_charge,
            issue_date: billing.issue_date,
            due_date: billing.due_date,
            billing_type: billing.billing_type,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.rows.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, billing: &Billing) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&billing.id.value()) {
            Some(row) => {
                *row = billing.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Billing", billing.id)),
        }
    }

    async fn delete(&self, id: BillingId) -> Result<(), StoreError> {
        match self.rows.lock().unwrap().remove(&id.value()) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("Billing", id)),
        }
    }
}

/// In-memory property store
#[derive(Default)]
pub struct InMemoryProperties {
    rows: Mutex<Vec<Property>>,
}

impl InMemoryProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a property
    pub fn add(&self, property: Property) {
        self.rows.lock().unwrap().push(property);
    }
}

#[async_trait]
impl PropertyStore for InMemoryProperties {
    async fn find(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Property>, StoreError> {
        let mut properties = self.rows.lock().unwrap().clone();
        properties.sort_by_key(|p| p.id);
        Ok(properties)
    }
}

/// In-memory invoice store with a per-year sequence counter
#[derive(Default)]
pub struct InMemoryInvoices {
    rows: Mutex<HashMap<i64, Invoice>>,
    counters: Mutex<HashMap<i32, u32>>,
    next_id: AtomicI64,
}

impl InMemoryInvoices {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self, mut invoices: Vec<Invoice>) -> Vec<Invoice> {
        invoices.sort_by_key(|i| i.id);
        invoices
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoices {
    async fn find(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id.value()).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Invoice>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|i| i.reference == reference)
            .cloned())
    }

    async fn list_by_billing(&self, id: BillingId) -> Result<Vec<Invoice>, StoreError> {
        let invoices = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.billing_id == id)
            .cloned()
            .collect();
        Ok(self.sorted(invoices))
    }

    async fn list_by_property(&self, id: PropertyId) -> Result<Vec<Invoice>, StoreError> {
        let invoices = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.property_id == id)
            .cloned()
            .collect();
        Ok(self.sorted(invoices))
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, StoreError> {
        let invoices = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect();
        Ok(self.sorted(invoices))
    }

    async fn count_by_billing(&self, id: BillingId) -> Result<u64, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.billing_id == id)
            .count() as u64)
    }

    async fn insert_all(
        &self,
        year: i32,
        invoices: Vec<NewInvoice>,
    ) -> Result<Vec<Invoice>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let mut counters = self.counters.lock().unwrap();

        // Sequences advance on a local copy; the counter and the rows commit
        // together, so a failed batch leaves both untouched.
        let mut sequence = counters.get(&year).copied().unwrap_or(0);

        let mut created = Vec::with_capacity(invoices.len());
        for draft in invoices {
            sequence += 1;
            let (invoice_number, reference) = draft
                .numbering(year, sequence)
                .map_err(|e| StoreError::conflict(e.to_string()))?;

            if rows
                .values()
                .any(|i| i.invoice_number == invoice_number || i.reference == reference)
            {
                return Err(StoreError::conflict(format!(
                    "duplicate invoice number or reference: {invoice_number}"
                )));
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            created.push(Invoice {
                id: InvoiceId::new(id),
                billing_id: draft.billing_id,
                property_id: draft.property_id,
                amount: draft.amount,
                due_date: draft.due_date,
                invoice_number,
                reference,
                status: InvoiceStatus::Created,
                document: None,
                created_at: Utc::now(),
                updated_at: None,
            });
        }

        counters.insert(year, sequence);
        for invoice in &created {
            rows.insert(invoice.id.value(), invoice.clone());
        }
        Ok(created)
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&invoice.id.value()) {
            Some(row) => {
                *row = invoice.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Invoice", invoice.id)),
        }
    }
}

/// In-memory payment store
#[derive(Default)]
pub struct InMemoryPayments {
    rows: Mutex<HashMap<i64, Payment>>,
    next_id: AtomicI64,
}

impl InMemoryPayments {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPayments {
    async fn find(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id.value()).cloned())
    }

    async fn list_by_invoice(&self, id: InvoiceId) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.invoice_id == id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.id);
        Ok(payments)
    }

    async fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.payment_date >= from && p.payment_date <= to)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.id);
        Ok(payments)
    }

    async fn insert(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Payment {
            id: PaymentId::new(id),
            invoice_id: payment.invoice_id,
            amount: payment.amount,
            payment_date: payment.payment_date,
            method: payment.method,
            comment: payment.comment,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&payment.id.value()) {
            Some(row) => {
                *row = payment.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Payment", payment.id)),
        }
    }

    async fn delete(&self, id: PaymentId) -> Result<(), StoreError> {
        match self.rows.lock().unwrap().remove(&id.value()) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("Payment", id)),
        }
    }
}
