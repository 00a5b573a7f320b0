//! Billing domain services
//!
//! The services orchestrate the entities, the allocation engine, and the
//! reference generator over the persistence ports. Each public operation
//! maps to one unit of work; the SQL adapters make the multi-row steps
//! (invoice batch insert, sequence reservation) atomic.

use chrono::{NaiveDate, Utc};
use core_kernel::{Amount, BillingId, InvoiceId, PaymentId, PropertyId};
use std::sync::Arc;
use tracing::{debug, info};

use crate::allocation::{allocate, total_shares};
use crate::billing::{Billing, NewBilling};
use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus, NewInvoice};
use crate::payment::{NewPayment, Payment, PaymentMethod, PaymentUpdate};
use crate::ports::{BillingStore, InvoiceStore, PaymentStore, PropertyStore};
use crate::reference;

/// Service for managing billing events
pub struct BillingService {
    billings: Arc<dyn BillingStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl BillingService {
    /// Creates a new billing service
    pub fn new(billings: Arc<dyn BillingStore>, invoices: Arc<dyn InvoiceStore>) -> Self {
        Self { billings, invoices }
    }

    /// Fetches a billing by id
    pub async fn get(&self, id: BillingId) -> Result<Billing, BillingError> {
        self.billings
            .find(id)
            .await?
            .ok_or(BillingError::BillingNotFound(id))
    }

    /// Lists billings for a year
    pub async fn list_by_year(&self, year: i32) -> Result<Vec<Billing>, BillingError> {
        Ok(self.billings.list_by_year(year).await?)
    }

    /// Creates a billing
    ///
    /// The total amount and the extra charge must both be non-negative.
    pub async fn create(&self, billing: NewBilling) -> Result<Billing, BillingError> {
        validate_amounts(&billing)?;
        let created = self.billings.insert(billing).await?;
        info!(billing_id = %created.id, year = created.year, "created billing");
        Ok(created)
    }

    /// Updates a billing in place
    ///
    /// If invoices already exist for the billing, the caller is responsible
    /// for regenerating them after changing the amounts.
    pub async fn update(
        &self,
        id: BillingId,
        details: NewBilling,
    ) -> Result<Billing, BillingError> {
        validate_amounts(&details)?;
        let mut billing = self.get(id).await?;
        billing.apply(details);
        self.billings.update(&billing).await?;
        Ok(billing)
    }

    /// Deletes a billing
    ///
    /// Refused while any invoice still references the billing.
    pub async fn delete(&self, id: BillingId) -> Result<(), BillingError> {
        let billing = self.get(id).await?;
        if self.invoices.count_by_billing(billing.id).await? > 0 {
            return Err(BillingError::BillingHasInvoices(id));
        }
        self.billings.delete(id).await?;
        info!(billing_id = %id, "deleted billing");
        Ok(())
    }
}

fn validate_amounts(billing: &NewBilling) -> Result<(), BillingError> {
    Amount::non_negative(billing.total_amount.value())?;
    if let Some(extra) = billing.extra_charge {
        Amount::non_negative(extra.value())?;
    }
    Ok(())
}

/// Service for invoice issuance and lifecycle
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    billings: Arc<dyn BillingStore>,
    properties: Arc<dyn PropertyStore>,
}

impl InvoiceService {
    /// Creates a new invoice service
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        billings: Arc<dyn BillingStore>,
        properties: Arc<dyn PropertyStore>,
    ) -> Self {
        Self {
            invoices,
            billings,
            properties,
        }
    }

    /// Issues one invoice per property for a billing
    ///
    /// Each property's amount comes from the allocation engine. The invoice
    /// number and payment reference use the next sequence number from the
    /// per-year counter, which is shared across all billings of that year
    /// and reserved by the store inside the same transaction as the batch
    /// insert, so a failed issuance leaves no gap in the year's numbering.
    ///
    /// Issuance is not idempotent: running it twice for the same billing
    /// creates a second set of invoices. Callers guard against that.
    ///
    /// # Errors
    ///
    /// Returns `BillingNotFound` if the billing does not exist; no invoices
    /// are created in that case. A billing with zero properties succeeds
    /// with an empty result.
    pub async fn issue_invoices(&self, billing_id: BillingId) -> Result<Vec<Invoice>, BillingError> {
        let billing = self
            .billings
            .find(billing_id)
            .await?
            .ok_or(BillingError::BillingNotFound(billing_id))?;

        let properties = self.properties.list_all().await?;
        if properties.is_empty() {
            debug!(billing_id = %billing_id, "no properties to bill");
            return Ok(Vec::new());
        }

        let denominator = total_shares(&properties);

        let mut drafts = Vec::with_capacity(properties.len());
        for property in &properties {
            reference::ensure_property_id_fits(property.id)?;
            let amount = allocate(
                billing.total_amount,
                property.share_ratio,
                denominator,
                billing.extra_charge,
            )?;

            drafts.push(NewInvoice {
                billing_id: billing.id,
                property_id: property.id,
                amount,
                due_date: billing.due_date,
            });
        }

        let created = self.invoices.insert_all(billing.year, drafts).await?;
        info!(
            billing_id = %billing_id,
            year = billing.year,
            count = created.len(),
            "issued invoices"
        );
        Ok(created)
    }

    /// Fetches an invoice by id
    pub async fn get(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.invoices
            .find(id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(id))
    }

    /// Finds the invoice carrying a payment reference
    pub async fn find_by_reference(&self, payment_reference: &str) -> Result<Invoice, BillingError> {
        self.invoices
            .find_by_reference(payment_reference)
            .await?
            .ok_or_else(|| BillingError::NoInvoiceForReference(payment_reference.to_string()))
    }

    /// Lists invoices belonging to a billing
    pub async fn list_by_billing(&self, id: BillingId) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.invoices.list_by_billing(id).await?)
    }

    /// Lists invoices belonging to a property
    ///
    /// Fails with `PropertyNotFound` for an unknown property, so callers can
    /// distinguish "no invoices yet" from a bad identifier.
    pub async fn list_by_property(&self, id: PropertyId) -> Result<Vec<Invoice>, BillingError> {
        self.properties
            .find(id)
            .await?
            .ok_or(BillingError::PropertyNotFound(id))?;
        Ok(self.invoices.list_by_property(id).await?)
    }

    /// Lists invoices in a status
    pub async fn list_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.invoices.list_by_status(status).await?)
    }

    /// Marks an invoice as dispatched; a no-op unless it is `CREATED`
    pub async fn mark_sent(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        let mut invoice = self.get(id).await?;
        if invoice.mark_sent() {
            self.invoices.update(&invoice).await?;
            debug!(invoice_id = %id, "marked invoice sent");
        }
        Ok(invoice)
    }

    /// Cancels an invoice; refused when it is already paid
    pub async fn cancel(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        let mut invoice = self.get(id).await?;
        invoice.cancel()?;
        self.invoices.update(&invoice).await?;
        info!(invoice_id = %id, "cancelled invoice");
        Ok(invoice)
    }

    /// Moves every `SENT` invoice whose due date has passed to `OVERDUE`
    ///
    /// Invoices in any other status are left alone regardless of due date.
    /// Returns the number of invoices changed. Safe to run on any schedule.
    pub async fn sweep_overdue(&self, today: NaiveDate) -> Result<usize, BillingError> {
        let sent = self.invoices.list_by_status(InvoiceStatus::Sent).await?;

        let mut marked = 0;
        for mut invoice in sent {
            if invoice.is_past_due(today) {
                invoice.status = InvoiceStatus::Overdue;
                invoice.updated_at = Some(Utc::now());
                self.invoices.update(&invoice).await?;
                marked += 1;
            }
        }

        info!(count = marked, %today, "overdue sweep finished");
        Ok(marked)
    }

    /// Stores the rendered invoice document
    pub async fn store_document(
        &self,
        id: InvoiceId,
        document: Vec<u8>,
    ) -> Result<(), BillingError> {
        let mut invoice = self.get(id).await?;
        invoice.document = Some(document);
        invoice.updated_at = Some(Utc::now());
        self.invoices.update(&invoice).await?;
        Ok(())
    }

    /// Fetches the stored rendered document, if any
    pub async fn document(&self, id: InvoiceId) -> Result<Option<Vec<u8>>, BillingError> {
        Ok(self.get(id).await?.document)
    }
}

/// Service for payment reconciliation
///
/// Every payment mutation ends with a recomputation of the owning invoice's
/// payment-driven status from the full payment sum.
pub struct PaymentService {
    payments: Arc<dyn PaymentStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl PaymentService {
    /// Creates a new payment service
    pub fn new(payments: Arc<dyn PaymentStore>, invoices: Arc<dyn InvoiceStore>) -> Self {
        Self { payments, invoices }
    }

    /// Fetches a payment by id
    pub async fn get(&self, id: PaymentId) -> Result<Payment, BillingError> {
        self.payments
            .find(id)
            .await?
            .ok_or(BillingError::PaymentNotFound(id))
    }

    /// Lists payments recorded against an invoice
    pub async fn list_by_invoice(&self, id: InvoiceId) -> Result<Vec<Payment>, BillingError> {
        Ok(self.payments.list_by_invoice(id).await?)
    }

    /// Lists payments received in a date range
    pub async fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Payment>, BillingError> {
        Ok(self.payments.list_by_date_range(from, to).await?)
    }

    /// Registers a payment matched by its payment reference
    ///
    /// The reference is checksum-validated before any lookup; a failed
    /// checksum is an invalid argument, an unknown reference is not-found.
    pub async fn register_by_reference(
        &self,
        payment_reference: &str,
        amount: Amount,
        payment_date: NaiveDate,
        method: PaymentMethod,
        comment: Option<String>,
    ) -> Result<Payment, BillingError> {
        if !reference::validate(payment_reference) {
            return Err(BillingError::InvalidReference(
                payment_reference.to_string(),
            ));
        }

        let invoice = self
            .invoices
            .find_by_reference(payment_reference)
            .await?
            .ok_or_else(|| BillingError::NoInvoiceForReference(payment_reference.to_string()))?;

        let payment = self
            .payments
            .insert(NewPayment {
                invoice_id: invoice.id,
                amount,
                payment_date,
                method,
                comment,
            })
            .await?;

        self.reconcile(invoice.id).await?;
        info!(payment_id = %payment.id, invoice_id = %invoice.id, "registered payment by reference");
        Ok(payment)
    }

    /// Registers a payment addressed directly to an invoice
    pub async fn register_for_invoice(
        &self,
        payment: NewPayment,
    ) -> Result<Payment, BillingError> {
        let invoice_id = payment.invoice_id;
        self.invoices
            .find(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

        let created = self.payments.insert(payment).await?;
        self.reconcile(invoice_id).await?;
        info!(payment_id = %created.id, invoice_id = %invoice_id, "registered payment");
        Ok(created)
    }

    /// Updates a payment and recomputes the owning invoice's status
    pub async fn update_payment(
        &self,
        id: PaymentId,
        update: PaymentUpdate,
    ) -> Result<Payment, BillingError> {
        let mut payment = self.get(id).await?;
        payment.apply(update);
        self.payments.update(&payment).await?;
        self.reconcile(payment.invoice_id).await?;
        Ok(payment)
    }

    /// Deletes a payment and recomputes the owning invoice's status
    pub async fn delete_payment(&self, id: PaymentId) -> Result<(), BillingError> {
        let payment = self.get(id).await?;
        self.payments.delete(id).await?;
        self.reconcile(payment.invoice_id).await?;
        info!(payment_id = %id, invoice_id = %payment.invoice_id, "deleted payment");
        Ok(())
    }

    /// Recomputes an invoice's payment-driven status from the payment sum
    async fn reconcile(&self, invoice_id: InvoiceId) -> Result<(), BillingError> {
        let mut invoice = self
            .invoices
            .find(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

        let total_paid: Amount = self
            .payments
            .list_by_invoice(invoice_id)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum();

        if invoice.apply_payment_total(total_paid) {
            self.invoices.update(&invoice).await?;
            debug!(
                invoice_id = %invoice_id,
                total_paid = %total_paid,
                status = %invoice.status,
                "reconciled invoice"
            );
        }

        Ok(())
    }
}
