//! Billing domain integration tests
//!
//! Exercises the services end to end over the in-memory stores: issuance,
//! payment reconciliation, the overdue sweep, and the guards around billing
//! deletion and invoice cancellation.

use chrono::NaiveDate;
use core_kernel::{Amount, PropertyId};
use rust_decimal_macros::dec;
use std::sync::Arc;

use domain_billing::{
    reference, BillingError, BillingService, InvoiceService, InvoiceStatus, InvoiceStore,
    NewInvoice, NewPayment, PaymentMethod, PaymentService,
};
use test_utils::{
    BillingBuilder, InMemoryBillings, InMemoryInvoices, InMemoryPayments, InMemoryProperties,
    PropertyBuilder,
};

struct Harness {
    properties: Arc<InMemoryProperties>,
    invoices: Arc<InMemoryInvoices>,
    billing_service: BillingService,
    invoice_service: InvoiceService,
    payment_service: PaymentService,
}

fn harness() -> Harness {
    let billings = Arc::new(InMemoryBillings::new());
    let invoices = Arc::new(InMemoryInvoices::new());
    let payments = Arc::new(InMemoryPayments::new());
    let properties = Arc::new(InMemoryProperties::new());

    Harness {
        properties: properties.clone(),
        invoices: invoices.clone(),
        billing_service: BillingService::new(billings.clone(), invoices.clone()),
        invoice_service: InvoiceService::new(invoices.clone(), billings.clone(), properties),
        payment_service: PaymentService::new(payments, invoices),
    }
}

fn seed_three_properties(harness: &Harness) {
    harness
        .properties
        .add(PropertyBuilder::new().with_id(1).with_share(dec!(1.000)).build());
    harness
        .properties
        .add(PropertyBuilder::new().with_id(2).with_share(dec!(2.000)).build());
    harness
        .properties
        .add(PropertyBuilder::new().with_id(3).with_share(dec!(1.000)).build());
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[tokio::test]
async fn issuance_creates_one_invoice_per_property() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().with_total(dec!(17000)).build())
        .await
        .unwrap();

    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();

    assert_eq!(invoices.len(), 3);
    assert_eq!(invoices[0].amount, Amount::from_major(4250));
    assert_eq!(invoices[1].amount, Amount::from_major(8500));
    assert_eq!(invoices[2].amount, Amount::from_major(4250));
    for invoice in &invoices {
        assert_eq!(invoice.status, InvoiceStatus::Created);
        assert_eq!(invoice.due_date, billing.due_date);
        assert_eq!(invoice.billing_id, billing.id);
    }
}

#[tokio::test]
async fn issuance_numbers_invoices_from_the_year_sequence() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();

    let numbers: Vec<&str> = invoices.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, vec!["2025-1", "2025-2", "2025-3"]);

    for invoice in &invoices {
        assert!(reference::validate(&invoice.reference));
        assert_eq!(
            reference::extract_property_id(&invoice.reference),
            Some(invoice.property_id)
        );
    }
}

#[tokio::test]
async fn sequence_continues_across_billings_of_the_same_year() {
    let h = harness();
    seed_three_properties(&h);

    let annual = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let extra = h
        .billing_service
        .create(
            BillingBuilder::new()
                .with_description("Road resurfacing")
                .with_total(dec!(5000))
                .build(),
        )
        .await
        .unwrap();

    h.invoice_service.issue_invoices(annual.id).await.unwrap();
    let second = h.invoice_service.issue_invoices(extra.id).await.unwrap();

    let numbers: Vec<&str> = second.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, vec!["2025-4", "2025-5", "2025-6"]);
}

#[tokio::test]
async fn issuance_rejects_a_property_outside_the_reference_range() {
    let h = harness();
    seed_three_properties(&h);
    // This id is too wide for the reference field, so the register as a
    // whole cannot be billed
    h.properties.add(
        PropertyBuilder::new()
            .with_id(10_000)
            .with_share(dec!(1.000))
            .build(),
    );

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();

    let result = h.invoice_service.issue_invoices(billing.id).await;
    assert!(matches!(result, Err(BillingError::Reference(_))));
    assert!(h
        .invoice_service
        .list_by_billing(billing.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn failed_batch_insert_returns_its_sequence_numbers() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let draft = |property_id: i64| NewInvoice {
        billing_id: billing.id,
        property_id: PropertyId::new(property_id),
        amount: Amount::from_major(100),
        due_date: date(2025, 3, 31),
    };

    // The second draft cannot be numbered, so the whole batch fails and the
    // counter must roll back with it
    let failed = h.invoices.insert_all(2025, vec![draft(1), draft(10_000)]).await;
    assert!(failed.is_err());

    let created = h
        .invoices
        .insert_all(2025, vec![draft(1), draft(2), draft(3)])
        .await
        .unwrap();

    let numbers: Vec<&str> = created.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, vec!["2025-1", "2025-2", "2025-3"]);
}

#[tokio::test]
async fn issuance_fails_for_unknown_billing() {
    let h = harness();
    seed_three_properties(&h);

    let result = h
        .invoice_service
        .issue_invoices(core_kernel::BillingId::new(999))
        .await;

    assert!(matches!(result, Err(BillingError::BillingNotFound(_))));
}

#[tokio::test]
async fn listing_invoices_for_unknown_property_is_not_found() {
    let h = harness();
    seed_three_properties(&h);

    let result = h
        .invoice_service
        .list_by_property(PropertyId::new(999))
        .await;

    assert!(matches!(result, Err(BillingError::PropertyNotFound(_))));
}

#[tokio::test]
async fn listing_invoices_by_property_returns_only_its_invoices() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    h.invoice_service.issue_invoices(billing.id).await.unwrap();

    let invoices = h
        .invoice_service
        .list_by_property(PropertyId::new(2))
        .await
        .unwrap();

    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].property_id, PropertyId::new(2));
}

#[tokio::test]
async fn issuance_with_no_properties_creates_nothing() {
    let h = harness();

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();

    assert!(invoices.is_empty());
}

#[tokio::test]
async fn extra_charge_is_allocated_on_top_of_the_total() {
    let h = harness();
    h.properties
        .add(PropertyBuilder::new().with_id(1).with_share(dec!(1.000)).build());
    h.properties
        .add(PropertyBuilder::new().with_id(2).with_share(dec!(1.000)).build());

    let billing = h
        .billing_service
        .create(
            BillingBuilder::new()
                .with_total(dec!(10000))
                .with_extra_charge(dec!(2000))
                .build(),
        )
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();

    assert_eq!(invoices[0].amount, Amount::from_major(6000));
    assert_eq!(invoices[1].amount, Amount::from_major(6000));
}

#[tokio::test]
async fn full_payment_marks_the_invoice_paid() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Sent);

    h.payment_service
        .register_by_reference(
            &invoice.reference,
            invoice.amount,
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await
        .unwrap();

    let reloaded = h.invoice_service.get(invoice.id).await.unwrap();
    assert_eq!(reloaded.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn partial_payments_accumulate_to_paid() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();

    h.payment_service
        .register_by_reference(
            &invoice.reference,
            Amount::from_major(1000),
            date(2025, 3, 10),
            PaymentMethod::BankGiro,
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::PartiallyPaid
    );

    h.payment_service
        .register_by_reference(
            &invoice.reference,
            invoice.amount - Amount::from_major(1000),
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            Some("remainder".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Paid
    );
}

#[tokio::test]
async fn overpayment_still_caps_at_paid() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();

    h.payment_service
        .register_by_reference(
            &invoice.reference,
            invoice.amount + Amount::from_major(500),
            date(2025, 3, 20),
            PaymentMethod::InstantTransfer,
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Paid
    );
}

#[tokio::test]
async fn deleting_the_only_payment_reverts_to_sent() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();

    let payment = h
        .payment_service
        .register_by_reference(
            &invoice.reference,
            invoice.amount,
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Paid
    );

    h.payment_service.delete_payment(payment.id).await.unwrap();

    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Sent
    );
}

#[tokio::test]
async fn payments_never_touch_a_cancelled_invoice() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.cancel(invoices[0].id).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Cancelled);

    h.payment_service
        .register_for_invoice(NewPayment {
            invoice_id: invoice.id,
            amount: invoice.amount,
            payment_date: date(2025, 3, 20),
            method: PaymentMethod::Manual,
            comment: Some("paid after cancellation".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Cancelled
    );
}

#[tokio::test]
async fn payment_with_bad_checksum_is_rejected() {
    let h = harness();

    let result = h
        .payment_service
        .register_by_reference(
            "250015020",
            Amount::from_major(100),
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await;

    assert!(matches!(result, Err(BillingError::InvalidReference(_))));
}

#[tokio::test]
async fn payment_with_unknown_reference_is_not_found() {
    let h = harness();

    let orphan = reference::generate(2025, PropertyId::new(15), 2).unwrap();
    let result = h
        .payment_service
        .register_by_reference(
            &orphan,
            Amount::from_major(100),
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await;

    assert!(matches!(result, Err(BillingError::NoInvoiceForReference(_))));
}

#[tokio::test]
async fn sweep_marks_only_past_due_sent_invoices() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().with_due_date(date(2025, 3, 31)).build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();

    // One SENT, one left in CREATED, one PAID
    let sent = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();
    let paid = h.invoice_service.mark_sent(invoices[2].id).await.unwrap();
    h.payment_service
        .register_by_reference(
            &paid.reference,
            paid.amount,
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await
        .unwrap();

    let marked = h.invoice_service.sweep_overdue(date(2025, 4, 1)).await.unwrap();

    assert_eq!(marked, 1);
    assert_eq!(
        h.invoice_service.get(sent.id).await.unwrap().status,
        InvoiceStatus::Overdue
    );
    assert_eq!(
        h.invoice_service.get(invoices[1].id).await.unwrap().status,
        InvoiceStatus::Created
    );
    assert_eq!(
        h.invoice_service.get(paid.id).await.unwrap().status,
        InvoiceStatus::Paid
    );
}

#[tokio::test]
async fn sweep_leaves_invoices_due_today_alone() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().with_due_date(date(2025, 3, 31)).build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    h.invoice_service.mark_sent(invoices[0].id).await.unwrap();

    let marked = h.invoice_service.sweep_overdue(date(2025, 3, 31)).await.unwrap();

    assert_eq!(marked, 0);
}

#[tokio::test]
async fn overdue_invoice_settles_to_paid_when_payment_arrives() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();
    h.invoice_service.sweep_overdue(date(2025, 4, 15)).await.unwrap();
    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Overdue
    );

    h.payment_service
        .register_by_reference(
            &invoice.reference,
            invoice.amount,
            date(2025, 4, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        h.invoice_service.get(invoice.id).await.unwrap().status,
        InvoiceStatus::Paid
    );
}

#[tokio::test]
async fn cancelling_a_paid_invoice_is_refused() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();
    h.payment_service
        .register_by_reference(
            &invoice.reference,
            invoice.amount,
            date(2025, 3, 20),
            PaymentMethod::BankGiro,
            None,
        )
        .await
        .unwrap();

    let result = h.invoice_service.cancel(invoice.id).await;

    assert!(matches!(result, Err(BillingError::CancelPaidInvoice(_))));
}

#[tokio::test]
async fn negative_billing_total_is_rejected() {
    let h = harness();

    let result = h
        .billing_service
        .create(BillingBuilder::new().with_total(dec!(-100)).build())
        .await;

    assert!(result.is_err());
    assert!(result.err().unwrap().is_invalid_argument());
}

#[tokio::test]
async fn billing_with_invoices_cannot_be_deleted() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    h.invoice_service.issue_invoices(billing.id).await.unwrap();

    let result = h.billing_service.delete(billing.id).await;
    assert!(matches!(result, Err(BillingError::BillingHasInvoices(_))));
}

#[tokio::test]
async fn billing_without_invoices_can_be_deleted() {
    let h = harness();

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    h.billing_service.delete(billing.id).await.unwrap();

    let result = h.billing_service.get(billing.id).await;
    assert!(matches!(result, Err(BillingError::BillingNotFound(_))));
}

#[tokio::test]
async fn mark_sent_is_idempotent() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();

    let first = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();
    let second = h.invoice_service.mark_sent(invoices[0].id).await.unwrap();

    assert_eq!(first.status, InvoiceStatus::Sent);
    assert_eq!(second.status, InvoiceStatus::Sent);
}

#[tokio::test]
async fn stored_document_can_be_read_back() {
    let h = harness();
    seed_three_properties(&h);

    let billing = h
        .billing_service
        .create(BillingBuilder::new().build())
        .await
        .unwrap();
    let invoices = h.invoice_service.issue_invoices(billing.id).await.unwrap();
    let invoice_id = invoices[0].id;

    assert_eq!(h.invoice_service.document(invoice_id).await.unwrap(), None);

    h.invoice_service
        .store_document(invoice_id, b"%PDF-1.7 stub".to_vec())
        .await
        .unwrap();

    assert_eq!(
        h.invoice_service.document(invoice_id).await.unwrap(),
        Some(b"%PDF-1.7 stub".to_vec())
    );
}
