use aerobill::model::InvoiceId;
use aerobill::store::Ledger;
use aerobill::{
    Billing, BillingError, BillingSettings, Company, FileStore, Invoice, InvoiceDraft, InvoiceEdit,
    InvoiceFilter,
    InvoiceStatus, InvoiceStore, LineItemPatch, MemoryStore, NewLineItem, NumberingStrategy,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn billing() -> Billing<MemoryStore> {
    Billing::new(MemoryStore::new(), BillingSettings::default())
}

fn march_draft(tax_rate: Decimal) -> InvoiceDraft {
    InvoiceDraft::new("Jane Traveller", "eur")
        .with_tax_rate(tax_rate)
        .issued_on(date(2025, 3, 14))
}

fn scenario_items() -> Vec<NewLineItem> {
    vec![
        NewLineItem::new("Airport transfer", dec!(2), dec!(10.00)),
        NewLineItem::new("Parking", dec!(1), dec!(5.50)),
    ]
}

fn amount_of(billing: &Billing<MemoryStore>, id: InvoiceId) -> Decimal {
    billing.get(id).unwrap().amount
}

#[test]
fn test_create_computes_number_and_cached_total() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();

    assert_eq!(invoice.number, "INV-202503-0001");
    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.currency, "EUR");
    assert_eq!(invoice.amount, dec!(30.60));

    let totals = billing.recalculate(invoice.id).unwrap().unwrap();
    assert_eq!(totals.subtotal, dec!(25.50));
    assert_eq!(totals.tax_amount, dec!(5.10));
    assert_eq!(totals.total, dec!(30.60));
}

#[test]
fn test_removing_item_updates_cached_total() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();

    let first = billing.item_at(invoice.id, 1).unwrap();
    assert_eq!(first.qty, dec!(2));
    billing.remove_item(first.id).unwrap();

    let totals = billing.recalculate(invoice.id).unwrap().unwrap();
    assert_eq!(totals.subtotal, dec!(5.50));
    assert_eq!(totals.tax_amount, dec!(1.10));
    assert_eq!(amount_of(&billing, invoice.id), dec!(6.60));
}

#[test]
fn test_add_and_edit_item_update_cached_total() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(10.00)), &[])
        .unwrap();
    assert_eq!(invoice.amount, Decimal::ZERO);

    let item = billing
        .add_item(invoice.id, &NewLineItem::new("Car rental", dec!(3), dec!(55.00)))
        .unwrap();
    assert_eq!(amount_of(&billing, invoice.id), dec!(181.50));

    let patch = LineItemPatch {
        qty: Some(dec!(4)),
        ..Default::default()
    };
    let updated = billing.update_item(item.id, &patch).unwrap();
    assert_eq!(updated.description, "Car rental");
    assert_eq!(updated.line_total(), dec!(220.00));
    assert_eq!(amount_of(&billing, invoice.id), dec!(242.00));
}

#[test]
fn test_zero_item_invoice_has_zero_amount_at_any_rate() {
    let billing = billing();
    for rate in [dec!(0), dec!(20.00), dec!(999.99)] {
        let invoice = billing.create_invoice(march_draft(rate), &[]).unwrap();
        assert_eq!(invoice.amount, Decimal::ZERO);
    }
}

#[test]
fn test_numbers_are_sequential_within_a_month() {
    let billing = billing();
    let numbers: Vec<String> = (0..5)
        .map(|_| billing.create_invoice(march_draft(dec!(0)), &[]).unwrap().number)
        .collect();

    assert_eq!(
        numbers,
        [
            "INV-202503-0001",
            "INV-202503-0002",
            "INV-202503-0003",
            "INV-202503-0004",
            "INV-202503-0005",
        ]
    );
}

#[test]
fn test_each_month_starts_its_own_sequence() {
    let billing = billing();
    billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();

    let april = InvoiceDraft::new("Jane Traveller", "EUR").issued_on(date(2025, 4, 1));
    assert_eq!(
        billing.create_invoice(april, &[]).unwrap().number,
        "INV-202504-0001"
    );

    let march_next_year = InvoiceDraft::new("Jane Traveller", "EUR").issued_on(date(2026, 3, 2));
    assert_eq!(
        billing.create_invoice(march_next_year, &[]).unwrap().number,
        "INV-202603-0001"
    );

    assert_eq!(
        billing.create_invoice(march_draft(dec!(0)), &[]).unwrap().number,
        "INV-202503-0003"
    );
}

#[test]
fn test_recalculate_is_idempotent() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(23.00)), &scenario_items())
        .unwrap();

    let first = billing.recalculate(invoice.id).unwrap();
    let second = billing.recalculate(invoice.id).unwrap();
    assert_eq!(first, second);
    assert_eq!(amount_of(&billing, invoice.id), invoice.amount);
}

fn corrupted_march_ledger() -> Ledger {
    let mut ledger = Ledger::default();
    ledger.last_invoice_id = 1;
    ledger.invoices.push(Invoice {
        id: 1,
        number: "INV-202503-00AB".to_string(),
        customer: "Legacy".to_string(),
        customer_email: None,
        status: InvoiceStatus::Sent,
        currency: "EUR".to_string(),
        tax_rate: Decimal::ZERO,
        issued_at: date(2025, 3, 1),
        due_at: None,
        paid_at: None,
        notes: String::new(),
        amount: Decimal::ZERO,
    });
    ledger
}

#[test]
fn test_malformed_last_number_restarts_sequence() {
    let billing = Billing::new(
        MemoryStore::from_ledger(corrupted_march_ledger()),
        BillingSettings::default(),
    );

    let invoice = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    assert_eq!(invoice.number, "INV-202503-0001");
}

#[test]
fn test_missing_invoice_recompute_is_noop() {
    let billing = billing();
    assert_eq!(billing.recalculate(42).unwrap(), None);

    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();
    billing.delete_invoice(invoice.id).unwrap();
    assert_eq!(billing.recalculate(invoice.id).unwrap(), None);
}

#[test]
fn test_delete_cascades_to_items() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();
    let item = billing.item_at(invoice.id, 2).unwrap();

    billing.delete_invoice(invoice.id).unwrap();

    assert!(billing.items(invoice.id).unwrap().is_empty());
    assert!(billing.store().snapshot().items.is_empty());
    assert!(matches!(
        billing.remove_item(item.id),
        Err(BillingError::LineItemNotFound(_))
    ));
    assert!(matches!(
        billing.get(invoice.id),
        Err(BillingError::InvoiceNotFound(_))
    ));
}

#[test]
fn test_adding_item_to_missing_invoice_fails() {
    let billing = billing();
    let result = billing.add_item(7, &NewLineItem::new("Parking", dec!(1), dec!(5)));
    assert!(matches!(result, Err(BillingError::InvoiceNotFound(_))));
}

#[test]
fn test_status_machine() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();

    let err = billing
        .transition(invoice.id, InvoiceStatus::Paid, date(2025, 3, 20))
        .unwrap_err();
    assert!(matches!(err, BillingError::InvalidTransition { .. }));

    let sent = billing
        .transition(invoice.id, InvoiceStatus::Sent, date(2025, 3, 15))
        .unwrap();
    assert_eq!(sent.status, InvoiceStatus::Sent);
    assert_eq!(sent.paid_at, None);

    let paid = billing
        .transition(invoice.id, InvoiceStatus::Paid, date(2025, 3, 20))
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.paid_at, Some(date(2025, 3, 20)));
    assert_eq!(paid.number, invoice.number);
    assert_eq!(paid.amount, invoice.amount);

    assert!(billing
        .transition(invoice.id, InvoiceStatus::Void, date(2025, 3, 21))
        .is_err());
}

#[test]
fn test_draft_and_sent_can_be_voided() {
    let billing = billing();
    let draft = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    let sent = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    billing
        .transition(sent.id, InvoiceStatus::Sent, date(2025, 3, 15))
        .unwrap();

    for id in [draft.id, sent.id] {
        let voided = billing
            .transition(id, InvoiceStatus::Void, date(2025, 3, 16))
            .unwrap();
        assert_eq!(voided.status, InvoiceStatus::Void);
    }
}

#[test]
fn test_validation_rejects_bad_input() {
    let billing = billing();

    let bad_currency = InvoiceDraft::new("Jane", "E1");
    assert!(matches!(
        billing.create_invoice(bad_currency, &[]),
        Err(BillingError::InvalidCurrency(_))
    ));

    let negative_rate = march_draft(dec!(-1));
    assert!(matches!(
        billing.create_invoice(negative_rate, &[]),
        Err(BillingError::InvalidAmount { .. })
    ));

    let negative_qty = [NewLineItem::new("Refund", dec!(-1), dec!(10))];
    assert!(billing.create_invoice(march_draft(dec!(0)), &negative_qty).is_err());

    let fractional_cents = [NewLineItem::new("Fuel", dec!(1), dec!(1.999))];
    assert!(billing
        .create_invoice(march_draft(dec!(0)), &fractional_cents)
        .is_err());

    // nothing was persisted by the failed attempts
    assert!(billing.search(&InvoiceFilter::default()).unwrap().is_empty());
}

#[test]
fn test_search_and_find() {
    let billing = billing();
    let mut draft = march_draft(dec!(0));
    draft.customer_email = Some("jane@example.com".to_string());
    let jane = billing.create_invoice(draft, &[]).unwrap();
    let bob = billing
        .create_invoice(InvoiceDraft::new("Bob Pilot", "EUR").issued_on(date(2025, 3, 20)), &[])
        .unwrap();

    let all = billing.search(&InvoiceFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, bob.id, "newest first");

    let by_email = InvoiceFilter {
        query: Some("EXAMPLE.com".to_string()),
        status: None,
    };
    assert_eq!(billing.search(&by_email).unwrap(), vec![jane.clone()]);

    let by_status = InvoiceFilter {
        query: None,
        status: Some(InvoiceStatus::Sent),
    };
    assert!(billing.search(&by_status).unwrap().is_empty());

    assert_eq!(billing.find("INV-202503-0002").unwrap().id, bob.id);
    assert_eq!(billing.find(&jane.id.to_string()).unwrap().id, jane.id);
    assert!(matches!(
        billing.find("INV-209901-0001"),
        Err(BillingError::InvoiceNotFound(_))
    ));
}

#[test]
fn test_document_carries_line_totals_and_cached_total() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();
    let company = Company {
        name: "AeroLogicTech".to_string(),
        address: "1 Terminal Road".to_string(),
        city: "Lisbon".to_string(),
        zip: "1700-111".to_string(),
        country: "Portugal".to_string(),
        email: "billing@aerologictech.example".to_string(),
        phone: None,
        tax_id: None,
    };

    let document = billing.document(invoice.id, &company).unwrap();
    assert_eq!(document.number, "INV-202503-0001");
    assert_eq!(document.issued_at, "14 Mar 2025");
    assert_eq!(document.items.len(), 2);
    assert_eq!(document.items[0].position, 1);
    assert_eq!(document.items[0].line_total, dec!(20.00));
    assert_eq!(document.subtotal, dec!(25.50));
    assert_eq!(document.tax_amount, dec!(5.10));
    assert_eq!(document.total, invoice.amount);

    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["total"], "30.60");
    assert_eq!(json["items"][1]["unit_price"], "5.50");

    assert!(matches!(
        billing.document(99, &company),
        Err(BillingError::InvoiceNotFound(_))
    ));
}

#[test]
fn test_tax_rate_edit_moves_cached_total() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();
    assert_eq!(invoice.amount, dec!(30.60));

    let edit = InvoiceEdit {
        tax_rate: Some(dec!(10.00)),
        currency: Some("usd".to_string()),
        notes: Some("Corrected VAT".to_string()),
        ..Default::default()
    };
    let updated = billing.update_invoice(invoice.id, edit).unwrap();

    assert_eq!(updated.number, invoice.number);
    assert_eq!(updated.status, InvoiceStatus::Draft);
    assert_eq!(updated.tax_rate, dec!(10.00));
    assert_eq!(updated.currency, "USD");
    assert_eq!(updated.notes, "Corrected VAT");
    assert_eq!(updated.customer, invoice.customer);
    // 25.50 subtotal plus 2.55 tax
    assert_eq!(updated.amount, dec!(28.05));
    assert_eq!(amount_of(&billing, invoice.id), dec!(28.05));
}

#[test]
fn test_invoice_edit_keeps_number_when_issue_month_changes() {
    let billing = billing();
    let invoice = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();

    let edit = InvoiceEdit {
        issued_at: Some(date(2025, 4, 2)),
        due_at: Some(date(2025, 5, 2)),
        ..Default::default()
    };
    let updated = billing.update_invoice(invoice.id, edit).unwrap();
    assert_eq!(updated.number, "INV-202503-0001");
    assert_eq!(updated.issued_at, date(2025, 4, 2));
    assert_eq!(updated.due_at, Some(date(2025, 5, 2)));
}

#[test]
fn test_invoice_edit_validation() {
    let billing = billing();
    let invoice = billing
        .create_invoice(march_draft(dec!(20.00)), &scenario_items())
        .unwrap();

    let bad_rate = InvoiceEdit {
        tax_rate: Some(dec!(-5)),
        ..Default::default()
    };
    assert!(matches!(
        billing.update_invoice(invoice.id, bad_rate),
        Err(BillingError::InvalidAmount { .. })
    ));

    let bad_currency = InvoiceEdit {
        currency: Some("€".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        billing.update_invoice(invoice.id, bad_currency),
        Err(BillingError::InvalidCurrency(_))
    ));

    // due date checked against the stored issue date
    let due_too_early = InvoiceEdit {
        due_at: Some(date(2025, 3, 1)),
        ..Default::default()
    };
    assert!(matches!(
        billing.update_invoice(invoice.id, due_too_early),
        Err(BillingError::InvalidDate(_))
    ));

    let unchanged = billing.get(invoice.id).unwrap();
    assert_eq!(unchanged, invoice);

    let missing = InvoiceEdit {
        notes: Some("gone".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        billing.update_invoice(99, missing),
        Err(BillingError::InvoiceNotFound(_))
    ));
}

#[test]
fn test_preview_number_reserves_nothing() {
    let billing = billing();
    billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();

    assert_eq!(billing.preview_number(date(2025, 3, 31)).unwrap(), "INV-202503-0002");
    assert_eq!(billing.preview_number(date(2025, 3, 31)).unwrap(), "INV-202503-0002");
    assert_eq!(billing.preview_number(date(2025, 5, 1)).unwrap(), "INV-202505-0001");
}

#[test]
fn test_counter_strategy_keeps_number_format() {
    let settings = BillingSettings {
        numbering: NumberingStrategy::Counter,
        max_attempts: 1,
    };
    let billing = Billing::new(MemoryStore::new(), settings);

    let first = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    let second = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    assert_eq!(first.number, "INV-202503-0001");
    assert_eq!(second.number, "INV-202503-0002");

    // deleting does not hand a number out again
    billing.delete_invoice(second.id).unwrap();
    let third = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    assert_eq!(third.number, "INV-202503-0003");
}

#[test]
fn test_file_store_persists_between_opens() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.toml");

    let invoice = {
        let billing = Billing::new(FileStore::open(&path), BillingSettings::default());
        billing
            .create_invoice(march_draft(dec!(20.00)), &scenario_items())
            .unwrap()
    };

    let billing = Billing::new(FileStore::open(&path), BillingSettings::default());
    let reloaded = billing.find("INV-202503-0001").unwrap();
    assert_eq!(reloaded, invoice);
    assert_eq!(reloaded.amount, dec!(30.60));
    assert_eq!(billing.items(reloaded.id).unwrap().len(), 2);

    let second = billing.create_invoice(march_draft(dec!(0)), &[]).unwrap();
    assert_eq!(second.number, "INV-202503-0002");

    let store = billing.store();
    assert_eq!(store.path(), path.as_path());
    let ledger = store.load().unwrap();
    assert_eq!(ledger.invoices.len(), 2);
    assert_eq!(ledger.items.len(), 2);

    // only the ledger and its lock file remain; temp files were renamed away
    let mut names: Vec<String> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["ledger.toml", "ledger.toml.lock"]);
}

#[test]
fn test_file_store_rejects_duplicate_numbers() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open(temp_dir.path().join("ledger.toml"));
    let draft = march_draft(dec!(0));

    store.create_invoice("INV-202503-0001", &draft).unwrap();
    let err = store.create_invoice("INV-202503-0001", &draft).unwrap_err();
    assert!(matches!(err, BillingError::DuplicateNumber(n) if n == "INV-202503-0001"));
    assert_eq!(store.list_invoices().unwrap().len(), 1);
}
