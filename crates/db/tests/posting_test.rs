//! Integration tests for transaction creation and posting.

mod common;

use common::{id_of, setup, Fixture};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tally_core::posting::{PostingEngine, PostingLine, TransactionType};
use tally_db::entities::{ledger_entries, line_items, transactions};
use tally_db::repositories::CreateSalesTaxInput;
use tally_db::StoreError;
use tally_shared::types::SalesTaxId;

#[tokio::test]
async fn test_invoice_round_trip() {
    let fx = setup().await;

    // $500 invoice with 10% tax: total $550.
    let mut draft = fx.draft(TransactionType::Invoice, dec!(550));
    draft.sub_total = dec!(500);
    draft.lines = vec![Fixture::item(dec!(500), Some(fx.revenue))];
    draft.tax = Some(
        fx.sales_taxes()
            .breakdown_for(
                fx.company,
                simple_tax(&fx, "HST", dec!(10), fx.gst_payable).await,
                dec!(50),
            )
            .await
            .unwrap(),
    );
    let invoice = fx.post(&draft).await;

    assert_eq!(invoice.amount(), dec!(550));
    assert_eq!(invoice.balance(), dec!(550));
    assert_eq!(invoice.status, "open");

    let entries = fx.transactions().ledger_entries_for(id_of(&invoice)).await.unwrap();
    assert_eq!(entries.len(), 3);
    let debit_total: i64 = entries.iter().map(|e| e.debit_cents).sum();
    let credit_total: i64 = entries.iter().map(|e| e.credit_cents).sum();
    assert_eq!(debit_total, credit_total);
    assert_eq!(
        entry_amount(&entries, fx.receivable.into_inner(), true),
        55_000
    );
    assert_eq!(
        entry_amount(&entries, fx.revenue.into_inner(), false),
        50_000
    );
    assert_eq!(
        entry_amount(&entries, fx.gst_payable.into_inner(), false),
        5_000
    );

    // Deleting the invoice removes every row.
    fx.reversal()
        .delete_invoice(fx.company, id_of(&invoice))
        .await
        .unwrap();
    assert_eq!(
        transactions::Entity::find_by_id(invoice.id)
            .one(&fx.db)
            .await
            .unwrap(),
        None
    );
    let remaining_children = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TransactionId.eq(invoice.id))
        .count(&fx.db)
        .await
        .unwrap()
        + line_items::Entity::find()
            .filter(line_items::Column::TransactionId.eq(invoice.id))
            .count(&fx.db)
            .await
            .unwrap();
    assert_eq!(remaining_children, 0);
}

#[tokio::test]
async fn test_composite_tax_override_distributes_exactly() {
    let fx = setup().await;
    let taxes = fx.sales_taxes();

    let composite = taxes
        .create_sales_tax(CreateSalesTaxInput {
            company_id: fx.company,
            name: "GST+PST".to_string(),
            rate: dec!(12),
            account_id: None,
            parent_tax_id: None,
            position: 0,
        })
        .await
        .unwrap();
    let parent_id = SalesTaxId::from_uuid(composite.id);
    for (name, rate, account, position) in [
        ("GST", dec!(5), fx.gst_payable, 0),
        ("PST", dec!(7), fx.pst_payable, 1),
    ] {
        taxes
            .create_sales_tax(CreateSalesTaxInput {
                company_id: fx.company,
                name: name.to_string(),
                rate,
                account_id: Some(account),
                parent_tax_id: Some(parent_id),
                position,
            })
            .await
            .unwrap();
    }

    // 5% + 7% on $1000 calculates $120; the manual override of $118 must
    // land as $49.17 + $68.83.
    let mut draft = fx.draft(TransactionType::Invoice, dec!(1118));
    draft.sub_total = dec!(1000);
    draft.lines = vec![Fixture::item(dec!(1000), Some(fx.revenue))];
    draft.tax = Some(
        taxes
            .breakdown_for(fx.company, parent_id, dec!(118))
            .await
            .unwrap(),
    );
    let invoice = fx.post(&draft).await;

    let entries = fx.transactions().ledger_entries_for(id_of(&invoice)).await.unwrap();
    assert_eq!(
        entry_amount(&entries, fx.gst_payable.into_inner(), false),
        4_917
    );
    assert_eq!(
        entry_amount(&entries, fx.pst_payable.into_inner(), false),
        6_883
    );
    assert_eq!(invoice.tax_amount(), dec!(118));
}

#[tokio::test]
async fn test_unbalanced_entries_rejected() {
    let fx = setup().await;
    let draft = fx.draft(TransactionType::JournalEntry, dec!(100));
    let entries = vec![
        PostingLine::debit(fx.bank, dec!(100)),
        PostingLine::credit(fx.revenue, dec!(60)),
    ];
    let result = fx
        .transactions()
        .create_transaction(fx.company, &draft, &entries)
        .await;
    assert!(matches!(result, Err(StoreError::Posting(_))));
}

#[tokio::test]
async fn test_references_auto_assigned_per_type() {
    let fx = setup().await;
    let first = fx.create_invoice(dec!(100)).await;
    let second = fx.create_invoice(dec!(200)).await;
    let bill = fx.create_bill(dec!(50)).await;

    assert_eq!(first.reference, "1");
    assert_eq!(second.reference, "2");
    // Bills number independently of invoices.
    assert_eq!(bill.reference, "1");
}

#[tokio::test]
async fn test_duplicate_reference_rejected() {
    let fx = setup().await;
    let mut draft = fx.draft(TransactionType::Invoice, dec!(100));
    draft.reference = Some("INV-7".to_string());
    draft.lines = vec![Fixture::item(dec!(100), Some(fx.revenue))];
    let entries = PostingEngine::build_entries(&draft, &fx.resolver).unwrap();
    fx.transactions()
        .create_transaction(fx.company, &draft, &entries)
        .await
        .unwrap();

    let result = fx
        .transactions()
        .create_transaction(fx.company, &draft, &entries)
        .await;
    assert!(matches!(
        result,
        Err(StoreError::DuplicateReference { reference }) if reference == "INV-7"
    ));
}

#[tokio::test]
async fn test_journal_entry_passthrough() {
    let fx = setup().await;
    let mut draft = fx.draft(TransactionType::JournalEntry, dec!(75));
    draft.contact_id = None;
    draft.explicit_entries = vec![
        PostingLine::debit(fx.bank, dec!(75)),
        PostingLine::credit(fx.revenue, dec!(75)),
    ];
    let journal = fx.post(&draft).await;

    assert_eq!(journal.status, "completed");
    assert_eq!(journal.balance_cents, 0);
    let entries = fx.transactions().ledger_entries_for(id_of(&journal)).await.unwrap();
    assert_eq!(entries.len(), 2);
}

async fn simple_tax(
    fx: &Fixture,
    name: &str,
    rate: rust_decimal::Decimal,
    account: tally_shared::types::AccountId,
) -> SalesTaxId {
    let tax = fx
        .sales_taxes()
        .create_sales_tax(CreateSalesTaxInput {
            company_id: fx.company,
            name: name.to_string(),
            rate,
            account_id: Some(account),
            parent_tax_id: None,
            position: 0,
        })
        .await
        .unwrap();
    SalesTaxId::from_uuid(tax.id)
}

fn entry_amount(entries: &[ledger_entries::Model], account: uuid::Uuid, debit: bool) -> i64 {
    entries
        .iter()
        .filter(|e| e.account_id == account)
        .map(|e| if debit { e.debit_cents } else { e.credit_cents })
        .sum()
}
