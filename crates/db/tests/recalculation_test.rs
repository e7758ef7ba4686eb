//! Integration tests for authoritative balance recalculation.

mod common;

use common::{id_of, setup};
use rust_decimal_macros::dec;
use tally_core::allocation::AllocationRequest;
use tally_db::StoreError;

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let fx = setup().await;
    let invoice = fx.create_invoice(dec!(500)).await;
    let payment = fx.create_payment(dec!(200), &[]).await;
    fx.payments()
        .apply_payment(
            fx.company,
            id_of(&payment),
            &[AllocationRequest {
                invoice_id: id_of(&invoice),
                amount: dec!(200),
            }],
        )
        .await
        .unwrap();

    let recalc = fx.recalculation();
    let first = recalc
        .recalculate_invoice_balance(fx.company, id_of(&invoice))
        .await
        .unwrap();
    let second = recalc
        .recalculate_invoice_balance(fx.company, id_of(&invoice))
        .await
        .unwrap();

    assert_eq!(first.balance_cents, second.balance_cents);
    assert_eq!(first.status, second.status);
    assert_eq!(first.balance(), dec!(300));
    assert_eq!(first.status, "partial");
}

#[tokio::test]
async fn test_recalculation_supersedes_stored_values() {
    let fx = setup().await;
    let invoice = fx.create_invoice(dec!(500)).await;

    // Corrupt the stored balance; the recompute must derive it from the
    // application rows alone.
    {
        use sea_orm::{ActiveModelTrait, Set};
        use tally_db::entities::transactions;
        let mut active: transactions::ActiveModel = invoice.clone().into();
        active.balance_cents = Set(12_345);
        active.status = Set("paid".to_string());
        active.update(&fx.db).await.unwrap();
    }

    let recalculated = fx
        .recalculation()
        .recalculate_invoice_balance(fx.company, id_of(&invoice))
        .await
        .unwrap();
    assert_eq!(recalculated.balance(), dec!(500));
    assert_eq!(recalculated.status, "open");
}

#[tokio::test]
async fn test_recalculate_rejects_non_obligations() {
    let fx = setup().await;
    let payment = fx.create_payment(dec!(100), &[]).await;
    let result = fx
        .recalculation()
        .recalculate_invoice_balance(fx.company, id_of(&payment))
        .await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_recalculate_all_covers_every_obligation() {
    let fx = setup().await;
    fx.create_invoice(dec!(100)).await;
    fx.create_invoice(dec!(200)).await;
    fx.create_bill(dec!(300)).await;
    fx.create_payment(dec!(50), &[]).await;

    let recalculated = fx.recalculation().recalculate_all(fx.company).await.unwrap();
    assert_eq!(recalculated, 3);
}

#[tokio::test]
async fn test_settled_within_one_cent_is_paid() {
    let fx = setup().await;
    let invoice = fx.create_invoice(dec!(100)).await;
    let payment = fx.create_payment(dec!(99.99), &[]).await;
    fx.payments()
        .apply_payment(
            fx.company,
            id_of(&payment),
            &[AllocationRequest {
                invoice_id: id_of(&invoice),
                amount: dec!(99.99),
            }],
        )
        .await
        .unwrap();

    // A remaining cent is within tolerance.
    let invoice_after = fx.reload(id_of(&invoice)).await;
    assert_eq!(invoice_after.status, "paid");
    assert_eq!(invoice_after.balance_cents, 0);
}
