mod common;

use rust_decimal_macros::dec;

use apartment_billing::models::{BillingPeriod, InvoiceSettingsPatch};
use apartment_billing::services::debt::{DebtCalculator, DebtSummary};
use common::{date, TestApp};

fn calculator(app: &TestApp) -> DebtCalculator {
    DebtCalculator::new(
        app.repos.invoices.clone(),
        app.state.services.settings.clone(),
    )
}

#[tokio::test]
async fn sums_unpaid_invoices_and_interest_per_invoice() {
    let app = TestApp::new();
    let tenant = app.tenant("Somsak").await;
    let room = app.room("201", Some(tenant.id)).await;
    app.unpaid_invoice(room.id, tenant.id, 2024, 12, dec!(2000), date(2025, 1, 1))
        .await;
    app.unpaid_invoice(room.id, tenant.id, 2025, 1, dec!(2500), date(2025, 2, 1))
        .await;
    app.unpaid_invoice(room.id, tenant.id, 2025, 2, dec!(3000), date(2025, 3, 1))
        .await;

    let debt = calculator(&app)
        .calculate(room.id, BillingPeriod::new(2025, 6).unwrap())
        .await
        .unwrap();

    assert_eq!(debt.previous_balance, dec!(7500));
    // 2000 * 2% * 5 + 2500 * 2% * 4 + 3000 * 2% * 3
    assert_eq!(debt.interest_charge, dec!(580.00));
    assert_eq!(debt.accumulated_total, dec!(8080.00));
}

#[tokio::test]
async fn ignores_paid_current_and_later_periods() {
    let app = TestApp::new();
    let tenant = app.tenant("Suda").await;
    let room = app.room("202", Some(tenant.id)).await;
    let other_room = app.room("203", Some(tenant.id)).await;

    let paid = app
        .unpaid_invoice(room.id, tenant.id, 2025, 1, dec!(1000), date(2025, 1, 8))
        .await;
    app.state
        .services
        .invoicing
        .mark_paid(paid.id, Some(date(2025, 1, 7)))
        .await
        .unwrap();
    app.unpaid_invoice(room.id, tenant.id, 2025, 3, dec!(4000), date(2025, 3, 8))
        .await;
    app.unpaid_invoice(room.id, tenant.id, 2025, 4, dec!(4000), date(2025, 4, 8))
        .await;
    app.unpaid_invoice(other_room.id, tenant.id, 2025, 1, dec!(9000), date(2025, 1, 8))
        .await;

    let debt = calculator(&app)
        .calculate(room.id, BillingPeriod::new(2025, 3).unwrap())
        .await
        .unwrap();

    assert_eq!(debt.previous_balance, dec!(0));
    assert_eq!(debt.interest_charge, dec!(0));
    assert_eq!(debt.accumulated_total, dec!(0));
}

#[tokio::test]
async fn no_interest_before_a_full_month_has_passed() {
    let app = TestApp::new();
    let tenant = app.tenant("Wan").await;
    let room = app.room("204", Some(tenant.id)).await;
    app.unpaid_invoice(room.id, tenant.id, 2025, 1, dec!(3000), date(2025, 1, 10))
        .await;

    let debt = calculator(&app)
        .calculate(room.id, BillingPeriod::new(2025, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(debt.previous_balance, dec!(3000));
    assert_eq!(debt.interest_charge, dec!(0));
    assert_eq!(debt.accumulated_total, dec!(3000));
}

#[tokio::test]
async fn updated_rate_applies_to_later_calculations() {
    let app = TestApp::new();
    let tenant = app.tenant("Lek").await;
    let room = app.room("205", Some(tenant.id)).await;
    app.unpaid_invoice(room.id, tenant.id, 2024, 10, dec!(3000), date(2024, 10, 10))
        .await;
    let period = BillingPeriod::new(2025, 1).unwrap();

    let before = calculator(&app).calculate(room.id, period).await.unwrap();
    assert_eq!(before.interest_charge, dec!(120.00));

    app.state
        .services
        .settings
        .update(InvoiceSettingsPatch {
            interest_rate_per_month: Some(dec!(0)),
            ..Default::default()
        })
        .await
        .unwrap();

    let after = calculator(&app).calculate(room.id, period).await.unwrap();
    assert_eq!(after.previous_balance, dec!(3000));
    assert_eq!(after.interest_charge, dec!(0));
    assert_eq!(after.accumulated_total, dec!(3000));
}

#[tokio::test]
async fn two_whole_months_on_three_thousand() {
    let app = TestApp::new();
    let tenant = app.tenant("Fah").await;
    let room = app.room("206", Some(tenant.id)).await;
    app.unpaid_invoice(room.id, tenant.id, 2025, 1, dec!(3000), date(2025, 1, 5))
        .await;

    let debt = calculator(&app)
        .calculate(room.id, BillingPeriod::new(2025, 4).unwrap())
        .await
        .unwrap();

    assert_eq!(debt.previous_balance, dec!(3000.00));
    assert_eq!(debt.interest_charge, dec!(120.00));
    assert_eq!(debt.accumulated_total, dec!(3120.00));
}

#[tokio::test]
async fn room_without_history_owes_nothing() {
    let app = TestApp::new();
    let room = app.room("207", None).await;

    let debt = calculator(&app)
        .calculate(room.id, BillingPeriod::new(2025, 4).unwrap())
        .await
        .unwrap();

    assert_eq!(debt, DebtSummary::default());
}
