mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use apartment_billing::entities::invoice::InvoiceStatus;
use apartment_billing::errors::ServiceError;
use apartment_billing::services::invoicing::CreateInvoiceRequest;
use common::{date, TestApp};

fn january_request(room_id: i32) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        room_id,
        billing_year: Some(2025),
        billing_month: Some(1),
        issue_date: Some(date(2025, 1, 5)),
        electricity_units: Some(100),
        electricity_rate: Some(dec!(5.50)),
        water_units: Some(15),
        water_rate: Some(dec!(18.50)),
        include_common_fee: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn creates_invoice_from_lease_meters_and_maintenance() {
    let app = TestApp::new();
    let tenant = app.tenant("Somchai").await;
    let room = app.room("101", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 12, 1), dec!(4500))
        .await;
    app.completed_maintenance(room.id, date(2025, 1, 20), Some(dec!(200)))
        .await;
    app.completed_maintenance(room.id, date(2025, 1, 21), None)
        .await;
    app.completed_maintenance(room.id, date(2025, 2, 1), Some(dec!(999)))
        .await;

    let invoice = app
        .state
        .services
        .invoicing
        .create_invoice(january_request(room.id))
        .await
        .unwrap();

    assert_eq!(invoice.tenant_id, tenant.id);
    assert_eq!(invoice.rent_baht, dec!(4500));
    assert_eq!(invoice.electricity_baht, Some(dec!(550.00)));
    assert_eq!(invoice.water_baht, Some(dec!(277.50)));
    assert_eq!(invoice.common_fee_baht, dec!(300));
    assert_eq!(invoice.garbage_fee_baht, dec!(0));
    assert_eq!(invoice.maintenance_baht, dec!(200));
    assert_eq!(invoice.total_baht, dec!(5827.50));
    assert_eq!(invoice.previous_balance, dec!(0));
    assert_eq!(invoice.interest_charge, dec!(0));
    assert_eq!(invoice.accumulated_total, dec!(5827.50));
    assert_eq!(invoice.due_date, Some(date(2025, 1, 12)));
    assert_eq!(invoice.status, InvoiceStatus::Pending);
}

#[tokio::test]
async fn carries_unpaid_balance_with_interest() {
    let app = TestApp::new();
    let tenant = app.tenant("Malee").await;
    let room = app.room("102", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 1, 1), dec!(3000))
        .await;
    app.unpaid_invoice(room.id, tenant.id, 2024, 10, dec!(3000), date(2024, 10, 10))
        .await;

    let invoice = app
        .state
        .services
        .invoicing
        .create_invoice(CreateInvoiceRequest {
            room_id: room.id,
            billing_year: Some(2025),
            billing_month: Some(1),
            issue_date: Some(date(2025, 1, 1)),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(invoice.total_baht, dec!(3000));
    assert_eq!(invoice.previous_balance, dec!(3000));
    assert_eq!(invoice.interest_charge, dec!(120.00));
    assert_eq!(invoice.accumulated_total, dec!(6120.00));
}

#[tokio::test]
async fn second_invoice_for_same_period_conflicts() {
    let app = TestApp::new();
    let tenant = app.tenant("Anan").await;
    let room = app.room("103", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 12, 1), dec!(4000))
        .await;
    let invoicing = &app.state.services.invoicing;

    invoicing
        .create_invoice(january_request(room.id))
        .await
        .unwrap();
    let err = invoicing
        .create_invoice(january_request(room.id))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("2025-01"));
    assert_eq!(invoicing.list_invoices_for_room(room.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn explicit_tenant_must_match_lease() {
    let app = TestApp::new();
    let lessee = app.tenant("Lessee").await;
    let stranger = app.tenant("Stranger").await;
    let room = app.room("104", Some(lessee.id)).await;
    app.lease(room.id, lessee.id, date(2024, 12, 1), dec!(4000))
        .await;

    let err = app
        .state
        .services
        .invoicing
        .create_invoice(CreateInvoiceRequest {
            tenant_id: Some(stranger.id),
            ..january_request(room.id)
        })
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn room_without_lease_or_tenant_is_rejected() {
    let app = TestApp::new();
    let room = app.room("105", None).await;

    let err = app
        .state
        .services
        .invoicing
        .create_invoice(january_request(room.id))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn explicit_tenant_bills_room_without_lease() {
    let app = TestApp::new();
    let tenant = app.tenant("Walk-in").await;
    let room = app.room("106", None).await;

    let invoice = app
        .state
        .services
        .invoicing
        .create_invoice(CreateInvoiceRequest {
            tenant_id: Some(tenant.id),
            rent_baht: Some(dec!(3500)),
            ..january_request(room.id)
        })
        .await
        .unwrap();

    assert_eq!(invoice.tenant_id, tenant.id);
    assert_eq!(invoice.rent_baht, dec!(3500));
}

#[tokio::test]
async fn unknown_room_and_bad_month_are_rejected() {
    let app = TestApp::new();
    let invoicing = &app.state.services.invoicing;

    assert_matches!(
        invoicing.create_invoice(january_request(999)).await,
        Err(ServiceError::NotFound(_))
    );

    let tenant = app.tenant("Nok").await;
    let room = app.room("107", Some(tenant.id)).await;
    let err = invoicing
        .create_invoice(CreateInvoiceRequest {
            billing_month: Some(13),
            ..january_request(room.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("Invalid billing month: 13"));
}

#[tokio::test]
async fn negative_amounts_are_rejected_without_writing() {
    let app = TestApp::new();
    let tenant = app.tenant("Pim").await;
    let room = app.room("108", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 12, 1), dec!(4000))
        .await;

    let err = app
        .state
        .services
        .invoicing
        .create_invoice(CreateInvoiceRequest {
            other_baht: Some(dec!(-1)),
            ..january_request(room.id)
        })
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
    assert!(app
        .state
        .services
        .invoicing
        .list_invoices_for_room(room.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn paid_invoices_stop_accruing_and_cannot_be_paid_twice() {
    let app = TestApp::new();
    let tenant = app.tenant("Dao").await;
    let room = app.room("109", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 1, 1), dec!(3000))
        .await;
    let old = app
        .unpaid_invoice(room.id, tenant.id, 2024, 10, dec!(3000), date(2024, 10, 10))
        .await;
    let invoicing = &app.state.services.invoicing;

    let paid = invoicing
        .mark_paid(old.id, Some(date(2024, 12, 20)))
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.paid_date, Some(date(2024, 12, 20)));
    assert_matches!(
        invoicing.mark_paid(old.id, None).await,
        Err(ServiceError::Conflict(_))
    );

    let invoice = invoicing
        .create_invoice(CreateInvoiceRequest {
            room_id: room.id,
            billing_year: Some(2025),
            billing_month: Some(1),
            issue_date: Some(date(2025, 1, 1)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(invoice.previous_balance, dec!(0));
    assert_eq!(invoice.interest_charge, dec!(0));
    assert_eq!(invoice.accumulated_total, invoice.total_baht);
}

#[tokio::test]
async fn overdue_sweep_flags_pending_invoices_past_due() {
    let app = TestApp::new();
    let tenant = app.tenant("Korn").await;
    let room = app.room("110", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 12, 1), dec!(4000))
        .await;
    let invoicing = &app.state.services.invoicing;
    let invoice = invoicing
        .create_invoice(january_request(room.id))
        .await
        .unwrap();

    assert_eq!(invoicing.mark_overdue(date(2025, 1, 12)).await.unwrap(), 0);
    assert_eq!(invoicing.mark_overdue(date(2025, 1, 13)).await.unwrap(), 1);
    assert_eq!(invoicing.mark_overdue(date(2025, 1, 14)).await.unwrap(), 0);

    let stored = invoicing.get_invoice(invoice.id).await.unwrap();
    assert_eq!(stored.status, InvoiceStatus::Overdue);
}

#[tokio::test]
async fn out_of_range_amounts_are_rejected_without_writing() {
    let app = TestApp::new();
    let tenant = app.tenant("Nok").await;
    let room = app.room("110", Some(tenant.id)).await;
    app.lease(room.id, tenant.id, date(2024, 12, 1), dec!(4000))
        .await;
    let invoicing = &app.state.services.invoicing;

    let err = invoicing
        .create_invoice(CreateInvoiceRequest {
            electricity_rate: Some(Decimal::MAX),
            ..january_request(room.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("out of range"));

    let err = invoicing
        .create_invoice(CreateInvoiceRequest {
            rent_baht: Some(dec!(99999999999999)),
            other_baht: Some(dec!(99999999999999)),
            ..january_request(room.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("total_baht"));

    assert!(invoicing
        .list_invoices_for_room(room.id)
        .await
        .unwrap()
        .is_empty());
}
