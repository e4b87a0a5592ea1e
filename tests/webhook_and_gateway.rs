use coursepay::gateways::mock::MockGateway;
use coursepay::gateways::{
    sign_webhook_payload, verify_webhook_signature, CreateOrderSpec, GatewayPaymentStatus,
    PaymentGateway, TransferOutcome, TransferSpec, WebhookEvent,
};

#[test]
fn signature_round_trip() {
    let body = serde_json::to_vec(&WebhookEvent {
        event: "payment.captured".to_string(),
        order_id: "order_abc".to_string(),
        payment_id: Some("pay_123".to_string()),
        error_reason: None,
    })
    .unwrap();

    let sig = sign_webhook_payload(&body, "whsec_prod");
    assert!(verify_webhook_signature(&body, &sig, "whsec_prod"));
    assert!(!verify_webhook_signature(&body, &sig, "whsec_other"));
    assert!(!verify_webhook_signature(b"{}", &sig, "whsec_prod"));
}

#[test]
fn signature_of_wrong_length_is_rejected() {
    assert!(!verify_webhook_signature(b"body", "deadbeef", "whsec"));
    assert!(!verify_webhook_signature(b"body", "", "whsec"));
}

#[tokio::test]
async fn mock_gateway_order_echoes_receipt() {
    let gw = MockGateway::new("ALWAYS_SUCCESS");
    let order = gw
        .create_order(&CreateOrderSpec {
            receipt: "ord_1700000000000_ab12cd34".to_string(),
            amount_minor: 5000_00,
            currency: "INR".to_string(),
        })
        .await
        .unwrap();
    assert!(order.order_id.contains("ord_1700000000000_ab12cd34"));
    assert!(!order.payment_link.is_empty());
}

#[tokio::test]
async fn unreachable_gateway_surfaces_as_error_not_status() {
    let gw = MockGateway::new("ALWAYS_UNREACHABLE");
    let res = gw
        .create_order(&CreateOrderSpec {
            receipt: "ord_x".to_string(),
            amount_minor: 100,
            currency: "INR".to_string(),
        })
        .await;
    assert!(res.is_err());
    assert!(gw.get_payment("pay_1").await.is_err());
}

#[tokio::test]
async fn mock_gateway_maps_payment_statuses() {
    assert_eq!(
        MockGateway::new("ALWAYS_SUCCESS").get_payment("p").await.unwrap(),
        GatewayPaymentStatus::Captured
    );
    assert_eq!(
        MockGateway::new("ALWAYS_PENDING").get_payment("p").await.unwrap(),
        GatewayPaymentStatus::Pending
    );
    assert!(matches!(
        MockGateway::new("ALWAYS_FAILURE").get_payment("p").await.unwrap(),
        GatewayPaymentStatus::Failed { .. }
    ));
}

#[tokio::test]
async fn refused_transfer_is_a_business_outcome() {
    let gw = MockGateway::new("TRANSFER_REFUSED");
    let outcome = gw
        .request_transfer(&TransferSpec {
            reference_id: "payout_1".to_string(),
            amount_minor: 1500_00,
            destination: serde_json::json!({"type": "upi", "vpa": "teacher@bank"}),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, TransferOutcome::Refused { .. }));
}
