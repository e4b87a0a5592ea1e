use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use coursepay::config::AppConfig;
use coursepay::gateways::razorpay::RazorpayGateway;
use coursepay::repo::catalog_repo::CatalogRepo;
use coursepay::repo::enrollments_repo::EnrollmentsRepo;
use coursepay::repo::outbox_repo::OutboxRepo;
use coursepay::repo::payments_repo::PaymentsRepo;
use coursepay::repo::payouts_repo::PayoutsRepo;
use coursepay::repo::revenue_repo::RevenueRepo;
use coursepay::service::ledger::LedgerQuery;
use coursepay::service::order_service::OrderService;
use coursepay::service::outbox_relay::OutboxRelay;
use coursepay::service::payout_service::PayoutService;
use coursepay::service::reconciler::PaymentReconciler;
use coursepay::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;

    let payments_repo = PaymentsRepo { pool: pool.clone() };
    let payouts_repo = PayoutsRepo { pool: pool.clone() };
    let revenue_repo = RevenueRepo { pool: pool.clone() };
    let enrollments_repo = EnrollmentsRepo { pool: pool.clone() };
    let catalog_repo = CatalogRepo { pool: pool.clone() };
    let outbox_repo = OutboxRepo { pool: pool.clone() };

    let gateway = Arc::new(RazorpayGateway {
        base_url: cfg.gateway_base_url.clone(),
        key_id: cfg.gateway_key_id.clone(),
        key_secret: cfg.gateway_key_secret.clone(),
        timeout_ms: cfg.gateway_timeout_ms,
        client: reqwest::Client::new(),
    });

    let order_service = OrderService {
        payments_repo: payments_repo.clone(),
        catalog_repo,
        enrollments_repo: enrollments_repo.clone(),
        gateway: gateway.clone(),
    };

    let reconciler = PaymentReconciler {
        pool: pool.clone(),
        payments_repo,
        revenue_repo: revenue_repo.clone(),
        enrollments_repo,
        outbox_repo: outbox_repo.clone(),
        gateway: gateway.clone(),
        webhook_secret: cfg.webhook_secret.clone(),
        allow_unverified_webhooks: false,
    };

    let payout_service = PayoutService {
        pool: pool.clone(),
        payouts_repo: payouts_repo.clone(),
        revenue_repo: revenue_repo.clone(),
        outbox_repo: outbox_repo.clone(),
        gateway,
    };

    let ledger = LedgerQuery {
        revenue_repo,
        payouts_repo,
    };

    let relay = OutboxRelay {
        outbox_repo,
        redis_client,
        stream_key: cfg.notification_stream_key.clone(),
    };
    tokio::spawn(relay.run());

    let state = AppState {
        order_service,
        reconciler,
        payout_service,
        ledger,
    };

    let admin_key = cfg.internal_api_key.clone();
    let admin_routes = Router::new()
        .route(
            "/payouts/:payout_id/approve",
            post(coursepay::http::handlers::payouts::approve_payout),
        )
        .route(
            "/payouts/:payout_id/complete",
            post(coursepay::http::handlers::payouts::complete_payout),
        )
        .route(
            "/payouts/:payout_id/reject",
            post(coursepay::http::handlers::payouts::reject_payout),
        )
        .layer(from_fn_with_state(
            admin_key,
            coursepay::http::middleware::admin_auth::require_internal_api_key,
        ));

    let app = Router::new()
        .route("/health", get(coursepay::http::handlers::payments::health))
        .route(
            "/payments/create-order",
            post(coursepay::http::handlers::payments::create_order),
        )
        .route(
            "/payments/verify",
            post(coursepay::http::handlers::payments::verify_payment),
        )
        .route(
            "/payments/webhook",
            post(coursepay::http::handlers::payments::webhook),
        )
        .route(
            "/payments/my-payments",
            get(coursepay::http::handlers::payments::my_payments),
        )
        .route(
            "/payments/:payment_id/retry",
            post(coursepay::http::handlers::payments::retry_payment),
        )
        .route(
            "/payments/emi-plans",
            get(coursepay::http::handlers::payments::emi_plans),
        )
        .route(
            "/payments/enroll-emi",
            post(coursepay::http::handlers::payments::enroll_emi),
        )
        .route("/payouts", post(coursepay::http::handlers::payouts::request_payout))
        .route(
            "/payouts/my-payouts",
            get(coursepay::http::handlers::payouts::my_payouts),
        )
        .route(
            "/payouts/earnings/summary",
            get(coursepay::http::handlers::payouts::earnings_summary),
        )
        .merge(admin_routes)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
