pub mod config;
pub mod domain {
    pub mod emi;
    pub mod payment;
    pub mod payout;
    pub mod split;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod payments;
        pub mod payouts;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod identity;
    }
}
pub mod repo {
    pub mod catalog_repo;
    pub mod enrollments_repo;
    pub mod outbox_repo;
    pub mod payments_repo;
    pub mod payouts_repo;
    pub mod revenue_repo;
}
pub mod service {
    pub mod ledger;
    pub mod order_service;
    pub mod outbox_relay;
    pub mod payout_service;
    pub mod reconciler;
}

#[derive(Clone)]
pub struct AppState {
    pub order_service: service::order_service::OrderService,
    pub reconciler: service::reconciler::PaymentReconciler,
    pub payout_service: service::payout_service::PayoutService,
    pub ledger: service::ledger::LedgerQuery,
}
