//! Shared application state.

use std::sync::Arc;

use shepherd_commerce::{
    LogNotifier, OrderManager, OrderSettlement, PaymentGateway, PaymentService,
    ReconciliationConfig,
};
use shepherd_db::Database;

/// Handed to every handler. Cloning is shallow.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub orders: OrderManager,
    pub payments: PaymentService,
}

impl AppState {
    /// Wires the services. Successful payments mark their order as paid.
    pub fn new(
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        reconciliation: ReconciliationConfig,
    ) -> Self {
        let orders = OrderManager::new(db.clone(), Arc::new(LogNotifier));
        let payments = PaymentService::new(db.clone(), gateway, reconciliation)
            .with_settlement(Arc::new(OrderSettlement::new(orders.clone())));

        AppState {
            db,
            orders,
            payments,
        }
    }
}
