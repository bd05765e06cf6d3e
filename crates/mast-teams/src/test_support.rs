//! Test support: a scriptable in-memory exchange for unit and scenario tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::error::TeamsError;
use crate::exchange::{
    ContractSpec, ExchangeClient, ExchangePosition, FuturesTicker, OrderAck, OrderRequest,
};

/// Mock venue with configurable quotes, contract specs, positions and
/// failure injection. Every order is recorded for assertions.
pub struct MockExchange {
    last_price: Decimal,
    change_percentage_24h: Decimal,
    quanto_multiplier: Decimal,
    lot_size: Decimal,
    min_order_size: Decimal,
    positions: Vec<ExchangePosition>,
    fail_orders: bool,
    fail_positions: bool,
    delay: Option<Duration>,
    placed: Mutex<Vec<OrderRequest>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            last_price: dec!(62000),
            change_percentage_24h: dec!(2.0),
            quanto_multiplier: dec!(0.0001),
            lot_size: Decimal::ONE,
            min_order_size: Decimal::ONE,
            positions: Vec::new(),
            fail_orders: false,
            fail_positions: false,
            delay: None,
            placed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_last_price(mut self, last_price: Decimal) -> Self {
        self.last_price = last_price;
        self
    }

    pub fn with_change(mut self, change_percentage_24h: Decimal) -> Self {
        self.change_percentage_24h = change_percentage_24h;
        self
    }

    pub fn with_contract(
        mut self,
        quanto_multiplier: Decimal,
        lot_size: Decimal,
        min_order_size: Decimal,
    ) -> Self {
        self.quanto_multiplier = quanto_multiplier;
        self.lot_size = lot_size;
        self.min_order_size = min_order_size;
        self
    }

    pub fn with_position(mut self, contract: &str, size: Decimal) -> Self {
        self.positions.push(ExchangePosition {
            contract: contract.to_string(),
            size,
        });
        self
    }

    pub fn failing_orders(mut self) -> Self {
        self.fail_orders = true;
        self
    }

    pub fn failing_positions(mut self) -> Self {
        self.fail_positions = true;
        self
    }

    /// Delay the position snapshot, to hold a cycle in flight during
    /// scheduler overlap tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.placed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    async fn set_leverage(&self, _contract: &str, _leverage: u32) -> Result<(), TeamsError> {
        Ok(())
    }

    async fn ticker(&self, contract: &str) -> Result<FuturesTicker, TeamsError> {
        Ok(FuturesTicker {
            contract: contract.to_string(),
            last: self.last_price,
            change_percentage_24h: self.change_percentage_24h,
        })
    }

    async fn contract_spec(&self, contract: &str) -> Result<ContractSpec, TeamsError> {
        Ok(ContractSpec {
            contract: contract.to_string(),
            quanto_multiplier: self.quanto_multiplier,
            lot_size: self.lot_size,
            min_order_size: self.min_order_size,
        })
    }

    async fn positions(&self) -> Result<Vec<ExchangePosition>, TeamsError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_positions {
            return Err(TeamsError::Exchange(
                "mock position snapshot unavailable".to_string(),
            ));
        }
        Ok(self.positions.clone())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, TeamsError> {
        if self.fail_orders {
            return Err(TeamsError::Exchange("mock order rejection".to_string()));
        }
        self.placed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(OrderAck {
            order_id: format!("mock_{}", Uuid::new_v4().simple()),
            raw: serde_json::json!({ "mock": true, "size": request.size }),
        })
    }

    async fn order(&self, order_id: &str) -> Result<OrderAck, TeamsError> {
        Err(TeamsError::Exchange(format!("unknown order {order_id}")))
    }
}
