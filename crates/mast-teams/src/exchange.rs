use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TeamsError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuturesTicker {
    pub contract: String,
    pub last: Decimal,
    /// 24h change in percent (e.g. 1.8 = +1.8%).
    pub change_percentage_24h: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractSpec {
    pub contract: String,
    /// Value of one contract in the base asset.
    pub quanto_multiplier: Decimal,
    /// Order sizes are floored to a multiple of this.
    pub lot_size: Decimal,
    pub min_order_size: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangePosition {
    pub contract: String,
    /// Signed size; zero means flat.
    pub size: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub contract: String,
    /// Signed size; negative sells/shorts.
    pub size: Decimal,
    /// Zero means market order.
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub raw: serde_json::Value,
}

/// Port to the futures venue. Errors are surfaced as `TeamsError::Exchange`
/// and callers treat them as caught failures, never retry targets.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn set_leverage(&self, contract: &str, leverage: u32) -> Result<(), TeamsError>;
    async fn ticker(&self, contract: &str) -> Result<FuturesTicker, TeamsError>;
    async fn contract_spec(&self, contract: &str) -> Result<ContractSpec, TeamsError>;
    async fn positions(&self) -> Result<Vec<ExchangePosition>, TeamsError>;
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, TeamsError>;
    async fn order(&self, order_id: &str) -> Result<OrderAck, TeamsError>;
}

struct PaperMarket {
    last: Decimal,
    change_percentage_24h: Decimal,
    quanto_multiplier: Decimal,
}

/// Deterministic in-process venue so the daemon can run without live
/// connectivity. Quotes are fixed per supported contract; orders always fill.
pub struct PaperExchange {
    markets: HashMap<&'static str, PaperMarket>,
    orders: Mutex<Vec<OrderAck>>,
}

impl PaperExchange {
    pub fn new() -> Self {
        let mut markets = HashMap::new();
        markets.insert(
            "BTC_USDT",
            PaperMarket {
                last: dec!(62450),
                change_percentage_24h: dec!(1.8),
                quanto_multiplier: dec!(0.0001),
            },
        );
        markets.insert(
            "ETH_USDT",
            PaperMarket {
                last: dec!(3320.5),
                change_percentage_24h: dec!(-0.6),
                quanto_multiplier: dec!(0.01),
            },
        );
        markets.insert(
            "SOL_USDT",
            PaperMarket {
                last: dec!(148.2),
                change_percentage_24h: dec!(2.4),
                quanto_multiplier: dec!(1),
            },
        );
        markets.insert(
            "BNB_USDT",
            PaperMarket {
                last: dec!(585),
                change_percentage_24h: dec!(0.3),
                quanto_multiplier: dec!(0.01),
            },
        );
        markets.insert(
            "XRP_USDT",
            PaperMarket {
                last: dec!(0.52),
                change_percentage_24h: dec!(-1.2),
                quanto_multiplier: dec!(10),
            },
        );
        markets.insert(
            "DOGE_USDT",
            PaperMarket {
                last: dec!(0.16),
                change_percentage_24h: dec!(4.1),
                quanto_multiplier: dec!(10),
            },
        );
        Self {
            markets,
            orders: Mutex::new(Vec::new()),
        }
    }

    fn market(&self, contract: &str) -> Result<&PaperMarket, TeamsError> {
        self.markets
            .get(contract)
            .ok_or_else(|| TeamsError::Exchange(format!("no paper market for contract {contract}")))
    }
}

impl Default for PaperExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn set_leverage(&self, contract: &str, _leverage: u32) -> Result<(), TeamsError> {
        self.market(contract)?;
        Ok(())
    }

    async fn ticker(&self, contract: &str) -> Result<FuturesTicker, TeamsError> {
        let market = self.market(contract)?;
        Ok(FuturesTicker {
            contract: contract.to_string(),
            last: market.last,
            change_percentage_24h: market.change_percentage_24h,
        })
    }

    async fn contract_spec(&self, contract: &str) -> Result<ContractSpec, TeamsError> {
        let market = self.market(contract)?;
        Ok(ContractSpec {
            contract: contract.to_string(),
            quanto_multiplier: market.quanto_multiplier,
            lot_size: Decimal::ONE,
            min_order_size: Decimal::ONE,
        })
    }

    async fn positions(&self) -> Result<Vec<ExchangePosition>, TeamsError> {
        Ok(Vec::new())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, TeamsError> {
        let market = self.market(&request.contract)?;
        let ack = OrderAck {
            order_id: format!("paper_{}", Uuid::new_v4().simple()),
            raw: serde_json::json!({
                "contract": request.contract,
                "size": request.size,
                "fill_price": market.last,
                "venue": "paper",
            }),
        };
        let mut orders = self
            .orders
            .lock()
            .map_err(|_| TeamsError::Exchange("paper order book poisoned".to_string()))?;
        orders.push(ack.clone());
        Ok(ack)
    }

    async fn order(&self, order_id: &str) -> Result<OrderAck, TeamsError> {
        let orders = self
            .orders
            .lock()
            .map_err(|_| TeamsError::Exchange("paper order book poisoned".to_string()))?;
        orders
            .iter()
            .find(|ack| ack.order_id == order_id)
            .cloned()
            .ok_or_else(|| TeamsError::Exchange(format!("unknown order {order_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn paper_ticker_is_deterministic() {
        let exchange = PaperExchange::new();
        let first = exchange.ticker("BTC_USDT").await.unwrap();
        let second = exchange.ticker("BTC_USDT").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.last, dec!(62450));
    }

    #[tokio::test]
    async fn paper_unknown_contract_errors() {
        let exchange = PaperExchange::new();
        let result = exchange.ticker("SHIB_USDT").await;
        assert!(matches!(result, Err(TeamsError::Exchange(_))));
    }

    #[tokio::test]
    async fn paper_orders_fill_and_are_queryable() {
        let exchange = PaperExchange::new();
        let ack = exchange
            .place_order(&OrderRequest {
                contract: "ETH_USDT".to_string(),
                size: dec!(3),
                price: Decimal::ZERO,
            })
            .await
            .unwrap();

        let fetched = exchange.order(&ack.order_id).await.unwrap();
        assert_eq!(fetched, ack);
        assert!(ack.order_id.starts_with("paper_"));
    }
}
