use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use mast_models::plan::{ExecutionPlan, TradeSide};

use crate::error::TeamsError;
use crate::exchange::{ExchangeClient, OrderRequest};

/// Outcome of converting an approved plan into an order. Never an error:
/// exchange failures are folded into a failed result with a synthetic id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub order_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub message: String,
    pub exchange_raw: serde_json::Value,
}

/// Size and submit a market order for the approved plan with the gate-
/// adjusted margin.
pub async fn execute_plan_order(
    plan: &ExecutionPlan,
    margin_usdt: Decimal,
    exchange: &dyn ExchangeClient,
) -> ExecutionResult {
    match place(plan, margin_usdt, exchange).await {
        Ok(result) => result,
        Err(e) => {
            error!(symbol = %plan.symbol, error = %e, "order execution failed");
            ExecutionResult {
                success: false,
                order_id: format!("failed_{}", Uuid::new_v4().simple()),
                price: Decimal::ZERO,
                quantity: Decimal::ZERO,
                message: e.to_string(),
                exchange_raw: json!({ "error": e.to_string(), "at": Utc::now().to_rfc3339() }),
            }
        }
    }
}

async fn place(
    plan: &ExecutionPlan,
    margin_usdt: Decimal,
    exchange: &dyn ExchangeClient,
) -> Result<ExecutionResult, TeamsError> {
    let contract = format!("{}_USDT", plan.symbol);

    exchange.set_leverage(&contract, plan.leverage).await?;
    let ticker = exchange.ticker(&contract).await?;
    if ticker.last <= Decimal::ZERO {
        return Ok(rejected(
            "invalid mark price, execution rejected",
            "invalid_price",
            Decimal::ZERO,
        ));
    }

    let spec = exchange.contract_spec(&contract).await?;
    if spec.quanto_multiplier <= Decimal::ZERO {
        return Err(TeamsError::Exchange(format!(
            "invalid contract multiplier for {contract}"
        )));
    }

    let mut quantity =
        margin_usdt * Decimal::from(plan.leverage) / (ticker.last * spec.quanto_multiplier);
    if spec.lot_size > Decimal::ZERO {
        quantity = (quantity / spec.lot_size).floor() * spec.lot_size;
    }
    quantity = quantity.max(spec.min_order_size);

    if quantity <= Decimal::ZERO {
        return Ok(rejected(
            "invalid order quantity, execution rejected",
            "invalid_quantity",
            ticker.last,
        ));
    }

    let size = match plan.side {
        TradeSide::Long => quantity,
        TradeSide::Short => -quantity,
    };
    let ack = exchange
        .place_order(&OrderRequest {
            contract,
            size,
            price: Decimal::ZERO,
        })
        .await?;

    info!(
        symbol = %plan.symbol,
        side = plan.side.as_str(),
        quantity = %quantity,
        price = %ticker.last,
        order_id = %ack.order_id,
        "order placed"
    );

    Ok(ExecutionResult {
        success: true,
        order_id: ack.order_id,
        price: ticker.last,
        quantity,
        message: format!("opened {} {}", plan.symbol, plan.side.as_str()),
        exchange_raw: ack.raw,
    })
}

fn rejected(message: &str, reason_code: &str, price: Decimal) -> ExecutionResult {
    ExecutionResult {
        success: false,
        order_id: format!("rejected_{}", Uuid::new_v4().simple()),
        price,
        quantity: Decimal::ZERO,
        message: message.to_string(),
        exchange_raw: json!({ "reason": reason_code, "at": Utc::now().to_rfc3339() }),
    }
}
