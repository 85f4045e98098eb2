//! Portfolio valuation and simulated swaps.
//!
//! This module provides:
//! - Holdings valued at feed prices
//! - Risk level from the stablecoin share
//! - Local swap simulation (no order is sent anywhere)
//! - An in-memory swap history with status filters and CSV export

use crate::price_feed::{normalize_symbol, PriceFeed};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const STABLECOINS: [&str; 3] = ["USDC", "USDT", "DAI"];

/// Minimum simulated gas fee in USD
const MIN_GAS_FEE: f64 = 0.5;
/// Upper bound of the random gas fee draw in USD
const MAX_GAS_FEE_DRAW: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Neutral,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    AiSuggestion,
    Automation,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AiSuggestion => "ai_suggestion",
            Self::Automation => "automation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::AiSuggestion => "AI Suggested",
            Self::Automation => "Auto Rule",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Completed,
    Failed,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Record of one simulated swap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub id: Uuid,
    pub from_token: String,
    pub to_token: String,
    pub from_amount: f64,
    pub to_amount: f64,
    /// `to_amount / from_amount`
    pub swap_rate: f64,
    /// USD
    pub gas_fee: f64,
    pub trigger_type: TriggerType,
    pub reasoning: String,
    pub status: SwapStatus,
    /// Performance since the swap, once known
    pub profit_loss_percentage: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq)]
pub enum SwapError {
    #[error("percent must be in (0, 100], got {0}")]
    InvalidPercent(f64),

    #[error("no holding of {0}")]
    NoHolding(String),

    #[error("cannot swap {0} into itself")]
    SameToken(String),
}

const CSV_HEADER: [&str; 10] = [
    "Date",
    "From Token",
    "From Amount",
    "To Token",
    "To Amount",
    "Rate",
    "Gas Fee",
    "Status",
    "Trigger",
    "AI Reasoning",
];

fn csv_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Swap receipts in the order they were recorded. Not persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapHistory {
    records: Vec<SwapReceipt>,
}

impl SwapHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, receipt: SwapReceipt) {
        self.records.push(receipt);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&SwapReceipt> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Receipts newest first, optionally only those with `status`.
    pub fn filter(&self, status: Option<SwapStatus>) -> Vec<&SwapReceipt> {
        let mut records: Vec<&SwapReceipt> = self
            .records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Settle a pending swap. Returns false for unknown ids.
    pub fn set_status(&mut self, id: Uuid, status: SwapStatus) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_profit_loss(&mut self, id: Uuid, percentage: f64) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.profit_loss_percentage = Some(percentage);
                true
            }
            None => false,
        }
    }

    /// Swaps not started by the user directly.
    pub fn automated_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.trigger_type != TriggerType::Manual)
            .count()
    }

    /// Sum of profit/loss percentages over completed swaps that have one.
    pub fn total_profit_loss(&self) -> f64 {
        self.records
            .iter()
            .filter(|r| r.status == SwapStatus::Completed)
            .filter_map(|r| r.profit_loss_percentage)
            .sum()
    }

    /// Export receipts matching `status`, newest first. Every cell is
    /// quoted; `None` when nothing matches.
    pub fn to_csv(&self, status: Option<SwapStatus>) -> Option<String> {
        let records = self.filter(status);
        if records.is_empty() {
            return None;
        }

        let mut lines = vec![CSV_HEADER
            .iter()
            .map(|h| csv_cell(h))
            .collect::<Vec<_>>()
            .join(",")];

        for r in records {
            let cells = [
                r.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                r.from_token.clone(),
                r.from_amount.to_string(),
                r.to_token.clone(),
                r.to_amount.to_string(),
                r.swap_rate.to_string(),
                r.gas_fee.to_string(),
                r.status.as_str().to_string(),
                r.trigger_type.as_str().to_string(),
                r.reasoning.replace('\n', " "),
            ];
            lines.push(
                cells
                    .iter()
                    .map(|c| csv_cell(c))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        Some(lines.join("\n"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    holdings: Vec<Holding>,
    history: SwapHistory,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the balance for a symbol, adding the holding if needed.
    pub fn set_balance(&mut self, symbol: &str, balance: f64) {
        let symbol = normalize_symbol(symbol);
        match self.holdings.iter_mut().find(|h| h.symbol == symbol) {
            Some(holding) => holding.balance = balance,
            None => self.holdings.push(Holding { symbol, balance }),
        }
    }

    pub fn balance(&self, symbol: &str) -> Option<f64> {
        let symbol = normalize_symbol(symbol);
        self.holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .map(|h| h.balance)
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Every swap simulated on this portfolio.
    pub fn history(&self) -> &SwapHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut SwapHistory {
        &mut self.history
    }

    /// USD value of one holding; unpriced symbols count as zero.
    pub fn value_of(&self, holding: &Holding, feed: &PriceFeed) -> f64 {
        let price = feed.get_price(&holding.symbol).map(|p| p.price).unwrap_or(0.0);
        holding.balance * price
    }

    pub fn total_value(&self, feed: &PriceFeed) -> f64 {
        self.holdings.iter().map(|h| self.value_of(h, feed)).sum()
    }

    /// Low above 70% stablecoins by value, Medium above 40%, else High.
    pub fn risk_level(&self, feed: &PriceFeed) -> RiskLevel {
        if self.holdings.is_empty() {
            return RiskLevel::Neutral;
        }

        let total = self.total_value(feed);
        if total <= 0.0 {
            return RiskLevel::High;
        }

        let stable: f64 = self
            .holdings
            .iter()
            .filter(|h| STABLECOINS.contains(&h.symbol.as_str()))
            .map(|h| self.value_of(h, feed))
            .sum();
        let stable_pct = stable / total * 100.0;

        if stable_pct > 70.0 {
            RiskLevel::Low
        } else if stable_pct > 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Swap `percent` of the `from` balance into `to` at feed prices, with
    /// a random gas fee. The receipt is appended to the history.
    pub fn simulate_swap(
        &mut self,
        from: &str,
        to: &str,
        percent: f64,
        trigger: TriggerType,
        feed: &PriceFeed,
    ) -> Result<SwapReceipt, SwapError> {
        let gas_fee = MIN_GAS_FEE.max(rand::random::<f64>() * MAX_GAS_FEE_DRAW);
        self.simulate_swap_with_fee(from, to, percent, trigger, feed, gas_fee)
    }

    /// Deterministic core of `simulate_swap`.
    ///
    /// An unpriced `from` token is worth zero; an unpriced `to` token is
    /// taken at 1 USD. Rejected swaps are not recorded.
    pub fn simulate_swap_with_fee(
        &mut self,
        from: &str,
        to: &str,
        percent: f64,
        trigger: TriggerType,
        feed: &PriceFeed,
        gas_fee: f64,
    ) -> Result<SwapReceipt, SwapError> {
        let from = normalize_symbol(from);
        let to = normalize_symbol(to);

        if !(percent > 0.0 && percent <= 100.0) {
            return Err(SwapError::InvalidPercent(percent));
        }
        if from == to {
            return Err(SwapError::SameToken(from));
        }
        let balance = self
            .balance(&from)
            .ok_or_else(|| SwapError::NoHolding(from.clone()))?;

        let from_price = feed.get_price(&from).map(|p| p.price).unwrap_or(0.0);
        let to_price = feed
            .get_price(&to)
            .map(|p| p.price)
            .filter(|p| *p > 0.0)
            .unwrap_or(1.0);

        let from_amount = balance * percent / 100.0;
        let usd_value = from_amount * from_price;
        let to_amount = usd_value / to_price;
        let swap_rate = if from_amount > 0.0 {
            to_amount / from_amount
        } else {
            0.0
        };

        self.set_balance(&from, balance - from_amount);
        let to_balance = self.balance(&to).unwrap_or(0.0);
        self.set_balance(&to, to_balance + to_amount);

        let reasoning = match trigger {
            TriggerType::Manual => format!("Swapped {}% of {} based on user action", percent, from),
            TriggerType::AiSuggestion => {
                format!("Swapped {}% of {} on assistant suggestion", percent, from)
            }
            TriggerType::Automation => {
                format!("Swapped {}% of {} by automation rule", percent, from)
            }
        };

        let receipt = SwapReceipt {
            id: Uuid::new_v4(),
            reasoning,
            from_token: from,
            to_token: to,
            from_amount,
            to_amount,
            swap_rate,
            gas_fee,
            trigger_type: trigger,
            status: SwapStatus::Completed,
            profit_loss_percentage: None,
            created_at: Utc::now(),
        };
        self.history.record(receipt.clone());

        Ok(receipt)
    }
}
