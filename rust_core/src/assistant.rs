//! Scripted chat assistant.
//!
//! Replies come from a fixed keyword table; the only live data is the price
//! quote, read from the feed without fetching.

use crate::price_feed::PriceFeed;

pub const DEFAULT_ASSISTANT_NAME: &str = "X PAY Assistant";

/// Tokens the price intent recognises, in match order.
const QUOTABLE_TOKENS: [&str; 6] = ["eth", "btc", "matic", "sol", "bnb", "usdc"];

const SWAP_REPLY: &str = "I can help you execute that swap! Here's what I recommend:\n\n\
• Check current gas fees (they're moderate right now)\n\
• Consider market volatility\n\
• Review slippage tolerance\n\n\
Would you like me to prepare a swap transaction for you?";

const PORTFOLIO_REPLY: &str = "Let me analyze your portfolio for you. Based on current market conditions:\n\n\
✅ Your diversification looks reasonable\n\
⚠️ Consider rebalancing if volatility increases\n\
💡 Gas fees are optimal for swaps right now\n\n\
Would you like specific recommendations?";

const AUTOMATION_REPLY: &str = "Great question! I can help you set up automation rules. For example:\n\n\
\"If BTC price > $70,000 → swap 20% to USDC\"\n\
\"If gas fees < 10 gwei → rebalance portfolio\"\n\n\
Would you like to create a rule now?";

const RISK_REPLY: &str = "Based on your current portfolio composition:\n\n\
📊 Your risk level is moderate\n\
🛡️ Consider holding 30-40% in stablecoins for protection\n\
📈 Volatile assets can offer higher returns but need monitoring\n\n\
Would you like me to suggest a safer allocation?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Price,
    Swap,
    Portfolio,
    Automation,
    Risk,
    General,
}

/// Intent keyword groups in priority order.
const INTENT_KEYWORDS: [(Intent, &[&str]); 5] = [
    (Intent::Price, &["price", "how much"]),
    (Intent::Swap, &["buy", "swap"]),
    (Intent::Portfolio, &["portfolio", "holdings"]),
    (Intent::Automation, &["automation", "auto", "rule"]),
    (Intent::Risk, &["risk", "safe"]),
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn first_match(lower: &str, groups: &[(Intent, &[&str])]) -> Intent {
    groups
        .iter()
        .find(|(_, keywords)| contains_any(lower, keywords))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

/// Keyword classification, first match wins. `Price` only wins if a
/// quotable token is present and priced; that check happens in `reply`.
pub fn classify(message: &str) -> Intent {
    first_match(&message.to_lowercase(), &INTENT_KEYWORDS)
}

#[derive(Debug, Clone)]
pub struct ScriptedAssistant {
    name: String,
}

impl Default for ScriptedAssistant {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ScriptedAssistant {
    /// `name` falls back to the default when absent or blank.
    pub fn new(name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_ASSISTANT_NAME);
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn welcome(&self) -> String {
        format!(
            "Hi! I'm {}, your AI crypto assistant. I can help you:\n\n\
             • Analyze market trends\n\
             • Suggest optimal swap timings\n\
             • Answer questions about your portfolio\n\
             • Set up automation rules\n\n\
             What would you like to know?",
            self.name
        )
    }

    pub fn reply(&self, message: &str, feed: &PriceFeed) -> String {
        let lower = message.to_lowercase();

        if contains_any(&lower, INTENT_KEYWORDS[0].1) {
            if let Some(quote) = price_reply(&lower, feed) {
                return quote;
            }
        }

        match classify_without_price(&lower) {
            Intent::Swap => SWAP_REPLY.to_string(),
            Intent::Portfolio => PORTFOLIO_REPLY.to_string(),
            Intent::Automation => AUTOMATION_REPLY.to_string(),
            Intent::Risk => RISK_REPLY.to_string(),
            _ => general_reply(message),
        }
    }
}

// Falls through the table below the price intent.
fn classify_without_price(lower: &str) -> Intent {
    first_match(lower, &INTENT_KEYWORDS[1..])
}

fn price_reply(lower: &str, feed: &PriceFeed) -> Option<String> {
    let token = QUOTABLE_TOKENS.iter().find(|t| lower.contains(*t))?;
    let symbol = token.to_uppercase();
    let snapshot = feed.get_price(&symbol)?;
    let direction = if snapshot.change_24h >= 0.0 { "up" } else { "down" };

    Some(format!(
        "{} is currently trading at ${:.2}. It's {} {:.2}% in the last 24 hours.\n\n\
         Would you like me to analyze if this is a good time to buy or sell?",
        symbol,
        snapshot.price,
        direction,
        snapshot.change_24h.abs()
    ))
}

fn general_reply(message: &str) -> String {
    format!(
        "I understand you're asking about \"{}\". Here's my take:\n\n\
         The crypto market is dynamic right now. I recommend:\n\n\
         • Monitor price movements closely\n\
         • Set up automation rules for protection\n\
         • Diversify across multiple assets\n\n\
         Would you like more specific advice on this topic?",
        message
    )
}
