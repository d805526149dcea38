//! MarketSelfCorrectionEngine
//!
//! Every sale decays the traded player's market value; sales of the same
//! player inside the rapid window decay it faster, which makes flip-trading
//! a losing strategy. An hourly natural-decay pass erodes idle listings.

use crate::config::MarketConfig;
use crate::error::{ensure_non_negative, ValidationError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMarketListing {
    pub player_id: String,
    pub player_market_value: u64,
    pub last_sale_time: DateTime<Utc>,
    /// Rapid re-sales in a row; resets once the window passes without a sale
    pub consecutive_transactions: u32,
    /// Last time the value changed (sale or natural decay)
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaleOutcome {
    pub buyer_coins: u64,
    pub decayed_value: u64,
    pub decay_multiplier: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSelfCorrectionEngine {
    config: MarketConfig,
    listings: HashMap<String, PlayerMarketListing>,
}

impl MarketSelfCorrectionEngine {
    pub fn new(config: MarketConfig) -> Self {
        Self { config, listings: HashMap::new() }
    }

    pub fn listing(&self, player_id: &str) -> Option<&PlayerMarketListing> {
        self.listings.get(player_id)
    }

    pub fn listings(&self) -> impl Iterator<Item = &PlayerMarketListing> {
        self.listings.values()
    }

    pub fn process_sale(
        &mut self,
        player_id: &str,
        sale_price: u64,
        buyer_coins: u64,
    ) -> Result<SaleOutcome, ValidationError> {
        self.process_sale_at(player_id, sale_price, buyer_coins, Utc::now())
    }

    /// Credits the sale and decays the player's value.
    ///
    /// A first sale creates the listing at `sale_price` and applies the base
    /// decay; later sales inside the rapid window add `consecutive_step` of
    /// extra decay per consecutive sale, down to `min_multiplier`.
    pub fn process_sale_at(
        &mut self,
        player_id: &str,
        sale_price: u64,
        buyer_coins: u64,
        now: DateTime<Utc>,
    ) -> Result<SaleOutcome, ValidationError> {
        if player_id.is_empty() {
            return Err(ValidationError::EmptyPlayerId);
        }

        let cfg = &self.config;
        let buyer_coins = buyer_coins.saturating_add(sale_price);

        let window = Duration::hours(cfg.rapid_window_hours);
        let (listing, decay_multiplier) = match self.listings.entry(player_id.to_string()) {
            Entry::Vacant(slot) => {
                let listing = slot.insert(PlayerMarketListing {
                    player_id: player_id.to_string(),
                    player_market_value: sale_price,
                    last_sale_time: now,
                    consecutive_transactions: 0,
                    last_update: now,
                });
                (listing, cfg.base_decay)
            }
            Entry::Occupied(slot) => {
                let listing = slot.into_mut();
                let multiplier = if now - listing.last_sale_time < window {
                    listing.consecutive_transactions += 1;
                    (cfg.base_decay - listing.consecutive_transactions as f64 * cfg.consecutive_step)
                        .max(cfg.min_multiplier)
                } else {
                    listing.consecutive_transactions = 0;
                    cfg.base_decay
                };
                (listing, multiplier)
            }
        };

        let decayed_value = (listing.player_market_value as f64 * decay_multiplier).floor() as u64;
        listing.player_market_value = decayed_value;
        listing.last_sale_time = now;
        listing.last_update = now;

        debug!(
            player_id,
            decay_multiplier,
            decayed_value,
            consecutive = listing.consecutive_transactions,
            "player sale processed"
        );

        Ok(SaleOutcome { buyer_coins, decayed_value, decay_multiplier })
    }

    pub fn apply_natural_decay(&mut self) -> usize {
        self.apply_natural_decay_at(Utc::now())
    }

    /// Decays every listing idle for longer than the decay interval; returns
    /// how many listings changed.
    pub fn apply_natural_decay_at(&mut self, now: DateTime<Utc>) -> usize {
        let interval = Duration::hours(self.config.natural_decay_interval_hours);
        let factor = self.config.natural_decay;

        let mut decayed = 0;
        for listing in self.listings.values_mut() {
            if now - listing.last_update > interval {
                listing.player_market_value =
                    (listing.player_market_value as f64 * factor).floor() as u64;
                listing.last_update = now;
                decayed += 1;
            }
        }

        if decayed > 0 {
            debug!(decayed, "natural market decay applied");
        }
        decayed
    }

    /// Seeds a listing for a player that has not traded yet.
    pub fn register_listing(
        &mut self,
        player_id: &str,
        market_value: f64,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if player_id.is_empty() {
            return Err(ValidationError::EmptyPlayerId);
        }
        let value = ensure_non_negative("market_value", market_value)?.floor() as u64;
        self.listings.entry(player_id.to_string()).or_insert_with(|| PlayerMarketListing {
            player_id: player_id.to_string(),
            player_market_value: value,
            last_sale_time: now,
            consecutive_transactions: 0,
            last_update: now,
        });
        Ok(())
    }
}
