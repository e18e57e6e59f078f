//! Engine settings.
//!
//! Grounded on the teacher's `RedisConfig`/`FeeConfig` pattern
//! (`cache/redis_client.rs`, `services/matching/types.rs`): a `Default` impl
//! plus a `from_env` constructor that overrides individual fields, paired
//! with the `dotenvy::dotenv().ok()` convention from `main.rs`. Loading a
//! config *file* (the `config` crate, remote config) is out of scope per
//! SPEC_FULL.md #1; reading a handful of env vars into a typed struct with
//! sane defaults is the ambient convention this codebase always carries.

use crate::decimal::Dec;
use std::env;

/// Digits of precision kept for the price-limit fractions; these are ratios
/// (e.g. `0.1` for 10%), not asset-denominated amounts, so a fixed precision
/// independent of any market's `money_prec` is used.
const LIMIT_FRAC_PREC: u32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Seconds a cached depth reply stays valid before being recomputed.
    pub cache_timeout: f64,
    /// Fractional band around `last_price` a LIMIT/AON/FOK price must fall
    /// within (0 disables the check).
    pub last_price_limit: Dec,
    /// Same, relative to `closing_price`.
    pub closing_price_limit: Dec,
    pub order_book_max_len: usize,
    pub order_list_max_len: usize,
    pub source_max_len: usize,
    /// User id that accumulates maker/taker trading fees.
    pub fee_collector_user_id: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_timeout: 1.0,
            last_price_limit: Dec::parse("0.1", LIMIT_FRAC_PREC).expect("static literal parses"),
            closing_price_limit: Dec::parse("0.1", LIMIT_FRAC_PREC).expect("static literal parses"),
            order_book_max_len: 100,
            order_list_max_len: 100,
            source_max_len: 64,
            fee_collector_user_id: 0,
        }
    }
}

impl EngineSettings {
    /// Start from defaults and override any field present as an env var,
    /// ignoring unset or unparsable ones (they keep the default).
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(v) = env::var("ENGINE_CACHE_TIMEOUT") {
            if let Ok(parsed) = v.parse() {
                settings.cache_timeout = parsed;
            }
        }
        if let Ok(v) = env::var("ENGINE_LAST_PRICE_LIMIT") {
            if let Ok(parsed) = Dec::parse(&v, LIMIT_FRAC_PREC) {
                settings.last_price_limit = parsed;
            }
        }
        if let Ok(v) = env::var("ENGINE_CLOSING_PRICE_LIMIT") {
            if let Ok(parsed) = Dec::parse(&v, LIMIT_FRAC_PREC) {
                settings.closing_price_limit = parsed;
            }
        }
        if let Ok(v) = env::var("ENGINE_ORDER_BOOK_MAX_LEN") {
            if let Ok(parsed) = v.parse() {
                settings.order_book_max_len = parsed;
            }
        }
        if let Ok(v) = env::var("ENGINE_ORDER_LIST_MAX_LEN") {
            if let Ok(parsed) = v.parse() {
                settings.order_list_max_len = parsed;
            }
        }
        if let Ok(v) = env::var("ENGINE_SOURCE_MAX_LEN") {
            if let Ok(parsed) = v.parse() {
                settings.source_max_len = parsed;
            }
        }
        if let Ok(v) = env::var("ENGINE_FEE_COLLECTOR_USER_ID") {
            if let Ok(parsed) = v.parse() {
                settings.fee_collector_user_id = parsed;
            }
        }
        settings
    }

    /// `check_price_limit(ref, p, frac)`: true when `ref == 0`, or when `p`
    /// is within `frac` of `ref`, per SPEC_FULL.md #4.5. Kept in `Dec`
    /// throughout rather than `f64` so this gate rounds exactly like every
    /// other validation on the order-placement path.
    pub fn check_price_limit(reference: Dec, price: Dec, frac: Dec) -> bool {
        if reference.is_zero() {
            return true;
        }
        let diff = match price.checked_sub(reference) {
            Some(d) => d,
            None => return false,
        };
        let ratio = match diff.checked_div(reference) {
            Some(r) => r,
            None => return true,
        };
        ratio.abs().inner() <= frac.inner()
    }
}
