//! Engine error hierarchy and its mapping onto the wire error code (`5000 + code`).
//!
//! Grounded on the teacher's `MatchingError` (`services/matching/types.rs`)
//! and `AppError` (`utils/response.rs`), consolidated into a single hierarchy
//! since this crate has one reply-envelope error shape rather than the
//! teacher's two (a typed matching error plus an HTTP-facing error).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("order not found")]
    OrderNotFound,

    #[error("repeat update")]
    RepeatUpdate,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("user mismatch")]
    UserMismatch,

    #[error("balance not enough")]
    BalanceNotEnough,

    #[error("price out of range")]
    PriceOutOfRange,

    #[error("insufficient trading fee")]
    InsufficientFee,

    #[error("invalid price")]
    InvalidPrice,

    #[error("no orders found")]
    NoOrdersFound,
}

impl EngineError {
    /// The raw business code, pre-offset. Matches the source's negative
    /// handler return codes mapped to positive wire codes in `wire_code`.
    pub fn code(&self) -> u32 {
        match self {
            EngineError::Invalid(_) => 1,
            EngineError::Internal(_) => 2,
            EngineError::ServiceUnavailable => 3,
            EngineError::InsufficientBalance | EngineError::OrderNotFound | EngineError::RepeatUpdate => 10,
            EngineError::InvalidAmount | EngineError::UserMismatch | EngineError::BalanceNotEnough => 11,
            EngineError::PriceOutOfRange => 12,
            EngineError::InsufficientFee => 13,
            EngineError::InvalidPrice => 14,
            EngineError::NoOrdersFound => 15,
        }
    }

    /// The wire-visible error code, `5000 + code`.
    pub fn wire_code(&self) -> u32 {
        5000 + self.code()
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
