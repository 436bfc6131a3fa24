use derive_more::{Display, Error};

pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Failures raised by securities and the exchange. None of these are transient so nothing in the
/// crate retries; every layer passes them up unchanged apart from the exchange turning a missing
/// key into [ExchangeError::NotFound].
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[display("unexpected negative value")]
    NegativeValue,
    #[display("unexpected empty symbol")]
    EmptyIdentifier,
    #[display("unexpected invalid denominator")]
    InvalidDenominator,
    #[display("security not found: {symbol}")]
    NotFound { symbol: String },
    #[display("security already listed: {symbol}")]
    AlreadyExists { symbol: String },
    #[display("share index requested on an exchange with no securities")]
    EmptyExchange,
    #[display("invalid listing: {reason}")]
    InvalidListing { reason: String },
}

#[cfg(test)]
mod tests {
    use super::ExchangeError;

    #[test]
    fn test_that_not_found_names_the_symbol() {
        let err = ExchangeError::NotFound {
            symbol: "XYZ".to_string(),
        };
        assert_eq!(err.to_string(), "security not found: XYZ");
    }

    #[test]
    fn test_that_errors_are_std_errors() {
        let err: Box<dyn std::error::Error> = Box::new(ExchangeError::NegativeValue);
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "unexpected negative value");
    }
}
