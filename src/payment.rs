//! Payment Methods

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a payment method name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payment method: {0:?}")]
pub struct PaymentMethodError(pub String);

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Instant bank transfer
    #[serde(rename = "pix")]
    Pix,

    /// Credit card
    #[serde(rename = "cartao", alias = "credit-card", alias = "credit_card")]
    CreditCard,

    /// Bank payment slip
    #[serde(rename = "boleto")]
    Boleto,
}

impl PaymentMethod {
    /// Every accepted payment method, in display order.
    pub const ALL: [PaymentMethod; 3] = [Self::Pix, Self::CreditCard, Self::Boleto];

    /// Wire name sent to the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::CreditCard => "cartao",
            Self::Boleto => "boleto",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pix" => Ok(Self::Pix),
            "cartao" | "cartão" | "credit-card" | "credit_card" => Ok(Self::CreditCard),
            "boleto" => Ok(Self::Boleto),
            _ => Err(PaymentMethodError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_wire_names_and_aliases() -> TestResult {
        assert_eq!("pix".parse::<PaymentMethod>()?, PaymentMethod::Pix);
        assert_eq!("cartao".parse::<PaymentMethod>()?, PaymentMethod::CreditCard);
        assert_eq!(" Credit-Card ".parse::<PaymentMethod>()?, PaymentMethod::CreditCard);
        assert_eq!("BOLETO".parse::<PaymentMethod>()?, PaymentMethod::Boleto);

        Ok(())
    }

    #[test]
    fn rejects_unknown_methods() {
        assert_eq!(
            "cheque".parse::<PaymentMethod>(),
            Err(PaymentMethodError("cheque".to_string()))
        );
    }

    #[test]
    fn serializes_with_wire_names() -> TestResult {
        assert_eq!(serde_json::to_string(&PaymentMethod::CreditCard)?, "\"cartao\"");

        let method: PaymentMethod = serde_json::from_str("\"credit-card\"")?;

        assert_eq!(method, PaymentMethod::CreditCard);

        Ok(())
    }

    #[test]
    fn display_matches_wire_name() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.to_string(), method.as_str());
        }
    }
}
