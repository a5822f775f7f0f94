//! Payment step.
//!
//! Card numbers and CVVs are held as [`SecretString`] from the moment they
//! are entered. They never leave this module except as the masked number,
//! and are never sent to the orders API.

use heirloom_core::PaymentMethodKind;
use secrecy::{ExposeSecret, SecretString};

use super::error::ValidationError;
use super::shipping::required;

pub const CARD_NUMBER_MAX: usize = 19;
pub const EXPIRY_MAX: usize = 5;
pub const CVV_MAX: usize = 4;

/// Raw payment form input.
#[derive(Debug)]
pub struct PaymentForm {
    pub method: PaymentMethodKind,
    pub cardholder_name: String,
    pub card_number: SecretString,
    pub expiry_date: String,
    pub cvv: SecretString,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self::paypal()
    }
}

impl PaymentForm {
    /// PayPal needs no further input.
    #[must_use]
    pub fn paypal() -> Self {
        Self {
            method: PaymentMethodKind::PayPal,
            cardholder_name: String::new(),
            card_number: SecretString::from(String::new()),
            expiry_date: String::new(),
            cvv: SecretString::from(String::new()),
        }
    }

    /// Card form with the given input.
    #[must_use]
    pub fn card(
        cardholder_name: impl Into<String>,
        card_number: impl Into<String>,
        expiry_date: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            method: PaymentMethodKind::Card,
            cardholder_name: cardholder_name.into(),
            card_number: SecretString::from(card_number.into()),
            expiry_date: expiry_date.into(),
            cvv: SecretString::from(cvv.into()),
        }
    }

    /// Validate the selected method.
    ///
    /// Card fields are checked for presence in the order card number, expiry
    /// date, CVV, cardholder name, then for length. No Luhn or expiry-date
    /// checks are made; the card processor owns those.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<PaymentMethod, ValidationError> {
        match self.method {
            PaymentMethodKind::PayPal => Ok(PaymentMethod::PayPal),
            PaymentMethodKind::Card => {
                let number = required("card number", self.card_number.expose_secret())?;
                let expiry = required("expiry date", &self.expiry_date)?;
                let cvv = required("cvv", self.cvv.expose_secret())?;
                let cardholder_name = required("cardholder name", &self.cardholder_name)?;

                max_len("card number", &number, CARD_NUMBER_MAX)?;
                max_len("expiry date", &expiry, EXPIRY_MAX)?;
                max_len("cvv", &cvv, CVV_MAX)?;

                Ok(PaymentMethod::Card(CardDetails {
                    cardholder_name,
                    number: SecretString::from(number),
                    expiry,
                    cvv: SecretString::from(cvv),
                }))
            }
        }
    }
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validated card details.
pub struct CardDetails {
    cardholder_name: String,
    number: SecretString,
    expiry: String,
    cvv: SecretString,
}

impl Clone for CardDetails {
    fn clone(&self) -> Self {
        Self {
            cardholder_name: self.cardholder_name.clone(),
            number: SecretString::from(self.number.expose_secret().to_string()),
            expiry: self.expiry.clone(),
            cvv: SecretString::from(self.cvv.expose_secret().to_string()),
        }
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("cardholder_name", &self.cardholder_name)
            .field("number", &self.masked_number())
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

impl CardDetails {
    #[must_use]
    pub fn cardholder_name(&self) -> &str {
        &self.cardholder_name
    }

    #[must_use]
    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    /// Last four digits of the card number.
    #[must_use]
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self
            .number
            .expose_secret()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        let skip = digits.len().saturating_sub(4);
        digits.into_iter().skip(skip).collect()
    }

    /// `**** **** **** 1234`
    #[must_use]
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last_four())
    }

}

/// A validated payment choice.
#[derive(Debug, Clone)]
pub enum PaymentMethod {
    PayPal,
    Card(CardDetails),
}

impl PaymentMethod {
    #[must_use]
    pub const fn kind(&self) -> PaymentMethodKind {
        match self {
            Self::PayPal => PaymentMethodKind::PayPal,
            Self::Card(_) => PaymentMethodKind::Card,
        }
    }

    /// One-line description for the review step.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::PayPal => "PayPal".to_string(),
            Self::Card(card) => format!("Credit Card ({})", card.masked_number()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card() -> PaymentForm {
        PaymentForm::card("A. Collector", "4242 4242 4242 4242", "12/29", "123")
    }

    #[test]
    fn test_paypal_needs_nothing() {
        let method = PaymentForm::paypal().validate().unwrap();
        assert_eq!(method.kind(), PaymentMethodKind::PayPal);
        assert_eq!(method.summary(), "PayPal");
    }

    #[test]
    fn test_card_masks_last_four() {
        let PaymentMethod::Card(details) = card().validate().unwrap() else {
            panic!("expected card");
        };
        assert_eq!(details.masked_number(), "**** **** **** 4242");
        assert_eq!(details.expiry(), "12/29");
    }

    #[test]
    fn test_card_summary_shows_only_last_four() {
        let form = PaymentForm::card("A. Collector", "5555-4444-3333-1111", "01/31", "321");
        let method = form.validate().unwrap();
        assert_eq!(method.summary(), "Credit Card (**** **** **** 1111)");

        let short = PaymentForm::card("A. Collector", "12", "01/31", "321");
        let PaymentMethod::Card(details) = short.validate().unwrap() else {
            panic!("expected card");
        };
        assert_eq!(details.last_four(), "12");
    }

    #[test]
    fn test_card_field_order() {
        let mut form = PaymentForm::card("", "", "", "");
        assert_eq!(form.validate().unwrap_err().to_string(), "card number is required");

        form.card_number = SecretString::from("4111111111111111".to_string());
        assert_eq!(form.validate().unwrap_err().to_string(), "expiry date is required");

        form.expiry_date = "01/30".to_string();
        assert_eq!(form.validate().unwrap_err().to_string(), "cvv is required");

        form.cvv = SecretString::from("999".to_string());
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "cardholder name is required"
        );

        form.cardholder_name = "B. Buyer".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_card_length_limits() {
        let mut form = card();
        form.cvv = SecretString::from("12345".to_string());
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::TooLong { field: "cvv", max: CVV_MAX }
        );

        let mut form = card();
        form.card_number = SecretString::from("4".repeat(20));
        assert!(matches!(
            form.validate(),
            Err(ValidationError::TooLong { field: "card number", .. })
        ));
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let form = card();
        let method = form.validate().unwrap();
        let rendered = format!("{form:?} {method:?}");
        assert!(!rendered.contains("4242 4242 4242 4242"));
        assert!(!rendered.contains("123\""));
        assert!(rendered.contains("**** **** **** 4242"));
    }
}
