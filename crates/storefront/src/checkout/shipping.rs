//! Shipping step.

use crate::api::ShippingAddressPayload;

use super::error::ValidationError;

/// Raw shipping form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingForm {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingForm {
    /// Check that every field is present, in form order.
    ///
    /// Only presence is checked. Whitespace-only input counts as missing and
    /// surrounding whitespace is trimmed from the result.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] naming the first empty field.
    pub fn validate(&self) -> Result<ShippingAddress, ValidationError> {
        Ok(ShippingAddress {
            full_name: required("full name", &self.full_name)?,
            address: required("address", &self.address)?,
            city: required("city", &self.city)?,
            postal_code: required("postal code", &self.postal_code)?,
            country: required("country", &self.country)?,
            phone: required("phone", &self.phone)?,
        })
    }
}

impl From<&ShippingAddress> for ShippingForm {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            full_name: address.full_name.clone(),
            address: address.address.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone: address.phone.clone(),
        }
    }
}

pub(super) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(value.to_string())
}

/// A validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    full_name: String,
    address: String,
    city: String,
    postal_code: String,
    country: String,
    phone: String,
}

impl ShippingAddress {
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    #[must_use]
    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Address lines as shown on the review step.
    #[must_use]
    pub fn lines(&self) -> [String; 4] {
        [
            self.full_name.clone(),
            self.address.clone(),
            format!("{}, {}", self.city, self.postal_code),
            self.country.clone(),
        ]
    }

    pub(crate) fn to_payload(&self) -> ShippingAddressPayload {
        ShippingAddressPayload {
            full_name: self.full_name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            phone: self.phone.clone(),
        }
    }
}
