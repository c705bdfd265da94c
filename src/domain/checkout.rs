//! Checkout payload accepted by order creation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::{
    money::{max_amount, max_quantity},
    order::DeliveryAddress,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    /// Ten-digit Indian mobile number.
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_address"))]
    pub address: String,
    #[validate(custom(function = "validate_area"))]
    pub area: String,
    /// Six-digit postal code.
    #[validate(custom(function = "validate_pincode"))]
    pub pincode: String,
}

impl CustomerInput {
    pub fn to_delivery_address(&self) -> DeliveryAddress {
        DeliveryAddress {
            name: self.name.trim().to_string(),
            phone: self.phone.clone(),
            email: self.email.clone().filter(|e| !e.trim().is_empty()),
            address: self.address.trim().to_string(),
            area: self.area.trim().to_string(),
            pincode: self.pincode.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product_id: String,
    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
    /// Unit price seen by the customer when the item was added to the cart.
    #[validate(custom(function = "validate_amount"))]
    pub price: Decimal,
    /// Client-computed line total; informational only, the server recomputes it.
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    #[validate(nested)]
    pub customer: CustomerInput,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<LineItemInput>,
    /// Flat fee of the delivery area chosen at checkout.
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub delivery_charge: Decimal,
    pub notes: Option<String>,
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required").with_message(format!("{field} is required").into()))
    } else {
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    required(name, "name")
}

fn validate_address(address: &str) -> Result<(), ValidationError> {
    required(address, "address")
}

fn validate_area(area: &str) -> Result<(), ValidationError> {
    required(area, "area")
}

fn validate_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity > max_quantity() {
        return Err(ValidationError::new("quantity").with_message("quantity is too large".into()));
    }
    Ok(())
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        return Err(ValidationError::new("amount").with_message("amount must not be negative".into()));
    }
    if *amount > max_amount() {
        return Err(ValidationError::new("amount").with_message("amount is too large".into()));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("phone must be 10 digits".into()))
    }
}

fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
    if pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("pincode").with_message("pincode must be 6 digits".into()))
    }
}
