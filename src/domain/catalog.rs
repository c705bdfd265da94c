//! Catalog records: products and delivery areas.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ProductCategory {
    #[serde(rename = "Black Crabs")]
    BlackCrabs,
    #[serde(rename = "Green Crabs")]
    GreenCrabs,
    #[serde(rename = "Mud Crabs")]
    MudCrabs,
    Fish,
    Prawns,
    Lobsters,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::BlackCrabs => "Black Crabs",
            ProductCategory::GreenCrabs => "Green Crabs",
            ProductCategory::MudCrabs => "Mud Crabs",
            ProductCategory::Fish => "Fish",
            ProductCategory::Prawns => "Prawns",
            ProductCategory::Lobsters => "Lobsters",
        }
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            ProductCategory::BlackCrabs | ProductCategory::GreenCrabs | ProductCategory::MudCrabs => {
                CategoryGroup::MudCrabs
            }
            ProductCategory::Fish | ProductCategory::Prawns | ProductCategory::Lobsters => {
                CategoryGroup::FreshFish
            }
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Black Crabs" => Ok(ProductCategory::BlackCrabs),
            "Green Crabs" => Ok(ProductCategory::GreenCrabs),
            "Mud Crabs" => Ok(ProductCategory::MudCrabs),
            "Fish" => Ok(ProductCategory::Fish),
            "Prawns" => Ok(ProductCategory::Prawns),
            "Lobsters" => Ok(ProductCategory::Lobsters),
            other => Err(format!("unknown product category `{other}`")),
        }
    }
}

/// Storefront filter tabs, each covering several categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryGroup {
    MudCrabs,
    FreshFish,
}

impl CategoryGroup {
    pub fn categories(&self) -> &'static [ProductCategory] {
        match self {
            CategoryGroup::MudCrabs => &[
                ProductCategory::BlackCrabs,
                ProductCategory::GreenCrabs,
                ProductCategory::MudCrabs,
            ],
            CategoryGroup::FreshFish => &[
                ProductCategory::Fish,
                ProductCategory::Prawns,
                ProductCategory::Lobsters,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductUnit {
    #[default]
    Kg,
    Piece,
}

impl ProductUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductUnit::Kg => "kg",
            ProductUnit::Piece => "piece",
        }
    }
}

impl FromStr for ProductUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(ProductUnit::Kg),
            "piece" => Ok(ProductUnit::Piece),
            other => Err(format!("unknown product unit `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub name_localized: Option<String>,
    pub category: ProductCategory,
    pub price: Decimal,
    pub unit: ProductUnit,
    pub description: String,
    pub image: String,
    pub stock: i32,
    pub min_order_quantity: Decimal,
    /// Orderability gate, independent of stock.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-supplied product fields, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    /// Optional slug; generated when absent on create, ignored on update.
    pub id: Option<String>,
    pub name: String,
    pub name_localized: Option<String>,
    pub category: ProductCategory,
    pub price: Decimal,
    #[serde(default)]
    pub unit: ProductUnit,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "crate::domain::money::quantity_step")]
    pub min_order_quantity: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name is required".into());
        }
        if self.price.is_sign_negative() {
            return Err("price must not be negative".into());
        }
        if self.stock < 0 {
            return Err("stock must not be negative".into());
        }
        if self.min_order_quantity <= Decimal::ZERO {
            return Err("minimum order quantity must be positive".into());
        }
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err("product id must not be blank".into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryArea {
    pub id: Uuid,
    pub area: String,
    pub charge: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct DeliveryAreaInput {
    pub area: String,
    pub charge: Decimal,
}

impl DeliveryAreaInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.area.trim().is_empty() {
            return Err("area name is required".into());
        }
        if self.charge.is_sign_negative() {
            return Err("delivery charge must not be negative".into());
        }
        Ok(())
    }
}
