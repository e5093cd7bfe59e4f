//! Product Aggregate

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Money, ResourceId};

/// A catalog product as served by the backend. Read-only on the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    pub price: Money,
    #[serde(default)]
    pub discount_price: Option<Money>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub stock_count: u32,
    #[serde(default)]
    pub specs: BTreeMap<String, SpecValue>,
    #[serde(default)]
    pub featured: bool,
}

/// A specification entry: either a single scalar or a list of values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Text(String),
    Number(serde_json::Number),
    List(Vec<String>),
}

impl SpecValue {
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s.clone()],
            Self::Number(n) => vec![n.to_string()],
            Self::List(items) => items.clone(),
        }
    }
    pub fn is_list(&self) -> bool { matches!(self, Self::List(_)) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Star { Full, Half, Empty }

impl Product {
    pub fn is_in_stock(&self) -> bool { self.stock_count > 0 }

    /// Whole-number percentage saved by the discount price, 0 without one.
    /// Halves round up.
    pub fn discount_percentage(&self) -> u32 {
        let Some(discount) = self.discount_price else { return 0 };
        if self.price.is_zero() { return 0; }
        let saved = (self.price.amount() - discount.amount()) / self.price.amount() * Decimal::ONE_HUNDRED;
        saved.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_u32().unwrap_or(0)
    }

    /// Five stars for the rating: full below the floor, half for a fractional remainder.
    pub fn rating_stars(&self) -> [Star; 5] {
        let mut stars = [Star::Empty; 5];
        let full = self.rating.floor();
        for (i, star) in stars.iter_mut().enumerate() {
            let i = i as f64;
            *star = if i < full { Star::Full } else if i < self.rating { Star::Half } else { Star::Empty };
        }
        stars
    }

    /// Fill width in percent for the 1-based star `star_number`.
    pub fn star_fill_percent(&self, star_number: u8) -> f64 {
        let rating = self.rating.min(5.0);
        let remaining = rating - f64::from(star_number.saturating_sub(1));
        (remaining * 100.0).clamp(0.0, 100.0)
    }

    pub fn spec_keys(&self) -> impl Iterator<Item = &str> { self.specs.keys().map(String::as_str) }

    pub fn spec_values(&self, key: &str) -> Vec<String> {
        self.specs.get(key).map(SpecValue::values).unwrap_or_default()
    }

    pub fn primary_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or(&self.image_url)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}
