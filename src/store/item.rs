//! Item records

use serde::{Deserialize, Serialize};

/// Item as submitted by a client
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewItem {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: f64,
  #[serde(default)]
  pub tax: Option<f64>,
}

/// Stored item: the submitted fields plus the generated id and, when tax is
/// present and non-zero, `price_with_tax`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub name: String,
  pub description: Option<String>,
  pub price: f64,
  pub tax: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub price_with_tax: Option<f64>,
  pub id: String,
}

impl NewItem {
  /// Attach the id and the derived price
  pub fn into_item(self, id: String) -> Item {
    let price_with_tax = match self.tax {
      Some(tax) if tax != 0.0 => Some(self.price + tax),
      _ => None,
    };

    Item {
      name: self.name,
      description: self.description,
      price: self.price,
      tax: self.tax,
      price_with_tax,
      id,
    }
  }
}
