use serde::{Deserialize, Serialize};

const CURRENCY_ICON_BASE: &str = "https://yastatic.net/s3/web-payment/trust/icons";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrencyIconSize {
    Small,
    #[default]
    Medium,
    Svg,
}

impl CurrencyIconSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyIconSize::Small => "small",
            CurrencyIconSize::Medium => "medium",
            CurrencyIconSize::Svg => "svg",
        }
    }
}

/// Catalog entry as configured in the developer console
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "imageURI")]
    pub image_uri: String,
    /// Formatted price, e.g. `"50 YAN"`
    pub price: String,
    /// Numeric part of the price as a string, e.g. `"50"`
    #[serde(rename = "priceValue")]
    pub price_value: String,
    #[serde(rename = "priceCurrencyCode")]
    pub price_currency_code: String,
}

impl Product {
    /// Icon URL for the product's currency
    pub fn price_currency_image(&self, size: CurrencyIconSize) -> String {
        format!(
            "{CURRENCY_ICON_BASE}/{}/{}.png",
            size.as_str(),
            self.price_currency_code
        )
    }
}

/// A completed purchase; stays listed until consumed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Purchase {
    #[serde(rename = "productID")]
    pub product_id: String,
    #[serde(rename = "purchaseToken")]
    pub purchase_token: String,
    #[serde(rename = "developerPayload")]
    pub developer_payload: String,
    /// Present only in signed mode
    pub signature: String,
}
