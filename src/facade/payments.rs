use tracing::{debug, warn};

use super::{Bridge, OperationRequest, decode_json, require_non_empty};
use crate::core::{OperationKind, Result};
use crate::correlation::CorrelationKey;
use crate::host::HostCall;
use crate::models::{Product, Purchase};

impl Bridge {
    /// Products configured for the game
    pub async fn get_catalog(&self) -> Result<Vec<Product>> {
        let kind = OperationKind::Catalog;
        let request = OperationRequest::singleton(kind, HostCall::GetCatalog);
        self.call(request, |body| decode_json(kind, body)).await
    }

    /// Buy `product_id`.
    ///
    /// Grant the item and persist the player's state before calling
    /// [`Bridge::consume_purchase`]; a consumed purchase cannot be recovered.
    pub async fn purchase(
        &self,
        product_id: &str,
        developer_payload: Option<&str>,
    ) -> Result<Purchase> {
        require_non_empty("product id", product_id)?;
        let payload = developer_payload.unwrap_or_default();

        let kind = OperationKind::Purchase;
        let request = OperationRequest::new(
            kind,
            CorrelationKey::explicit(product_id),
            HostCall::Purchase {
                product_id: product_id.to_string(),
                developer_payload: payload.to_string(),
            },
        )
        .fingerprint(payload);
        let purchase: Purchase = self.call(request, |body| decode_json(kind, body)).await?;

        debug!(product_id, token = %purchase.purchase_token, "purchase completed, grant before consuming");
        Ok(purchase)
    }

    /// Purchases not yet consumed
    pub async fn get_purchases(&self) -> Result<Vec<Purchase>> {
        let kind = OperationKind::Purchases;
        let request = OperationRequest::singleton(kind, HostCall::GetPurchases);
        self.call(request, |body| decode_json(kind, body)).await
    }

    /// Mark a purchase as delivered so it no longer shows up in
    /// [`Bridge::get_purchases`]
    pub async fn consume_purchase(&self, purchase_token: &str) -> Result<()> {
        require_non_empty("purchase token", purchase_token)?;

        let request = OperationRequest::new(
            OperationKind::ConsumePurchase,
            CorrelationKey::explicit(purchase_token),
            HostCall::ConsumePurchase {
                purchase_token: purchase_token.to_string(),
            },
        );
        self.call(request, |_| Ok(())).await
    }

    /// Whether an unconsumed purchase of `product_id` exists.
    ///
    /// Errors are logged and reported as `false`.
    pub async fn has_purchase(&self, product_id: &str) -> bool {
        match self.get_purchases().await {
            Ok(purchases) => purchases.iter().any(|p| p.product_id == product_id),
            Err(err) => {
                warn!(product_id, error = %err, "purchase lookup failed");
                false
            }
        }
    }
}
