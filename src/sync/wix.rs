use crate::utils::error::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub choices: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub stock: Stock,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    #[serde(default)]
    collections: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<Product>,
}

/// Client for the store's Wix-style catalog/inventory REST API. Calls are
/// sequential with no retry; HTTP failures map straight to `StoreError::Api`.
pub struct WixClient {
    client: Client,
    base_url: String,
    api_key: String,
    site_id: String,
    account_id: Option<String>,
}

impl WixClient {
    pub fn new(base_url: &str, api_key: &str, site_id: &str, account_id: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            site_id: site_id.to_string(),
            account_id: account_id.map(String::from),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", &self.api_key)
            .header("wix-site-id", &self.site_id);
        if let Some(account_id) = &self.account_id {
            builder = builder.header("wix-account-id", account_id);
        }
        builder
    }

    /// All store collections, for mapping category names to ids.
    pub async fn collections(&self) -> Result<Vec<Collection>> {
        let response = self
            .request(reqwest::Method::POST, "/stores/v1/collections/query")
            .json(&json!({"query": {"paging": {"limit": PAGE_SIZE}}}))
            .send()
            .await?
            .error_for_status()?;
        let body: CollectionsResponse = response.json().await?;
        Ok(body.collections)
    }

    /// Products of one collection, variants included. Pages by offset until
    /// a short page signals the end.
    pub async fn products_by_collection(&self, collection_id: &str) -> Result<Vec<Product>> {
        let filter = json!({"collections.id": {"$hasSome": [collection_id]}});
        let mut products = Vec::new();
        let mut offset = 0;

        loop {
            tracing::debug!(
                "querying products for collection {} (offset {})",
                collection_id,
                offset
            );
            let response = self
                .request(reqwest::Method::POST, "/stores-reader/v1/products/query")
                .json(&json!({
                    "query": {
                        // The API expects the filter as an embedded JSON string.
                        "filter": filter.to_string(),
                        "paging": {"limit": PAGE_SIZE, "offset": offset},
                    },
                    "includeVariants": true,
                }))
                .send()
                .await?
                .error_for_status()?;
            let page: ProductsResponse = response.json().await?;
            let fetched = page.products.len();
            products.extend(page.products);
            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }
        Ok(products)
    }

    pub async fn update_product_price(&self, product_id: &str, price: f64) -> Result<()> {
        tracing::info!("updating price of product {} to {}", product_id, price);
        self.request(
            reqwest::Method::PATCH,
            &format!("/stores/v1/products/{product_id}"),
        )
        .json(&json!({"product": {"priceData": {"price": price}}}))
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }

    pub async fn update_variant_price(
        &self,
        product_id: &str,
        variant_id: &str,
        price: f64,
    ) -> Result<()> {
        tracing::info!(
            "updating price of variant {} (product {}) to {}",
            variant_id,
            product_id,
            price
        );
        self.request(
            reqwest::Method::PATCH,
            &format!("/stores/v1/products/{product_id}/variants"),
        )
        .json(&json!({"variants": [{"id": variant_id, "price": price}]}))
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }

    pub async fn update_product_visibility(&self, product_id: &str, visible: bool) -> Result<()> {
        tracing::info!("setting product {} visible={}", product_id, visible);
        self.request(
            reqwest::Method::PATCH,
            &format!("/stores/v1/products/{product_id}"),
        )
        .json(&json!({"product": {"visible": visible}}))
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }

    /// Sets tracked stock quantities for the given variants of one product.
    pub async fn update_inventory_quantity(
        &self,
        product_id: &str,
        variants: &[(String, u32)],
    ) -> Result<()> {
        let updates: Vec<serde_json::Value> = variants
            .iter()
            .map(|(variant_id, quantity)| json!({"variantId": variant_id, "quantity": quantity}))
            .collect();
        tracing::info!(
            "updating inventory of product {} ({} variants)",
            product_id,
            updates.len()
        );
        self.request(
            reqwest::Method::PATCH,
            &format!("/stores/v2/inventoryItems/product/{product_id}"),
        )
        .json(&json!({
            "inventoryItem": {
                "productId": product_id,
                "trackQuantity": true,
                "variants": updates,
            }
        }))
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }
}
