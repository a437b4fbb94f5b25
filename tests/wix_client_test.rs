use flowerstock::sync::WixClient;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

fn client(server: &MockServer) -> WixClient {
    WixClient::new(&server.base_url(), "api-key", "site-1", Some("account-1"))
}

#[tokio::test]
async fn collections_query_carries_auth_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/stores/v1/collections/query")
            .header("Authorization", "api-key")
            .header("wix-site-id", "site-1")
            .header("wix-account-id", "account-1");
        then.status(200).json_body(json!({
            "collections": [
                {"id": "col-1", "name": "Bouquets"},
                {"id": "col-2", "name": "Plants"}
            ]
        }));
    });

    let collections = client(&server).collections().await.unwrap();
    mock.assert();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].id, "col-1");
    assert_eq!(collections[1].name, "Plants");
}

#[tokio::test]
async fn product_query_pages_until_short_page() {
    let server = MockServer::start();

    // Full first page (100 products) forces a second request.
    let first_page: Vec<serde_json::Value> = (0..100)
        .map(|i| json!({"id": format!("p{i}"), "name": format!("Product {i}")}))
        .collect();
    let page_one = server.mock(|when, then| {
        when.method(POST)
            .path("/stores-reader/v1/products/query")
            .json_body_partial(r#"{"query": {"paging": {"limit": 100, "offset": 0}}}"#);
        then.status(200).json_body(json!({"products": first_page}));
    });
    let page_two = server.mock(|when, then| {
        when.method(POST)
            .path("/stores-reader/v1/products/query")
            .json_body_partial(r#"{"query": {"paging": {"limit": 100, "offset": 100}}}"#);
        then.status(200).json_body(json!({
            "products": [{
                "id": "p100",
                "name": "Last",
                "variants": [{"id": "v1", "stock": {"quantity": 5, "inStock": true}}]
            }]
        }));
    });

    let products = client(&server)
        .products_by_collection("col-1")
        .await
        .unwrap();
    page_one.assert();
    page_two.assert();
    assert_eq!(products.len(), 101);
    assert_eq!(products[100].variants[0].stock.quantity, Some(5));
}

#[tokio::test]
async fn short_first_page_stops_pagination() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/stores-reader/v1/products/query");
        then.status(200)
            .json_body(json!({"products": [{"id": "p1", "name": "Only"}]}));
    });

    let products = client(&server)
        .products_by_collection("col-1")
        .await
        .unwrap();
    mock.assert_hits(1);
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn price_updates_hit_product_and_variant_endpoints() {
    let server = MockServer::start();
    let product_patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/stores/v1/products/p1")
            .json_body(json!({"product": {"priceData": {"price": 34.5}}}));
        then.status(200).json_body(json!({}));
    });
    let variant_patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/stores/v1/products/p1/variants")
            .json_body(json!({"variants": [{"id": "v1", "price": 12.0}]}));
        then.status(200).json_body(json!({}));
    });

    let client = client(&server);
    client.update_product_price("p1", 34.5).await.unwrap();
    client.update_variant_price("p1", "v1", 12.0).await.unwrap();
    product_patch.assert();
    variant_patch.assert();
}

#[tokio::test]
async fn inventory_update_tracks_quantity() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/stores/v2/inventoryItems/product/p1")
            .json_body(json!({
                "inventoryItem": {
                    "productId": "p1",
                    "trackQuantity": true,
                    "variants": [
                        {"variantId": "v1", "quantity": 50},
                        {"variantId": "v2", "quantity": 30}
                    ]
                }
            }));
        then.status(200).json_body(json!({}));
    });

    client(&server)
        .update_inventory_quantity("p1", &[("v1".into(), 50), ("v2".into(), 30)])
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn server_error_surfaces_as_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PATCH).path("/stores/v1/products/p1");
        then.status(500);
    });

    let err = client(&server)
        .update_product_price("p1", 10.0)
        .await
        .unwrap_err();
    assert!(matches!(err, flowerstock::StoreError::Api(_)));
}
