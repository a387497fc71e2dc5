//! Stateless HTTP request builder and response parser for the market API.
//!
//! # Design
//! `MarketClient` holds only the base URL and a wire-compatibility flag and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. Executing the round-trip is left to the
//! caller or to `service::ProductService`.

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart;
use crate::payload::{
    build_create_payload, build_delete_payload, build_partial_update_payload, Payload, DESCRIPTION,
    LEGACY_DESCRIPTION,
};
use crate::types::{PartialProductDraft, ProductDetail, ProductDraft, ProductSummary, ServerError};

const JSON: &str = "application/json";

/// Synchronous, stateless client for the market API.
#[derive(Debug, Clone)]
pub struct MarketClient {
    base_url: String,
    legacy_description_key: bool,
}

impl MarketClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            legacy_description_key: false,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            legacy_description_key: config.legacy_description_key,
            ..Self::new(&config.base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_products(&self, page: u32) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/products?page={page}", self.base_url),
            headers: vec![("accept".to_string(), JSON.to_string())],
            body: None,
        }
    }

    pub fn build_get_product(&self, id: u64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/products/{id}", self.base_url),
            headers: vec![("accept".to_string(), JSON.to_string())],
            body: None,
        }
    }

    pub fn build_create_product(&self, draft: &ProductDraft) -> Result<HttpRequest, ApiError> {
        let payload = build_create_payload(draft)?;
        self.build_request(&payload, "/products", HttpMethod::Post)
    }

    pub fn build_update_product(
        &self,
        id: u64,
        draft: &PartialProductDraft,
        password: &str,
    ) -> Result<HttpRequest, ApiError> {
        let payload = build_partial_update_payload(draft, password);
        self.build_request(&payload, &format!("/products/{id}"), HttpMethod::Patch)
    }

    pub fn build_delete_product(&self, id: u64, password: &str) -> Result<HttpRequest, ApiError> {
        let payload = build_delete_payload(id, password);
        self.build_request(&payload, &format!("/products/{id}"), HttpMethod::Delete)
    }

    /// Binds `payload` to a wire format chosen by `method`: multipart for
    /// POST, JSON for PATCH and DELETE. GET requests carry no body.
    ///
    /// `endpoint` is a path relative to the base URL.
    pub fn build_request(
        &self,
        payload: &Payload,
        endpoint: &str,
        method: HttpMethod,
    ) -> Result<HttpRequest, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));

        let renamed;
        let payload = if self.legacy_description_key && payload.contains_key(DESCRIPTION) {
            let mut copy = payload.clone();
            copy.rename_key(DESCRIPTION, LEGACY_DESCRIPTION);
            renamed = copy;
            &renamed
        } else {
            payload
        };

        let (content_type, body) = match method {
            HttpMethod::Get => (None, None),
            HttpMethod::Post => {
                let form = multipart::encode(payload);
                (Some(form.content_type()), Some(form.bytes))
            }
            HttpMethod::Patch | HttpMethod::Delete => (Some(JSON.to_string()), Some(payload.to_json()?)),
        };

        let mut headers = vec![("accept".to_string(), JSON.to_string())];
        if let Some(content_type) = content_type {
            headers.push(("content-type".to_string(), content_type));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    pub fn parse_list_products(&self, response: HttpResponse) -> Result<Vec<ProductSummary>, ApiError> {
        check_status(&response)?;
        decode_list(&response.body)
    }

    /// Parses the single-product body returned by detail, create, update
    /// and delete.
    pub fn parse_product(&self, response: HttpResponse) -> Result<ProductDetail, ApiError> {
        check_status(&response)?;
        decode_detail(&response.body)
    }
}

/// Decodes a list response: a JSON array of product summaries.
pub fn decode_list(data: &[u8]) -> Result<Vec<ProductSummary>, ApiError> {
    decode(data, "Vec<ProductSummary>")
}

/// Decodes a detail response.
pub fn decode_detail(data: &[u8]) -> Result<ProductDetail, ApiError> {
    decode(data, "ProductDetail")
}

fn decode<T: DeserializeOwned>(data: &[u8], target: &'static str) -> Result<T, ApiError> {
    serde_json::from_slice(data).map_err(|e| ApiError::Decoding {
        target,
        reason: e.to_string(),
    })
}

/// Map non-2xx statuses to `ApiError::Request`, lifting the server's
/// `message` out of the body when it has one.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = match serde_json::from_slice::<ServerError>(&response.body) {
        Ok(err) => Some(err.message),
        Err(_) => {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
    };
    Err(ApiError::Request {
        status: Some(response.status),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, ImageRef};
    use proptest::prelude::*;

    const DETAIL: &str = r#"{"id":1,"name":"Lamp","description":"Desk lamp","thumbnail":"http://img/1.png","images":["http://img/1.png"],"price":5000,"bargain_price":4000,"currency":"KRW","stock":3}"#;

    fn client() -> MarketClient {
        MarketClient::new("http://localhost:3000")
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_list_products_produces_correct_request() {
        let req = client().build_list_products(2);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/products?page=2");
        assert!(req.body.is_none());
        assert_eq!(req.content_type(), None);
    }

    #[test]
    fn build_get_product_produces_correct_request() {
        let req = client().build_get_product(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/products/42");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_product_is_multipart() {
        let draft = ProductDraft {
            title: Some("Lamp".to_string()),
            description: Some("Desk lamp".to_string()),
            price: Some(5000),
            currency: Some(Currency::Krw),
            stock: Some(3),
            discounted_price: Some(4000),
            images: vec![ImageRef::url("http://img/1.png")],
            password: "abc".to_string(),
        };
        let req = client().build_create_product(&draft).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/products");
        assert!(req
            .content_type()
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains("name=\"discounted_price\"\r\n\r\n4000\r\n"));
        assert!(body.contains("name=\"images[]\"\r\n\r\nhttp://img/1.png\r\n"));
    }

    #[test]
    fn build_create_product_rejects_incomplete_draft() {
        let draft = ProductDraft {
            title: Some("Lamp".to_string()),
            password: "abc".to_string(),
            ..Default::default()
        };
        let err = client().build_create_product(&draft).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "description" }));
    }

    #[test]
    fn build_update_product_sends_only_present_fields() {
        let draft = PartialProductDraft {
            title: Some("Lamp".to_string()),
            price: Some(5000),
            ..Default::default()
        };
        let req = client().build_update_product(9, &draft, "abc").unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://localhost:3000/products/9");
        assert_eq!(req.content_type(), Some("application/json"));
        assert_eq!(
            body_json(&req),
            serde_json::json!({ "title": "Lamp", "price": 5000, "password": "abc" })
        );
    }

    #[test]
    fn build_delete_product_carries_id_and_password() {
        let req = client().build_delete_product(9, "abc").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:3000/products/9");
        assert_eq!(body_json(&req), serde_json::json!({ "id": 9, "password": "abc" }));
    }

    #[test]
    fn legacy_description_key_is_applied_to_outgoing_payloads() {
        let config = ClientConfig {
            legacy_description_key: true,
            ..ClientConfig::new("http://localhost:3000")
        };
        let client = MarketClient::from_config(&config);
        let draft = PartialProductDraft {
            description: Some("new".to_string()),
            ..Default::default()
        };
        let req = client.build_update_product(1, &draft, "abc").unwrap();
        assert_eq!(
            body_json(&req),
            serde_json::json!({ "discription": "new", "password": "abc" })
        );
    }

    #[test]
    fn parse_product_success() {
        let detail = client().parse_product(HttpResponse::new(200, DETAIL)).unwrap();
        assert_eq!(detail.name, "Lamp");
        assert_eq!(detail.bargain_price, 4000);
        assert_eq!(detail.currency, Currency::Krw);
    }

    #[test]
    fn parse_product_gone_carries_server_message() {
        let err = client()
            .parse_product(HttpResponse::new(410, r#"{"message": "gone"}"#))
            .unwrap_err();
        match err {
            ApiError::Request { status, message } => {
                assert_eq!(status, Some(410));
                assert_eq!(message.as_deref(), Some("gone"));
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn parse_product_plain_text_error_body_becomes_message() {
        let err = client()
            .parse_product(HttpResponse::new(500, "internal error"))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Request { status: Some(500), message: Some(ref m) } if m == "internal error"
        ));
    }

    #[test]
    fn parse_product_not_found_without_body() {
        let err = client().parse_product(HttpResponse::new(404, "")).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, ApiError::Request { message: None, .. }));
    }

    #[test]
    fn parse_product_missing_name_is_decoding_error() {
        let body = r#"{"id":1,"description":"d","thumbnail":"t","images":[],"price":1,"bargain_price":1,"currency":"KRW","stock":1}"#;
        let err = client().parse_product(HttpResponse::new(200, body)).unwrap_err();
        match err {
            ApiError::Decoding { target, reason } => {
                assert_eq!(target, "ProductDetail");
                assert!(reason.contains("name"), "{reason}");
            }
            other => panic!("expected Decoding, got {other:?}"),
        }
    }

    #[test]
    fn parse_list_products_success() {
        let body = r#"[{"id":1,"name":"Lamp","thumbnail":"t","price":5000,"bargain_price":5000,"currency":"USD","stock":1},
                       {"id":2,"name":"Desk","thumbnail":"t","price":9000,"bargain_price":8000,"currency":"KRW","stock":0}]"#;
        let items = client().parse_list_products(HttpResponse::new(200, body)).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Lamp");
        assert_eq!(items[1].id, 2);
    }

    #[test]
    fn decode_list_rejects_mistyped_price() {
        let body = r#"[{"id":1,"name":"Lamp","thumbnail":"t","price":"5000","bargain_price":5000,"currency":"USD","stock":1}]"#;
        let err = decode_list(body.as_bytes()).unwrap_err();
        assert!(matches!(err, ApiError::Decoding { target: "Vec<ProductSummary>", .. }));
    }

    #[test]
    fn detail_roundtrips_through_json() {
        let detail = decode_detail(DETAIL.as_bytes()).unwrap();
        let encoded = serde_json::to_vec(&detail).unwrap();
        assert_eq!(decode_detail(&encoded).unwrap(), detail);
    }

    fn currency() -> impl Strategy<Value = Currency> {
        prop_oneof![
            Just(Currency::Krw),
            Just(Currency::Usd),
            Just(Currency::Jpy),
            Just(Currency::Eur),
        ]
    }

    prop_compose! {
        fn product_detail()(
            id in any::<u64>(),
            name in ".{0,16}",
            description in ".{0,32}",
            images in proptest::collection::vec("https?://[a-z]{1,8}/[a-z0-9]{1,8}\\.png", 0..4),
            price in any::<u64>(),
            bargain_price in any::<u64>(),
            currency in currency(),
            stock in any::<u64>(),
        ) -> ProductDetail {
            let thumbnail = images.first().cloned().unwrap_or_default();
            ProductDetail { id, name, description, thumbnail, images, price, bargain_price, currency, stock }
        }
    }

    proptest! {
        #[test]
        fn any_detail_survives_encode_and_decode(detail in product_detail()) {
            let encoded = serde_json::to_vec(&detail).unwrap();
            prop_assert_eq!(decode_detail(&encoded).unwrap(), detail);
        }
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = MarketClient::new("http://localhost:3000/");
        let req = client.build_get_product(1);
        assert_eq!(req.url, "http://localhost:3000/products/1");
    }

    #[test]
    fn parse_list_products_bad_json() {
        let err = client()
            .parse_list_products(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decoding { .. }));
    }
}
