//! Draft-to-payload encoding.
//!
//! # Design
//! A `Payload` is the key/value body of a mutation before it is bound to a
//! wire format. `build_create_payload` checks that every required field is
//! present; `build_partial_update_payload` copies exactly the supplied
//! fields and never fills in defaults, so the server keeps whatever it has
//! stored for the rest. Both functions are pure.
//!
//! Fields live in a `serde_json::Map`, which keeps keys sorted, so encoding
//! the same payload twice produces identical bytes.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::types::{ImageRef, PartialProductDraft, ProductDraft};

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const PRICE: &str = "price";
pub const CURRENCY: &str = "currency";
pub const STOCK: &str = "stock";
pub const DISCOUNTED_PRICE: &str = "discounted_price";
pub const IMAGES: &str = "images";
pub const PASSWORD: &str = "password";

/// Description key used by older backends.
pub const LEGACY_DESCRIPTION: &str = "discription";

/// The key/value body of a create, update or delete request.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    fields: Map<String, Value>,
    images: Vec<ImageRef>,
}

impl Payload {
    /// A payload holding only the password.
    pub fn with_password(password: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(PASSWORD.to_string(), Value::from(password));
        Self {
            fields,
            images: Vec::new(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Images in the order they were drafted.
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Moves the value stored under `from` to `to`. No-op when `from` is
    /// absent, so optional fields stay absent.
    pub fn rename_key(&mut self, from: &str, to: &str) {
        if let Some(value) = self.fields.remove(from) {
            self.fields.insert(to.to_string(), value);
        }
    }

    /// JSON encoding of the fields.
    pub fn to_json(&self) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec(&self.fields).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    fn insert_opt(&mut self, key: &str, value: Option<impl Into<Value>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }
}

/// Builds the payload for a full create.
///
/// Fails with `ApiError::Validation` naming the first missing field. An
/// empty image list or an empty password counts as missing.
/// `discounted_price` is optional and only included when set.
pub fn build_create_payload(draft: &ProductDraft) -> Result<Payload, ApiError> {
    let title = require(draft.title.as_ref(), TITLE)?;
    let description = require(draft.description.as_ref(), DESCRIPTION)?;
    let price = require(draft.price, PRICE)?;
    let currency = require(draft.currency, CURRENCY)?;
    let stock = require(draft.stock, STOCK)?;
    if draft.images.is_empty() {
        return Err(ApiError::Validation { field: IMAGES });
    }
    if draft.password.is_empty() {
        return Err(ApiError::Validation { field: PASSWORD });
    }

    let mut payload = Payload::with_password(&draft.password);
    payload.insert(TITLE, title.as_str());
    payload.insert(DESCRIPTION, description.as_str());
    payload.insert(PRICE, price);
    payload.insert(CURRENCY, currency.code());
    payload.insert(STOCK, stock);
    payload.insert_opt(DISCOUNTED_PRICE, draft.discounted_price);
    payload.insert(
        IMAGES,
        draft
            .images
            .iter()
            .map(|image| Value::from(image.reference()))
            .collect::<Vec<_>>(),
    );
    payload.images = draft.images.clone();
    Ok(payload)
}

/// Builds the payload for a partial update: `password` plus exactly the
/// fields present in `draft`.
pub fn build_partial_update_payload(draft: &PartialProductDraft, password: &str) -> Payload {
    let mut payload = Payload::with_password(password);
    payload.insert_opt(TITLE, draft.title.as_deref());
    payload.insert_opt(DESCRIPTION, draft.description.as_deref());
    payload.insert_opt(PRICE, draft.price);
    payload.insert_opt(CURRENCY, draft.currency.map(|c| c.code()));
    payload.insert_opt(STOCK, draft.stock);
    payload.insert_opt(DISCOUNTED_PRICE, draft.discounted_price);
    payload
}

/// Builds the payload for a delete: the product id and the password.
pub fn build_delete_payload(id: u64, password: &str) -> Payload {
    let mut payload = Payload::with_password(password);
    payload.insert("id", id);
    payload
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ApiError> {
    value.ok_or(ApiError::Validation { field })
}
