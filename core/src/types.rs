//! Domain DTOs for the market API.
//!
//! # Design
//! Drafts (`ProductDraft`, `PartialProductDraft`) are the caller-side view
//! of a mutation and are never deserialized from the wire. Responses
//! (`ProductSummary`, `ProductDetail`, `ServerError`) mirror the server's
//! JSON and are defined independently of the mock-server crate; the
//! integration tests catch schema drift between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency code attached to a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Krw,
    Usd,
    Jpy,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Krw => "KRW",
            Currency::Usd => "USD",
            Currency::Jpy => "JPY",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An image bytes payload to be attached to a create request.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

// Image bytes would drown any log line they ended up in.
impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One entry of a draft's ordered image list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// An image already hosted somewhere; sent as its URL.
    Url(String),
    /// Raw bytes sent as a file part.
    Upload(ImageUpload),
}

impl ImageRef {
    pub fn url(url: impl Into<String>) -> Self {
        ImageRef::Url(url.into())
    }

    pub fn upload(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        ImageRef::Upload(ImageUpload {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        })
    }

    /// The string that stands for this image in a JSON view of a payload:
    /// the URL, or the upload's file name.
    pub fn reference(&self) -> &str {
        match self {
            ImageRef::Url(url) => url,
            ImageRef::Upload(upload) => &upload.file_name,
        }
    }
}

/// Fields for creating a product.
///
/// Every field except `discounted_price` must be present for
/// `build_create_payload` to succeed, and `images` must be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub currency: Option<Currency>,
    pub stock: Option<u64>,
    pub discounted_price: Option<u64>,
    pub images: Vec<ImageRef>,
    pub password: String,
}

impl ProductDraft {
    /// Returns `false` when a discounted price is set above the price.
    ///
    /// Payload builders do not call this; enforcing it is up to the caller.
    pub fn check_discount(&self) -> bool {
        discount_within_price(self.price, self.discounted_price)
    }
}

/// Fields for a partial update. Omitted fields keep their stored value on
/// the server; the password is passed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<u64>,
}

impl PartialProductDraft {
    /// Only meaningful when both prices are part of the same edit.
    pub fn check_discount(&self) -> bool {
        discount_within_price(self.price, self.discounted_price)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn discount_within_price(price: Option<u64>, discounted: Option<u64>) -> bool {
    match (price, discounted) {
        (Some(price), Some(discounted)) => discounted <= price,
        _ => true,
    }
}

/// One element of the product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: u64,
    pub name: String,
    pub thumbnail: String,
    pub price: u64,
    pub bargain_price: u64,
    pub currency: Currency,
    pub stock: u64,
}

/// A single product with its description and full image list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub price: u64,
    pub bargain_price: u64,
    pub currency: Currency,
    pub stock: u64,
}

impl ProductDetail {
    pub fn is_discounted(&self) -> bool {
        self.bargain_price < self.price
    }

    pub fn is_sold_out(&self) -> bool {
        self.stock == 0
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            thumbnail: self.thumbnail.clone(),
            price: self.price,
            bargain_price: self.bargain_price,
            currency: self.currency,
            stock: self.stock,
        }
    }
}

/// What every mutation returns: the product as the server now stores it.
pub type ProductResponse = ProductDetail;

/// Structured error body returned with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,
}
