use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const PAGE_SIZE: usize = 20;
pub const CURRENCIES: [&str; 4] = ["KRW", "USD", "JPY", "EUR"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub price: u64,
    pub bargain_price: u64,
    pub currency: String,
    pub stock: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: u64,
    pub name: String,
    pub thumbnail: String,
    pub price: u64,
    pub bargain_price: u64,
    pub currency: String,
    pub stock: u64,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            thumbnail: p.thumbnail.clone(),
            price: p.price,
            bargain_price: p.bargain_price,
            currency: p.currency.clone(),
            stock: p.stock,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateProduct {
    pub title: Option<String>,
    #[serde(alias = "discription")]
    pub description: Option<String>,
    pub price: Option<u64>,
    pub currency: Option<String>,
    pub stock: Option<u64>,
    pub discounted_price: Option<u64>,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DeleteProduct {
    pub id: u64,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

struct StoredProduct {
    product: Product,
    discounted_price: Option<u64>,
    password: String,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    products: BTreeMap<u64, StoredProduct>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error answered as `{"message": ...}` with the given status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "product not found")
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "password mismatch")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "message": self.message }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_products(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<ProductSummary>> {
    let store = db.read().await;
    let skip = query.page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    Json(
        store
            .products
            .values()
            .skip(skip)
            .take(PAGE_SIZE)
            .map(|stored| ProductSummary::from(&stored.product))
            .collect(),
    )
}

#[derive(Default)]
struct CreateForm {
    title: Option<String>,
    description: Option<String>,
    price: Option<u64>,
    currency: Option<String>,
    stock: Option<u64>,
    discounted_price: Option<u64>,
    images: Vec<ImagePart>,
    password: Option<String>,
}

enum ImagePart {
    Url(String),
    File(String),
}

async fn create_product(
    State(db): State<Db>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let mut form = CreateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(text(field).await?),
            "description" | "discription" => form.description = Some(text(field).await?),
            "price" => form.price = Some(number("price", field).await?),
            "currency" => form.currency = Some(text(field).await?),
            "stock" => form.stock = Some(number("stock", field).await?),
            "discounted_price" => form.discounted_price = Some(number("discounted_price", field).await?),
            "password" => form.password = Some(text(field).await?),
            "images[]" | "images" => {
                let part = match field.file_name() {
                    Some(file_name) => {
                        let file_name = file_name.to_string();
                        // Uploaded bytes are not kept; only the name ends up in the URL.
                        field
                            .bytes()
                            .await
                            .map_err(|e| ApiError::bad_request(e.to_string()))?;
                        ImagePart::File(file_name)
                    }
                    None => ImagePart::Url(text(field).await?),
                };
                form.images.push(part);
            }
            other => return Err(ApiError::bad_request(format!("unknown field: {other}"))),
        }
    }

    let title = required(form.title, "title")?;
    let description = required(form.description, "description")?;
    let price = required(form.price, "price")?;
    let currency = check_currency(required(form.currency, "currency")?)?;
    let stock = required(form.stock, "stock")?;
    let password = required(form.password, "password")?;
    if form.images.is_empty() {
        return Err(ApiError::bad_request("missing field: images"));
    }
    check_discount(price, form.discounted_price)?;

    let mut store = db.write().await;
    store.next_id += 1;
    let id = store.next_id;

    let images: Vec<String> = form
        .images
        .into_iter()
        .enumerate()
        .map(|(n, part)| match part {
            ImagePart::Url(url) => url,
            ImagePart::File(file_name) => format!("/images/{id}/{n}-{file_name}"),
        })
        .collect();

    let product = Product {
        id,
        name: title,
        description,
        thumbnail: images[0].clone(),
        images,
        price,
        bargain_price: form.discounted_price.unwrap_or(price),
        currency,
        stock,
    };
    store.products.insert(
        id,
        StoredProduct {
            product: product.clone(),
            discounted_price: form.discounted_price,
            password,
        },
    );
    tracing::info!(id, "Created product");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Product>, ApiError> {
    let store = db.read().await;
    store
        .products
        .get(&id)
        .map(|stored| Json(stored.product.clone()))
        .ok_or_else(ApiError::not_found)
}

async fn update_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    let mut store = db.write().await;
    let stored = store.products.get_mut(&id).ok_or_else(ApiError::not_found)?;
    if stored.password != input.password {
        return Err(ApiError::forbidden());
    }

    let mut product = stored.product.clone();
    if let Some(title) = input.title {
        product.name = title;
    }
    if let Some(description) = input.description {
        product.description = description;
    }
    if let Some(price) = input.price {
        product.price = price;
    }
    if let Some(currency) = input.currency {
        product.currency = check_currency(currency)?;
    }
    if let Some(stock) = input.stock {
        product.stock = stock;
    }
    let discounted_price = input.discounted_price.or(stored.discounted_price);
    check_discount(product.price, discounted_price)?;
    product.bargain_price = discounted_price.unwrap_or(product.price);

    stored.product = product.clone();
    stored.discounted_price = discounted_price;
    tracing::info!(id, "Updated product");
    Ok(Json(product))
}

async fn delete_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<DeleteProduct>,
) -> Result<Json<Product>, ApiError> {
    if input.id != id {
        return Err(ApiError::bad_request("id does not match path"));
    }
    let mut store = db.write().await;
    let stored = store.products.get(&id).ok_or_else(ApiError::not_found)?;
    if stored.password != input.password {
        return Err(ApiError::forbidden());
    }
    let removed = store.products.remove(&id).ok_or_else(ApiError::not_found)?;
    tracing::info!(id, "Deleted product");
    Ok(Json(removed.product))
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn number(name: &str, field: Field<'_>) -> Result<u64, ApiError> {
    let raw = text(field).await?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a non-negative integer")))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(format!("missing field: {name}")))
}

fn check_currency(currency: String) -> Result<String, ApiError> {
    if CURRENCIES.contains(&currency.as_str()) {
        Ok(currency)
    } else {
        Err(ApiError::bad_request(format!("unsupported currency: {currency}")))
    }
}

fn check_discount(price: u64, discounted_price: Option<u64>) -> Result<(), ApiError> {
    match discounted_price {
        Some(discounted) if discounted > price => Err(ApiError::bad_request(
            "discounted_price must not exceed price",
        )),
        _ => Ok(()),
    }
}
