use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    audit::{self, Actor},
    dto::{
        filled,
        products::{CreateProductRequest, ProductDetail, ProductRatingSummary, UpdateProductRequest},
    },
    entity::{
        Ratings,
        products::{self, Entity as Products},
        ratings,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, Rating},
    response::{ApiResponse, Pagination},
    routes::params::ProductQuery,
    services::{contains_pattern, rating_service::average_rating},
    state::AppState,
};

const PRODUCT_NOT_FOUND: &str = "Produk tidak ditemukan";
const CODE_TAKEN: &str = "Kode produk sudah digunakan";

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(products::Column::Name).ilike(pattern.clone()))
                .add(Expr::col(products::Column::ProductCode).ilike(pattern.clone()))
                .add(Expr::col(products::Column::Description).ilike(pattern)),
        );
    }

    if let Some(product_type) = query.product_type.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(products::Column::ProductType.eq(product_type.as_str()));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(products::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Data produk berhasil ditampilkan",
        items,
        Pagination::new(page, limit, total),
    ))
}

async fn product_detail(state: &AppState, product: products::Model) -> AppResult<ProductDetail> {
    let ratings = product
        .find_related(Ratings)
        .order_by_desc(ratings::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Rating::from)
        .collect();
    Ok(ProductDetail {
        product: Product::from(product),
        ratings,
    })
}

pub async fn get_product(state: &AppState, id: i32) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND))?;
    Ok(ApiResponse::success(
        "Berhasil mendapatkan data produk",
        product_detail(state, product).await?,
    ))
}

pub async fn get_product_by_code(
    state: &AppState,
    code: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(products::Column::ProductCode.eq(code))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND))?;
    Ok(ApiResponse::success(
        "Berhasil mendapatkan data produk",
        product_detail(state, product).await?,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let (product_code, name, product_type, price) = match (
        filled(payload.product_code),
        filled(payload.name),
        filled(payload.product_type),
        payload.price,
    ) {
        (Some(code), Some(name), Some(kind), Some(price)) => (code, name, kind, price),
        _ => {
            return Err(AppError::bad_request(
                "Field wajib diisi (product_code, name, type, price)",
            ));
        }
    };

    let exist = Products::find()
        .filter(products::Column::ProductCode.eq(product_code.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(CODE_TAKEN.to_string()));
    }

    let product = products::ActiveModel {
        id: NotSet,
        product_code: Set(product_code),
        name: Set(name),
        image: Set(filled(payload.image)),
        product_type: Set(product_type),
        price: Set(price),
        description: Set(payload.description),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, CODE_TAKEN))?;

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Produk berhasil dibuat",
        Product::from(product),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND))?;

    let product_code = filled(payload.product_code);
    if let Some(code) = product_code.as_deref() {
        let taken = Products::find()
            .filter(products::Column::ProductCode.eq(code))
            .filter(products::Column::Id.ne(id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(
                "Kode produk sudah digunakan produk lain".to_string(),
            ));
        }
    }

    let mut active: products::ActiveModel = existing.into();
    if let Some(code) = product_code {
        active.product_code = Set(code);
    }
    if let Some(name) = filled(payload.name) {
        active.name = Set(name);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(product_type) = filled(payload.product_type) {
        active.product_type = Set(product_type);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, "Kode produk sudah digunakan produk lain"))?;

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Produk berhasil diupdate",
        Product::from(product),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found(PRODUCT_NOT_FOUND));
    }

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::empty("Produk berhasil dihapus"))
}

pub async fn product_rating(
    state: &AppState,
    id: i32,
) -> AppResult<ApiResponse<ProductRatingSummary>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND))?;

    let ratings: Vec<Rating> = product
        .find_related(Ratings)
        .order_by_desc(ratings::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Rating::from)
        .collect();
    let scores: Vec<f64> = ratings.iter().map(|r| r.rating).collect();

    Ok(ApiResponse::success(
        "Berhasil mendapatkan rating produk",
        ProductRatingSummary {
            product_id: product.id,
            product_name: product.name,
            total_ratings: ratings.len() as u64,
            average_rating: average_rating(&scores),
            ratings,
        },
    ))
}
