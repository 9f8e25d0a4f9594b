use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    dto::ratings::{
        CreateRatingRequest, ProductRatings, RatingView, UpdateRatingRequest,
    },
    entity::{
        Buyers, Orders, Products,
        buyers, orders, products,
        ratings::{self, Entity as Ratings},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{BuyerSummary, Order, Product, Rating},
    response::{ApiResponse, Pagination},
    routes::params::{PageQuery, RatingQuery},
    state::AppState,
};

const RATING_NOT_FOUND: &str = "Rating tidak ditemukan";
const RATING_TAKEN: &str = "Rating sudah ada untuk pesanan, produk, dan pembeli ini";

/// Mean of the scores rounded to two decimals; zero when there are none.
pub fn average_rating(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}

pub(crate) fn validate_score(score: f64) -> AppResult<f64> {
    if !(1.0..=5.0).contains(&score) {
        return Err(AppError::bad_request("Rating harus antara 1-5"));
    }
    Ok(score)
}

/// Every score recorded for a product, in no particular order.
pub(crate) async fn product_scores<C: ConnectionTrait>(db: &C, product_id: i32) -> AppResult<Vec<f64>> {
    let scores = Ratings::find()
        .select_only()
        .column(ratings::Column::Rating)
        .filter(ratings::Column::ProductId.eq(product_id))
        .into_tuple::<f64>()
        .all(db)
        .await?;
    Ok(scores)
}

/// Attaches order, product and buyer summary to each rating.
pub(crate) async fn rating_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<ratings::Model>,
) -> AppResult<Vec<RatingView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = rows.iter().map(|r| r.order_id).collect();
    let product_ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
    let buyer_ids: Vec<i64> = rows.iter().map(|r| r.buyer_id).collect();

    let orders: HashMap<i64, orders::Model> = Orders::find()
        .filter(orders::Column::Id.is_in(order_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|o| (o.id, o))
        .collect();
    let products: HashMap<i32, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let buyers: HashMap<i64, buyers::Model> = Buyers::find()
        .filter(buyers::Column::Id.is_in(buyer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    Ok(rows
        .into_iter()
        .map(|r| RatingView {
            order: orders.get(&r.order_id).cloned().map(Order::from),
            product: products.get(&r.product_id).cloned().map(Product::from),
            buyer: buyers.get(&r.buyer_id).cloned().map(BuyerSummary::from),
            rating: Rating::from(r),
        })
        .collect())
}

async fn find_rating(state: &AppState, id: i64) -> AppResult<ratings::Model> {
    Ratings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(RATING_NOT_FOUND))
}

async fn ensure_references(
    state: &AppState,
    order_id: Option<i64>,
    product_id: Option<i32>,
    buyer_id: Option<i64>,
) -> AppResult<()> {
    if let Some(id) = order_id {
        if Orders::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::not_found("Pesanan tidak ditemukan"));
        }
    }
    if let Some(id) = product_id {
        if Products::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::not_found("Produk tidak ditemukan"));
        }
    }
    if let Some(id) = buyer_id {
        if Buyers::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::not_found("Pembeli tidak ditemukan"));
        }
    }
    Ok(())
}

async fn ensure_triple_free(
    state: &AppState,
    exclude_id: Option<i64>,
    order_id: i64,
    product_id: i32,
    buyer_id: i64,
) -> AppResult<()> {
    let mut condition = Condition::all()
        .add(ratings::Column::OrderId.eq(order_id))
        .add(ratings::Column::ProductId.eq(product_id))
        .add(ratings::Column::BuyerId.eq(buyer_id));
    if let Some(id) = exclude_id {
        condition = condition.add(ratings::Column::Id.ne(id));
    }
    if Ratings::find().filter(condition).one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(RATING_TAKEN.to_string()));
    }
    Ok(())
}

pub async fn list_ratings(
    state: &AppState,
    user: &AuthUser,
    query: RatingQuery,
) -> AppResult<ApiResponse<Vec<RatingView>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize();

    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(ratings::Column::OrderId.eq(order_id));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(ratings::Column::ProductId.eq(product_id));
    }
    if let Some(buyer_id) = query.buyer_id {
        condition = condition.add(ratings::Column::BuyerId.eq(buyer_id));
    }

    let finder = Ratings::find()
        .filter(condition)
        .order_by_desc(ratings::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder.limit(limit).offset(offset).all(&state.orm).await?;

    Ok(ApiResponse::paginated(
        "Data rating berhasil ditampilkan",
        rating_views(&state.orm, rows).await?,
        Pagination::new(page, limit, total),
    ))
}

/// One page of a product's ratings; the average covers all of them.
pub async fn list_product_ratings(
    state: &AppState,
    product_id: i32,
    query: PageQuery,
) -> AppResult<ApiResponse<ProductRatings>> {
    let (page, limit, offset) = query.normalize();

    let finder = Ratings::find()
        .filter(ratings::Column::ProductId.eq(product_id))
        .order_by_desc(ratings::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder.limit(limit).offset(offset).all(&state.orm).await?;
    let scores = product_scores(&state.orm, product_id).await?;

    Ok(ApiResponse::paginated(
        "Data rating produk berhasil ditampilkan",
        ProductRatings {
            product_id,
            average_rating: average_rating(&scores),
            total_ratings: total,
            ratings: rating_views(&state.orm, rows).await?,
        },
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_rating(state: &AppState, id: i64) -> AppResult<ApiResponse<RatingView>> {
    let found = find_rating(state, id).await?;
    let view = rating_views(&state.orm, vec![found])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(RATING_NOT_FOUND))?;
    Ok(ApiResponse::success("Berhasil mendapatkan data rating", view))
}

pub async fn create_rating(
    state: &AppState,
    payload: CreateRatingRequest,
) -> AppResult<ApiResponse<RatingView>> {
    let (order_id, product_id, buyer_id, score) = match (
        payload.order_id,
        payload.product_id,
        payload.buyer_id,
        payload.rating,
    ) {
        (Some(o), Some(p), Some(b), Some(r)) => (o, p, b, r),
        _ => {
            return Err(AppError::bad_request(
                "Field wajib diisi (order_id, product_id, buyer_id, rating)",
            ));
        }
    };
    let score = validate_score(score)?;

    ensure_references(state, Some(order_id), Some(product_id), Some(buyer_id)).await?;
    ensure_triple_free(state, None, order_id, product_id, buyer_id).await?;

    let created = ratings::ActiveModel {
        id: NotSet,
        order_id: Set(order_id),
        product_id: Set(product_id),
        buyer_id: Set(buyer_id),
        rating: Set(score),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, RATING_TAKEN))?;

    tracing::info!(rating_id = created.id, product_id, "rating created");
    let view = rating_views(&state.orm, vec![created])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(RATING_NOT_FOUND))?;
    Ok(ApiResponse::success("Rating berhasil dibuat", view))
}

pub async fn update_rating(
    state: &AppState,
    id: i64,
    payload: UpdateRatingRequest,
) -> AppResult<ApiResponse<RatingView>> {
    let existing = find_rating(state, id).await?;

    if let Some(score) = payload.rating {
        validate_score(score)?;
    }
    ensure_references(state, payload.order_id, payload.product_id, payload.buyer_id).await?;

    let order_id = payload.order_id.unwrap_or(existing.order_id);
    let product_id = payload.product_id.unwrap_or(existing.product_id);
    let buyer_id = payload.buyer_id.unwrap_or(existing.buyer_id);
    ensure_triple_free(state, Some(id), order_id, product_id, buyer_id).await?;

    let mut active: ratings::ActiveModel = existing.into();
    active.order_id = Set(order_id);
    active.product_id = Set(product_id);
    active.buyer_id = Set(buyer_id);
    if let Some(score) = payload.rating {
        active.rating = Set(score);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, RATING_TAKEN))?;

    let view = rating_views(&state.orm, vec![updated])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(RATING_NOT_FOUND))?;
    Ok(ApiResponse::success("Rating berhasil diupdate", view))
}

pub async fn delete_rating(state: &AppState, id: i64) -> AppResult<ApiResponse<()>> {
    let result = Ratings::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(RATING_NOT_FOUND));
    }
    Ok(ApiResponse::empty("Rating berhasil dihapus"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_rounded_to_two_decimals() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[5.0]), 5.0);
        assert_eq!(average_rating(&[4.0, 5.0, 5.0]), 4.67);
        assert_eq!(average_rating(&[1.0, 2.0]), 1.5);
    }

    #[test]
    fn scores_outside_one_to_five_are_rejected() {
        assert!(validate_score(1.0).is_ok());
        assert!(validate_score(5.0).is_ok());
        assert!(validate_score(0.5).is_err());
        assert!(validate_score(5.5).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }
}
