use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    dto::detail_orders::{CreateDetailOrderRequest, DetailOrderView, UpdateDetailOrderRequest},
    entity::{
        Orders, Products,
        detail_orders::{self, Entity as DetailOrders},
        orders, products,
    },
    error::{AppError, AppResult},
    models::{DetailOrder, Order, Product},
    response::{ApiResponse, Pagination},
    routes::params::DetailOrderQuery,
    services::order_service::check_amounts,
    state::AppState,
};

const DETAIL_NOT_FOUND: &str = "Detail pesanan tidak ditemukan";

async fn detail_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<detail_orders::Model>,
) -> AppResult<Vec<DetailOrderView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = rows.iter().map(|d| d.order_id).collect();
    let product_ids: Vec<i32> = rows.iter().map(|d| d.product_id).collect();

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

    Ok(rows
        .into_iter()
        .map(|d| DetailOrderView {
            order: orders.get(&d.order_id).cloned().map(Order::from),
            product: products.get(&d.product_id).cloned().map(Product::from),
            detail: DetailOrder::from(d),
        })
        .collect())
}

async fn single_view(state: &AppState, row: detail_orders::Model) -> AppResult<DetailOrderView> {
    detail_views(&state.orm, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(DETAIL_NOT_FOUND))
}

async fn ensure_order_and_product(
    state: &AppState,
    order_id: Option<i64>,
    product_id: Option<i32>,
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
    Ok(())
}

pub async fn list_detail_orders(
    state: &AppState,
    query: DetailOrderQuery,
) -> AppResult<ApiResponse<Vec<DetailOrderView>>> {
    let (page, limit, offset) = query.normalize();

    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(detail_orders::Column::OrderId.eq(order_id));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(detail_orders::Column::ProductId.eq(product_id));
    }

    let finder = DetailOrders::find()
        .filter(condition)
        .order_by_desc(detail_orders::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder.limit(limit).offset(offset).all(&state.orm).await?;

    Ok(ApiResponse::paginated(
        "Data detail pesanan berhasil ditampilkan",
        detail_views(&state.orm, rows).await?,
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_detail_order(
    state: &AppState,
    id: i64,
) -> AppResult<ApiResponse<DetailOrderView>> {
    let row = DetailOrders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(DETAIL_NOT_FOUND))?;
    Ok(ApiResponse::success(
        "Berhasil mendapatkan data detail pesanan",
        single_view(state, row).await?,
    ))
}

pub async fn create_detail_order(
    state: &AppState,
    payload: CreateDetailOrderRequest,
) -> AppResult<ApiResponse<DetailOrderView>> {
    let (order_id, product_id, price, quantity) = match (
        payload.order_id,
        payload.product_id,
        payload.price,
        payload.quantity,
    ) {
        (Some(o), Some(p), Some(price), Some(qty)) => (o, p, price, qty),
        _ => {
            return Err(AppError::bad_request(
                "Field wajib diisi (order_id, product_id, price, quantity)",
            ));
        }
    };
    check_amounts(price, quantity)?;
    ensure_order_and_product(state, Some(order_id), Some(product_id)).await?;

    let created = detail_orders::ActiveModel {
        id: NotSet,
        order_id: Set(order_id),
        product_id: Set(product_id),
        price: Set(price),
        quantity: Set(quantity),
        sub_total: Set(price * quantity),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Detail pesanan berhasil dibuat",
        single_view(state, created).await?,
    ))
}

/// `sub_total` follows the final price and quantity, whichever of them changed.
pub async fn update_detail_order(
    state: &AppState,
    id: i64,
    payload: UpdateDetailOrderRequest,
) -> AppResult<ApiResponse<DetailOrderView>> {
    let existing = DetailOrders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(DETAIL_NOT_FOUND))?;

    ensure_order_and_product(state, payload.order_id, payload.product_id).await?;

    let price = payload.price.unwrap_or(existing.price);
    let quantity = payload.quantity.unwrap_or(existing.quantity);
    check_amounts(price, quantity)?;

    let mut active: detail_orders::ActiveModel = existing.into();
    if let Some(order_id) = payload.order_id {
        active.order_id = Set(order_id);
    }
    if let Some(product_id) = payload.product_id {
        active.product_id = Set(product_id);
    }
    active.price = Set(price);
    active.quantity = Set(quantity);
    active.sub_total = Set(price * quantity);
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Detail pesanan berhasil diupdate",
        single_view(state, updated).await?,
    ))
}

pub async fn delete_detail_order(state: &AppState, id: i64) -> AppResult<ApiResponse<()>> {
    let result = DetailOrders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(DETAIL_NOT_FOUND));
    }
    Ok(ApiResponse::empty("Detail pesanan berhasil dihapus"))
}
