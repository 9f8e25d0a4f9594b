use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    audit::{self, Actor},
    dto::{
        filled,
        orders::{
            CreateOrderRequest, DetailOrderWithProduct, OrderLineRequest, OrderView,
            UpdateOrderRequest,
        },
    },
    entity::{
        Buyers, DetailOrders, Products, Ratings, Users, buyers, detail_orders,
        orders::{self, Entity as Orders},
        products, ratings, users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner},
    models::{BuyerSummary, DetailOrder, Order, Product, Rating, UserSummary},
    response::{ApiResponse, Pagination},
    routes::params::OrderQuery,
    services::contains_pattern,
    state::AppState,
};

const ORDER_NOT_FOUND: &str = "Pesanan tidak ditemukan";
const CODE_TAKEN: &str = "Kode pesanan sudah digunakan";

/// A line item that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderLine {
    pub product_id: i32,
    pub price: f64,
    pub quantity: f64,
}

impl OrderLine {
    pub fn sub_total(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Checks price and quantity on a single line. Quantity must be positive and price
/// non-negative.
pub(crate) fn check_amounts(price: f64, quantity: f64) -> AppResult<()> {
    if quantity.is_nan() || quantity <= 0.0 {
        return Err(AppError::bad_request("Quantity harus lebih dari 0"));
    }
    if price.is_nan() || price < 0.0 {
        return Err(AppError::bad_request("Harga tidak boleh negatif"));
    }
    Ok(())
}

pub fn validate_lines(lines: &[OrderLineRequest]) -> AppResult<Vec<OrderLine>> {
    lines
        .iter()
        .map(|line| match (line.product_id, line.price, line.quantity) {
            (Some(product_id), Some(price), Some(quantity)) => {
                check_amounts(price, quantity)?;
                Ok(OrderLine {
                    product_id,
                    price,
                    quantity,
                })
            }
            _ => Err(AppError::bad_request(
                "Detail pesanan harus memiliki product_id, price, dan quantity",
            )),
        })
        .collect()
}

/// Loads user, buyer, detail lines (with products) and ratings for each order.
pub(crate) async fn order_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<orders::Model>,
) -> AppResult<Vec<OrderView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = rows.iter().map(|o| o.id).collect();
    let user_ids: Vec<i32> = rows.iter().filter_map(|o| o.user_id).collect();
    let buyer_ids: Vec<i64> = rows.iter().filter_map(|o| o.buyer_id).collect();

    let users: HashMap<i32, users::Model> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };
    let buyers: HashMap<i64, buyers::Model> = if buyer_ids.is_empty() {
        HashMap::new()
    } else {
        Buyers::find()
            .filter(buyers::Column::Id.is_in(buyer_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect()
    };

    let details = DetailOrders::find()
        .filter(detail_orders::Column::OrderId.is_in(order_ids.clone()))
        .order_by_asc(detail_orders::Column::Id)
        .all(db)
        .await?;
    let product_ids: Vec<i32> = details.iter().map(|d| d.product_id).collect();
    let products: HashMap<i32, products::Model> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let mut lines_by_order: HashMap<i64, Vec<DetailOrderWithProduct>> = HashMap::new();
    for detail in details {
        let product = products.get(&detail.product_id).cloned().map(Product::from);
        lines_by_order
            .entry(detail.order_id)
            .or_default()
            .push(DetailOrderWithProduct {
                detail: DetailOrder::from(detail),
                product,
            });
    }

    let mut ratings_by_order: HashMap<i64, Vec<Rating>> = HashMap::new();
    for rating in Ratings::find()
        .filter(ratings::Column::OrderId.is_in(order_ids))
        .all(db)
        .await?
    {
        ratings_by_order
            .entry(rating.order_id)
            .or_default()
            .push(Rating::from(rating));
    }

    Ok(rows
        .into_iter()
        .map(|order| OrderView {
            user: order
                .user_id
                .and_then(|id| users.get(&id).cloned())
                .map(UserSummary::from),
            buyer: order
                .buyer_id
                .and_then(|id| buyers.get(&id).cloned())
                .map(BuyerSummary::from),
            detail_orders: lines_by_order.remove(&order.id).unwrap_or_default(),
            ratings: ratings_by_order.remove(&order.id).unwrap_or_default(),
            order: Order::from(order),
        })
        .collect())
}

async fn single_view<C: ConnectionTrait>(db: &C, order: orders::Model) -> AppResult<OrderView> {
    order_views(db, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(ORDER_NOT_FOUND))
}

/// Only admins may move an order to another user or detach it. `requested` is the
/// raw update field: `None` when absent, `Some(None)` for an explicit null.
pub(crate) fn check_reassignment(
    user: &AuthUser,
    current: Option<i32>,
    requested: Option<Option<i32>>,
) -> AppResult<()> {
    match requested {
        Some(target) if target != current && !user.is_admin() => Err(AppError::Forbidden(
            "Hanya admin yang dapat memindahkan pesanan".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn ensure_parties_exist<C: ConnectionTrait>(
    db: &C,
    user_id: Option<i32>,
    buyer_id: Option<i64>,
) -> AppResult<()> {
    if let Some(id) = user_id {
        if Users::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::not_found("Pengguna tidak ditemukan"));
        }
    }
    if let Some(id) = buyer_id {
        if Buyers::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::not_found("Pembeli tidak ditemukan"));
        }
    }
    Ok(())
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderQuery,
) -> AppResult<ApiResponse<Vec<OrderView>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(orders::Column::OrderCode).ilike(pattern.clone()))
                .add(Expr::col(orders::Column::Description).ilike(pattern)),
        );
    }
    if let Some(user_id) = query.user_id {
        condition = condition.add(orders::Column::UserId.eq(user_id));
    }
    if let Some(buyer_id) = query.buyer_id {
        condition = condition.add(orders::Column::BuyerId.eq(buyer_id));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(orders::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder.limit(limit).offset(offset).all(&state.orm).await?;

    Ok(ApiResponse::paginated(
        "Data pesanan berhasil ditampilkan",
        order_views(&state.orm, rows).await?,
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderView>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(ORDER_NOT_FOUND))?;
    ensure_owner(user, order.user_id)?;

    Ok(ApiResponse::success(
        "Berhasil mendapatkan data pesanan",
        single_view(&state.orm, order).await?,
    ))
}

pub async fn get_order_by_code(state: &AppState, code: &str) -> AppResult<ApiResponse<OrderView>> {
    let order = Orders::find()
        .filter(orders::Column::OrderCode.eq(code))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(ORDER_NOT_FOUND))?;

    Ok(ApiResponse::success(
        "Berhasil mendapatkan data pesanan",
        single_view(&state.orm, order).await?,
    ))
}

/// Inserts the order and all of its lines in one transaction. Orders that name
/// neither a user nor a buyer belong to the caller. A taken code is reported before
/// any line is looked at.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let (order_code, total, lines) = match (
        filled(payload.order_code),
        payload.total,
        payload.detail_orders.filter(|lines| !lines.is_empty()),
    ) {
        (Some(code), Some(total), Some(lines)) => (code, total, lines),
        _ => {
            return Err(AppError::bad_request(
                "Field wajib diisi (order_code, total, detail_orders)",
            ));
        }
    };

    let exist = Orders::find()
        .filter(orders::Column::OrderCode.eq(order_code.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(CODE_TAKEN.to_string()));
    }
    let lines = validate_lines(&lines)?;

    let (user_id, buyer_id) = match (payload.user_id, payload.buyer_id) {
        (None, None) => (Some(user.id), None),
        given => given,
    };

    let txn = state.orm.begin().await?;

    ensure_parties_exist(&txn, user_id, buyer_id).await?;
    for line in &lines {
        if Products::find_by_id(line.product_id).one(&txn).await?.is_none() {
            return Err(AppError::bad_request(format!(
                "Produk dengan ID {} tidak ditemukan",
                line.product_id
            )));
        }
    }

    let order = orders::ActiveModel {
        id: NotSet,
        order_code: Set(order_code),
        user_id: Set(user_id),
        buyer_id: Set(buyer_id),
        total: Set(total),
        discount: Set(payload.discount.unwrap_or(0.0)),
        description: Set(payload.description.unwrap_or_default()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::from_write(e, CODE_TAKEN))?;

    for line in &lines {
        detail_orders::ActiveModel {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            price: Set(line.price),
            quantity: Set(line.quantity),
            sub_total: Set(line.sub_total()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(order_id = order.id, lines = lines.len(), "order created");
    audit::record(
        &state.pool,
        Actor::User(user.id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_code": order.order_code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pesanan berhasil dibuat",
        single_view(&state.orm, order).await?,
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(ORDER_NOT_FOUND))?;
    ensure_owner(user, existing.user_id)?;

    let order_code = filled(payload.order_code);
    if let Some(code) = order_code.as_deref() {
        let taken = Orders::find()
            .filter(orders::Column::OrderCode.eq(code))
            .filter(orders::Column::Id.ne(id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(
                "Kode pesanan sudah digunakan pesanan lain".to_string(),
            ));
        }
    }
    check_reassignment(user, existing.user_id, payload.user_id)?;
    ensure_parties_exist(
        &state.orm,
        payload.user_id.flatten(),
        payload.buyer_id.flatten(),
    )
    .await?;

    let mut active: orders::ActiveModel = existing.into();
    if let Some(code) = order_code {
        active.order_code = Set(code);
    }
    if let Some(user_id) = payload.user_id {
        active.user_id = Set(user_id);
    }
    if let Some(buyer_id) = payload.buyer_id {
        active.buyer_id = Set(buyer_id);
    }
    if let Some(total) = payload.total {
        active.total = Set(total);
    }
    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, "Kode pesanan sudah digunakan pesanan lain"))?;

    Ok(ApiResponse::success(
        "Pesanan berhasil diupdate",
        single_view(&state.orm, updated).await?,
    ))
}

/// Detail lines go with the order through the cascading foreign key.
pub async fn delete_order(state: &AppState, user: &AuthUser, id: i64) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found(ORDER_NOT_FOUND));
    }

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::empty("Pesanan berhasil dihapus"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Option<i32>, price: Option<f64>, quantity: Option<f64>) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            price,
            quantity,
        }
    }

    #[test]
    fn sub_total_is_price_times_quantity() {
        let lines = validate_lines(&[line(Some(1), Some(10.0), Some(2.0))]).unwrap();
        assert_eq!(lines[0].sub_total(), 20.0);

        let fractional = OrderLine {
            product_id: 1,
            price: 12.5,
            quantity: 0.5,
        };
        assert_eq!(fractional.sub_total(), 12.5 * 0.5);
    }

    #[test]
    fn lines_missing_a_field_are_rejected() {
        let err = validate_lines(&[
            line(Some(1), Some(10.0), Some(1.0)),
            line(Some(2), None, Some(1.0)),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Detail pesanan harus memiliki product_id, price, dan quantity"
        );
    }

    fn caller(id: i32, role: crate::models::Role) -> AuthUser {
        AuthUser {
            id,
            username: format!("u{id}"),
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn only_admins_move_orders_between_users() {
        use crate::models::Role;

        let owner = caller(3, Role::User);
        assert!(check_reassignment(&owner, Some(3), None).is_ok());
        assert!(check_reassignment(&owner, Some(3), Some(Some(3))).is_ok());
        assert!(matches!(
            check_reassignment(&owner, Some(3), Some(Some(4))),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_reassignment(&owner, Some(3), Some(None)),
            Err(AppError::Forbidden(_))
        ));

        let admin = caller(1, Role::Admin);
        assert!(check_reassignment(&admin, Some(3), Some(Some(4))).is_ok());
        assert!(check_reassignment(&admin, Some(3), Some(None)).is_ok());
    }

    #[test]
    fn quantity_must_be_positive_and_price_not_negative() {
        assert!(validate_lines(&[line(Some(1), Some(10.0), Some(0.0))]).is_err());
        assert!(validate_lines(&[line(Some(1), Some(-1.0), Some(1.0))]).is_err());
        assert!(validate_lines(&[line(Some(1), Some(0.0), Some(1.0))]).is_ok());
        assert!(check_amounts(f64::NAN, 1.0).is_err());
    }
}
