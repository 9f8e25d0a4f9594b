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
        buyers::{BuyerDetail, CreateBuyerRequest, UpdateBuyerRequest},
        filled,
    },
    entity::{
        Orders, Ratings, Vouchers,
        buyers::{self, Entity as Buyers},
        orders, ratings, vouchers,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthBuyer, AuthUser, ensure_admin, ensure_buyer_owner},
    models::{Buyer, Order, Rating, Voucher},
    response::{ApiResponse, Pagination},
    routes::params::SearchQuery,
    services::contains_pattern,
    state::AppState,
};

const BUYER_NOT_FOUND: &str = "Pembeli tidak ditemukan";
const BUYER_TAKEN: &str = "Phone atau username sudah terdaftar";

pub async fn list_buyers(
    state: &AppState,
    user: &AuthUser,
    query: SearchQuery,
) -> AppResult<ApiResponse<Vec<Buyer>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize();

    let mut condition = Condition::all();
    if let Some(term) = query.term() {
        let pattern = contains_pattern(term);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(buyers::Column::Username).ilike(pattern.clone()))
                .add(Expr::col(buyers::Column::Phone).ilike(pattern)),
        );
    }

    let finder = Buyers::find()
        .filter(condition)
        .order_by_desc(buyers::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Buyer::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Berhasil mendapatkan data semua pembeli",
        items,
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_buyer(
    state: &AppState,
    buyer: &AuthBuyer,
    id: i64,
) -> AppResult<ApiResponse<BuyerDetail>> {
    ensure_buyer_owner(buyer, id)?;

    let found = Buyers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(BUYER_NOT_FOUND))?;

    let vouchers = found
        .find_related(Vouchers)
        .order_by_desc(vouchers::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Voucher::from)
        .collect();
    let orders = found
        .find_related(Orders)
        .order_by_desc(orders::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    let ratings = found
        .find_related(Ratings)
        .order_by_desc(ratings::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Rating::from)
        .collect();

    Ok(ApiResponse::success(
        "Berhasil mendapatkan data pembeli",
        BuyerDetail {
            buyer: Buyer::from(found),
            vouchers,
            orders,
            ratings,
        },
    ))
}

async fn ensure_buyer_free(
    state: &AppState,
    exclude_id: Option<i64>,
    phone: Option<&str>,
    username: Option<&str>,
) -> AppResult<()> {
    if phone.is_none() && username.is_none() {
        return Ok(());
    }

    let mut either = Condition::any();
    if let Some(phone) = phone {
        either = either.add(buyers::Column::Phone.eq(phone));
    }
    if let Some(username) = username {
        either = either.add(buyers::Column::Username.eq(username));
    }

    let mut condition = Condition::all().add(either);
    if let Some(id) = exclude_id {
        condition = condition.add(buyers::Column::Id.ne(id));
    }

    if Buyers::find().filter(condition).one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(BUYER_TAKEN.to_string()));
    }
    Ok(())
}

/// Creates a buyer with a caller-chosen activation code and expiry.
pub async fn create_buyer(
    state: &AppState,
    payload: CreateBuyerRequest,
) -> AppResult<ApiResponse<Buyer>> {
    let (phone, username, activation_code, expired) = match (
        filled(payload.phone),
        filled(payload.username),
        filled(payload.activation_code),
        payload.expired,
    ) {
        (Some(phone), Some(username), Some(code), Some(expired)) => {
            (phone, username, code, expired)
        }
        _ => {
            return Err(AppError::bad_request(
                "Semua field wajib diisi (phone, username, activation_code, expired)",
            ));
        }
    };

    ensure_buyer_free(state, None, Some(&phone), Some(&username)).await?;

    let created = buyers::ActiveModel {
        id: NotSet,
        phone: Set(phone),
        username: Set(username),
        activation_code: Set(activation_code),
        expired: Set(expired.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, BUYER_TAKEN))?;

    tracing::info!(buyer_id = created.id, "buyer created");
    Ok(ApiResponse::success(
        "Pembeli berhasil dibuat",
        Buyer::from(created),
    ))
}

pub async fn update_buyer(
    state: &AppState,
    buyer: &AuthBuyer,
    id: i64,
    payload: UpdateBuyerRequest,
) -> AppResult<ApiResponse<Buyer>> {
    ensure_buyer_owner(buyer, id)?;

    let existing = Buyers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(BUYER_NOT_FOUND))?;

    let phone = filled(payload.phone);
    let username = filled(payload.username);
    ensure_buyer_free(state, Some(id), phone.as_deref(), username.as_deref()).await?;

    let mut active: buyers::ActiveModel = existing.into();
    if let Some(phone) = phone {
        active.phone = Set(phone);
    }
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(code) = filled(payload.activation_code) {
        active.activation_code = Set(code);
    }
    if let Some(expired) = payload.expired {
        active.expired = Set(expired.into());
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, BUYER_TAKEN))?;

    Ok(ApiResponse::success(
        "Pembeli berhasil diupdate",
        Buyer::from(updated),
    ))
}

pub async fn delete_buyer(state: &AppState, user: &AuthUser, id: i64) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;

    let result = Buyers::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(BUYER_NOT_FOUND));
    }

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "buyer_delete",
        "buyers",
        serde_json::json!({ "buyer_id": id }),
    )
    .await;

    Ok(ApiResponse::empty("Pembeli berhasil dihapus"))
}
