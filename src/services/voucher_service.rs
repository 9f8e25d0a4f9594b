use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    audit::{self, Actor},
    dto::{
        filled,
        vouchers::{CreateVoucherRequest, UpdateVoucherRequest, VoucherView},
    },
    entity::{
        Buyers, buyers,
        vouchers::{self, Entity as Vouchers},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{BuyerSummary, Voucher},
    response::{ApiResponse, Pagination},
    routes::params::SearchQuery,
    services::contains_pattern,
    state::AppState,
};

const VOUCHER_NOT_FOUND: &str = "Voucher tidak ditemukan";
const CODE_TAKEN: &str = "Kode voucher sudah digunakan";

pub fn is_expired(expired_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expired_time
}

/// Usage counts must stay within `0..=quantity_max`.
pub fn check_quota(quantity_used: i32, quantity_max: i32) -> AppResult<()> {
    if quantity_max < 1 {
        return Err(AppError::bad_request("Quantity max minimal 1"));
    }
    if quantity_used < 0 || quantity_used > quantity_max {
        return Err(AppError::bad_request(
            "Quantity used tidak boleh melebihi quantity max",
        ));
    }
    Ok(())
}

async fn voucher_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<vouchers::Model>,
) -> AppResult<Vec<VoucherView>> {
    let buyer_ids: Vec<i64> = rows.iter().filter_map(|v| v.buyer_id).collect();
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

    Ok(rows
        .into_iter()
        .map(|v| VoucherView {
            buyer: v
                .buyer_id
                .and_then(|id| buyers.get(&id).cloned())
                .map(BuyerSummary::from),
            voucher: Voucher::from(v),
        })
        .collect())
}

async fn single_view(state: &AppState, row: vouchers::Model) -> AppResult<VoucherView> {
    voucher_views(&state.orm, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(VOUCHER_NOT_FOUND))
}

async fn find_voucher(state: &AppState, id: i32) -> AppResult<vouchers::Model> {
    Vouchers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(VOUCHER_NOT_FOUND))
}

async fn ensure_buyer_exists(state: &AppState, buyer_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = buyer_id {
        if Buyers::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::not_found("Pembeli tidak ditemukan"));
        }
    }
    Ok(())
}

pub async fn list_vouchers(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<Vec<VoucherView>>> {
    let (page, limit, offset) = query.normalize();

    let mut condition = Condition::all();
    if let Some(term) = query.term() {
        let pattern = contains_pattern(term);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(vouchers::Column::Name).ilike(pattern.clone()))
                .add(Expr::col(vouchers::Column::Code).ilike(pattern)),
        );
    }

    let finder = Vouchers::find()
        .filter(condition)
        .order_by_desc(vouchers::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder.limit(limit).offset(offset).all(&state.orm).await?;

    Ok(ApiResponse::paginated(
        "Berhasil mendapatkan data semua voucher",
        voucher_views(&state.orm, rows).await?,
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_voucher(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<VoucherView>> {
    ensure_admin(user)?;
    let voucher = find_voucher(state, id).await?;
    Ok(ApiResponse::success(
        "Berhasil mendapatkan data voucher",
        single_view(state, voucher).await?,
    ))
}

pub async fn get_voucher_by_code(
    state: &AppState,
    code: &str,
) -> AppResult<ApiResponse<VoucherView>> {
    let voucher = Vouchers::find()
        .filter(vouchers::Column::Code.eq(code))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(VOUCHER_NOT_FOUND))?;
    Ok(ApiResponse::success(
        "Berhasil mendapatkan data voucher",
        single_view(state, voucher).await?,
    ))
}

pub async fn create_voucher(
    state: &AppState,
    user: &AuthUser,
    payload: CreateVoucherRequest,
) -> AppResult<ApiResponse<VoucherView>> {
    ensure_admin(user)?;

    let (name, code, expired_time, quantity_max) = match (
        filled(payload.name),
        filled(payload.code),
        payload.expired_time,
        payload.quantity_max,
    ) {
        (Some(name), Some(code), Some(expired_time), Some(max)) => {
            (name, code, expired_time, max)
        }
        _ => {
            return Err(AppError::bad_request(
                "Field wajib diisi (name, code, expired_time, quantity_max)",
            ));
        }
    };
    check_quota(0, quantity_max)?;
    ensure_buyer_exists(state, payload.buyer_id).await?;

    let exist = Vouchers::find()
        .filter(vouchers::Column::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(CODE_TAKEN.to_string()));
    }

    let created = vouchers::ActiveModel {
        id: NotSet,
        name: Set(name),
        code: Set(code),
        expired_time: Set(expired_time.into()),
        quantity_used: Set(0),
        quantity_max: Set(quantity_max),
        buyer_id: Set(payload.buyer_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, CODE_TAKEN))?;

    Ok(ApiResponse::success(
        "Voucher berhasil dibuat",
        single_view(state, created).await?,
    ))
}

pub async fn update_voucher(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateVoucherRequest,
) -> AppResult<ApiResponse<VoucherView>> {
    ensure_admin(user)?;
    let existing = find_voucher(state, id).await?;

    let code = filled(payload.code);
    if let Some(code) = code.as_deref() {
        let taken = Vouchers::find()
            .filter(vouchers::Column::Code.eq(code))
            .filter(vouchers::Column::Id.ne(id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(CODE_TAKEN.to_string()));
        }
    }
    ensure_buyer_exists(state, payload.buyer_id).await?;

    let quantity_used = payload.quantity_used.unwrap_or(existing.quantity_used);
    let quantity_max = payload.quantity_max.unwrap_or(existing.quantity_max);
    check_quota(quantity_used, quantity_max)?;

    let mut active: vouchers::ActiveModel = existing.into();
    if let Some(name) = filled(payload.name) {
        active.name = Set(name);
    }
    if let Some(code) = code {
        active.code = Set(code);
    }
    if let Some(expired_time) = payload.expired_time {
        active.expired_time = Set(expired_time.into());
    }
    if let Some(buyer_id) = payload.buyer_id {
        active.buyer_id = Set(Some(buyer_id));
    }
    active.quantity_used = Set(quantity_used);
    active.quantity_max = Set(quantity_max);
    active.updated_at = Set(Utc::now().into());

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, CODE_TAKEN))?;

    Ok(ApiResponse::success(
        "Voucher berhasil diupdate",
        single_view(state, updated).await?,
    ))
}

/// Consumes one use. The increment is a single conditional UPDATE, so concurrent
/// callers can never push `quantity_used` past `quantity_max`.
pub async fn use_voucher(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<VoucherView>> {
    let voucher = find_voucher(state, id).await?;

    if is_expired(voucher.expired_time.with_timezone(&Utc), Utc::now()) {
        return Err(AppError::bad_request("Voucher sudah expired"));
    }

    let result = Vouchers::update_many()
        .col_expr(
            vouchers::Column::QuantityUsed,
            Expr::col(vouchers::Column::QuantityUsed).add(1),
        )
        .col_expr(vouchers::Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(vouchers::Column::Id.eq(id))
        .filter(Expr::col(vouchers::Column::QuantityUsed).lt(Expr::col(vouchers::Column::QuantityMax)))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::bad_request("Voucher sudah habis digunakan"));
    }

    let voucher = find_voucher(state, id).await?;

    tracing::info!(voucher_id = id, used = voucher.quantity_used, "voucher used");
    audit::record(
        &state.pool,
        Actor::User(user.id),
        "voucher_use",
        "vouchers",
        serde_json::json!({ "voucher_id": id, "quantity_used": voucher.quantity_used }),
    )
    .await;

    Ok(ApiResponse::success(
        "Voucher berhasil digunakan",
        single_view(state, voucher).await?,
    ))
}

pub async fn delete_voucher(state: &AppState, user: &AuthUser, id: i32) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;
    let result = Vouchers::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(VOUCHER_NOT_FOUND));
    }
    Ok(ApiResponse::empty("Voucher berhasil dihapus"))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn voucher_is_usable_up_to_its_expiry_instant() {
        let expiry = Utc::now();
        assert!(!is_expired(expiry, expiry));
        assert!(is_expired(expiry, expiry + Duration::seconds(1)));
        assert!(!is_expired(expiry, expiry - Duration::days(1)));
    }

    #[test]
    fn quota_bounds() {
        assert!(check_quota(0, 10).is_ok());
        assert!(check_quota(10, 10).is_ok());
        assert!(check_quota(11, 10).is_err());
        assert!(check_quota(-1, 10).is_err());
        assert!(check_quota(0, 0).is_err());
    }
}
