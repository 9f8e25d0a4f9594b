use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    audit::{self, Actor},
    dto::{
        auth::RegisterRequest,
        filled,
        users::{UpdateUserRequest, UserDetail},
    },
    entity::{
        orders::{self, Entity as Orders},
        users::{self, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner},
    models::{Order, UserProfile},
    response::{ApiResponse, Pagination},
    routes::params::SearchQuery,
    services::{
        auth_service::{NewUser, ensure_identity_free, hash_password, insert_user},
        contains_pattern,
    },
    state::AppState,
};

const USER_NOT_FOUND: &str = "Pengguna tidak ditemukan";

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: SearchQuery,
) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize();

    let mut condition = Condition::all();
    if let Some(term) = query.term() {
        let pattern = contains_pattern(term);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(users::Column::Username).ilike(pattern.clone()))
                .add(Expr::col(users::Column::Email).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(users::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Data pengguna berhasil ditampilkan",
        items,
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_user(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<UserDetail>> {
    ensure_owner(user, id)?;

    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    let orders = found
        .find_related(Orders)
        .order_by_desc(orders::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Berhasil mendapatkan data pengguna",
        UserDetail {
            user: UserProfile::from(found),
            orders,
        },
    ))
}

/// Open sign-up through the user resource; the account is always a plain user.
pub async fn create_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let new_user = NewUser::from_request(RegisterRequest {
        role: None,
        ..payload
    })?;
    let created = insert_user(state, new_user).await?;

    tracing::info!(user_id = created.id, "user created");
    audit::record(
        &state.pool,
        Actor::User(created.id),
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pengguna berhasil dibuat",
        UserProfile::from(created),
    ))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    ensure_owner(user, id)?;

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    let email = filled(payload.email);
    let username = filled(payload.username);
    ensure_identity_free(
        state,
        id,
        email.as_deref(),
        username.as_deref(),
        "Email atau username sudah digunakan pengguna lain",
    )
    .await?;

    let mut active: users::ActiveModel = existing.into();
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(phone) = filled(payload.phone) {
        active.phone = Set(phone);
    }
    if let Some(password) = filled(payload.password) {
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(gender) = filled(payload.gender) {
        active.gender = Set(gender);
    }
    if let Some(dob) = payload.dob {
        active.dob = Set(dob);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, "Email atau username sudah digunakan pengguna lain"))?;

    Ok(ApiResponse::success(
        "Pengguna berhasil diupdate",
        UserProfile::from(updated),
    ))
}

pub async fn delete_user(state: &AppState, user: &AuthUser, id: i32) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;

    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::empty("Pengguna berhasil dihapus"))
}
