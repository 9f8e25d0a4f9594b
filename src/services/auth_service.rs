use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::OsRng;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter, Set,
};

use crate::{
    audit::{self, Actor},
    dto::{
        auth::{
            AuthPayload, BuyerAuthPayload, BuyerLoginRequest, BuyerRegisterPayload,
            BuyerRegisterRequest, ChangePasswordRequest, LoginRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        filled,
    },
    entity::{
        buyers::{self, Entity as Buyers},
        users::{self, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Buyer, Role, UserProfile},
    response::ApiResponse,
    services::token_service::{BuyerClaims, UserClaims},
    state::AppState,
};

pub const ACTIVATION_CODE_TTL_MINUTES: i64 = 30;

const BAD_CREDENTIALS: &str = "Email/username atau password salah";

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub(crate) fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Six-digit code, uniform over 100000..=999999.
pub fn generate_activation_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[derive(Debug, PartialEq, Eq)]
pub enum ActivationCheck {
    Accepted,
    WrongCode,
    Expired,
}

/// The expiry instant itself is still valid; the code is rejected strictly after it.
pub fn check_activation_code(
    stored: &str,
    given: &str,
    expired: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ActivationCheck {
    if stored != given {
        ActivationCheck::WrongCode
    } else if now > expired {
        ActivationCheck::Expired
    } else {
        ActivationCheck::Accepted
    }
}

fn issue_user_token(state: &AppState, user: &users::Model) -> AppResult<String> {
    state
        .tokens
        .issue_user(&UserClaims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        })
        .map_err(|e| AppError::Internal(e.into()))
}

fn issue_buyer_token(state: &AppState, buyer: &buyers::Model) -> AppResult<String> {
    state
        .tokens
        .issue_buyer(&BuyerClaims {
            buyer_id: buyer.id,
            username: buyer.username.clone(),
        })
        .map_err(|e| AppError::Internal(e.into()))
}

/// Validated fields of a new user account.
pub(crate) struct NewUser {
    pub email: String,
    pub username: String,
    pub phone: String,
    pub password: String,
    pub gender: String,
    pub dob: chrono::NaiveDate,
    pub address: String,
    pub role: Role,
}

impl NewUser {
    pub(crate) fn from_request(payload: RegisterRequest) -> AppResult<Self> {
        let missing = || {
            AppError::bad_request(
                "Field wajib diisi (email, username, phone, password, gender, dob)",
            )
        };
        let role = match filled(payload.role) {
            None => Role::User,
            Some(raw) => Role::parse(&raw)
                .ok_or_else(|| AppError::bad_request("Role tidak valid. Gunakan: admin, user"))?,
        };
        Ok(Self {
            email: filled(payload.email).ok_or_else(missing)?,
            username: filled(payload.username).ok_or_else(missing)?,
            phone: filled(payload.phone).ok_or_else(missing)?,
            password: filled(payload.password).ok_or_else(missing)?,
            gender: filled(payload.gender).ok_or_else(missing)?,
            dob: payload.dob.ok_or_else(missing)?,
            address: payload.address.unwrap_or_default(),
            role,
        })
    }
}

/// Shared by registration and the admin user surface: one existence query on
/// email OR username, then the insert.
pub(crate) async fn insert_user(state: &AppState, new_user: NewUser) -> AppResult<users::Model> {
    let exist = Users::find()
        .filter(
            Condition::any()
                .add(users::Column::Email.eq(new_user.email.as_str()))
                .add(users::Column::Username.eq(new_user.username.as_str())),
        )
        .one(&state.orm)
        .await?;

    if exist.is_some() {
        return Err(AppError::Conflict(
            "Email atau username sudah terdaftar".to_string(),
        ));
    }

    let password_hash = hash_password(&new_user.password)?;

    users::ActiveModel {
        id: NotSet,
        email: Set(new_user.email),
        username: Set(new_user.username),
        phone: Set(new_user.phone),
        password_hash: Set(password_hash),
        gender: Set(new_user.gender),
        dob: Set(new_user.dob),
        address: Set(new_user.address),
        role: Set(new_user.role),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, "Email atau username sudah terdaftar"))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    let new_user = NewUser::from_request(payload)?;
    let user = insert_user(state, new_user).await?;
    let token = issue_user_token(state, &user)?;

    tracing::info!(user_id = user.id, role = %user.role, "user registered");
    audit::record(
        &state.pool,
        Actor::User(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Registrasi berhasil",
        AuthPayload {
            user: UserProfile::from(user),
            token,
        },
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    let (identifier, password) = match (filled(payload.identifier), filled(payload.password)) {
        (Some(identifier), Some(password)) => (identifier, password),
        _ => {
            return Err(AppError::bad_request(
                "Email/username dan password wajib diisi",
            ));
        }
    };

    let user = Users::find()
        .filter(
            Condition::any()
                .add(users::Column::Email.eq(identifier.as_str()))
                .add(users::Column::Username.eq(identifier.as_str())),
        )
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized(BAD_CREDENTIALS.into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = issue_user_token(state, &user)?;

    tracing::info!(user_id = user.id, "user logged in");
    audit::record(
        &state.pool,
        Actor::User(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Login berhasil",
        AuthPayload {
            user: UserProfile::from(user),
            token,
        },
    ))
}

pub async fn register_buyer(
    state: &AppState,
    payload: BuyerRegisterRequest,
) -> AppResult<ApiResponse<BuyerRegisterPayload>> {
    let (phone, username) = match (filled(payload.phone), filled(payload.username)) {
        (Some(phone), Some(username)) => (phone, username),
        _ => return Err(AppError::bad_request("Phone dan username wajib diisi")),
    };

    let exist = Buyers::find()
        .filter(
            Condition::any()
                .add(buyers::Column::Username.eq(username.as_str()))
                .add(buyers::Column::Phone.eq(phone.as_str())),
        )
        .one(&state.orm)
        .await?;

    if exist.is_some() {
        return Err(AppError::Conflict(
            "Phone atau username sudah terdaftar".to_string(),
        ));
    }

    let activation_code = generate_activation_code();
    let expired = Utc::now() + Duration::minutes(ACTIVATION_CODE_TTL_MINUTES);

    let buyer = buyers::ActiveModel {
        id: NotSet,
        phone: Set(phone),
        username: Set(username),
        activation_code: Set(activation_code.clone()),
        expired: Set(expired.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, "Phone atau username sudah terdaftar"))?;

    let token = issue_buyer_token(state, &buyer)?;

    tracing::info!(buyer_id = buyer.id, "buyer registered");
    audit::record(
        &state.pool,
        Actor::Buyer(buyer.id),
        "buyer_register",
        "buyers",
        serde_json::json!({ "buyer_id": buyer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Registrasi buyer berhasil",
        BuyerRegisterPayload {
            buyer: Buyer::from(buyer),
            token,
            activation_code,
        },
    ))
}

pub async fn login_buyer(
    state: &AppState,
    payload: BuyerLoginRequest,
) -> AppResult<ApiResponse<BuyerAuthPayload>> {
    let (phone, code) = match (filled(payload.phone), filled(payload.activation_code)) {
        (Some(phone), Some(code)) => (phone, code),
        _ => {
            return Err(AppError::bad_request(
                "Phone dan activation code wajib diisi",
            ));
        }
    };

    let buyer = Buyers::find()
        .filter(buyers::Column::Phone.eq(phone.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Phone tidak terdaftar".into()))?;

    match check_activation_code(
        &buyer.activation_code,
        &code,
        buyer.expired.with_timezone(&Utc),
        Utc::now(),
    ) {
        ActivationCheck::Accepted => {}
        ActivationCheck::WrongCode => {
            return Err(AppError::Unauthorized("Activation code salah".into()));
        }
        ActivationCheck::Expired => {
            return Err(AppError::Unauthorized(
                "Activation code sudah expired".into(),
            ));
        }
    }

    let token = issue_buyer_token(state, &buyer)?;

    tracing::info!(buyer_id = buyer.id, "buyer logged in");
    audit::record(
        &state.pool,
        Actor::Buyer(buyer.id),
        "buyer_login",
        "buyers",
        serde_json::json!({ "buyer_id": buyer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Login buyer berhasil",
        BuyerAuthPayload {
            buyer: Buyer::from(buyer),
            token,
        },
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let profile = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Pengguna tidak ditemukan"))?;
    Ok(ApiResponse::success(
        "Profile berhasil diambil",
        UserProfile::from(profile),
    ))
}

/// Fails with 400 when `email` or `username` belongs to a user other than `user_id`.
pub(crate) async fn ensure_identity_free(
    state: &AppState,
    user_id: i32,
    email: Option<&str>,
    username: Option<&str>,
    conflict_message: &str,
) -> AppResult<()> {
    if email.is_none() && username.is_none() {
        return Ok(());
    }

    let mut either = Condition::any();
    if let Some(email) = email {
        either = either.add(users::Column::Email.eq(email));
    }
    if let Some(username) = username {
        either = either.add(users::Column::Username.eq(username));
    }

    let taken = Users::find()
        .filter(
            Condition::all()
                .add(users::Column::Id.ne(user_id))
                .add(either),
        )
        .one(&state.orm)
        .await?;

    if taken.is_some() {
        return Err(AppError::Conflict(conflict_message.to_string()));
    }
    Ok(())
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let email = filled(payload.email);
    let username = filled(payload.username);
    ensure_identity_free(
        state,
        user.id,
        email.as_deref(),
        username.as_deref(),
        "Email atau username sudah digunakan",
    )
    .await?;

    let existing = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Pengguna tidak ditemukan"))?;

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
        .map_err(|e| AppError::from_write(e, "Email atau username sudah digunakan"))?;

    Ok(ApiResponse::success(
        "Profile berhasil diupdate",
        UserProfile::from(updated),
    ))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<()>> {
    let (current, new) = match (
        filled(payload.current_password),
        filled(payload.new_password),
    ) {
        (Some(current), Some(new)) => (current, new),
        _ => {
            return Err(AppError::bad_request(
                "Current password dan new password wajib diisi",
            ));
        }
    };

    let existing = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Pengguna tidak ditemukan"))?;

    if !verify_password(&current, &existing.password_hash)? {
        return Err(AppError::Unauthorized("Current password salah".into()));
    }

    let mut active: users::ActiveModel = existing.into();
    active.password_hash = Set(hash_password(&new)?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Actor::User(user.id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::empty("Password berhasil diubah"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_codes_are_six_digits_in_range() {
        for _ in 0..1000 {
            let code = generate_activation_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn activation_expiry_boundary_is_inclusive() {
        let expired = Utc::now();
        assert_eq!(
            check_activation_code("123456", "123456", expired, expired),
            ActivationCheck::Accepted
        );
        assert_eq!(
            check_activation_code(
                "123456",
                "123456",
                expired,
                expired + Duration::milliseconds(1)
            ),
            ActivationCheck::Expired
        );
        assert_eq!(
            check_activation_code("123456", "654321", expired, expired),
            ActivationCheck::WrongCode
        );
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("rahasia").unwrap();
        assert!(verify_password("rahasia", &hash).unwrap());
        assert!(!verify_password("salah", &hash).unwrap());
    }

    #[test]
    fn register_payload_requires_fields_and_known_role() {
        let err = NewUser::from_request(RegisterRequest::default()).err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));

        let payload = || RegisterRequest {
            email: Some("a@b.c".into()),
            username: Some("ani".into()),
            phone: Some("0812".into()),
            password: Some("pw".into()),
            gender: Some("F".into()),
            dob: chrono::NaiveDate::from_ymd_opt(2000, 1, 2),
            ..Default::default()
        };
        let user = NewUser::from_request(payload()).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.address, "");

        let err = NewUser::from_request(RegisterRequest {
            role: Some("superuser".into()),
            ..payload()
        })
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "Role tidak valid. Gunakan: admin, user");
    }
}
