use chrono::{Duration, NaiveDate, Utc};
use toko_api::{
    db::{create_orm_conn, run_migrations, shared_pool},
    dto::{
        auth::{BuyerLoginRequest, BuyerRegisterRequest, LoginRequest, RegisterRequest},
        detail_orders::UpdateDetailOrderRequest,
        orders::{CreateOrderRequest, OrderLineRequest},
        products::CreateProductRequest,
        ratings::CreateRatingRequest,
        vouchers::CreateVoucherRequest,
    },
    entity::{Users, users},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::ProductQuery,
    services::{
        auth_service, detail_order_service, order_service, product_service, rating_service,
        token_service::TokenService, voucher_service,
    },
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

// Flows against a real Postgres. Skipped when no database is configured.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    let pool = shared_pool(&orm);
    run_migrations(&pool).await?;

    Ok(Some(AppState {
        pool,
        orm,
        tokens: TokenService::new("test-secret-key-for-jwt-testing-minimum-32-chars", 24),
    }))
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

async fn register(state: &AppState, tag: &str, role: &str) -> anyhow::Result<AuthUser> {
    let resp = auth_service::register_user(
        state,
        RegisterRequest {
            email: Some(format!("{role}-{tag}@example.com")),
            username: Some(format!("{role}_{tag}")),
            phone: Some(format!("08{tag}")),
            password: Some("rahasia123".into()),
            gender: Some("L".into()),
            dob: NaiveDate::from_ymd_opt(1995, 5, 17),
            address: Some("Bandung".into()),
            role: Some(role.into()),
        },
    )
    .await?;
    let user = resp.data.expect("registered user").user;
    Ok(AuthUser {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
}

fn product(code: &str, kind: &str, price: f64) -> CreateProductRequest {
    CreateProductRequest {
        product_code: Some(code.into()),
        name: Some(format!("Produk {code}")),
        product_type: Some(kind.into()),
        price: Some(price),
        ..Default::default()
    }
}

#[tokio::test]
async fn duplicate_product_code_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let admin = register(&state, &t, "admin").await?;
    let code = format!("P1-{t}");

    product_service::create_product(&state, &admin, product(&code, "umum", 1000.0)).await?;
    let err = product_service::create_product(&state, &admin, product(&code, "umum", 2000.0))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(ref m) if m == "Kode produk sudah digunakan"));
    Ok(())
}

#[tokio::test]
async fn product_listing_paginates_by_type() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let admin = register(&state, &t, "admin").await?;
    let kind = format!("jenis-{t}");

    for i in 0..12 {
        product_service::create_product(
            &state,
            &admin,
            product(&format!("PG-{t}-{i}"), &kind, 500.0),
        )
        .await?;
    }

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            product_type: Some(kind),
            page: Some(2),
            limit: Some(5),
            ..Default::default()
        },
    )
    .await?;

    let pagination = resp.pagination.expect("pagination");
    assert_eq!(pagination.total_data, 12);
    assert_eq!(pagination.total_page, 3);
    assert_eq!(pagination.page, 2);
    assert_eq!(resp.data.map(|rows| rows.len()), Some(5));
    Ok(())
}

#[tokio::test]
async fn order_lines_get_server_side_sub_totals_and_ratings_are_unique() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let admin = register(&state, &t, "admin").await?;
    let user = register(&state, &t, "user").await?;

    let created =
        product_service::create_product(&state, &admin, product(&format!("PO-{t}"), "umum", 10.0))
            .await?;
    let product_id = created.data.expect("product").id;

    let buyer = auth_service::register_buyer(
        &state,
        BuyerRegisterRequest {
            phone: Some(format!("62{t}")),
            username: Some(format!("buyer_{t}")),
        },
    )
    .await?
    .data
    .expect("buyer")
    .buyer;

    let order = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            order_code: Some(format!("O1-{t}")),
            total: Some(20.0),
            buyer_id: Some(buyer.id),
            detail_orders: Some(vec![OrderLineRequest {
                product_id: Some(product_id),
                price: Some(10.0),
                quantity: Some(2.0),
            }]),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("order");

    assert_eq!(order.order.buyer_id, Some(buyer.id));
    assert_eq!(order.detail_orders.len(), 1);
    assert_eq!(order.detail_orders[0].detail.sub_total, 20.0);

    let rating = || CreateRatingRequest {
        order_id: Some(order.order.id),
        product_id: Some(product_id),
        buyer_id: Some(buyer.id),
        rating: Some(4.0),
    };
    rating_service::create_rating(&state, rating()).await?;
    let err = rating_service::create_rating(&state, rating()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let summary = product_service::product_rating(&state, product_id)
        .await?
        .data
        .expect("summary");
    assert_eq!(summary.total_ratings, 1);
    assert_eq!(summary.average_rating, 4.0);
    Ok(())
}

#[tokio::test]
async fn order_with_unknown_product_is_not_stored() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let user = register(&state, &t, "user").await?;
    let code = format!("OX-{t}");

    let err = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            order_code: Some(code.clone()),
            total: Some(5.0),
            detail_orders: Some(vec![OrderLineRequest {
                product_id: Some(i32::MAX),
                price: Some(5.0),
                quantity: Some(1.0),
            }]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    let expected = format!("Produk dengan ID {} tidak ditemukan", i32::MAX);
    assert!(matches!(err, AppError::BadRequest(ref m) if *m == expected));

    let lookup = order_service::get_order_by_code(&state, &code).await;
    assert!(matches!(lookup, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn taken_order_code_is_reported_before_line_errors() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let admin = register(&state, &t, "admin").await?;
    let user = register(&state, &t, "user").await?;
    let product_id =
        product_service::create_product(&state, &admin, product(&format!("PC-{t}"), "umum", 3.0))
            .await?
            .data
            .expect("product")
            .id;
    let code = format!("OC-{t}");

    order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            order_code: Some(code.clone()),
            total: Some(3.0),
            detail_orders: Some(vec![OrderLineRequest {
                product_id: Some(product_id),
                price: Some(3.0),
                quantity: Some(1.0),
            }]),
            ..Default::default()
        },
    )
    .await?;

    let err = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            order_code: Some(code),
            total: Some(3.0),
            detail_orders: Some(vec![OrderLineRequest {
                product_id: Some(product_id),
                price: None,
                quantity: Some(1.0),
            }]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Kode pesanan sudah digunakan"));
    Ok(())
}

#[tokio::test]
async fn detail_order_update_recomputes_sub_total() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let admin = register(&state, &t, "admin").await?;
    let user = register(&state, &t, "user").await?;
    let product_id =
        product_service::create_product(&state, &admin, product(&format!("PD-{t}"), "umum", 10.0))
            .await?
            .data
            .expect("product")
            .id;

    let order = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            order_code: Some(format!("OD-{t}")),
            total: Some(20.0),
            detail_orders: Some(vec![OrderLineRequest {
                product_id: Some(product_id),
                price: Some(10.0),
                quantity: Some(2.0),
            }]),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("order");
    let line_id = order.detail_orders[0].detail.id;

    detail_order_service::update_detail_order(
        &state,
        line_id,
        UpdateDetailOrderRequest {
            quantity: Some(3.0),
            ..Default::default()
        },
    )
    .await?;
    let stored = detail_order_service::get_detail_order(&state, line_id)
        .await?
        .data
        .expect("line")
        .detail;
    assert_eq!((stored.price, stored.quantity, stored.sub_total), (10.0, 3.0, 30.0));

    detail_order_service::update_detail_order(
        &state,
        line_id,
        UpdateDetailOrderRequest {
            price: Some(2.5),
            ..Default::default()
        },
    )
    .await?;
    let stored = detail_order_service::get_detail_order(&state, line_id)
        .await?
        .data
        .expect("line")
        .detail;
    assert_eq!(stored.sub_total, 2.5 * 3.0);
    Ok(())
}

#[tokio::test]
async fn voucher_cannot_be_used_past_its_quota() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let admin = register(&state, &t, "admin").await?;

    let voucher = voucher_service::create_voucher(
        &state,
        &admin,
        CreateVoucherRequest {
            name: Some("Diskon".into()),
            code: Some(format!("V-{t}")),
            expired_time: Some(Utc::now() + Duration::days(1)),
            quantity_max: Some(2),
            buyer_id: None,
        },
    )
    .await?
    .data
    .expect("voucher")
    .voucher;

    voucher_service::use_voucher(&state, &admin, voucher.id).await?;
    let second = voucher_service::use_voucher(&state, &admin, voucher.id)
        .await?
        .data
        .expect("voucher");
    assert_eq!(second.voucher.quantity_used, 2);

    let err = voucher_service::use_voucher(&state, &admin, voucher.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Voucher sudah habis digunakan"));
    Ok(())
}

#[tokio::test]
async fn registration_and_login_flows() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let t = tag();
    let user = register(&state, &t, "user").await?;

    let dup = auth_service::register_user(
        &state,
        RegisterRequest {
            email: Some(user.email.clone()),
            username: Some(format!("lain_{t}")),
            phone: Some("0800".into()),
            password: Some("rahasia123".into()),
            gender: Some("P".into()),
            dob: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(dup, AppError::Conflict(_)));
    let same_email = Users::find()
        .filter(users::Column::Email.eq(user.email.as_str()))
        .count(&state.orm)
        .await?;
    assert_eq!(same_email, 1);
    let second = Users::find()
        .filter(users::Column::Username.eq(format!("lain_{t}")))
        .one(&state.orm)
        .await?;
    assert!(second.is_none());

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            identifier: Some(user.username.clone()),
            password: Some("rahasia123".into()),
        },
    )
    .await?;
    assert!(!login.data.expect("session").token.is_empty());

    let wrong = auth_service::login_user(
        &state,
        LoginRequest {
            identifier: Some(user.email.clone()),
            password: Some("salah".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(wrong, AppError::Unauthorized(_)));

    let phone = format!("63{t}");
    let registered = auth_service::register_buyer(
        &state,
        BuyerRegisterRequest {
            phone: Some(phone.clone()),
            username: Some(format!("pembeli_{t}")),
        },
    )
    .await?
    .data
    .expect("buyer");

    let bad_code = auth_service::login_buyer(
        &state,
        BuyerLoginRequest {
            phone: Some(phone.clone()),
            activation_code: Some("000000x".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(bad_code, AppError::Unauthorized(ref m) if m == "Activation code salah"));

    let session = auth_service::login_buyer(
        &state,
        BuyerLoginRequest {
            phone: Some(phone),
            activation_code: Some(registered.activation_code),
        },
    )
    .await?
    .data
    .expect("buyer session");
    assert_eq!(session.buyer.id, registered.buyer.id);
    Ok(())
}
