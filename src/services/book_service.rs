use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    dto::{
        books::{CreateBookRequest, UpdateBookRequest},
        filled,
    },
    entity::books::{self, Entity as Books},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Book,
    response::{ApiResponse, Pagination},
    routes::params::SearchQuery,
    services::contains_pattern,
    state::AppState,
};

const BOOK_NOT_FOUND: &str = "Buku tidak ditemukan";
const TITLE_TAKEN: &str = "Buku sudah terdaftar";

pub async fn list_books(state: &AppState, query: SearchQuery) -> AppResult<ApiResponse<Vec<Book>>> {
    let (page, limit, offset) = query.normalize();

    let mut finder = Books::find().order_by_asc(books::Column::Id);
    if let Some(term) = query.term() {
        finder = finder.filter(Expr::col(books::Column::Title).ilike(contains_pattern(term)));
    }
    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Book::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Berhasil mengambil data buku",
        items,
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_book(state: &AppState, id: i32) -> AppResult<ApiResponse<Book>> {
    let book = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;
    Ok(ApiResponse::success("Berhasil mengambil data buku", Book::from(book)))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_admin(user)?;

    let (title, author, publisher, year) = match (
        filled(payload.title),
        filled(payload.author),
        filled(payload.publisher),
        payload.year,
    ) {
        (Some(title), Some(author), Some(publisher), Some(year)) => {
            (title, author, publisher, year)
        }
        _ => {
            return Err(AppError::bad_request(
                "Field wajib diisi (title, author, publisher, year)",
            ));
        }
    };

    let exist = Books::find()
        .filter(books::Column::Title.eq(title.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(TITLE_TAKEN.to_string()));
    }

    let book = books::ActiveModel {
        id: NotSet,
        title: Set(title),
        author: Set(author),
        publisher: Set(publisher),
        year: Set(year),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from_write(e, TITLE_TAKEN))?;

    Ok(ApiResponse::success(
        "Berhasil menambahkan data buku",
        Book::from(book),
    ))
}

pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_admin(user)?;
    let existing = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    let title = filled(payload.title);
    if let Some(title) = title.as_deref() {
        let taken = Books::find()
            .filter(books::Column::Title.eq(title))
            .filter(books::Column::Id.ne(id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Buku sudah ada".to_string()));
        }
    }

    let mut active: books::ActiveModel = existing.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(author) = filled(payload.author) {
        active.author = Set(author);
    }
    if let Some(publisher) = filled(payload.publisher) {
        active.publisher = Set(publisher);
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    active.updated_at = Set(Utc::now().into());

    let book = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from_write(e, "Buku sudah ada"))?;

    Ok(ApiResponse::success("Buku berhasil diubah", Book::from(book)))
}

pub async fn delete_book(state: &AppState, user: &AuthUser, id: i32) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;
    let result = Books::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    }
    Ok(ApiResponse::empty("Buku berhasil dihapus"))
}
