//! Handler for the live book search used by the search page.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::books::{BookListResponse, BookSearchParams};
use crate::error::AppError;
use crate::state::AppState;

/// Searches the catalog.
///
/// # Endpoint
///
/// `GET /api/books/search?q=&title=&author=&availability=&sort=`
///
/// # Response
///
/// ```json
/// { "books": [ { "id": 1, "title": "Dune", "author": "Frank Herbert", "available_copies": 2 } ] }
/// ```
pub async fn search_books_handler(
    State(st): State<AppState>,
    Query(params): Query<BookSearchParams>,
) -> Result<Json<BookListResponse>, AppError> {
    let books = st.catalog_service.search(&params.to_search()).await?;
    Ok(Json(BookListResponse { books }))
}
