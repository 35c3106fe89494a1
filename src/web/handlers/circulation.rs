//! Catalog browsing, borrowing, reserving and returning books.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension,
    extract::{Path, Query, State},
    response::Response,
};

use crate::api::dto::books::BookSearchParams;
use crate::application::services::circulation_service::ReserveOutcome;
use crate::domain::entities::{BookSearch, BookSort, Reservation};
use crate::state::AppState;
use crate::utils::clock;
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::middleware::session::CurrentStudent;
use crate::web::page::PageContext;
use crate::web::views::{BookRow, LoanRow};

#[derive(Template, WebTemplate)]
#[template(path = "check_books.html")]
pub struct CheckBooksTemplate {
    pub ctx: PageContext,
    pub books: Vec<BookRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "search_books.html")]
pub struct SearchBooksTemplate {
    pub ctx: PageContext,
    pub books: Vec<BookRow>,
    pub q: String,
    pub title: String,
    pub author: String,
    pub availability: &'static str,
    pub sort: &'static str,
    pub searched: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "borrow_book_confirm.html")]
pub struct BorrowConfirmTemplate {
    pub ctx: PageContext,
    pub book: BookRow,
    pub loan_days: i64,
    pub queue_length: usize,
    /// The student heads the queue or there is none.
    pub may_borrow: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "reserve_book_confirm.html")]
pub struct ReserveConfirmTemplate {
    pub ctx: PageContext,
    pub book: BookRow,
    pub queue_length: usize,
    pub position: Option<usize>,
}

pub struct ReservationRow {
    pub book_id: i64,
    pub regno: String,
    pub title: String,
    pub reserved_at: String,
    pub status: &'static str,
}

impl From<&Reservation> for ReservationRow {
    fn from(r: &Reservation) -> Self {
        Self {
            book_id: r.book_id,
            regno: r.regno.clone(),
            title: r.book_title.clone(),
            reserved_at: r.reserved_at.format("%Y-%m-%d %H:%M").to_string(),
            status: r.status.as_str(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "my_reservations.html")]
pub struct MyReservationsTemplate {
    pub ctx: PageContext,
    pub reservations: Vec<ReservationRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "return.html")]
pub struct ReturnTemplate {
    pub ctx: PageContext,
    pub loans: Vec<LoanRow>,
    pub total_fine: String,
    pub has_fines: bool,
}

/// `GET /check_books`
///
/// The whole catalog with average ratings.
pub async fn check_books_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<CheckBooksTemplate, Response> {
    let search = BookSearch {
        sort: BookSort::TitleAsc,
        ..Default::default()
    };
    let entries = st
        .catalog_service
        .search_with_ratings(&search)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(CheckBooksTemplate {
        ctx,
        books: entries
            .iter()
            .map(|e| BookRow::new(&e.book, e.rating.as_ref()))
            .collect(),
    })
}

/// `GET /search_books?q=&title=&author=&availability=&sort=`
pub async fn search_books_handler(
    State(st): State<AppState>,
    Query(params): Query<BookSearchParams>,
    ctx: PageContext,
) -> Result<SearchBooksTemplate, Response> {
    let search = params.to_search();
    let searched = !search.is_empty();

    let books = if searched {
        st.catalog_service
            .search_with_ratings(&search)
            .await
            .or_redirect(&st, "/student_dashboard")?
            .iter()
            .map(|e| BookRow::new(&e.book, e.rating.as_ref()))
            .collect()
    } else {
        Vec::new()
    };

    Ok(SearchBooksTemplate {
        ctx,
        books,
        availability: search.availability.as_str(),
        sort: search.sort.as_str(),
        q: search.term,
        title: search.title,
        author: search.author,
        searched,
    })
}

/// `GET /borrow_book/{id}`
pub async fn borrow_book_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(book_id): Path<i64>,
    ctx: PageContext,
) -> Result<BorrowConfirmTemplate, Response> {
    let view = st
        .circulation_service
        .queue_view(&student.regno, book_id)
        .await
        .or_redirect(&st, "/check_books")?;

    Ok(BorrowConfirmTemplate {
        ctx,
        book: BookRow::from(&view.book),
        loan_days: st.fine_service.policy().loan_period_days,
        queue_length: view.queue_length,
        may_borrow: view.queue_length == 0 || view.position == Some(1),
    })
}

/// `POST /borrow_book/{id}`
///
/// Adds a warning when the late-return model expects this loan back late.
pub async fn borrow_book_submit_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(book_id): Path<i64>,
) -> Result<Response, Response> {
    let back = format!("/borrow_book/{book_id}");
    let outcome = st
        .circulation_service
        .borrow(&student.regno, book_id, clock::today())
        .await
        .or_redirect(&st, &back)?;

    let mut flashes = vec![Flash::success(format!(
        "You borrowed '{}'. Please return it by {}.",
        outcome.loan.book_title, outcome.loan.due_date
    ))];
    if outcome.predicted_late {
        flashes.push(Flash::warning(
            "Based on your borrowing history you may return this book late. Please keep the due date in mind.",
        ));
    }

    Ok(flash::redirect_with(&st, "/student_dashboard", flashes))
}

/// `GET /reserve_book/{id}`
pub async fn reserve_book_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(book_id): Path<i64>,
    ctx: PageContext,
) -> Result<ReserveConfirmTemplate, Response> {
    let view = st
        .circulation_service
        .queue_view(&student.regno, book_id)
        .await
        .or_redirect(&st, "/check_books")?;

    Ok(ReserveConfirmTemplate {
        ctx,
        book: BookRow::from(&view.book),
        queue_length: view.queue_length,
        position: view.position,
    })
}

/// `POST /reserve_book/{id}`
pub async fn reserve_book_submit_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(book_id): Path<i64>,
) -> Result<Response, Response> {
    let back = format!("/reserve_book/{book_id}");
    let outcome = st
        .circulation_service
        .reserve(&student.regno, book_id)
        .await
        .or_redirect(&st, &back)?;

    let flash = match outcome {
        ReserveOutcome::Queued { position } => Flash::success(format!(
            "Book reserved. You are number {position} in the queue."
        )),
        ReserveOutcome::AlreadyQueued { position } => Flash::info(format!(
            "You have already reserved this book. You are number {position} in the queue."
        )),
    };
    Ok(flash::redirect(&st, "/my_reservations", flash))
}

/// `GET /my_reservations`
pub async fn my_reservations_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<MyReservationsTemplate, Response> {
    let reservations = st
        .circulation_service
        .reservations_for(&student.regno)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(MyReservationsTemplate {
        ctx,
        reservations: reservations.iter().map(ReservationRow::from).collect(),
    })
}

/// `GET /return`
///
/// Open loans. Returning is blocked while any fine is outstanding.
pub async fn return_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<ReturnTemplate, Response> {
    let today = clock::today();
    let overview = st
        .fine_service
        .overview(&student.regno, today)
        .await
        .or_redirect(&st, "/student_dashboard")?;
    let loans = st
        .circulation_service
        .open_loans(&student.regno)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(ReturnTemplate {
        ctx,
        loans: LoanRow::rows(&loans, today),
        total_fine: overview.total.to_string(),
        has_fines: overview.total.is_positive(),
    })
}

/// `POST /return_confirm/{loan_id}`
pub async fn return_confirm_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(loan_id): Path<i64>,
) -> Result<Response, Response> {
    let loan = st
        .circulation_service
        .return_book(&student.regno, loan_id, clock::today())
        .await
        .or_redirect(&st, "/return")?;

    Ok(flash::redirect(
        &st,
        "/return",
        Flash::success(format!("'{}' returned successfully.", loan.book_title)),
    ))
}
