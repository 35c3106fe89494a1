//! Admin catalog maintenance: adding books and changing copy counts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use validator::Validate;

use crate::application::services::catalog_service::AddBookOutcome;
use crate::domain::entities::{CopyRemoval, NewBook};
use crate::error::AppError;
use crate::state::AppState;
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::forms::{AddBookForm, CopiesForm, parse_count};
use crate::web::page::PageContext;
use crate::web::views::BookRow;

#[derive(Template, WebTemplate)]
#[template(path = "all_books.html")]
pub struct AllBooksTemplate {
    pub ctx: PageContext,
    pub books: Vec<BookRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "add_book.html")]
pub struct AddBookTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "update_copies.html")]
pub struct UpdateCopiesTemplate {
    pub ctx: PageContext,
    pub book: BookRow,
}

#[derive(Template, WebTemplate)]
#[template(path = "delete_book_confirm.html")]
pub struct DeleteBookTemplate {
    pub ctx: PageContext,
    pub book: BookRow,
}

/// `GET /all_books`
pub async fn all_books_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<AllBooksTemplate, Response> {
    let books = st
        .catalog_service
        .all()
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(AllBooksTemplate {
        ctx,
        books: books.iter().map(BookRow::from).collect(),
    })
}

/// `GET /add_book`
pub async fn add_book_handler(ctx: PageContext) -> AddBookTemplate {
    AddBookTemplate { ctx }
}

/// `POST /add_book`
///
/// A title and author already in the catalog lead to the copies page
/// instead of a duplicate entry.
pub async fn add_book_submit_handler(
    State(st): State<AppState>,
    Form(form): Form<AddBookForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/add_book")?;
    let copies = parse_count(&form.copies).or_redirect(&st, "/add_book")?;

    let outcome = st
        .catalog_service
        .add_book(NewBook {
            title: form.title,
            author: form.author,
            copies,
        })
        .await
        .or_redirect(&st, "/add_book")?;

    Ok(match outcome {
        AddBookOutcome::Created(book) => flash::redirect(
            &st,
            "/all_books",
            Flash::success(format!(
                "'{}' added with {} copies.",
                book.title, book.available_copies
            )),
        ),
        AddBookOutcome::AlreadyExists(book) => flash::redirect(
            &st,
            &format!("/update_copies/{}", book.id),
            Flash::warning(format!(
                "'{}' by {} already exists. Add copies instead.",
                book.title, book.author
            )),
        ),
    })
}

/// `GET /update_copies/{id}`
pub async fn update_copies_handler(
    State(st): State<AppState>,
    Path(book_id): Path<i64>,
    ctx: PageContext,
) -> Result<UpdateCopiesTemplate, Response> {
    let book = st
        .catalog_service
        .get(book_id)
        .await
        .or_redirect(&st, "/all_books")?;

    Ok(UpdateCopiesTemplate {
        ctx,
        book: BookRow::from(&book),
    })
}

/// `POST /update_copies/{id}`
pub async fn update_copies_submit_handler(
    State(st): State<AppState>,
    Path(book_id): Path<i64>,
    Form(form): Form<CopiesForm>,
) -> Result<Response, Response> {
    let back = format!("/update_copies/{book_id}");
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, &back)?;
    let copies = parse_count(&form.copies).or_redirect(&st, &back)?;

    let book = st
        .catalog_service
        .add_copies(book_id, copies)
        .await
        .or_redirect(&st, &back)?;

    Ok(flash::redirect(
        &st,
        "/all_books",
        Flash::success(format!(
            "Added {copies} copies of '{}'. {} now available.",
            book.title, book.available_copies
        )),
    ))
}

/// `GET /delete_book/{id}`
pub async fn delete_book_handler(
    State(st): State<AppState>,
    Path(book_id): Path<i64>,
    ctx: PageContext,
) -> Result<DeleteBookTemplate, Response> {
    let book = st
        .catalog_service
        .get(book_id)
        .await
        .or_redirect(&st, "/all_books")?;

    Ok(DeleteBookTemplate {
        ctx,
        book: BookRow::from(&book),
    })
}

/// `POST /delete_book/{id}`
///
/// Removes copies from the shelf; removing the last one deletes the book.
pub async fn delete_book_submit_handler(
    State(st): State<AppState>,
    Path(book_id): Path<i64>,
    Form(form): Form<CopiesForm>,
) -> Result<Response, Response> {
    let back = format!("/delete_book/{book_id}");
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, &back)?;
    let copies = parse_count(&form.copies).or_redirect(&st, &back)?;

    let removal = st
        .catalog_service
        .remove_copies(book_id, copies)
        .await
        .or_redirect(&st, &back)?;

    let flash = match removal {
        CopyRemoval::Removed(book) => Flash::success(format!(
            "Removed {copies} copies of '{}'. {} remain.",
            book.title, book.available_copies
        )),
        CopyRemoval::Deleted => Flash::success("All copies removed. The book was deleted."),
    };
    Ok(flash::redirect(&st, "/all_books", flash))
}
