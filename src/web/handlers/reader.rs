//! Wishlist and the social page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};

use crate::application::services::reader_service::WishlistItem;
use crate::state::AppState;
use crate::utils::clock;
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::middleware::session::CurrentStudent;
use crate::web::page::PageContext;
use crate::web::views::LoanRow;

pub struct WishlistRow {
    pub id: i64,
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub available: bool,
    pub reserved: bool,
    pub added_at: String,
}

impl From<&WishlistItem> for WishlistRow {
    fn from(item: &WishlistItem) -> Self {
        Self {
            id: item.entry.id,
            book_id: item.entry.book_id,
            title: item.entry.title.clone(),
            author: item.entry.author.clone(),
            available: item.entry.available_copies > 0,
            reserved: item.reserved,
            added_at: item.entry.added_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub items: Vec<WishlistRow>,
}

pub struct StudentRow {
    pub regno: String,
    pub followed: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "social.html")]
pub struct SocialTemplate {
    pub ctx: PageContext,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub others: Vec<StudentRow>,
    pub feed: Vec<LoanRow>,
}

/// `GET /wishlist`
pub async fn wishlist_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<WishlistTemplate, Response> {
    let items = st
        .reader_service
        .wishlist(&student.regno)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(WishlistTemplate {
        ctx,
        items: items.iter().map(WishlistRow::from).collect(),
    })
}

/// `POST /add_to_wishlist/{id}`
pub async fn add_to_wishlist_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(book_id): Path<i64>,
) -> Result<Response, Response> {
    let (book, added) = st
        .reader_service
        .add_to_wishlist(&student.regno, book_id)
        .await
        .or_redirect(&st, "/check_books")?;

    let flash = if added {
        Flash::success(format!("'{}' added to your wishlist.", book.title))
    } else {
        Flash::info(format!("'{}' is already in your wishlist.", book.title))
    };
    Ok(flash::redirect(&st, "/wishlist", flash))
}

/// `POST /remove_from_wishlist/{id}`
pub async fn remove_from_wishlist_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(entry_id): Path<i64>,
) -> Result<Response, Response> {
    let title = st
        .reader_service
        .remove_from_wishlist(&student.regno, entry_id)
        .await
        .or_redirect(&st, "/wishlist")?;

    Ok(flash::redirect(
        &st,
        "/wishlist",
        Flash::success(format!("'{title}' removed from your wishlist.")),
    ))
}

/// `GET /social`
///
/// Who the student follows, who follows them, and what followed students
/// are reading right now.
pub async fn social_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<SocialTemplate, Response> {
    let overview = st
        .social_service
        .overview(&student.regno)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(SocialTemplate {
        ctx,
        feed: LoanRow::rows(&overview.feed, clock::today()),
        following: overview.following,
        followers: overview.followers,
        others: overview
            .others
            .into_iter()
            .map(|(regno, followed)| StudentRow { regno, followed })
            .collect(),
    })
}

/// `POST /follow/{regno}`
pub async fn follow_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(target): Path<String>,
) -> Result<Response, Response> {
    st.social_service
        .follow(&student.regno, &target)
        .await
        .or_redirect(&st, "/social")?;

    Ok(flash::redirect(
        &st,
        "/social",
        Flash::success(format!("You are now following {target}.")),
    ))
}

/// `POST /unfollow/{regno}`
pub async fn unfollow_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(target): Path<String>,
) -> Result<Response, Response> {
    st.social_service
        .unfollow(&student.regno, &target)
        .await
        .or_redirect(&st, "/social")?;

    Ok(flash::redirect(
        &st,
        "/social",
        Flash::info(format!("You unfollowed {target}.")),
    ))
}
