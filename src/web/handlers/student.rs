//! Student dashboard, history, ratings, recommendations and analytics.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::{Path, State},
    response::Response,
};
use validator::Validate;

use crate::application::services::reader_service::RECOMMENDATION_LIMIT;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::clock;
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::forms::RatingForm;
use crate::web::middleware::session::CurrentStudent;
use crate::web::page::PageContext;
use crate::web::views::{BookRow, FineRow, LoanRow, MonthRow};

#[derive(Template, WebTemplate)]
#[template(path = "student_dashboard.html")]
pub struct StudentDashboardTemplate {
    pub ctx: PageContext,
    pub regno: String,
    pub open_loans: Vec<LoanRow>,
    pub recommendations: Vec<BookRow>,
    pub fines: Vec<FineRow>,
    pub total_fine: String,
    pub has_fines: bool,
    pub can_borrow: bool,
    pub borrow_limit: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "my_recommendations.html")]
pub struct RecommendationsTemplate {
    pub ctx: PageContext,
    pub recommendations: Vec<BookRow>,
    pub total_fine: String,
    pub has_fines: bool,
    pub can_borrow: bool,
}

pub struct HistoryRow {
    pub loan: LoanRow,
    /// `"★★★★☆"`, empty when unrated.
    pub stars: String,
    pub review: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "borrowing_history.html")]
pub struct BorrowingHistoryTemplate {
    pub ctx: PageContext,
    pub rows: Vec<HistoryRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "rate_book.html")]
pub struct RateBookTemplate {
    pub ctx: PageContext,
    pub loan_id: i64,
    pub title: String,
    /// 0 when not rated yet.
    pub current: i16,
    pub review: String,
}

pub struct AuthorRow {
    pub name: String,
    pub count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "reading_analytics.html")]
pub struct ReadingAnalyticsTemplate {
    pub ctx: PageContext,
    pub total_borrowed: usize,
    pub total_returned: usize,
    pub currently_borrowed: usize,
    pub on_time_returns: usize,
    pub late_returns: usize,
    pub average_days_late: String,
    pub favorite_authors: Vec<AuthorRow>,
    pub monthly: Vec<MonthRow>,
}

fn stars(rating: i16) -> String {
    let filled = rating.clamp(0, 5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// `GET /student_dashboard`
///
/// Open loans, fines (accrued up to today) and a few recommendations.
pub async fn dashboard_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<StudentDashboardTemplate, Response> {
    let today = clock::today();
    let regno = student.regno;

    let overview = st
        .fine_service
        .overview(&regno, today)
        .await
        .or_redirect(&st, "/")?;
    let open_loans = st
        .circulation_service
        .open_loans(&regno)
        .await
        .or_redirect(&st, "/")?;
    let recommendations = st
        .reader_service
        .recommendations(&regno, RECOMMENDATION_LIMIT)
        .await
        .or_redirect(&st, "/")?;

    let policy = st.fine_service.policy();
    Ok(StudentDashboardTemplate {
        ctx,
        open_loans: LoanRow::rows(&open_loans, today),
        recommendations: recommendations.iter().map(BookRow::from).collect(),
        fines: FineRow::rows(&overview.fines, today, policy),
        total_fine: overview.total.to_string(),
        has_fines: overview.total.is_positive(),
        can_borrow: overview.can_borrow,
        borrow_limit: policy.borrow_limit().to_string(),
        regno,
    })
}

/// `GET /my_recommendations`
pub async fn recommendations_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<RecommendationsTemplate, Response> {
    let today = clock::today();

    let overview = st
        .fine_service
        .overview(&student.regno, today)
        .await
        .or_redirect(&st, "/student_dashboard")?;
    let recommendations = st
        .reader_service
        .recommendations(&student.regno, RECOMMENDATION_LIMIT)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(RecommendationsTemplate {
        ctx,
        recommendations: recommendations.iter().map(BookRow::from).collect(),
        total_fine: overview.total.to_string(),
        has_fines: overview.total.is_positive(),
        can_borrow: overview.can_borrow,
    })
}

/// `GET /borrowing_history`
pub async fn borrowing_history_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<BorrowingHistoryTemplate, Response> {
    let today = clock::today();
    let history = st
        .reader_service
        .history(&student.regno)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    let rows = history
        .iter()
        .map(|entry| HistoryRow {
            loan: LoanRow::new(&entry.loan, today),
            stars: entry.rating.as_ref().map(|r| stars(r.rating)).unwrap_or_default(),
            review: entry
                .rating
                .as_ref()
                .and_then(|r| r.review.clone())
                .unwrap_or_default(),
        })
        .collect();

    Ok(BorrowingHistoryTemplate { ctx, rows })
}

/// `GET /rate_book/{loan_id}`
pub async fn rate_book_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(loan_id): Path<i64>,
    ctx: PageContext,
) -> Result<RateBookTemplate, Response> {
    let entry = st
        .reader_service
        .rating_form(&student.regno, loan_id)
        .await
        .or_redirect(&st, "/borrowing_history")?;

    Ok(RateBookTemplate {
        ctx,
        loan_id,
        title: entry.loan.book_title,
        current: entry.rating.as_ref().map(|r| r.rating).unwrap_or(0),
        review: entry.rating.and_then(|r| r.review).unwrap_or_default(),
    })
}

/// `POST /rate_book/{loan_id}`
///
/// Re-rating a book replaces the earlier rating.
pub async fn rate_book_submit_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(loan_id): Path<i64>,
    Form(form): Form<RatingForm>,
) -> Result<Response, Response> {
    let back = format!("/rate_book/{loan_id}");
    form.validate().map_err(AppError::from).or_redirect(&st, &back)?;

    st.reader_service
        .rate_book(&student.regno, loan_id, form.rating, form.review())
        .await
        .or_redirect(&st, "/borrowing_history")?;

    Ok(flash::redirect(
        &st,
        "/borrowing_history",
        Flash::success("Thank you for your rating!"),
    ))
}

/// `GET /reading_analytics`
pub async fn reading_analytics_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<ReadingAnalyticsTemplate, Response> {
    let analytics = st
        .reader_service
        .analytics(&student.regno, clock::today())
        .await
        .or_redirect(&st, "/student_dashboard")?;

    Ok(ReadingAnalyticsTemplate {
        ctx,
        total_borrowed: analytics.total_borrowed,
        total_returned: analytics.total_returned,
        currently_borrowed: analytics.currently_borrowed,
        on_time_returns: analytics.on_time_returns,
        late_returns: analytics.late_returns,
        average_days_late: format!("{:.2}", analytics.average_days_late),
        favorite_authors: analytics
            .favorite_authors
            .into_iter()
            .map(|(name, count)| AuthorRow { name, count })
            .collect(),
        monthly: MonthRow::rows(&analytics.monthly),
    })
}
