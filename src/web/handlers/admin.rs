//! Admin panel: statistics, students, loans, reservations and password resets.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};

use crate::application::services::admin_service::LibraryStats;
use crate::domain::analytics::ANALYTICS_MONTHS;
use crate::domain::entities::Student;
use crate::state::AppState;
use crate::utils::clock;
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::forms::{EditDueForm, PanelQuery};
use crate::web::handlers::circulation::ReservationRow;
use crate::web::page::PageContext;
use crate::web::views::{BookRow, LoanRow, MonthRow};

pub struct StudentRow {
    pub regno: String,
    pub email: String,
    pub registered: String,
}

impl From<&Student> for StudentRow {
    fn from(s: &Student) -> Self {
        Self {
            regno: s.regno.clone(),
            email: s.email.clone(),
            registered: s.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_panel.html")]
pub struct AdminPanelTemplate {
    pub ctx: PageContext,
    pub stats: LibraryStats,
    pub monthly: Vec<MonthRow>,
    pub students: Vec<StudentRow>,
    pub open_loans: Vec<LoanRow>,
    pub books: Vec<BookRow>,
    pub search: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "library_statistics.html")]
pub struct LibraryStatisticsTemplate {
    pub ctx: PageContext,
    pub stats: LibraryStats,
    pub monthly: Vec<MonthRow>,
}

pub struct ResetRow {
    pub regno: String,
    pub requested_at: String,
    pub link_sent: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_password_resets.html")]
pub struct PasswordResetsTemplate {
    pub ctx: PageContext,
    pub requests: Vec<ResetRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_reservations.html")]
pub struct AdminReservationsTemplate {
    pub ctx: PageContext,
    pub reservations: Vec<ReservationRow>,
}

pub struct BorrowedRow {
    pub loan: LoanRow,
    pub email: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "borrowed_books.html")]
pub struct BorrowedBooksTemplate {
    pub ctx: PageContext,
    pub rows: Vec<BorrowedRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "registered_students.html")]
pub struct RegisteredStudentsTemplate {
    pub ctx: PageContext,
    pub students: Vec<StudentRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "delete_student_confirm.html")]
pub struct DeleteStudentTemplate {
    pub ctx: PageContext,
    pub student: StudentRow,
    pub open_loans: Vec<LoanRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "view_record.html")]
pub struct ViewRecordTemplate {
    pub ctx: PageContext,
    pub student: StudentRow,
    pub loans: Vec<LoanRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "edit_due.html")]
pub struct EditDueTemplate {
    pub ctx: PageContext,
    pub loan: LoanRow,
}

/// `GET /admin_panel?search=`
pub async fn admin_panel_handler(
    State(st): State<AppState>,
    Query(query): Query<PanelQuery>,
    ctx: PageContext,
) -> Result<AdminPanelTemplate, Response> {
    let today = clock::today();
    let panel = st
        .admin_service
        .panel(query.search.as_deref(), today)
        .await
        .or_redirect(&st, "/admin")?;

    Ok(AdminPanelTemplate {
        ctx,
        stats: panel.stats,
        monthly: MonthRow::rows(&panel.monthly),
        students: panel.students.iter().map(StudentRow::from).collect(),
        open_loans: LoanRow::rows(&panel.open_loans, today),
        books: panel.books.iter().map(BookRow::from).collect(),
        search: query.search.unwrap_or_default(),
    })
}

/// `GET /library_statistics`
///
/// A year of monthly borrowings.
pub async fn library_statistics_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<LibraryStatisticsTemplate, Response> {
    let today = clock::today();
    let stats = st
        .admin_service
        .stats(today)
        .await
        .or_redirect(&st, "/admin_panel")?;
    let monthly = st
        .admin_service
        .monthly_borrowings(today, ANALYTICS_MONTHS)
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(LibraryStatisticsTemplate {
        ctx,
        stats,
        monthly: MonthRow::rows(&monthly),
    })
}

/// `GET /admin_password_resets`
pub async fn password_resets_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<PasswordResetsTemplate, Response> {
    let pending = st
        .reset_service
        .pending()
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(PasswordResetsTemplate {
        ctx,
        requests: pending
            .iter()
            .map(|r| ResetRow {
                regno: r.regno.clone(),
                requested_at: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
                link_sent: r.token_hash.is_some(),
            })
            .collect(),
    })
}

/// `POST /approve_password_reset/{regno}`
///
/// Sets a temporary password and mails it to the student.
pub async fn approve_password_reset_handler(
    State(st): State<AppState>,
    Path(regno): Path<String>,
) -> Result<Response, Response> {
    let temporary = st
        .reset_service
        .approve(&regno)
        .await
        .or_redirect(&st, "/admin_password_resets")?;

    Ok(flash::redirect(
        &st,
        "/admin_password_resets",
        Flash::success(format!(
            "Password reset approved for {regno}. Temporary password: {temporary}"
        )),
    ))
}

/// `GET /admin_reservations`
pub async fn admin_reservations_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<AdminReservationsTemplate, Response> {
    let reservations = st
        .circulation_service
        .all_reservations()
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(AdminReservationsTemplate {
        ctx,
        reservations: reservations.iter().map(ReservationRow::from).collect(),
    })
}

/// `GET /borrowed_books`
pub async fn borrowed_books_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<BorrowedBooksTemplate, Response> {
    let today = clock::today();
    let loans = st
        .circulation_service
        .borrowed_books()
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(BorrowedBooksTemplate {
        ctx,
        rows: loans
            .iter()
            .map(|l| BorrowedRow {
                loan: LoanRow::new(&l.loan, today),
                email: l.email.clone(),
            })
            .collect(),
    })
}

/// `GET /registered_students`
pub async fn registered_students_handler(
    State(st): State<AppState>,
    ctx: PageContext,
) -> Result<RegisteredStudentsTemplate, Response> {
    let students = st
        .admin_service
        .students()
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(RegisteredStudentsTemplate {
        ctx,
        students: students.iter().map(StudentRow::from).collect(),
    })
}

/// `GET /delete_student_confirm/{regno}`
pub async fn delete_student_handler(
    State(st): State<AppState>,
    Path(regno): Path<String>,
    ctx: PageContext,
) -> Result<DeleteStudentTemplate, Response> {
    let (student, open) = st
        .admin_service
        .deletion_preview(&regno)
        .await
        .or_redirect(&st, "/registered_students")?;

    Ok(DeleteStudentTemplate {
        ctx,
        student: StudentRow::from(&student),
        open_loans: LoanRow::rows(&open, clock::today()),
    })
}

/// `POST /delete_student_confirm/{regno}`
///
/// Copies on open loans go back on the shelf.
pub async fn delete_student_submit_handler(
    State(st): State<AppState>,
    Path(regno): Path<String>,
) -> Result<Response, Response> {
    let restored = st
        .admin_service
        .delete_student(&regno)
        .await
        .or_redirect(&st, "/registered_students")?;

    let message = if restored > 0 {
        format!("Student {regno} deleted. {restored} borrowed copies returned to the shelf.")
    } else {
        format!("Student {regno} deleted.")
    };
    Ok(flash::redirect(
        &st,
        "/registered_students",
        Flash::success(message),
    ))
}

/// `GET /view_record/{regno}`
pub async fn view_record_handler(
    State(st): State<AppState>,
    Path(regno): Path<String>,
    ctx: PageContext,
) -> Result<ViewRecordTemplate, Response> {
    let (student, loans) = st
        .circulation_service
        .student_record(&regno)
        .await
        .or_redirect(&st, "/registered_students")?;

    Ok(ViewRecordTemplate {
        ctx,
        student: StudentRow::from(&student),
        loans: LoanRow::rows(&loans, clock::today()),
    })
}

/// `GET /edit_due/{loan_id}`
pub async fn edit_due_handler(
    State(st): State<AppState>,
    Path(loan_id): Path<i64>,
    ctx: PageContext,
) -> Result<EditDueTemplate, Response> {
    let loan = st
        .circulation_service
        .loan(loan_id)
        .await
        .or_redirect(&st, "/borrowed_books")?;

    Ok(EditDueTemplate {
        ctx,
        loan: LoanRow::new(&loan, clock::today()),
    })
}

/// `POST /edit_due/{loan_id}`
pub async fn edit_due_submit_handler(
    State(st): State<AppState>,
    Path(loan_id): Path<i64>,
    Form(form): Form<EditDueForm>,
) -> Result<Response, Response> {
    let back = format!("/edit_due/{loan_id}");
    let loan = st
        .circulation_service
        .edit_due_date(loan_id, &form.due_date)
        .await
        .or_redirect(&st, &back)?;

    Ok(flash::redirect(
        &st,
        &format!("/view_record/{}", loan.regno),
        Flash::success(format!(
            "Due date for '{}' changed to {}. The student has been notified.",
            loan.book_title, loan.due_date
        )),
    ))
}

/// `POST /send_reminders`
pub async fn send_reminders_handler(State(st): State<AppState>) -> Result<Response, Response> {
    let sent = st
        .circulation_service
        .send_reminders(clock::today())
        .await
        .or_redirect(&st, "/borrowed_books")?;

    let flash = if sent == 0 {
        Flash::info("No loans are overdue or due soon.")
    } else {
        Flash::success(format!("{sent} reminder emails queued."))
    };
    Ok(flash::redirect(&st, "/borrowed_books", flash))
}
