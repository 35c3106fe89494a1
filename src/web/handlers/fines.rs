//! Student fines, payments and the admin fine list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    response::Response,
};
use chrono::Utc;

use crate::state::AppState;
use crate::utils::clock;
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::forms::{AdminFinesQuery, PayFineForm};
use crate::web::middleware::session::CurrentStudent;
use crate::web::page::PageContext;
use crate::web::views::{FineRow, PaymentRow};

#[derive(Template, WebTemplate)]
#[template(path = "my_fines.html")]
pub struct MyFinesTemplate {
    pub ctx: PageContext,
    pub fines: Vec<FineRow>,
    pub payments: Vec<PaymentRow>,
    pub total: String,
    pub has_fines: bool,
    pub can_borrow: bool,
    pub borrow_limit: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "pay_fine.html")]
pub struct PayFineTemplate {
    pub ctx: PageContext,
    pub fine: FineRow,
    /// Pre-filled amount: the whole outstanding sum, as plain rupees.
    pub suggested: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_fines.html")]
pub struct AdminFinesTemplate {
    pub ctx: PageContext,
    pub fines: Vec<FineRow>,
    pub regno: String,
}

/// `GET /my_fines`
pub async fn my_fines_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    ctx: PageContext,
) -> Result<MyFinesTemplate, Response> {
    let today = clock::today();
    let overview = st
        .fine_service
        .overview(&student.regno, today)
        .await
        .or_redirect(&st, "/student_dashboard")?;

    let policy = st.fine_service.policy();
    Ok(MyFinesTemplate {
        ctx,
        fines: FineRow::rows(&overview.fines, today, policy),
        payments: overview.payments.iter().map(PaymentRow::from).collect(),
        total: overview.total.to_string(),
        has_fines: overview.total.is_positive(),
        can_borrow: overview.can_borrow,
        borrow_limit: policy.borrow_limit().to_string(),
    })
}

/// `GET /pay_fine/{id}`
pub async fn pay_fine_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(fine_id): Path<i64>,
    ctx: PageContext,
) -> Result<PayFineTemplate, Response> {
    let today = clock::today();
    let fine = st
        .fine_service
        .fine_for(&student.regno, fine_id)
        .await
        .or_redirect(&st, "/my_fines")?;

    if !fine.outstanding().is_positive() {
        return Err(flash::redirect(
            &st,
            "/my_fines",
            Flash::info("This fine has already been paid."),
        ));
    }

    let overview = st
        .fine_service
        .overview(&student.regno, today)
        .await
        .or_redirect(&st, "/my_fines")?;
    let detail = overview
        .fines
        .iter()
        .find(|d| d.fine.id == fine_id)
        .ok_or_else(|| {
            flash::redirect(&st, "/my_fines", Flash::info("This fine has already been paid."))
        })?;

    let outstanding = detail.fine.outstanding().paise();
    Ok(PayFineTemplate {
        ctx,
        fine: FineRow::new(detail, today, st.fine_service.policy()),
        suggested: format!("{}.{:02}", outstanding / 100, outstanding % 100),
    })
}

/// `POST /pay_fine/{id}`
///
/// Partial payments are accepted down to the minimum payment.
pub async fn pay_fine_submit_handler(
    State(st): State<AppState>,
    Extension(student): Extension<CurrentStudent>,
    Path(fine_id): Path<i64>,
    Form(form): Form<PayFineForm>,
) -> Result<Response, Response> {
    let back = format!("/pay_fine/{fine_id}");
    let amount = form.amount().or_redirect(&st, &back)?;

    let (fine, payment) = st
        .fine_service
        .pay(&student.regno, fine_id, amount, Utc::now())
        .await
        .or_redirect(&st, &back)?;

    let transaction = payment.transaction_id.unwrap_or_default();
    let flash = if fine.outstanding().is_positive() {
        Flash::success(format!(
            "Payment of {amount} received (transaction {transaction}). {} still outstanding.",
            fine.outstanding()
        ))
    } else {
        Flash::success(format!(
            "Payment of {amount} received (transaction {transaction}). The fine is fully paid."
        ))
    };
    Ok(flash::redirect(&st, "/my_fines", flash))
}

/// `GET /admin_fines?regno=`
pub async fn admin_fines_handler(
    State(st): State<AppState>,
    Query(query): Query<AdminFinesQuery>,
    ctx: PageContext,
) -> Result<AdminFinesTemplate, Response> {
    let today = clock::today();
    let regno = query.regno();

    let fines = match st.fine_service.admin_list(regno.clone(), today).await {
        Ok(fines) => fines,
        Err(e) if regno.is_some() => {
            return Err(flash::redirect(&st, "/admin_fines", Flash::from_error(&e)));
        }
        Err(e) => return Err(flash::redirect(&st, "/admin_panel", Flash::from_error(&e))),
    };

    Ok(AdminFinesTemplate {
        ctx,
        fines: FineRow::rows(&fines, today, st.fine_service.policy()),
        regno: regno.unwrap_or_default(),
    })
}
