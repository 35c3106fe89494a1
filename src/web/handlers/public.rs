//! Landing pages.

use askama::Template;
use askama_web::WebTemplate;

use crate::web::page::PageContext;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "student.html")]
pub struct StudentPortalTemplate {
    pub ctx: PageContext,
}

/// `GET /` - Choose between the student and admin portals.
pub async fn index_handler(ctx: PageContext) -> IndexTemplate {
    IndexTemplate { ctx }
}

/// `GET /student` - Student portal landing page with login and signup links.
pub async fn student_portal_handler(ctx: PageContext) -> StudentPortalTemplate {
    StudentPortalTemplate { ctx }
}
