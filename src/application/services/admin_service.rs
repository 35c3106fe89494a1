//! Admin accounts, library-wide statistics and student removal.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::domain::analytics::{MonthCount, monthly_counts, window_start};
use crate::domain::entities::{Admin, Book, BookSearch, Loan, Student};
use crate::domain::repositories::{
    AdminRepository, BookRepository, LoanRepository, SessionRepository, StudentRepository,
};
use crate::error::AppError;
use crate::utils::password::PasswordHasher;

/// Months of borrowing shown on the admin panel chart.
pub const PANEL_MONTHS: u32 = 6;

/// Headline numbers for the admin panel and `/api/admin/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub total_books: i64,
    pub total_borrowed: i64,
    pub total_overdue: i64,
    pub total_students: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminPanel {
    pub students: Vec<Student>,
    pub open_loans: Vec<Loan>,
    pub books: Vec<Book>,
    pub stats: LibraryStats,
    pub monthly: Vec<MonthCount>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminAccount {
    pub admin: Admin,
    pub is_super: bool,
}

pub struct AdminService {
    admins: Arc<dyn AdminRepository>,
    students: Arc<dyn StudentRepository>,
    books: Arc<dyn BookRepository>,
    loans: Arc<dyn LoanRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: PasswordHasher,
    super_admins: Vec<String>,
}

impl AdminService {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        students: Arc<dyn StudentRepository>,
        books: Arc<dyn BookRepository>,
        loans: Arc<dyn LoanRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: PasswordHasher,
        super_admins: Vec<String>,
    ) -> Self {
        Self {
            admins,
            students,
            books,
            loans,
            sessions,
            hasher,
            super_admins,
        }
    }

    fn is_super(&self, email: &str) -> bool {
        self.super_admins
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(email))
    }

    pub async fn stats(&self, today: NaiveDate) -> Result<LibraryStats, AppError> {
        Ok(LibraryStats {
            total_books: self.books.count().await?,
            total_borrowed: self.loans.count_open().await?,
            total_overdue: self.loans.count_overdue(today).await?,
            total_students: self.students.count().await?,
        })
    }

    /// Borrowings per calendar month, oldest month first.
    pub async fn monthly_borrowings(
        &self,
        today: NaiveDate,
        months: u32,
    ) -> Result<Vec<MonthCount>, AppError> {
        let dates = self
            .loans
            .borrow_dates_since(window_start(today, months))
            .await?;
        Ok(monthly_counts(&dates, today, months))
    }

    pub async fn panel(
        &self,
        search: Option<&str>,
        today: NaiveDate,
    ) -> Result<AdminPanel, AppError> {
        let search = BookSearch {
            term: search.unwrap_or_default().trim().to_string(),
            ..Default::default()
        };

        Ok(AdminPanel {
            students: self.students.list().await?,
            open_loans: self.loans.all_open().await?,
            books: self.books.search(&search).await?,
            stats: self.stats(today).await?,
            monthly: self.monthly_borrowings(today, PANEL_MONTHS).await?,
        })
    }

    pub async fn students(&self) -> Result<Vec<Student>, AppError> {
        self.students.list().await
    }

    pub async fn admins(&self) -> Result<Vec<AdminAccount>, AppError> {
        Ok(self
            .admins
            .list()
            .await?
            .into_iter()
            .map(|admin| AdminAccount {
                is_super: self.is_super(&admin.email),
                admin,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when the email or password is
    /// missing and [`AppError::Conflict`] when the email is taken.
    pub async fn add_admin(&self, email: &str, password: &str) -> Result<Admin, AppError> {
        let email = email.trim();
        check_credentials(email, password)?;

        let hash = self.hasher.hash(password).await?;
        let admin = self.admins.create(email, &hash).await?;

        tracing::info!(email = %admin.email, "Admin added");
        Ok(admin)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] for super admins and
    /// [`AppError::NotFound`] for unknown emails.
    pub async fn delete_admin(&self, email: &str) -> Result<(), AppError> {
        if self.is_super(email) {
            return Err(AppError::forbidden(
                "Super admins cannot be deleted.",
                json!({ "email": email }),
            ));
        }
        if !self.admins.delete_by_email(email).await? {
            return Err(AppError::not_found(
                "Admin not found.",
                json!({ "email": email }),
            ));
        }

        tracing::info!(email, "Admin deleted");
        Ok(())
    }

    /// Changes a super admin's own email and password.
    ///
    /// Every session of the admin is closed afterwards.
    ///
    /// # Errors
    ///
    /// - [`AppError::Forbidden`] unless `admin_id` is a super admin
    /// - [`AppError::Conflict`] when the new email belongs to another admin
    pub async fn update_credentials(
        &self,
        admin_id: i64,
        email: &str,
        password: &str,
    ) -> Result<Admin, AppError> {
        let current = self
            .admins
            .find_by_id(admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found.", json!({ "id": admin_id })))?;

        if !self.is_super(&current.email) {
            return Err(AppError::forbidden(
                "Only super admins can update their credentials.",
                json!({}),
            ));
        }

        let email = email.trim();
        check_credentials(email, password)?;

        if !email.eq_ignore_ascii_case(&current.email)
            && self.admins.find_by_email(email).await?.is_some()
        {
            return Err(AppError::conflict(
                "Another admin already uses this email.",
                json!({ "email": email }),
            ));
        }

        let hash = self.hasher.hash(password).await?;
        let updated = self.admins.update_credentials(admin_id, email, &hash).await?;
        self.sessions.delete_for_admin(admin_id).await?;

        tracing::info!(admin_id, email = %updated.email, "Admin credentials updated");
        Ok(updated)
    }

    /// Creates every configured super admin that does not exist yet.
    pub async fn seed_super_admins(&self, password: &str) -> Result<usize, AppError> {
        let mut created = 0;
        for email in &self.super_admins {
            if self.admins.find_by_email(email).await?.is_some() {
                continue;
            }
            let hash = self.hasher.hash(password).await?;
            self.admins.create(email, &hash).await?;
            tracing::info!(email = %email, "Super admin seeded");
            created += 1;
        }
        Ok(created)
    }

    /// The student and their open loans, shown before deletion.
    pub async fn deletion_preview(&self, regno: &str) -> Result<(Student, Vec<Loan>), AppError> {
        let student = self
            .students
            .find(regno)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found.", json!({ "regno": regno })))?;
        let open = self.loans.open_for_student(regno).await?;
        Ok((student, open))
    }

    /// Deletes a student and their records. Returns the copies put back.
    pub async fn delete_student(&self, regno: &str) -> Result<u64, AppError> {
        let restored = self.students.delete_with_loans(regno).await?;
        tracing::info!(regno, restored, "Student deleted");
        Ok(restored)
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::bad_request(
            "Email and password are required.",
            json!({}),
        ));
    }
    Ok(())
}
