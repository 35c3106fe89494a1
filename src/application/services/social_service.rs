//! Following other students and seeing what they read.

use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::entities::Loan;
use crate::domain::repositories::{FollowRepository, LoanRepository, StudentRepository};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct SocialOverview {
    pub following: Vec<String>,
    pub followers: Vec<String>,
    /// Every other student, with whether `regno` follows them.
    pub others: Vec<(String, bool)>,
    /// Open loans of followed students, newest first.
    pub feed: Vec<Loan>,
}

pub struct SocialService {
    students: Arc<dyn StudentRepository>,
    follows: Arc<dyn FollowRepository>,
    loans: Arc<dyn LoanRepository>,
}

impl SocialService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        follows: Arc<dyn FollowRepository>,
        loans: Arc<dyn LoanRepository>,
    ) -> Self {
        Self {
            students,
            follows,
            loans,
        }
    }

    /// # Errors
    ///
    /// - [`AppError::Validation`] when following yourself
    /// - [`AppError::NotFound`] for an unknown student
    /// - [`AppError::Conflict`] when already following
    pub async fn follow(&self, regno: &str, target: &str) -> Result<(), AppError> {
        if regno == target {
            return Err(AppError::bad_request(
                "You cannot follow yourself.",
                json!({}),
            ));
        }
        if self.students.find(target).await?.is_none() {
            return Err(AppError::not_found(
                "Student not found.",
                json!({ "regno": target }),
            ));
        }
        if !self.follows.follow(regno, target).await? {
            return Err(AppError::conflict(
                format!("You are already following {target}."),
                json!({ "regno": target }),
            ));
        }

        tracing::debug!(regno, target, "Followed");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when not following `target`.
    pub async fn unfollow(&self, regno: &str, target: &str) -> Result<(), AppError> {
        if !self.follows.unfollow(regno, target).await? {
            return Err(AppError::not_found(
                format!("You are not following {target}."),
                json!({ "regno": target }),
            ));
        }

        tracing::debug!(regno, target, "Unfollowed");
        Ok(())
    }

    pub async fn overview(&self, regno: &str) -> Result<SocialOverview, AppError> {
        let following: Vec<String> = self
            .follows
            .following(regno)
            .await?
            .into_iter()
            .map(|f| f.followed_regno)
            .collect();
        let followers: Vec<String> = self
            .follows
            .followers(regno)
            .await?
            .into_iter()
            .map(|f| f.follower_regno)
            .collect();

        let followed: HashSet<&str> = following.iter().map(String::as_str).collect();
        let others = self
            .students
            .list()
            .await?
            .into_iter()
            .filter(|s| s.regno != regno)
            .map(|s| {
                let is_followed = followed.contains(s.regno.as_str());
                (s.regno, is_followed)
            })
            .collect();

        let feed = self.loans.open_for_students(&following).await?;

        Ok(SocialOverview {
            following,
            followers,
            others,
            feed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Follow, Student};
    use crate::domain::repositories::{
        MockFollowRepository, MockLoanRepository, MockStudentRepository,
    };
    use chrono::{NaiveDate, Utc};

    fn follow(follower: &str, followed: &str) -> Follow {
        Follow {
            id: 1,
            follower_regno: follower.into(),
            followed_regno: followed.into(),
            created_at: Utc::now(),
        }
    }

    fn service(
        students: MockStudentRepository,
        follows: MockFollowRepository,
        loans: MockLoanRepository,
    ) -> SocialService {
        SocialService::new(Arc::new(students), Arc::new(follows), Arc::new(loans))
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let mut follows = MockFollowRepository::new();
        follows.expect_follow().never();

        let service = service(MockStudentRepository::new(), follows, MockLoanRepository::new());
        let result = service.follow("R1", "R1").await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_follow_unknown_student() {
        let mut students = MockStudentRepository::new();
        students.expect_find().returning(|_| Ok(None));

        let service = service(students, MockFollowRepository::new(), MockLoanRepository::new());
        let result = service.follow("R1", "GHOST").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_follow_is_conflict() {
        let mut students = MockStudentRepository::new();
        students.expect_find().returning(|regno| {
            Ok(Some(Student::new(regno.into(), "x@rgmcet.edu.in".into(), None)))
        });
        let mut follows = MockFollowRepository::new();
        follows.expect_follow().returning(|_, _| Ok(false));

        let service = service(students, follows, MockLoanRepository::new());
        let err = service.follow("R1", "R2").await.unwrap_err();

        assert_eq!(err.message(), "You are already following R2.");
    }

    #[tokio::test]
    async fn test_unfollow_when_not_following() {
        let mut follows = MockFollowRepository::new();
        follows.expect_unfollow().returning(|_, _| Ok(false));

        let service = service(MockStudentRepository::new(), follows, MockLoanRepository::new());
        assert!(service.unfollow("R1", "R2").await.is_err());
    }

    #[tokio::test]
    async fn test_overview() {
        let mut students = MockStudentRepository::new();
        students.expect_list().returning(|| {
            Ok(["R1", "R2", "R3"]
                .into_iter()
                .map(|r| Student::new(r.into(), format!("{r}@rgmcet.edu.in"), None))
                .collect())
        });
        let mut follows = MockFollowRepository::new();
        follows
            .expect_following()
            .returning(|_| Ok(vec![follow("R1", "R2")]));
        follows
            .expect_followers()
            .returning(|_| Ok(vec![follow("R3", "R1")]));
        let mut loans = MockLoanRepository::new();
        loans
            .expect_open_for_students()
            .withf(|regnos| regnos == ["R2".to_string()])
            .returning(|_| {
                let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
                Ok(vec![Loan::new(1, "R2".into(), Some(1), "Dune".into(), day, day)])
            });

        let service = service(students, follows, loans);
        let overview = service.overview("R1").await.unwrap();

        assert_eq!(overview.following, vec!["R2"]);
        assert_eq!(overview.followers, vec!["R3"]);
        assert_eq!(
            overview.others,
            vec![("R2".to_string(), true), ("R3".to_string(), false)]
        );
        assert_eq!(overview.feed.len(), 1);
    }
}
