//! Accommodation application intake and review.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{not_found, AllocationError, Result};
use crate::store::DocumentStore;
use crate::types::{Application, ApplicationId, ApplicationStatus, UserId};

/// Outcome a reviewer records on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    fn into_status(self) -> ApplicationStatus {
        match self {
            Self::Approved => ApplicationStatus::Approved,
            Self::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Handles the application lifecycle: submit, review, read.
pub struct ApplicationService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for ApplicationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: DocumentStore> ApplicationService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records a new application for a semester.
    ///
    /// A student may hold at most one pending application per semester;
    /// duplicates are rejected rather than silently replaced.
    pub async fn submit(&self, student_id: UserId, semester: String) -> Result<Application> {
        let student = self
            .store
            .get_user(&student_id)
            .await?
            .ok_or_else(|| not_found("student", student_id))?;

        let existing = self.store.list_applications_by_student(&student.id).await?;
        if existing
            .iter()
            .any(|app| app.semester == semester && app.status == ApplicationStatus::Pending)
        {
            return Err(AllocationError::Validation(format!(
                "a pending application for {semester} already exists"
            )));
        }

        let application = Application {
            id: ApplicationId::new(),
            student_id: student.id,
            semester,
            status: ApplicationStatus::Pending,
            submitted_at: self.clock.now(),
            reviewed_at: None,
            reviewed_by: None,
        };
        self.store.create_application(application.clone()).await?;
        tracing::info!(
            application_id = %application.id,
            student_id = %application.student_id,
            semester = %application.semester,
            "application submitted"
        );
        Ok(application)
    }

    /// Records a review decision. Only pending applications can be reviewed.
    pub async fn review(
        &self,
        application_id: &ApplicationId,
        decision: ReviewDecision,
        reviewed_by: UserId,
    ) -> Result<Application> {
        let mut application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| not_found("application", application_id))?;

        if application.status != ApplicationStatus::Pending {
            return Err(AllocationError::Validation(format!(
                "application is already {}",
                application.status
            )));
        }

        application.status = decision.into_status();
        application.reviewed_by = Some(reviewed_by);
        application.reviewed_at = Some(self.clock.now());
        self.store.update_application(application.clone()).await?;
        tracing::info!(
            application_id = %application.id,
            status = %application.status,
            reviewer = %reviewed_by,
            "application reviewed"
        );
        Ok(application)
    }

    pub async fn get(&self, id: &ApplicationId) -> Result<Application> {
        self.store
            .get_application(id)
            .await?
            .ok_or_else(|| not_found("application", id))
    }

    pub async fn list_for_student(&self, student_id: &UserId) -> Result<Vec<Application>> {
        let mut applications = self.store.list_applications_by_student(student_id).await?;
        applications.sort_by_key(|a| std::cmp::Reverse(a.submitted_at));
        Ok(applications)
    }

    pub async fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<Application>> {
        let mut applications = self.store.list_applications(status).await?;
        applications.sort_by_key(|a| std::cmp::Reverse(a.submitted_at));
        Ok(applications)
    }
}
