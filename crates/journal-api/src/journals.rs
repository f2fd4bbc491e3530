//! Journal service
//!
//! Single-journal operations follow one sequence: load by id, answer
//! `NotFound` when absent, run the ownership check, then act. Listing is
//! scoped to the caller inside the store query.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::ownership::OwnershipGuard;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use journal_core::{
    CredentialStore, Journal, JournalId, JournalStore, NewJournal, Page, PageRequest, UserId,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Create and full-replace body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct JournalRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "title must be at most 255 characters")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub message: String,
}

/// Partial update body; absent or blank fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct JournalPatchRequest {
    #[validate(length(max = 255, message = "title must be at most 255 characters"))]
    pub title: Option<String>,
    pub message: Option<String>,
}

/// Journal as returned to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub id: JournalId,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub user_id: UserId,
}

impl From<Journal> for JournalResponse {
    fn from(journal: Journal) -> Self {
        Self {
            id: journal.id,
            title: journal.title,
            message: journal.message,
            created_at: journal.created_at,
            last_modified_at: journal.last_modified_at,
            user_id: journal.owner_id,
        }
    }
}

/// One page of the caller's journals
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalPage {
    pub content: Vec<JournalResponse>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl From<Page<Journal>> for JournalPage {
    fn from(page: Page<Journal>) -> Self {
        let total_pages = page.total_pages();
        Self {
            page: page.request.page,
            size: page.request.size,
            total_elements: page.total,
            total_pages,
            content: page.items.into_iter().map(JournalResponse::from).collect(),
        }
    }
}

/// Query parameters for listing
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page number
    #[param(default = 0)]
    pub page: Option<u32>,
    /// Page size, clamped to 1..=100
    #[param(default = 10)]
    pub size: Option<u32>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some(Cow::Borrowed("must not be blank"));
        return Err(err);
    }
    Ok(())
}

/// Treat a blank patch field like an absent one
fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Journal operations, always on behalf of an explicit caller
#[derive(Clone)]
pub struct JournalService {
    journals: Arc<dyn JournalStore>,
    credentials: Arc<dyn CredentialStore>,
    guard: OwnershipGuard,
}

impl JournalService {
    pub fn new(
        journals: Arc<dyn JournalStore>,
        credentials: Arc<dyn CredentialStore>,
        guard: OwnershipGuard,
    ) -> Self {
        Self {
            journals,
            credentials,
            guard,
        }
    }

    /// Create a journal owned by the caller
    ///
    /// A token may outlive its account; such a caller gets `Unauthorized`.
    pub async fn create(
        &self,
        caller_id: UserId,
        request: JournalRequest,
    ) -> Result<JournalResponse, AppError> {
        if self.credentials.find_user_by_id(caller_id).await?.is_none() {
            return Err(AppError::user_missing());
        }

        let journal = self
            .journals
            .insert_journal(NewJournal::new(caller_id, request.title, request.message))
            .await?;

        tracing::debug!(journal_id = journal.id, user_id = caller_id, "journal created");

        Ok(journal.into())
    }

    pub async fn get(&self, caller_id: UserId, id: JournalId) -> Result<JournalResponse, AppError> {
        self.load_owned(caller_id, id).await.map(JournalResponse::from)
    }

    /// The caller's journals, newest first
    pub async fn list(&self, caller_id: UserId, page: PageRequest) -> Result<JournalPage, AppError> {
        let page = self.journals.list_journals_by_owner(caller_id, page).await?;
        Ok(page.into())
    }

    /// Replace title and message
    pub async fn update(
        &self,
        caller_id: UserId,
        id: JournalId,
        request: JournalRequest,
    ) -> Result<JournalResponse, AppError> {
        let mut journal = self.load_owned(caller_id, id).await?;

        journal.title = request.title;
        journal.message = request.message;

        self.save(journal).await
    }

    /// Apply only the fields that carry a non-blank value
    pub async fn patch(
        &self,
        caller_id: UserId,
        id: JournalId,
        request: JournalPatchRequest,
    ) -> Result<JournalResponse, AppError> {
        let mut journal = self.load_owned(caller_id, id).await?;

        if let Some(title) = provided(request.title) {
            journal.title = title;
        }
        if let Some(message) = provided(request.message) {
            journal.message = message;
        }

        self.save(journal).await
    }

    pub async fn delete(&self, caller_id: UserId, id: JournalId) -> Result<(), AppError> {
        self.load_owned(caller_id, id).await?;

        if !self.journals.delete_journal(id).await? {
            return Err(AppError::journal_not_found(id));
        }

        tracing::debug!(journal_id = id, user_id = caller_id, "journal deleted");
        Ok(())
    }

    async fn load_owned(&self, caller_id: UserId, id: JournalId) -> Result<Journal, AppError> {
        let journal = self
            .journals
            .find_journal(id)
            .await?
            .ok_or_else(|| AppError::journal_not_found(id))?;

        self.guard
            .assert_owner(journal.owner_id, caller_id, id)
            .map_err(|e| {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: caller_id,
                    resource: format!("journal:{id}"),
                });
                e
            })?;

        Ok(journal)
    }

    async fn save(&self, mut journal: Journal) -> Result<JournalResponse, AppError> {
        journal.last_modified_at = Utc::now();
        let id = journal.id;

        self.journals
            .update_journal(&journal)
            .await?
            .map(JournalResponse::from)
            .ok_or_else(|| AppError::journal_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal_core::{MemoryStore, NewUser, OwnershipPolicy};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: JournalService,
        alice: UserId,
        bob: UserId,
    }

    async fn fixture(policy: OwnershipPolicy) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = store
            .insert_user(NewUser::new(None, "alice", "hash"))
            .await
            .unwrap()
            .id;
        let bob = store
            .insert_user(NewUser::new(None, "bobby", "hash"))
            .await
            .unwrap()
            .id;

        let service = JournalService::new(store.clone(), store.clone(), OwnershipGuard::new(policy));
        Fixture {
            store,
            service,
            alice,
            bob,
        }
    }

    fn body(title: &str, message: &str) -> JournalRequest {
        JournalRequest {
            title: title.to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_owner_round_trip() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        let created = f.service.create(f.alice, body("Day 1", "hello")).await.unwrap();

        assert_eq!(created.user_id, f.alice);
        assert_eq!(created.created_at, created.last_modified_at);

        let fetched = f.service.get(f.alice, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_cross_user_access_forbidden() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        let created = f.service.create(f.alice, body("Day 1", "hello")).await.unwrap();
        let forbidden = AppError::Forbidden("Not your journal".to_string());

        assert_eq!(f.service.get(f.bob, created.id).await.unwrap_err(), forbidden);
        assert_eq!(
            f.service
                .update(f.bob, created.id, body("x", "y"))
                .await
                .unwrap_err(),
            forbidden
        );
        assert_eq!(
            f.service
                .patch(f.bob, created.id, JournalPatchRequest::default())
                .await
                .unwrap_err(),
            forbidden
        );
        assert_eq!(
            f.service.delete(f.bob, created.id).await.unwrap_err(),
            forbidden
        );

        // Nothing changed
        let stored = f.store.find_journal(created.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Day 1");
    }

    #[tokio::test]
    async fn test_conceal_policy_matches_not_found() {
        let f = fixture(OwnershipPolicy::Conceal).await;
        let created = f.service.create(f.alice, body("Day 1", "hello")).await.unwrap();

        let foreign = f.service.get(f.bob, created.id).await.unwrap_err();
        let missing = f.service.get(f.bob, 9999).await.unwrap_err();

        assert_eq!(foreign, AppError::journal_not_found(created.id));
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_journal_is_not_found() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        assert_eq!(
            f.service.get(f.alice, 42).await.unwrap_err(),
            AppError::journal_not_found(42)
        );
    }

    #[tokio::test]
    async fn test_patch_ignores_blank_fields() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        let created = f.service.create(f.alice, body("Day 1", "hello")).await.unwrap();

        let patched = f
            .service
            .patch(
                f.alice,
                created.id,
                JournalPatchRequest {
                    title: Some("   ".to_string()),
                    message: Some("updated".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.title, "Day 1");
        assert_eq!(patched.message, "updated");
        assert!(patched.last_modified_at >= created.last_modified_at);
        assert_eq!(patched.created_at, created.created_at);
        assert_eq!(patched.user_id, f.alice);
    }

    #[tokio::test]
    async fn test_update_replaces_both_fields() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        let created = f.service.create(f.alice, body("Day 1", "hello")).await.unwrap();

        let updated = f
            .service
            .update(f.alice, created.id, body("Day 2", "bye"))
            .await
            .unwrap();

        assert_eq!((updated.title.as_str(), updated.message.as_str()), ("Day 2", "bye"));
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_caller() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        for i in 0..3 {
            f.service
                .create(f.alice, body(&format!("a{i}"), "m"))
                .await
                .unwrap();
        }
        f.service.create(f.bob, body("b", "m")).await.unwrap();

        let page = f.service.list(f.alice, PageRequest::new(0, 2)).await.unwrap();

        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.content.len(), 2);
        assert!(page.content.iter().all(|j| j.user_id == f.alice));
    }

    #[tokio::test]
    async fn test_create_for_deleted_user() {
        let f = fixture(OwnershipPolicy::Forbidden).await;
        f.store.delete_user(f.alice).await.unwrap();

        assert_eq!(
            f.service.create(f.alice, body("t", "m")).await.unwrap_err(),
            AppError::user_missing()
        );
    }

    #[test]
    fn test_request_validation() {
        assert!(body("t", "m").validate().is_ok());
        assert!(body("  ", "m").validate().is_err());
        assert!(body("t", "").validate().is_err());
        assert!(body(&"t".repeat(256), "m").validate().is_err());

        let patch = JournalPatchRequest {
            title: Some("t".repeat(256)),
            message: None,
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_page_query_defaults() {
        let request = PageRequest::from(PageQuery::default());
        assert_eq!(request, PageRequest::new(0, 10));

        let clamped = PageRequest::from(PageQuery {
            page: Some(2),
            size: Some(500),
        });
        assert_eq!(clamped.size, PageRequest::MAX_SIZE);
    }
}
