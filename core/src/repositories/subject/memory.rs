//! In-memory implementation of SubjectRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{Subject, SubjectId};
use crate::errors::DomainError;

use super::r#trait::SubjectRepository;

#[derive(Clone, Default)]
pub struct InMemorySubjectRepository {
    subjects: Arc<RwLock<HashMap<SubjectId, Subject>>>,
}

impl InMemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `subjects`
    pub fn with_subjects(subjects: impl IntoIterator<Item = Subject>) -> Self {
        let map = subjects.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            subjects: Arc::new(RwLock::new(map)),
        }
    }

    /// Insert or replace a subject
    pub async fn upsert(&self, subject: Subject) {
        self.subjects.write().await.insert(subject.id.clone(), subject);
    }
}

#[async_trait]
impl SubjectRepository for InMemorySubjectRepository {
    async fn find_subject(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError> {
        Ok(self.subjects.read().await.get(id).cloned())
    }
}
