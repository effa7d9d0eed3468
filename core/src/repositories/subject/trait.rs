//! Subject repository trait defining the user-identity lookup the token
//! subsystem consumes.

use async_trait::async_trait;

use crate::domain::entities::{Subject, SubjectId};
use crate::errors::DomainError;

/// Read-only lookup of the principals tokens are issued for
///
/// Account management lives outside the token subsystem; this is the only
/// view of it the services need.
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Find a subject by id
    ///
    /// # Returns
    /// * `Ok(Some(Subject))` - Subject found
    /// * `Ok(None)` - No subject with that id
    /// * `Err(DomainError)` - Storage error occurred
    async fn find_subject(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError>;
}
