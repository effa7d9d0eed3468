pub mod subject;
pub mod token;

pub use subject::{InMemorySubjectRepository, SubjectRepository};
pub use token::{InMemoryTokenStore, TokenStore};
