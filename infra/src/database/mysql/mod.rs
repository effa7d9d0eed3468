//! MySQL implementations of the core repository traits

pub mod subject_repository_impl;
pub mod token_store_impl;

pub use subject_repository_impl::MySqlSubjectRepository;
pub use token_store_impl::MySqlTokenStore;
