//! Repository backends: the [`provider::RepositoryProvider`] contract, version
//! selection strategies, write listeners, and [`directory::DirectoryRepository`].

pub mod directory;
pub mod provider;
