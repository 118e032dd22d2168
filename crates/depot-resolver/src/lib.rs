pub mod listing;
pub mod provider;
pub mod resolver;
