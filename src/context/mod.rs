pub mod cache;
pub mod curated;
pub mod dictionary;
pub mod resolver;
