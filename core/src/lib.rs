pub mod corpus;
pub mod extract;
pub mod index;
pub mod query;
pub mod urls;

pub type DocId = u32;
