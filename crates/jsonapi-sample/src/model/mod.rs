//! # Blog Models
//!
//! Typed wrappers around [`Model`](jsonapi_orm::Model) handles, one per
//! JSON:API type the blog server exposes.

mod article;
mod comment;
mod person;

pub use article::{Article, ArticleStatus};
pub use comment::Comment;
pub use person::Person;

use jsonapi_orm::ModelDecl;

/// Fields shared by everything a person can write.
pub fn authored() -> ModelDecl {
    ModelDecl::new("authored").to_one("author", "author")
}
