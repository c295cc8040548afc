use super::{authored, Comment, Person};
use jsonapi_orm::{ApiModel, Model, ModelDecl, Result};
use serde::{Deserialize, Serialize};

/// Publication state, stored as a lowercase string attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Archived,
}

/// A blog article.
///
/// See [`impl ApiModel for Article`](#impl-ApiModel-for-Article) for the
/// declared fields: `title` and `status` attributes, a to-one `author`
/// (inherited from [`authored`]) and a to-many `comments`.
#[derive(Debug, Clone, PartialEq)]
pub struct Article(Model);

impl ApiModel for Article {
    const TYPE: &'static str = "articles";

    fn declare() -> ModelDecl {
        ModelDecl::new(Self::TYPE)
            .attribute("title", "title")
            .attribute("status", "status")
            .to_many("comments", "comments")
            .inherit(&authored())
    }

    fn from_model(model: Model) -> Self {
        Self(model)
    }

    fn model(&self) -> &Model {
        &self.0
    }
}

impl Article {
    pub async fn title(&self) -> Result<Option<String>> {
        self.0.attribute_as("title").await
    }

    pub async fn set_title(&self, title: &str) -> Result<()> {
        self.0.set_attribute("title", title).await
    }

    pub async fn status(&self) -> Result<Option<ArticleStatus>> {
        self.0.attribute_as("status").await
    }

    pub async fn set_status(&self, status: ArticleStatus) -> Result<()> {
        self.0.set_attribute("status", &status).await
    }

    pub async fn author(&self) -> Result<Option<Person>> {
        Ok(self.0.to_one("author").await?.map(Person::from_model))
    }

    pub async fn set_author(&self, author: Option<&Person>) -> Result<()> {
        self.0.set_to_one("author", author.map(|a| a.model())).await
    }

    pub async fn comments(&self) -> Result<Vec<Comment>> {
        let comments = self.0.to_many("comments").await?;
        Ok(comments.into_iter().map(Comment::from_model).collect())
    }

    pub async fn set_comments(&self, comments: &[Comment]) -> Result<()> {
        let models: Vec<Model> = comments.iter().map(|c| c.model().clone()).collect();
        self.0.set_to_many("comments", &models).await
    }

    /// Marks the article published and saves it.
    pub async fn publish(&self) -> Result<()> {
        self.set_status(ArticleStatus::Published).await?;
        self.save().await
    }
}
