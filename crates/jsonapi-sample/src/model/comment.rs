use super::{authored, Person};
use jsonapi_orm::{ApiModel, Model, ModelDecl, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment(Model);

impl ApiModel for Comment {
    const TYPE: &'static str = "comments";

    fn declare() -> ModelDecl {
        ModelDecl::new(Self::TYPE)
            .attribute("body", "body")
            .inherit(&authored())
    }

    fn from_model(model: Model) -> Self {
        Self(model)
    }

    fn model(&self) -> &Model {
        &self.0
    }
}

impl Comment {
    pub async fn body(&self) -> Result<Option<String>> {
        self.0.attribute_as("body").await
    }

    pub async fn set_body(&self, body: &str) -> Result<()> {
        self.0.set_attribute("body", body).await
    }

    pub async fn author(&self) -> Result<Option<Person>> {
        Ok(self.0.to_one("author").await?.map(Person::from_model))
    }

    pub async fn set_author(&self, author: Option<&Person>) -> Result<()> {
        self.0.set_to_one("author", author.map(|a| a.model())).await
    }
}
