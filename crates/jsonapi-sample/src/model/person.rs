use jsonapi_orm::{ApiModel, Model, ModelDecl, Result};

/// A blog author.
#[derive(Debug, Clone, PartialEq)]
pub struct Person(Model);

impl ApiModel for Person {
    const TYPE: &'static str = "people";

    fn declare() -> ModelDecl {
        ModelDecl::new(Self::TYPE)
            .attribute("name", "name")
            .attribute("twitter", "twitter")
    }

    fn from_model(model: Model) -> Self {
        Self(model)
    }

    fn model(&self) -> &Model {
        &self.0
    }
}

impl Person {
    pub async fn name(&self) -> Result<Option<String>> {
        self.0.attribute_as("name").await
    }

    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.0.set_attribute("name", name).await
    }

    pub async fn twitter(&self) -> Result<Option<String>> {
        self.0.attribute_as("twitter").await
    }

    pub async fn set_twitter(&self, handle: Option<&str>) -> Result<()> {
        self.0.set_attribute("twitter", &handle).await
    }
}
