use crate::model::{Article, Comment, Person};
use crate::server::{MemoryServer, ServerHandle};
use jsonapi_orm::{ApiConfig, OrmApi, Result, Transport};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Owns the ORM with the blog models registered and, when it runs one, the
/// in-memory server behind it.
///
/// # Example
///
/// ```ignore
/// let (server, handle) = MemoryServer::new(32);
/// let blog = Blog::start(server, handle, ApiConfig::new("http://localhost/api"))?;
///
/// let article = blog.new_article()?;
/// article.set_title("Hello").await?;
/// article.save().await?;
///
/// blog.shutdown().await?;
/// ```
pub struct Blog {
    orm: Arc<OrmApi>,
    server: Option<JoinHandle<()>>,
}

impl Blog {
    /// Registers the blog models on an ORM talking to `transport`.
    pub fn new(transport: Arc<dyn Transport>, config: ApiConfig) -> Result<Self> {
        let orm = OrmApi::new(transport, config);
        orm.register_model::<Person>()?;
        orm.register_model::<Article>()?;
        orm.register_model::<Comment>()?;
        info!(types = ?orm.registry().type_tags(), "Blog models registered");
        Ok(Self { orm, server: None })
    }

    /// Spawns `server` and wires the ORM to it through `handle`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(server: MemoryServer, handle: ServerHandle, config: ApiConfig) -> Result<Self> {
        let mut blog = Self::new(Arc::new(handle), config)?;
        blog.server = Some(tokio::spawn(server.run()));
        Ok(blog)
    }

    pub fn orm(&self) -> &Arc<OrmApi> {
        &self.orm
    }

    pub fn new_article(&self) -> Result<Article> {
        self.orm.create_model()
    }

    pub fn new_comment(&self) -> Result<Comment> {
        self.orm.create_model()
    }

    pub fn new_person(&self) -> Result<Person> {
        self.orm.create_model()
    }

    /// Article stub; fetched on first field access.
    pub fn article(&self, id: &str) -> Result<Article> {
        self.orm.from_id(id)
    }

    pub fn person(&self, id: &str) -> Result<Person> {
        self.orm.from_id(id)
    }

    pub async fn articles(&self) -> Result<Vec<Article>> {
        self.orm.get_list().await
    }

    /// Drops the ORM and waits for the server task to finish.
    ///
    /// The server stops once every transport handle is gone, so models and
    /// `OrmApi` clones obtained from this blog must be dropped first.
    pub async fn shutdown(self) -> std::result::Result<(), String> {
        info!("Shutting down blog...");
        drop(self.orm);

        if let Some(server) = self.server {
            if let Err(e) = server.await {
                error!("Server task failed: {:?}", e);
                return Err(format!("Server task failed: {:?}", e));
            }
        }

        info!("Blog shutdown complete.");
        Ok(())
    }
}
