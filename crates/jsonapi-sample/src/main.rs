use jsonapi_orm::{ApiConfig, ApiModel};
use jsonapi_sample::lifecycle::{setup_tracing, Blog};
use jsonapi_sample::model::ArticleStatus;
use jsonapi_sample::server::MemoryServer;
use serde_json::json;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting blog sample");

    let (mut server, handle) = MemoryServer::new(32);
    server
        .seed(json!({
            "type": "people",
            "id": "9",
            "attributes": {"name": "Dan Gebhardt", "twitter": "dgeb"}
        }))
        .map_err(|e| e.to_string())?;

    let config = ApiConfig::new("http://localhost/api").with_timeout(Some(5.0));
    let blog = Blog::start(server, handle, config).map_err(|e| e.to_string())?;

    let span = tracing::info_span!("writing");
    let article_id = async {
        let author = blog.person("9").map_err(|e| e.to_string())?;
        info!(name = ?author.name().await.map_err(|e| e.to_string())?, "Loaded author");

        let article = blog.new_article().map_err(|e| e.to_string())?;
        article
            .set_title("JSON:API paints my bikeshed!")
            .await
            .map_err(|e| e.to_string())?;
        article
            .set_status(ArticleStatus::Draft)
            .await
            .map_err(|e| e.to_string())?;
        article
            .set_author(Some(&author))
            .await
            .map_err(|e| e.to_string())?;
        article.save().await.map_err(|e| e.to_string())?;

        let comment = blog.new_comment().map_err(|e| e.to_string())?;
        comment
            .set_body("First!")
            .await
            .map_err(|e| e.to_string())?;
        comment
            .set_author(Some(&author))
            .await
            .map_err(|e| e.to_string())?;
        comment.save().await.map_err(|e| e.to_string())?;

        article
            .set_comments(&[comment])
            .await
            .map_err(|e| e.to_string())?;
        article.publish().await.map_err(|e| e.to_string())?;

        article
            .id()
            .ok_or_else(|| "article was saved without an id".to_string())
    }
    .instrument(span)
    .await?;

    info!(article_id = %article_id, "Article published");

    let span = tracing::info_span!("reading");
    let read = async {
        for article in blog.articles().await.map_err(|e| e.to_string())? {
            let author = match article.author().await.map_err(|e| e.to_string())? {
                Some(author) => author.name().await.map_err(|e| e.to_string())?,
                None => None,
            };
            let comments = article.comments().await.map_err(|e| e.to_string())?;
            info!(
                title = ?article.title().await.map_err(|e| e.to_string())?,
                status = ?article.status().await.map_err(|e| e.to_string())?,
                author = ?author,
                comments = comments.len(),
                "Article"
            );
        }
        Ok::<_, String>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = read {
        error!(error = %e, "Reading articles failed");
    }

    blog.shutdown().await?;

    info!("Sample completed successfully");
    Ok(())
}
