//! oEmbed resolver against a mock endpoint

use kodegen_tools_channelscout::{CrawlError, MetadataResolver, OEmbedResolver};
use mockito::Matcher;

const VIDEO: &str = "https://www.youtube.com/watch?v=abc123";

#[tokio::test]
async fn test_resolves_title_and_author() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/oembed")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("url".into(), VIDEO.into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "title": "A video",
                "author_name": "Someone",
                "author_url": "https://www.youtube.com/@someone",
                "thumbnail_url": "https://i.ytimg.com/vi/abc123/hqdefault.jpg",
                "provider_name": "YouTube",
                "type": "video"
            }"#,
        )
        .create_async()
        .await;

    let resolver =
        OEmbedResolver::with_endpoint("TestBot/1.0", format!("{}/oembed", server.url())).unwrap();
    let metadata = resolver.resolve(VIDEO).await.unwrap();

    assert_eq!(metadata.url, VIDEO);
    assert_eq!(metadata.title, "A video");
    assert_eq!(metadata.author, "Someone");
    assert_eq!(metadata.provider.as_deref(), Some("YouTube"));
    assert_eq!(metadata.duration_seconds, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_a_resolver_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/oembed")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let resolver =
        OEmbedResolver::with_endpoint("TestBot/1.0", format!("{}/oembed", server.url())).unwrap();
    let result = resolver.resolve(VIDEO).await;

    assert!(matches!(result, Err(CrawlError::Resolver(msg)) if msg.contains("404")));
}

#[tokio::test]
async fn test_malformed_body_is_a_resolver_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/oembed")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>consent</html>")
        .create_async()
        .await;

    let resolver =
        OEmbedResolver::with_endpoint("TestBot/1.0", format!("{}/oembed", server.url())).unwrap();
    assert!(matches!(
        resolver.resolve(VIDEO).await,
        Err(CrawlError::Resolver(_))
    ));
}
