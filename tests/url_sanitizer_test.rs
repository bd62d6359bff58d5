//! Allow-list behaviour of the URL sanitizer and work item construction

use kodegen_tools_channelscout::crawl_engine::orchestrator::build_work_items;
use kodegen_tools_channelscout::{ContentRow, InvalidUrlError, sanitize_url};

#[test]
fn test_only_https_is_accepted() {
    for scheme in ["http", "ftp", "file", "ws", "wss", "javascript", "HTTP"] {
        let url = format!("{scheme}://www.youtube.com/watch?v=abc");
        assert!(sanitize_url(&url).is_err(), "{url} should be rejected");
    }

    let url = "https://www.youtube.com/watch?v=abc";
    assert_eq!(sanitize_url(url), Ok(url.to_string()));
}

#[test]
fn test_non_default_port_is_rejected() {
    assert_eq!(
        sanitize_url("https://youtu.be:8443/x"),
        Err(InvalidUrlError::Port(8443))
    );
}

#[test]
fn test_explicit_default_port_is_rejected() {
    for url in [
        "https://youtu.be:443/x",
        "https://www.youtube.com:443/watch?v=abc",
        "https://www.youtube.com:/watch?v=abc",
    ] {
        assert_eq!(sanitize_url(url), Err(InvalidUrlError::Port(443)), "{url}");
    }
    // a colon after the authority is not a port
    assert!(sanitize_url("https://www.youtube.com/watch?v=a:b").is_ok());
}

#[test]
fn test_lookalike_hosts_are_rejected() {
    for url in [
        "https://youtube.com.evil.example/watch?v=abc",
        "https://notyoutube.com/watch?v=abc",
        "https://www.youtube.co/watch?v=abc",
    ] {
        assert!(
            matches!(sanitize_url(url), Err(InvalidUrlError::Host(_))),
            "{url} should be rejected by host"
        );
    }
}

#[test]
fn test_row_becomes_escaped_work_item() {
    let rows = vec![ContentRow {
        id: 42,
        platform: "youtube".into(),
        platform_ref: "abc123".into(),
        author: "Some <b>Author</b>".into(),
    }];

    let items = build_work_items(&rows).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].author, "Some &lt;b&gt;Author&lt;/b&gt;");

    let json = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(
        json["uniform_resource_locator"],
        "https://www.youtube.com/watch?v=abc123"
    );
    assert_eq!(json["source_ids"], serde_json::json!([42]));
}
