//! Directory request behavior: the index convention and listing fallback.

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use crate::{client, serve_site};

    #[tokio::test]
    async fn test_should_serve_root_index_for_root_request() {
        let site = serve_site("").await;
        site.store.insert("index.html", "<html>front page</html>");

        let resp = client().get(site.url("/")).send().await.expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<html>front page</html>");
    }

    #[tokio::test]
    async fn test_should_serve_index_for_trailing_separator_request() {
        let site = serve_site("").await;
        site.store.insert("docs/index.html", "<html>docs</html>");

        let resp = client()
            .get(site.url("/docs/"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<html>docs</html>");
    }

    #[tokio::test]
    async fn test_should_render_listing_when_no_index_or_fallback_exists() {
        let site = serve_site("").await;

        let resp = client()
            .get(site.url("/empty/"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("text/html"))
        );
        let page = resp.text().await.expect("body");
        assert!(page.contains("Index of /empty/"));
    }

    #[tokio::test]
    async fn test_should_serve_not_found_page_for_directory_without_index() {
        let site = serve_site("").await;
        site.store.insert("404.html", "<html>gone</html>");

        // The directory exists only as a name; its index chain ends at the
        // bucket-wide fallback page, with not-found status.
        let resp = client()
            .get(site.url("/ghost/"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.text().await.expect("body"), "<html>gone</html>");
    }

    #[tokio::test]
    async fn test_should_apply_root_prefix_to_directory_index() {
        let site = serve_site("site").await;
        site.store.insert("site/index.html", "<html>prefixed</html>");

        let resp = client().get(site.url("/")).send().await.expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<html>prefixed</html>");
    }
}
