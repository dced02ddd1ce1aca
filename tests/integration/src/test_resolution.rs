//! Fallback chain behavior observed over HTTP.

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use crate::{client, serve_site};

    #[tokio::test]
    async fn test_should_serve_exact_object() {
        let site = serve_site("").await;
        site.store.insert("hello.txt", "hello world");

        let resp = client()
            .get(site.url("/hello.txt"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/plain; charset=utf-8"),
        );
        assert_eq!(
            resp.headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok()),
            Some("11"),
        );
        assert_eq!(resp.text().await.expect("body"), "hello world");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_index_for_extensionless_path() {
        let site = serve_site("").await;
        site.store.insert("docs/index.html", "<html>docs</html>");

        let resp = client()
            .get(site.url("/docs"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<html>docs</html>");
    }

    #[tokio::test]
    async fn test_should_serve_custom_not_found_page_with_404_status() {
        let site = serve_site("").await;
        site.store.insert("404.html", "<html>custom 404</html>");

        let resp = client()
            .get(site.url("/missing/page"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.text().await.expect("body"), "<html>custom 404</html>");
    }

    #[tokio::test]
    async fn test_should_return_plain_404_when_no_fallback_exists() {
        let site = serve_site("").await;

        let resp = client()
            .get(site.url("/nothing/here"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.text().await.expect("body"), "404 page not found\n");
    }

    #[tokio::test]
    async fn test_should_serve_subtree_under_root_prefix() {
        let site = serve_site("site/v2").await;
        site.store.insert("site/v2/page.html", "<html>v2</html>");
        // An object outside the prefix must stay invisible.
        site.store.insert("page.html", "<html>top</html>");

        let resp = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<html>v2</html>");
    }

    #[tokio::test]
    async fn test_should_not_escape_root_via_dot_dot() {
        let site = serve_site("site").await;
        site.store.insert("secret.txt", "top secret");
        site.store.insert("site/404.html", "gone");

        let resp = client()
            .get(site.url("/../secret.txt"))
            .send()
            .await
            .expect("request");
        // Normalization keeps the request inside the prefix, so the chain
        // lands on the prefixed not-found page.
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.text().await.expect("body"), "gone");
    }

    #[tokio::test]
    async fn test_should_answer_head_like_get_without_body() {
        let site = serve_site("").await;
        site.store.insert("hello.txt", "hello world");

        let resp = client()
            .head(site.url("/hello.txt"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok()),
            Some("11"),
        );
        assert_eq!(resp.bytes().await.expect("body").len(), 0);
    }

    #[tokio::test]
    async fn test_should_reject_unsupported_methods() {
        let site = serve_site("").await;

        let resp = client()
            .post(site.url("/hello.txt"))
            .body("data")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get("allow").and_then(|v| v.to_str().ok()),
            Some("GET, HEAD"),
        );
    }

    #[tokio::test]
    async fn test_should_attach_common_headers() {
        let site = serve_site("").await;
        site.store.insert("a.txt", "a");

        let resp = client()
            .get(site.url("/a.txt"))
            .send()
            .await
            .expect("request");
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(
            resp.headers().get("server").and_then(|v| v.to_str().ok()),
            Some("BucketServe"),
        );
    }
}
