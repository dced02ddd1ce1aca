//! Response cache middleware behavior observed over HTTP.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::StatusCode;

    use bucketserve_http::cache::CacheConfig;

    use crate::{client, serve_cached_site};

    fn x_cache(resp: &reqwest::Response) -> Option<String> {
        resp.headers()
            .get("x-cache")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    }

    #[tokio::test]
    async fn test_should_replay_cached_response_without_touching_store() {
        let site = serve_cached_site("", CacheConfig::default()).await;
        site.store.insert("page.html", "<html>v1</html>");

        let resp = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(x_cache(&resp).as_deref(), Some("miss"));
        assert_eq!(resp.text().await.expect("body"), "<html>v1</html>");

        // Mutating the store must not show through a cache hit.
        site.store.insert("page.html", "<html>v2</html>");

        let resp = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(x_cache(&resp).as_deref(), Some("hit"));
        assert_eq!(resp.text().await.expect("body"), "<html>v1</html>");
    }

    #[tokio::test]
    async fn test_should_bypass_and_repopulate_with_refresh_key() {
        let site = serve_cached_site("", CacheConfig::default()).await;
        site.store.insert("page.html", "<html>v1</html>");

        let _ = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        site.store.insert("page.html", "<html>v2</html>");

        let resp = client()
            .get(site.url("/page.html?opn=1"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.text().await.expect("body"), "<html>v2</html>");

        // The refreshed entry now answers ordinary requests.
        let resp = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(x_cache(&resp).as_deref(), Some("hit"));
        assert_eq!(resp.text().await.expect("body"), "<html>v2</html>");
    }

    #[tokio::test]
    async fn test_should_expire_entries_after_ttl() {
        let config = CacheConfig {
            ttl: Duration::from_millis(50),
            ..CacheConfig::default()
        };
        let site = serve_cached_site("", config).await;
        site.store.insert("page.html", "<html>v1</html>");

        let _ = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        site.store.insert("page.html", "<html>v2</html>");

        tokio::time::sleep(Duration::from_millis(80)).await;

        let resp = client()
            .get(site.url("/page.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(x_cache(&resp).as_deref(), Some("miss"));
        assert_eq!(resp.text().await.expect("body"), "<html>v2</html>");
    }

    #[tokio::test]
    async fn test_should_not_cache_not_found_responses() {
        let site = serve_cached_site("", CacheConfig::default()).await;

        let resp = client()
            .get(site.url("/late.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // The object appearing later must be served, not the cached 404.
        site.store.insert("late.html", "<html>late</html>");

        let resp = client()
            .get(site.url("/late.html"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "<html>late</html>");
    }

    #[tokio::test]
    async fn test_should_cache_variants_by_query_string() {
        let site = serve_cached_site("", CacheConfig::default()).await;
        site.store.insert("page.html", "<html>v1</html>");

        let _ = client()
            .get(site.url("/page.html?a=1"))
            .send()
            .await
            .expect("request");

        // A different query string is a different cache entry.
        let resp = client()
            .get(site.url("/page.html?a=2"))
            .send()
            .await
            .expect("request");
        assert_eq!(x_cache(&resp).as_deref(), Some("miss"));
    }
}
