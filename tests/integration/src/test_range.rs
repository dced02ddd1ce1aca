//! Range and conditional request behavior observed over HTTP.

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use http::StatusCode;

    use crate::{TestSite, client, serve_site};

    /// 1 KiB of non-repeating-ish bytes so range slices are distinguishable.
    fn fixture_data() -> Vec<u8> {
        (0..1024_u32).map(|i| (i % 251) as u8).collect()
    }

    async fn site_with_data() -> (TestSite, Vec<u8>) {
        let site = serve_site("").await;
        let data = fixture_data();
        site.store.insert("assets/data.bin", data.clone());
        (site, data)
    }

    #[tokio::test]
    async fn test_should_serve_full_content_without_range() {
        let (site, data) = site_with_data().await;

        let resp = client()
            .get(site.url("/assets/data.bin"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("accept-ranges")
                .and_then(|v| v.to_str().ok()),
            Some("bytes"),
        );
        assert_eq!(resp.bytes().await.expect("body").as_ref(), &data[..]);
    }

    #[tokio::test]
    async fn test_should_serve_open_ended_range() {
        let (site, data) = site_with_data().await;

        let resp = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=512-")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok()),
            Some("bytes 512-1023/1024"),
        );
        assert_eq!(resp.bytes().await.expect("body").as_ref(), &data[512..]);
    }

    #[tokio::test]
    async fn test_should_serve_bounded_range() {
        let (site, data) = site_with_data().await;

        let resp = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=100-199")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok()),
            Some("100"),
        );
        assert_eq!(resp.bytes().await.expect("body").as_ref(), &data[100..200]);
    }

    #[tokio::test]
    async fn test_should_serve_suffix_range() {
        let (site, data) = site_with_data().await;

        let resp = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=-100")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok()),
            Some("bytes 924-1023/1024"),
        );
        assert_eq!(resp.bytes().await.expect("body").as_ref(), &data[924..]);
    }

    #[tokio::test]
    async fn test_should_reject_unsatisfiable_range() {
        let (site, _) = site_with_data().await;

        let resp = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=2048-")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok()),
            Some("bytes */1024"),
        );
    }

    #[tokio::test]
    async fn test_should_ignore_multi_range_and_serve_full_content() {
        let (site, data) = site_with_data().await;

        let resp = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=0-1,5-6")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.bytes().await.expect("body").len(), data.len());
    }

    #[tokio::test]
    async fn test_should_return_identical_bytes_for_rereads_of_same_range() {
        let (site, _) = site_with_data().await;

        let first = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=300-700")
            .send()
            .await
            .expect("request")
            .bytes()
            .await
            .expect("body");
        let second = client()
            .get(site.url("/assets/data.bin"))
            .header("Range", "bytes=300-700")
            .send()
            .await
            .expect("request")
            .bytes()
            .await
            .expect("body");
        assert_eq!(first, second);
    }

    // -----------------------------------------------------------------------
    // Conditional requests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_return_304_for_unmodified_object() {
        let site = serve_site("").await;
        let mod_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        site.store.insert_at("page.html", "<html></html>", mod_time);

        let resp = client()
            .get(site.url("/page.html"))
            .header("If-Modified-Since", "Fri, 01 Mar 2024 12:00:00 GMT")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.bytes().await.expect("body").len(), 0);
    }

    #[tokio::test]
    async fn test_should_serve_content_when_modified_since_condition_fails() {
        let site = serve_site("").await;
        let mod_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        site.store.insert_at("page.html", "<html></html>", mod_time);

        let resp = client()
            .get(site.url("/page.html"))
            .header("If-Modified-Since", "Mon, 01 Jan 2024 00:00:00 GMT")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("last-modified")
                .and_then(|v| v.to_str().ok()),
            Some("Fri, 01 Mar 2024 12:00:00 GMT"),
        );
    }
}
