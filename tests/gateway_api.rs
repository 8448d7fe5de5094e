//! End-to-end tests over a real socket against a temporary directory.

use reqwest::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_RANGE, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, LAST_MODIFIED, RANGE, WWW_AUTHENTICATE,
};
use reqwest::StatusCode;
use serde_json::Value;

mod common;
use common::{write, zip_entries, TestGateway, SECRET};

async fn sample() -> TestGateway {
    TestGateway::start(|root| {
        write(root, "index.html", "<html>index</html>");
        write(root, "b.txt", "bee");
        write(root, "a.txt", "alpha");
        write(root, "docs/readme.md", "# docs");
        write(root, "docs/nested/deep.bin", vec![0xABu8; 3000]);
        std::fs::create_dir_all(root.join("empty")).unwrap();
    })
    .await
}

#[tokio::test]
async fn username_is_ignored_and_password_is_checked() {
    let gw = sample().await;

    for user in ["", "admin", "someone-else"] {
        let res = gw
            .client
            .get(gw.url("/api/list"))
            .basic_auth(user, Some(SECRET))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "user {user:?}");
    }

    let res = gw
        .client
        .get(gw.url("/api/list"))
        .basic_auth("admin", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[WWW_AUTHENTICATE], "Basic realm=\"Login Required\"");

    let res = gw.client.get(gw.url("/download_zip")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn root_listing_is_sorted() {
    let gw = sample().await;
    let body: Value = gw.get("/api/list").send().await.unwrap().json().await.unwrap();

    assert_eq!(body["path"], ".");
    let names: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt", "docs", "empty", "index.html"]);

    let a = &body["items"][0];
    assert_eq!(a["is_dir"], false);
    assert_eq!(a["size"], 5);
    assert_eq!(a["path"], "a.txt");

    let docs = &body["items"][2];
    assert_eq!(docs["is_dir"], true);
    assert!(docs["size"].is_null());
}

#[tokio::test]
async fn nested_listing_and_rejections() {
    let gw = sample().await;

    let body: Value = gw
        .get("/api/list?path=docs")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["path"], "docs");
    assert_eq!(body["items"][0]["path"], "docs/nested");
    assert_eq!(body["items"][1]["path"], "docs/readme.md");

    for (query, status, error) in [
        ("../", StatusCode::BAD_REQUEST, "unsafe path"),
        ("docs/../../etc", StatusCode::BAD_REQUEST, "unsafe path"),
        ("missing", StatusCode::NOT_FOUND, "not found"),
        ("a.txt", StatusCode::BAD_REQUEST, "not a directory"),
    ] {
        let res = gw
            .get(&format!("/api/list?path={query}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), status, "{query}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], error);
    }
}

#[tokio::test]
async fn download_returns_exact_bytes_as_attachment() {
    let gw = sample().await;
    let res = gw
        .get("/download?path=docs/nested/deep.bin")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[ACCEPT_RANGES], "bytes");
    assert_eq!(
        res.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"deep.bin\""
    );
    assert_eq!(res.bytes().await.unwrap().as_ref(), &[0xABu8; 3000][..]);

    let res = gw.get("/download?path=../secret").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = gw.get("/download?path=docs").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = gw.get("/download?path=nope.txt").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conditional_and_range_requests() {
    let gw = sample().await;

    let res = gw.get("/download?path=a.txt").send().await.unwrap();
    let etag = res.headers()[ETAG].clone();
    let last_modified = res.headers()[LAST_MODIFIED].clone();

    let res = gw
        .get("/download?path=a.txt")
        .header(IF_NONE_MATCH, etag)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);

    let res = gw
        .get("/download?path=a.txt")
        .header(IF_MODIFIED_SINCE, last_modified)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);

    let res = gw
        .get("/download?path=a.txt")
        .header(RANGE, "bytes=1-3")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()[CONTENT_RANGE], "bytes 1-3/5");
    assert_eq!(res.text().await.unwrap(), "lph");

    let res = gw
        .get("/download?path=a.txt")
        .header(RANGE, "bytes=-2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "ha");

    let res = gw
        .get("/download?path=a.txt")
        .header(RANGE, "bytes=10-")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(res.headers()[CONTENT_RANGE], "bytes */5");
}

#[tokio::test]
async fn zip_of_a_directory_has_relative_entries() {
    let gw = sample().await;
    let res = gw.get("/download_zip?path=docs").send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/zip");
    assert_eq!(
        res.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"docs.zip\""
    );

    let bytes = res.bytes().await.unwrap();
    let entries = zip_entries(&bytes);
    let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["nested/deep.bin", "readme.md"]);
    assert_eq!(entries[1].1, b"# docs");

    assert!(gw.wait_for_empty_staging().await);
}

#[tokio::test]
async fn zip_of_the_root_is_named_after_it() {
    let gw = sample().await;
    let res = gw.get("/download_zip").send().await.unwrap();
    let expected = format!(
        "attachment; filename=\"{}.zip\"",
        gw.root.file_name().unwrap().to_string_lossy()
    );
    assert_eq!(res.headers()[CONTENT_DISPOSITION], expected.as_str());

    let entries = zip_entries(&res.bytes().await.unwrap());
    assert!(entries.iter().any(|(n, _)| n == "docs/nested/deep.bin"));
    assert!(entries.iter().any(|(n, _)| n == "index.html"));
    assert!(gw.wait_for_empty_staging().await);
}

#[tokio::test]
async fn zip_of_a_file_is_a_plain_download() {
    let gw = sample().await;
    let res = gw.get("/download_zip?path=b.txt").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"b.txt\""
    );
    assert_eq!(res.text().await.unwrap(), "bee");
}

#[tokio::test]
async fn zip_of_an_empty_directory_is_a_valid_archive() {
    let gw = sample().await;
    let res = gw.get("/download_zip?path=empty").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(zip_entries(&res.bytes().await.unwrap()).is_empty());
    assert!(gw.wait_for_empty_staging().await);
}

#[tokio::test]
async fn zip_rejections() {
    let gw = sample().await;
    let res = gw.get("/download_zip?path=../..").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = gw.get("/download_zip?path=ghost").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::staging_entries(gw.staging.path()), 0);
}

#[tokio::test]
async fn index_page_is_served() {
    let gw = sample().await;
    let res = gw.get("/").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(CONTENT_DISPOSITION).is_none());
    assert_eq!(res.text().await.unwrap(), "<html>index</html>");
}

#[tokio::test]
async fn missing_index_page() {
    let gw = TestGateway::start(|root| write(root, "only.txt", "x")).await;
    let res = gw.get("/").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "index.html not found");
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_out_of_the_root_are_rejected() {
    let outside = tempfile::tempdir().unwrap();
    write(outside.path(), "secret.txt", "top secret");
    let target = outside.path().to_path_buf();

    let gw = TestGateway::start(move |root| {
        std::os::unix::fs::symlink(&target, root.join("escape")).unwrap();
    })
    .await;

    let res = gw
        .get("/download?path=escape/secret.txt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn every_listed_file_downloads_byte_identical() {
    let gw = sample().await;
    let mut pending = vec![String::new()];

    while let Some(dir) = pending.pop() {
        let listing: Value = gw
            .get(&format!("/api/list?path={dir}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        for item in listing["items"].as_array().unwrap() {
            let path = item["path"].as_str().unwrap().to_string();
            if item["is_dir"].as_bool().unwrap() {
                pending.push(path);
                continue;
            }
            let body = gw
                .get(&format!("/download?path={path}"))
                .send()
                .await
                .unwrap()
                .bytes()
                .await
                .unwrap();
            let on_disk = std::fs::read(gw.root.join(&path)).unwrap();
            assert_eq!(body.as_ref(), on_disk.as_slice(), "{path}");
            assert_eq!(item["size"].as_u64().unwrap(), on_disk.len() as u64);
        }
    }
}
