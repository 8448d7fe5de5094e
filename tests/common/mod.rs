//! Shared utilities for end-to-end tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use file_gateway::config::GatewayConfig;
use file_gateway::http::HttpServer;
use file_gateway::lifecycle::Shutdown;
use file_gateway::storage::Vfs;

pub const SECRET: &str = "563789";

/// A gateway listening on an ephemeral port, torn down on drop.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub root: PathBuf,
    pub staging: TempDir,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    _root_dir: Option<TempDir>,
}

impl TestGateway {
    /// Serve a fresh temporary directory populated by `populate`.
    pub async fn start(populate: impl FnOnce(&Path)) -> Self {
        let root_dir = tempfile::tempdir().unwrap();
        populate(root_dir.path());
        let root = root_dir.path().canonicalize().unwrap();
        let mut gateway = Self::launch(root, None).await;
        gateway._root_dir = Some(root_dir);
        gateway
    }

    /// Serve `root` through a custom filesystem.
    pub async fn start_with_fs(root: &str, fs: Arc<dyn Vfs>) -> Self {
        Self::launch(PathBuf::from(root), Some(fs)).await
    }

    async fn launch(root: PathBuf, fs: Option<Arc<dyn Vfs>>) -> Self {
        let staging = tempfile::tempdir().unwrap();

        let mut config = GatewayConfig::default();
        config.storage.root = root.clone();
        config.auth.secret = SECRET.to_string();
        config.archive.staging_dir = Some(staging.path().to_path_buf());

        let server = match fs {
            Some(fs) => HttpServer::with_fs(config, fs).unwrap(),
            None => HttpServer::new(config).unwrap(),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .unwrap();

        Self {
            addr,
            root,
            staging,
            client,
            shutdown,
            _root_dir: None,
        }
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Authenticated GET with an arbitrary username.
    pub fn get(&self, path_and_query: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path_and_query))
            .basic_auth("anyone", Some(SECRET))
    }

    /// Wait until every staging directory is gone.
    pub async fn wait_for_empty_staging(&self) -> bool {
        for _ in 0..250 {
            if staging_entries(self.staging.path()) == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn staging_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// `(name, contents)` of every entry in a zip, in archive order.
pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;

    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut out = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).unwrap();
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        out.push((entry.name().to_string(), contents));
    }
    out
}
