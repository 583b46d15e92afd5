//! readable.jp 客户端
//!
//! 每个单元打开一个标签页：设置上传文件 → 等待下载链接出现 → 通过 HTTP 下载到暂存目录。

use std::collections::HashMap;
use std::io::Write;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Browser;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::clients::{SubmissionHandle, TranslationClient};
use crate::config::Config;
use crate::error::{BrowserError, SubmissionError};
use crate::infrastructure::JsExecutor;
use crate::models::{Artifact, WorkUnit};

/// 上传控件
pub const FILE_INPUT_SELECTOR: &str = r#"input[type="file"]"#;

/// 译文下载地址前缀
pub const DOWNLOAD_URL_PREFIX: &str = "https://files.readable.jp/";

const POLL_INTERVAL: Duration = Duration::from_secs(1);

fn download_link_script() -> String {
    format!(
        r#"(() => {{
            const a = document.querySelector('a[href*="{}"]');
            return a ? a.href : '';
        }})()"#,
        DOWNLOAD_URL_PREFIX
    )
}

/// 译文文件名：`{prefix}{源文件名}`
pub fn artifact_file_name(prefix: &str, source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}.pdf", prefix, stem)
}

/// 一个单元的标签页，离开作用域时在后台关闭
///
/// 提交失败、下载失败或外层超时丢弃 future 时都会经过这里。
struct Tab(JsExecutor);

impl Deref for Tab {
    type Target = JsExecutor;

    fn deref(&self) -> &JsExecutor {
        &self.0
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        let page = self.0.page().clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = page.close().await {
                        warn!("关闭标签页失败: {}", e);
                    }
                });
            }
            Err(_) => warn!("⚠️ 运行时已结束，标签页未关闭"),
        }
    }
}

/// 通过浏览器驱动 readable.jp 的客户端
pub struct ReadableClient {
    browser: Browser,
    http: reqwest::Client,
    target_url: String,
    staging_dir: PathBuf,
    prefix: String,
    wait_timeout: Duration,
    tabs: Mutex<HashMap<u64, Tab>>,
    next_ticket: AtomicU64,
}

impl ReadableClient {
    pub fn new(browser: Browser, config: &Config) -> Self {
        Self {
            browser,
            http: reqwest::Client::new(),
            target_url: config.target_url.clone(),
            staging_dir: config.staging_dir.clone(),
            prefix: config.reprocessed_prefix.clone(),
            wait_timeout: config.unit_timeout,
            tabs: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    async fn open_and_upload(&self, source: &Path) -> Result<Tab, BrowserError> {
        let page = self.browser.new_page(self.target_url.as_str()).await?;
        let tab = Tab(JsExecutor::new(page));

        tab.wait_for_selector(FILE_INPUT_SELECTOR, self.wait_timeout)
            .await?;
        tab.set_input_file(FILE_INPUT_SELECTOR, source).await?;
        Ok(tab)
    }

    /// 下载到暂存目录，先写临时文件再改名
    async fn download(&self, url: &str, dest: &Path) -> Result<(), SubmissionError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SubmissionError::Download(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SubmissionError::Download(e.to_string()))?;

        let io_err = |e: std::io::Error| SubmissionError::Download(format!("{}: {}", dest.display(), e));
        let mut tmp = tempfile::Builder::new()
            .prefix(".pdf-translate-")
            .suffix(".download")
            .tempfile_in(&self.staging_dir)
            .map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.persist(dest).map_err(|e| io_err(e.error))?;

        debug!("已下载 {} 字节: {}", bytes.len(), dest.display());
        Ok(())
    }
}

#[async_trait]
impl TranslationClient for ReadableClient {
    async fn submit(&self, unit: &WorkUnit) -> Result<SubmissionHandle, SubmissionError> {
        let source = std::fs::canonicalize(unit.path())
            .map_err(|e| SubmissionError::Rejected(format!("{}: {}", unit.path().display(), e)))?;

        let tab = self.open_and_upload(&source).await?;
        info!("📤 {} 已上传", unit.id());

        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        self.tabs.lock().insert(ticket, tab);
        Ok(SubmissionHandle::new(unit, ticket))
    }

    async fn await_artifact(&self, handle: &SubmissionHandle) -> Result<Artifact, SubmissionError> {
        let tab = self
            .tabs
            .lock()
            .remove(&handle.ticket)
            .ok_or_else(|| SubmissionError::Session(format!("未知的提交编号: {}", handle.ticket)))?;

        let href = tab
            .poll_string(
                &download_link_script(),
                self.wait_timeout,
                POLL_INTERVAL,
                DOWNLOAD_URL_PREFIX,
            )
            .await?;
        debug!("{} 下载链接: {}", handle.unit, href);

        let dest = self
            .staging_dir
            .join(artifact_file_name(&self.prefix, &handle.source));
        self.download(&href, &dest).await?;
        drop(tab);

        Artifact::from_path(&dest).map_err(|e| SubmissionError::Download(e.to_string()))
    }
}
