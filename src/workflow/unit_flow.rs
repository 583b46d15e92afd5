//! 单元处理流程 - 流程层
//!
//! 定义"一个单元"的完整处理流程：提交 → 等待译文 → 记录结果。
//! 不持有浏览器资源，只依赖 `TranslationClient` 能力。

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::clients::TranslationClient;
use crate::error::SubmissionError;
use crate::models::{Artifact, WorkUnit};
use crate::workflow::job_tracker::JobTracker;
use crate::workflow::unit_ctx::UnitCtx;

/// 单元处理流程，可在并发任务间 clone
#[derive(Clone)]
pub struct UnitFlow {
    client: Arc<dyn TranslationClient>,
    tracker: Arc<JobTracker>,
    unit_timeout: Duration,
}

impl UnitFlow {
    pub fn new(
        client: Arc<dyn TranslationClient>,
        tracker: Arc<JobTracker>,
        unit_timeout: Duration,
    ) -> Self {
        Self {
            client,
            tracker,
            unit_timeout,
        }
    }

    pub fn tracker(&self) -> &Arc<JobTracker> {
        &self.tracker
    }

    /// 处理单个单元。失败只记录在跟踪器中，不影响其他单元。
    pub async fn run(&self, unit: &WorkUnit, ctx: &UnitCtx) -> Result<Artifact, SubmissionError> {
        info!("{} 📤 正在提交: {}", ctx, unit.path().display());

        let handle = match self.client.submit(unit).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("{} ❌ 提交失败: {}", ctx, e);
                self.tracker.mark_failed(&ctx.unit, e.clone());
                return Err(e);
            }
        };

        match self
            .tracker
            .await_completion(self.client.as_ref(), &handle, self.unit_timeout)
            .await
        {
            Ok(artifact) => {
                info!("{} ✅ 译文已下载: {}", ctx, artifact.path.display());
                Ok(artifact)
            }
            Err(e) => {
                warn!("{} ⚠️ {}，该文档将不会合并", ctx, e);
                Err(e)
            }
        }
    }
}
