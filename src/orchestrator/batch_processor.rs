//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个流水线的入口，负责资源管理和阶段调度。
//!
//! ## 核心功能
//!
//! 1. **规划**：扫描工作目录，按跳过规则和拆分阈值生成提交单元
//! 2. **并发提交**：使用 Semaphore 限制同时进行的提交数量，每个单元一个任务
//! 3. **等待落盘**：全部单元结束后等待一段时间，让浏览器完成写文件
//! 4. **合并**：跳过有部分未完成的文档，合并暂存目录中的其余分组
//! 5. **整理**：把新生成的文件移回工作目录并清理部分文件
//! 6. **汇总**：每个源文档一条结果，决定退出码
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有翻译客户端（浏览器）的模块
//! - **阻塞隔离**：PDF 读写和目录操作放在 `spawn_blocking` 中
//! - **失败隔离**：单个文档或分组的失败只体现在汇总中

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;
use tracing::{error, info, warn};

use crate::browser::{self, ReadableClient};
use crate::clients::TranslationClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, SubmissionError};
use crate::models::{list_pdf_files, Document, WorkUnit};
use crate::orchestrator::document_processor::{DocumentPlanner, PlannedDocument, WorkPlan};
use crate::orchestrator::report::{DocumentOutcome, RunReport};
use crate::services::{Partitioner, Reassembler, ReassemblyReport, ReconcileReport, Reconciler, SkipSet};
use crate::utils::logging;
use crate::workflow::{JobTracker, UnitCtx, UnitFlow};

/// 应用主结构
pub struct App {
    config: Config,
    client: Option<Arc<dyn TranslationClient>>,
}

impl App {
    /// 按配置连接（或启动）浏览器
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let browser = browser::open_browser(&config).await?;
        let client = ReadableClient::new(browser, &config);
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// 使用指定的翻译客户端
    pub fn with_client(config: Config, client: Arc<dyn TranslationClient>) -> Self {
        Self {
            config,
            client: Some(client),
        }
    }

    /// 不连接浏览器，只能规划
    pub fn offline(config: Config) -> Self {
        Self {
            config,
            client: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行完整流水线
    pub async fn run(&self) -> AppResult<RunReport> {
        logging::log_startup(&self.config);

        let Some(client) = self.client.clone() else {
            warn!("⚠️ 未连接翻译服务，只生成规划");
            return self.plan_only(false).await;
        };

        tokio::fs::create_dir_all(&self.config.staging_dir)
            .await
            .map_err(|e| AppError::io(&self.config.staging_dir, e))?;

        let plan = self.scan_and_plan(true).await?;
        let units = plan.units();
        logging::log_units_planned(&plan.unit_paths(), self.config.max_concurrent_units);

        let tracker = Arc::new(JobTracker::new());
        if units.is_empty() {
            warn!("⚠️ 没有需要提交的文件");
        } else {
            self.submit_all(client, tracker.clone(), units).await;

            info!(
                "⏳ 等待 {} 秒，让下载完成写盘...",
                self.config.settle_delay.as_secs()
            );
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let reassembly = self.reassemble(&tracker).await?;
        let reconciled = self.reconcile().await?;

        let mut report = summarize(&plan, &tracker, &reassembly, &reconciled);
        report.finish();
        Ok(report)
    }

    /// 只规划；`materialize` 为真时写出部分文件（`split` 子命令）
    pub async fn plan_only(&self, materialize: bool) -> AppResult<RunReport> {
        let plan = self.scan_and_plan(materialize).await?;
        let mut report = RunReport::new();

        for document in &plan.documents {
            let outcome = match document {
                PlannedDocument::Skip { reason, .. } => DocumentOutcome::Skipped {
                    reason: reason.clone(),
                },
                PlannedDocument::Failed { reason, .. } => DocumentOutcome::Failed {
                    reason: reason.clone(),
                },
                PlannedDocument::Preview { windows, .. } => {
                    DocumentOutcome::Planned { units: windows.len() }
                }
                PlannedDocument::Submit { units, .. } => {
                    DocumentOutcome::Planned { units: units.len() }
                }
            };
            report.push(document.file(), outcome);
        }

        report.finish();
        Ok(report)
    }

    async fn scan_and_plan(&self, materialize: bool) -> AppResult<WorkPlan> {
        info!("\n📁 正在扫描: {}", self.config.working_dir.display());
        let listing = list_pdf_files(&self.config.working_dir)
            .await
            .map_err(AppError::Scan)?;

        let mut planner = DocumentPlanner::new(
            SkipSet::new(self.config.reprocessed_prefix.clone()),
            Partitioner::new(self.config.split_limits(), self.config.working_dir.clone()),
        );
        if !materialize {
            planner = planner.preview_only();
        }

        let plan = spawn_blocking(move || planner.plan(&listing)).await?;
        if !materialize {
            for document in &plan.documents {
                if let PlannedDocument::Preview { file, windows, .. } = document {
                    info!("   {} → {} 个单元 {:?}", file, windows.len(), windows);
                }
            }
        }
        Ok(plan)
    }

    /// 并发提交全部单元，结果记录在 `tracker` 中
    async fn submit_all(
        &self,
        client: Arc<dyn TranslationClient>,
        tracker: Arc<JobTracker>,
        units: Vec<WorkUnit>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_units));
        let flow = UnitFlow::new(client, tracker.clone(), self.config.unit_timeout);
        let total = units.len();
        let mut handles = Vec::with_capacity(total);

        for (offset, unit) in units.into_iter().enumerate() {
            tracker.register(&unit);
            let ctx = UnitCtx::new(unit.id(), offset + 1, total);
            let semaphore = semaphore.clone();
            let flow = flow.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let e = SubmissionError::Session("并发控制已关闭".to_string());
                    flow.tracker().mark_failed(&ctx.unit, e.clone());
                    return Err(e);
                };
                flow.run(&unit, &ctx).await
            });
            handles.push(handle);
        }

        let mut downloaded = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => downloaded += 1,
                Ok(Err(_)) => {}
                Err(e) => error!("提交任务异常退出: {}", e),
            }
        }
        info!("📥 下载完成: {}/{}", downloaded, total);
    }

    async fn reassemble(&self, tracker: &JobTracker) -> AppResult<ReassemblyReport> {
        let held = tracker.artifact_bases_to_hold();
        let staging = self.config.staging_dir.clone();
        let reassembler = Reassembler::holding(held);

        let result = spawn_blocking(move || reassembler.reassemble(&staging)).await?;
        result.map_err(|e| AppError::io(&self.config.staging_dir, e))
    }

    async fn reconcile(&self) -> AppResult<ReconcileReport> {
        let reconciler = Reconciler::new(
            self.config.staging_dir.clone(),
            self.config.working_dir.clone(),
            self.config.max_age,
        );
        Ok(spawn_blocking(move || reconciler.reconcile()).await?)
    }
}

/// 根据各阶段结果生成每个文档的结论
fn summarize(
    plan: &WorkPlan,
    tracker: &JobTracker,
    reassembly: &ReassemblyReport,
    reconciled: &ReconcileReport,
) -> RunReport {
    let mut report = RunReport::new();

    for document in &plan.documents {
        let outcome = match document {
            PlannedDocument::Skip { reason, .. } => DocumentOutcome::Skipped {
                reason: reason.clone(),
            },
            PlannedDocument::Failed { reason, .. } => DocumentOutcome::Failed {
                reason: reason.clone(),
            },
            PlannedDocument::Preview { windows, .. } => {
                DocumentOutcome::Planned { units: windows.len() }
            }
            PlannedDocument::Submit {
                document, units, ..
            } => submission_outcome(document, units, tracker, reassembly, reconciled),
        };
        report.push(document.file(), outcome);
    }

    report.record_reconcile(reconciled);
    report.warnings.extend(
        reassembly
            .unparsed
            .iter()
            .map(|p| format!("无法识别部分序号: {}", p.display())),
    );
    report
}

fn submission_outcome(
    document: &Document,
    units: &[WorkUnit],
    tracker: &JobTracker,
    reassembly: &ReassemblyReport,
    reconciled: &ReconcileReport,
) -> DocumentOutcome {
    if !tracker.is_complete(&document.id) {
        let reason = match tracker.failure(&document.id) {
            Some((unit, e)) => format!("{}: {}", unit, e),
            None => "仍有单元未完成".to_string(),
        };
        return DocumentOutcome::Failed { reason };
    }

    let parts = units.iter().filter(|u| u.is_part()).count();
    if parts == 0 {
        let output = tracker
            .artifacts()
            .into_iter()
            .find(|(unit, _)| unit.document == document.id)
            .and_then(|(_, artifact)| final_location(&artifact.path, reconciled));
        return DocumentOutcome::Translated { output };
    }

    let bases = tracker.artifact_bases(&document.id);
    let base = match bases.len() {
        0 => {
            return DocumentOutcome::Failed {
                reason: "译文文件名中没有部分标记，无法合并".to_string(),
            }
        }
        1 => bases.into_iter().next().unwrap_or_default(),
        _ => {
            return DocumentOutcome::Failed {
                reason: format!("译文分组名不一致: {:?}", bases),
            }
        }
    };

    if let Some(e) = reassembly.failed.get(&base) {
        return DocumentOutcome::Failed {
            reason: e.to_string(),
        };
    }
    match reassembly.merged.get(&base) {
        Some(staged) => DocumentOutcome::Merged {
            output: final_location(staged, reconciled).unwrap_or_else(|| staged.clone()),
            parts,
        },
        None => DocumentOutcome::Failed {
            reason: format!("未找到 {} 的合并结果", base),
        },
    }
}

/// 文件在整理后的位置
fn final_location(staged: &Path, reconciled: &ReconcileReport) -> Option<PathBuf> {
    reconciled
        .moved
        .iter()
        .find(|(from, _)| from == staged)
        .map(|(_, to)| to.clone())
}
