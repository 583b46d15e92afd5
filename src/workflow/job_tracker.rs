//! 提交跟踪 - 流程层
//!
//! 记录每个已提交单元的状态：等待中、已下载、失败。
//! 单元可以按任意顺序完成，合并前据此判断哪些文档的部分不全。

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clients::{SubmissionHandle, TranslationClient};
use crate::error::SubmissionError;
use crate::models::{Artifact, DocumentId, UnitId, WorkUnit};

/// 单元状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Downloaded(Artifact),
    Failed(SubmissionError),
}

#[derive(Debug, Clone)]
struct UnitRecord {
    source: PathBuf,
    state: UnitState,
}

/// 单个文档的汇总状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStatus {
    pub total: usize,
    pub pending: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl DocumentStatus {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.downloaded == self.total
    }
}

/// 提交跟踪器，可在多个任务间共享（`Arc<JobTracker>`）
#[derive(Debug, Default)]
pub struct JobTracker {
    units: Mutex<BTreeMap<UnitId, UnitRecord>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记单元，状态为等待中
    pub fn register(&self, unit: &WorkUnit) {
        self.units.lock().insert(
            unit.id(),
            UnitRecord {
                source: unit.path().to_path_buf(),
                state: UnitState::Pending,
            },
        );
    }

    pub fn mark_downloaded(&self, unit: &UnitId, artifact: Artifact) {
        self.set_state(unit, UnitState::Downloaded(artifact));
    }

    pub fn mark_failed(&self, unit: &UnitId, error: SubmissionError) {
        self.set_state(unit, UnitState::Failed(error));
    }

    fn set_state(&self, unit: &UnitId, state: UnitState) {
        let mut units = self.units.lock();
        match units.get_mut(unit) {
            Some(record) => record.state = state,
            None => warn!("未登记的单元: {}", unit),
        }
    }

    /// 在 `timeout` 内等待译文；超时或失败时记录状态并返回错误，不重试
    pub async fn await_completion(
        &self,
        client: &dyn TranslationClient,
        handle: &SubmissionHandle,
        timeout: Duration,
    ) -> Result<Artifact, SubmissionError> {
        let outcome = match tokio::time::timeout(timeout, client.await_artifact(handle)).await {
            Ok(result) => result,
            Err(_) => Err(SubmissionError::Timeout {
                seconds: timeout.as_secs(),
            }),
        };

        match &outcome {
            Ok(artifact) => {
                debug!("{} 已下载: {}", handle.unit, artifact.path.display());
                self.mark_downloaded(&handle.unit, artifact.clone());
            }
            Err(e) => self.mark_failed(&handle.unit, e.clone()),
        }
        outcome
    }

    pub fn state(&self, unit: &UnitId) -> Option<UnitState> {
        self.units.lock().get(unit).map(|r| r.state.clone())
    }

    pub fn source(&self, unit: &UnitId) -> Option<PathBuf> {
        self.units.lock().get(unit).map(|r| r.source.clone())
    }

    pub fn document_status(&self, document: &DocumentId) -> DocumentStatus {
        let units = self.units.lock();
        let mut status = DocumentStatus::default();
        for (_, record) in units.iter().filter(|(id, _)| &id.document == document) {
            status.total += 1;
            match record.state {
                UnitState::Pending => status.pending += 1,
                UnitState::Downloaded(_) => status.downloaded += 1,
                UnitState::Failed(_) => status.failed += 1,
            }
        }
        status
    }

    pub fn is_complete(&self, document: &DocumentId) -> bool {
        self.document_status(document).is_complete()
    }

    /// 登记过的全部文档
    pub fn documents(&self) -> BTreeSet<DocumentId> {
        self.units
            .lock()
            .keys()
            .map(|id| id.document.clone())
            .collect()
    }

    pub fn incomplete_documents(&self) -> Vec<DocumentId> {
        self.documents()
            .into_iter()
            .filter(|doc| !self.is_complete(doc))
            .collect()
    }

    /// 某个文档第一个失败单元的原因
    pub fn failure(&self, document: &DocumentId) -> Option<(UnitId, SubmissionError)> {
        self.units
            .lock()
            .iter()
            .filter(|(id, _)| &id.document == document)
            .find_map(|(id, record)| match &record.state {
                UnitState::Failed(e) => Some((id.clone(), e.clone())),
                _ => None,
            })
    }

    /// 文档已下载部分对应的译文分组名（如 `al-report`）
    pub fn artifact_bases(&self, document: &DocumentId) -> BTreeSet<String> {
        self.units
            .lock()
            .iter()
            .filter(|(id, _)| &id.document == document && id.part.is_some())
            .filter_map(|(_, record)| match &record.state {
                UnitState::Downloaded(artifact) => artifact.part_name().map(|name| name.base),
                _ => None,
            })
            .collect()
    }

    /// 合并时需要跳过的分组：所有不完整文档的分组名，以及文档名本身
    pub fn artifact_bases_to_hold(&self) -> BTreeSet<String> {
        let mut held = BTreeSet::new();
        for document in self.incomplete_documents() {
            held.extend(self.artifact_bases(&document));
            held.insert(document.as_str().to_string());
        }
        held
    }

    /// 已下载的全部译文
    pub fn artifacts(&self) -> Vec<(UnitId, Artifact)> {
        self.units
            .lock()
            .iter()
            .filter_map(|(id, record)| match &record.state {
                UnitState::Downloaded(artifact) => Some((id.clone(), artifact.clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Script, ScriptedClient};
    use crate::models::{Document, Part};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn part(dir: &std::path::Path, doc: &str, index: u32) -> WorkUnit {
        let path = dir.join(format!("{doc}_part{index}.pdf"));
        std::fs::write(&path, b"%PDF").unwrap();
        WorkUnit::Part(Part {
            document: DocumentId::new(doc),
            index,
            pages: 0..1,
            path,
        })
    }

    fn whole(dir: &std::path::Path, doc: &str) -> WorkUnit {
        let path = dir.join(format!("{doc}.pdf"));
        std::fs::write(&path, b"%PDF").unwrap();
        WorkUnit::Whole(Document {
            id: DocumentId::new(doc),
            path,
            page_count: 1,
            size_bytes: 4,
        })
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_groups_intact() {
        let work = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let units = vec![
            part(work.path(), "doc", 1),
            part(work.path(), "doc", 2),
            part(work.path(), "doc", 3),
            whole(work.path(), "memo"),
        ];
        let doc = DocumentId::new("doc");
        // 第 1 部分最后完成
        let client = Arc::new(
            ScriptedClient::new(staging.path(), Script::Complete(Duration::from_millis(5)))
                .with(UnitId::part(doc.clone(), 1), Script::Complete(Duration::from_millis(60)))
                .with(UnitId::part(doc.clone(), 3), Script::Complete(Duration::ZERO)),
        );
        let tracker = Arc::new(JobTracker::new());

        let mut handles = Vec::new();
        for unit in &units {
            tracker.register(unit);
            let handle = client.submit(unit).await.unwrap();
            let client = client.clone();
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker
                    .await_completion(client.as_ref(), &handle, Duration::from_secs(5))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert!(tracker.is_complete(&doc));
        assert!(tracker.is_complete(&DocumentId::new("memo")));
        assert!(tracker.incomplete_documents().is_empty());
        assert!(tracker.artifact_bases_to_hold().is_empty());
        assert_eq!(
            tracker.artifact_bases(&doc),
            BTreeSet::from(["al-doc".to_string()])
        );
        assert_eq!(tracker.artifacts().len(), 4);
    }

    #[tokio::test]
    async fn test_timeout_marks_only_that_unit_failed() {
        let work = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let doc = DocumentId::new("doc");
        let units = vec![part(work.path(), "doc", 1), part(work.path(), "doc", 2)];
        let other = whole(work.path(), "other");
        let client = ScriptedClient::new(staging.path(), Script::Complete(Duration::ZERO))
            .with(UnitId::part(doc.clone(), 2), Script::Hang);
        let tracker = JobTracker::new();

        for unit in units.iter().chain(std::iter::once(&other)) {
            tracker.register(unit);
            let handle = client.submit(unit).await.unwrap();
            let _ = tracker
                .await_completion(&client, &handle, Duration::from_millis(50))
                .await;
        }

        assert_eq!(
            tracker.state(&UnitId::part(doc.clone(), 2)),
            Some(UnitState::Failed(SubmissionError::Timeout { seconds: 0 }))
        );
        assert_eq!(
            tracker.document_status(&doc),
            DocumentStatus {
                total: 2,
                pending: 0,
                downloaded: 1,
                failed: 1
            }
        );
        assert!(!tracker.is_complete(&doc));
        assert!(tracker.is_complete(&DocumentId::new("other")));
        assert_eq!(tracker.incomplete_documents(), vec![doc.clone()]);
        assert_eq!(
            tracker.artifact_bases_to_hold(),
            BTreeSet::from(["al-doc".to_string(), "doc".to_string()])
        );
        assert!(matches!(
            tracker.failure(&doc),
            Some((_, SubmissionError::Timeout { .. }))
        ));
    }

    #[test]
    fn test_pending_units_make_document_incomplete() {
        let work = TempDir::new().unwrap();
        let tracker = JobTracker::new();
        let unit = part(work.path(), "doc", 1);
        tracker.register(&unit);

        assert_eq!(tracker.state(&unit.id()), Some(UnitState::Pending));
        assert!(!tracker.is_complete(&DocumentId::new("doc")));
        assert!(!tracker.is_complete(&DocumentId::new("unknown")));
        assert_eq!(tracker.source(&unit.id()).as_deref(), Some(unit.path()));
    }
}
