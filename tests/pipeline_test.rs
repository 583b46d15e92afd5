mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    file_names, page_labels, test_config, write_numbered_pdf, Script, ScriptedClient,
};
use pdf_translate_batch::{App, DocumentId, DocumentOutcome, UnitId};
use tempfile::TempDir;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn test_out_of_order_parts_are_merged_in_page_order() {
    let working = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let book = write_numbered_pdf(&working.path().join("book.pdf"), "b", 5);
    let memo = write_numbered_pdf(&working.path().join("memo.pdf"), "m", 1);

    let doc = DocumentId::new("book");
    // 第 3 部分最先完成，第 1 部分最后完成
    let client = ScriptedClient::new(staging.path(), Script::Complete(ms(30)))
        .with(UnitId::part(doc.clone(), 1), Script::Complete(ms(120)))
        .with(UnitId::part(doc.clone(), 3), Script::Complete(ms(0)));
    let app = App::with_client(
        test_config(working.path(), staging.path(), 2),
        Arc::new(client),
    );

    let report = app.run().await.unwrap();

    assert_eq!(report.exit_code(), 0, "{:?}", report.documents);
    assert_eq!(
        report.outcome("book.pdf"),
        Some(&DocumentOutcome::Merged {
            output: working.path().join("al-book.pdf"),
            parts: 3,
        })
    );
    assert_eq!(
        report.outcome("memo.pdf"),
        Some(&DocumentOutcome::Translated {
            output: Some(working.path().join("al-memo.pdf")),
        })
    );

    assert_eq!(page_labels(&working.path().join("al-book.pdf")), book);
    assert_eq!(page_labels(&working.path().join("al-memo.pdf")), memo);
    assert_eq!(
        file_names(working.path()),
        vec!["al-book.pdf", "al-memo.pdf", "book.pdf", "memo.pdf"]
    );
    assert!(file_names(staging.path()).is_empty());
    assert_eq!(report.purged, 3);
}

#[tokio::test]
async fn test_timed_out_part_fails_only_its_document() {
    let working = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    write_numbered_pdf(&working.path().join("book.pdf"), "b", 4);
    write_numbered_pdf(&working.path().join("memo.pdf"), "m", 1);

    let client = ScriptedClient::new(staging.path(), Script::Complete(ms(0)))
        .with(UnitId::part(DocumentId::new("book"), 2), Script::Hang);
    let mut config = test_config(working.path(), staging.path(), 2);
    config.unit_timeout = ms(200);
    let app = App::with_client(config, Arc::new(client));

    let report = app.run().await.unwrap();

    assert_eq!(report.exit_code(), 1);
    match report.outcome("book.pdf") {
        Some(DocumentOutcome::Failed { reason }) => {
            assert!(reason.contains("book#2"), "{}", reason);
            assert!(reason.contains("超时"), "{}", reason);
        }
        other => panic!("book.pdf 应该失败: {:?}", other),
    }
    assert!(matches!(
        report.outcome("memo.pdf"),
        Some(DocumentOutcome::Translated { .. })
    ));

    // 不完整的文档没有合并结果，部分文件也不会留在工作目录
    assert!(!working.path().join("al-book.pdf").exists());
    assert_eq!(
        file_names(working.path()),
        vec!["al-memo.pdf", "book.pdf", "memo.pdf"]
    );
}

#[tokio::test]
async fn test_corrupt_artifact_fails_its_group_and_others_still_merge() {
    let working = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    write_numbered_pdf(&working.path().join("doc.pdf"), "d", 4);
    let other = write_numbered_pdf(&working.path().join("other.pdf"), "o", 4);

    let client = ScriptedClient::new(staging.path(), Script::Complete(ms(0)))
        .with(UnitId::part(DocumentId::new("doc"), 2), Script::Corrupt(ms(0)));
    let app = App::with_client(
        test_config(working.path(), staging.path(), 2),
        Arc::new(client),
    );

    let report = app.run().await.unwrap();

    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        report.outcome("doc.pdf"),
        Some(DocumentOutcome::Failed { .. })
    ));
    assert!(matches!(
        report.outcome("other.pdf"),
        Some(DocumentOutcome::Merged { parts: 2, .. })
    ));
    assert_eq!(page_labels(&working.path().join("al-other.pdf")), other);
    assert!(!working.path().join("al-doc.pdf").exists());
}

#[tokio::test]
async fn test_rejected_submission_is_reported() {
    let working = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    write_numbered_pdf(&working.path().join("memo.pdf"), "m", 1);

    let client = ScriptedClient::new(staging.path(), Script::Reject("服务繁忙".to_string()));
    let app = App::with_client(
        test_config(working.path(), staging.path(), 2),
        Arc::new(client),
    );

    let report = app.run().await.unwrap();

    assert_eq!(
        report.outcome("memo.pdf"),
        Some(&DocumentOutcome::Failed {
            reason: "memo: 提交被拒绝: 服务繁忙".to_string()
        })
    );
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_dry_run_plans_without_writing() {
    let working = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    write_numbered_pdf(&working.path().join("book.pdf"), "b", 5);

    let app = App::offline(test_config(working.path(), staging.path(), 2));
    let report = app.run().await.unwrap();

    assert_eq!(
        report.outcome("book.pdf"),
        Some(&DocumentOutcome::Planned { units: 3 })
    );
    assert_eq!(file_names(working.path()), vec!["book.pdf"]);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_split_only_writes_parts() {
    let working = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    write_numbered_pdf(&working.path().join("book.pdf"), "b", 5);

    let app = App::offline(test_config(working.path(), staging.path(), 2));
    let report = app.plan_only(true).await.unwrap();

    assert_eq!(
        report.outcome("book.pdf"),
        Some(&DocumentOutcome::Planned { units: 3 })
    );
    assert_eq!(
        file_names(working.path()),
        vec!["book.pdf", "book_part1.pdf", "book_part2.pdf", "book_part3.pdf"]
    );
}
