mod common;

use common::*;
use record_store_client::RecordFields;

#[tokio::test]
async fn import_creates_valid_rows_and_reports_the_rest() {
    let h = loaded(&[]).await;
    let csv = "id,name,email\n\
               1,Ann,ann@x.com\n\
               2,,nobody@x.com\n\
               3,Bob,not-an-email\n\
               4,Cy,cy@x.com\n";

    let report = h.engine.import_csv(csv).await;

    let names: Vec<_> = report.created.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Cy"]);
    let skipped: Vec<_> = report.skipped.iter().map(|issue| issue.line).collect();
    assert_eq!(skipped, vec![3, 4]);
    assert!(report.failed.is_empty());
    assert_eq!(h.engine.records().len(), 2);
}

#[tokio::test]
async fn import_creates_in_file_order_and_ignores_file_ids() {
    let h = loaded(&trio()).await;

    let report = h
        .engine
        .import_csv("name,email\nDee,dee@x.com\nEve,eve@x.com\n")
        .await;

    assert!(report.is_clean());
    assert_eq!(
        h.store.mutation_calls(),
        vec![
            Call::Create(RecordFields::new("Dee", "dee@x.com")),
            Call::Create(RecordFields::new("Eve", "eve@x.com")),
        ]
    );
    let ids: Vec<_> = report.created.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4, 5]);
}

#[tokio::test]
async fn import_reports_service_failures_separately() {
    let h = loaded(&[]).await;
    h.store.fail_create(server_error());

    let report = h.engine.import_csv("id,name,email\n1,Ann,ann@x.com\n").await;

    assert!(report.created.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].line, 2);
}

#[tokio::test]
async fn export_is_in_id_order() {
    let h = loaded(&[cy(), ann(), bob()]).await;

    assert_eq!(
        h.engine.export_csv(),
        "id,name,email\n1,Ann,ann@x.com\n2,Bob,bob@x.com\n3,Cy,cy@x.com\n"
    );
}
