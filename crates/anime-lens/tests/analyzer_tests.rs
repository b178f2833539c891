//! End-to-end tests through the `Analyzer` session: selection, processing,
//! the results table and CSV export.

mod common;

use tokio_util::sync::CancellationToken;

use anime_lens::error::{AnimeLensError, ExportError};
use anime_lens::{CandidateFile, ItemStatus};

use common::harness::upload;
use common::{Reply, ScriptedCatalog, TestHarness};

#[tokio::test]
async fn test_directory_selection_to_export() {
    let harness = TestHarness::new();
    harness.write_input("b.png", "pixels-b");
    harness.write_input("a.jpg", "pixels-a");
    harness.write_input("notes.txt", "not an image");

    let catalog = ScriptedCatalog::new()
        .knows("pixels-a", "ExampleShow")
        .identify_as("pixels-b", Reply::Text("Unknown".to_string()));
    let analyzer = harness.analyzer(catalog);

    let selected = analyzer.select_directory(&harness.input_dir).unwrap();
    assert_eq!(selected, Some(2));

    analyzer.start(CancellationToken::new()).await.unwrap();

    let rows = analyzer.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].file_name, "a.jpg");
    assert_eq!(rows[0].status, ItemStatus::Complete);
    assert_eq!(rows[1].status, ItemStatus::Errored);
    assert!(rows[1].record.is_none());

    let path = analyzer.export_csv(&harness.output_dir).unwrap();
    assert_eq!(path, harness.output_dir.join("anime_data.csv"));
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("ExampleShow,"));
    assert!(lines[1].ends_with(",a.jpg"));
}

#[tokio::test]
async fn test_csv_round_trips_through_a_csv_parser() {
    let harness = TestHarness::new();
    let reply = format!(
        "```json\n{}\n```",
        serde_json::json!({
            "animeName": "Re:Zero, Starting Life",
            "plotSummary": "Subaru is \"summoned\".\nHe keeps dying.",
            "animeType": ["Isekai", "Drama"],
            "streamingPlatformCanada": "Crunchyroll",
            "redditRating": ""
        })
    );
    let catalog = ScriptedCatalog::new()
        .identify_as("pixels", Reply::Text("Re:Zero".to_string()))
        .enrich_as("Re:Zero", Reply::Text(reply));
    let analyzer = harness.analyzer(catalog);
    analyzer
        .select_files(vec![upload("odd, \"name\".png", "pixels")])
        .unwrap();
    analyzer.start(CancellationToken::new()).await.unwrap();

    let path = analyzer
        .export_csv_as(&harness.output_dir.join("export.csv"))
        .unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec![
            "Anime Name",
            "Plot Summary",
            "Type/Genre",
            "Streaming Platform (Canada)",
            "Reddit Rating",
            "Original File"
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(&row[0], "Re:Zero, Starting Life");
    assert_eq!(&row[1], "Subaru is \"summoned\".\nHe keeps dying.");
    assert_eq!(&row[2], "Isekai, Drama");
    assert_eq!(&row[3], "Crunchyroll");
    assert_eq!(&row[4], "");
    assert_eq!(&row[5], "odd, \"name\".png");
}

#[tokio::test]
async fn test_export_refused_without_records() {
    let harness = TestHarness::new();
    let catalog = ScriptedCatalog::new().identify_as("pixels", Reply::Text("Unknown".to_string()));
    let analyzer = harness.analyzer(catalog);

    let before = analyzer.export_csv(&harness.output_dir);
    assert!(matches!(
        before,
        Err(AnimeLensError::Export(ExportError::NothingToExport))
    ));

    analyzer.select_files(vec![upload("a.png", "pixels")]).unwrap();
    analyzer.start(CancellationToken::new()).await.unwrap();

    let after = analyzer.export_csv(&harness.output_dir);
    assert!(matches!(
        after,
        Err(AnimeLensError::Export(ExportError::NothingToExport))
    ));
    assert!(!harness.output_dir.join("anime_data.csv").exists());
}

#[tokio::test]
async fn test_intake_and_export_locked_while_running() {
    let harness = TestHarness::new();
    let catalog = ScriptedCatalog::new()
        .knows("done", "Done")
        .identify_as("stuck", Reply::Hang);
    let analyzer = harness.analyzer(catalog);
    analyzer
        .select_files(vec![upload("1.png", "done"), upload("2.png", "stuck")])
        .unwrap();
    let cancel = CancellationToken::new();

    let run = analyzer.start(cancel.clone());
    let intrude = async {
        while !analyzer.is_running() {
            tokio::task::yield_now().await;
        }
        assert!(analyzer.intake_disabled());

        let ignored = analyzer.select_files(vec![upload("3.png", "other")]).unwrap();
        assert_eq!(ignored, None);

        let busy = analyzer.export_csv(&harness.output_dir);
        assert!(matches!(busy, Err(AnimeLensError::Export(ExportError::Busy))));

        cancel.cancel();
    };
    let (summary, ()) = tokio::join!(run, intrude);

    assert!(summary.unwrap().cancelled);
    assert!(!analyzer.intake_disabled());
    assert_eq!(analyzer.rows().len(), 2);

    // One item completed before cancellation, so there is something to export
    let path = analyzer.export_csv(&harness.output_dir).unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_selection_without_images_keeps_batch() {
    let harness = TestHarness::new();
    let analyzer = harness.analyzer(ScriptedCatalog::new());

    analyzer.select_files(vec![upload("a.png", "pixels")]).unwrap();
    let ignored = analyzer
        .select_files(vec![CandidateFile::from_bytes(
            "notes.txt",
            Some("text/plain"),
            b"hello".to_vec(),
        )])
        .unwrap();

    assert_eq!(ignored, None);
    let rows = analyzer.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "a.png");
}

#[tokio::test]
async fn test_table_rendering_is_stable() {
    let harness = TestHarness::new();
    let catalog = ScriptedCatalog::new()
        .knows("a", "Alpha")
        .identify_as("b", Reply::Api(500));
    let analyzer = harness.analyzer(catalog);
    analyzer
        .select_files(vec![upload("a.png", "a"), upload("b.png", "b")])
        .unwrap();

    let pending = analyzer.table();
    assert!(pending.contains("Pending"));
    assert!(pending.contains("..."));

    analyzer.start(CancellationToken::new()).await.unwrap();

    let first = analyzer.table();
    let second = analyzer.table();
    assert_eq!(first, second);
    assert_eq!(analyzer.rows(), analyzer.rows());
    assert!(first.contains("Alpha"));
    assert!(first.contains("HTTP 500"));
}

#[tokio::test]
async fn test_progress_events_follow_each_transition() {
    let harness = TestHarness::new();
    let catalog = ScriptedCatalog::new()
        .knows("a", "Alpha")
        .identify_as("b", Reply::Text("Unknown".to_string()));
    let analyzer = harness.analyzer(catalog);
    analyzer
        .select_files(vec![upload("a.png", "a"), upload("b.png", "b")])
        .unwrap();
    let mut events = analyzer.subscribe();

    analyzer.start(CancellationToken::new()).await.unwrap();

    let mut statuses = Vec::new();
    let mut last_progress = None;
    while let Ok(event) = events.try_recv() {
        statuses.push((event.file_name.clone(), event.status));
        last_progress = Some(event.progress);
    }

    assert_eq!(
        statuses,
        vec![
            ("a.png".to_string(), ItemStatus::Identifying),
            ("a.png".to_string(), ItemStatus::Searching),
            ("a.png".to_string(), ItemStatus::Complete),
            ("b.png".to_string(), ItemStatus::Identifying),
            ("b.png".to_string(), ItemStatus::Errored),
        ]
    );
    let progress = last_progress.unwrap();
    assert!(progress.is_done());
    assert_eq!(progress.percent_finished(), 100);
    assert_eq!(progress.fraction_complete(), 0.5);
    assert_eq!(analyzer.progress(), progress);
}

#[tokio::test]
async fn test_unreadable_image_errors_only_that_item() {
    let harness = TestHarness::new();
    let gone = harness.write_input("gone.png", "pixels-gone");
    let kept = harness.write_input("kept.png", "pixels-kept");
    let analyzer = harness.analyzer(ScriptedCatalog::new().knows("pixels-kept", "Kept"));

    assert_eq!(analyzer.select_paths([gone.clone(), kept]).unwrap(), Some(2));
    std::fs::remove_file(&gone).unwrap();

    analyzer.start(CancellationToken::new()).await.unwrap();

    let rows = analyzer.rows();
    assert_eq!(rows[0].status, ItemStatus::Errored);
    assert!(
        rows[0].status_text.starts_with("Failed to read image"),
        "status was: {}",
        rows[0].status_text
    );
    assert!(rows[0].record.is_none());
    assert_eq!(rows[1].status, ItemStatus::Complete);
    assert_eq!(analyzer.processor().records().len(), 1);
    // The catalog is never asked about the missing file
    assert_eq!(
        analyzer.processor().catalog().calls(),
        vec!["identify:pixels-kept", "enrich:Kept"]
    );
}

#[tokio::test]
async fn test_intake_reopens_after_overlapping_starts() {
    let harness = TestHarness::new();
    let catalog = ScriptedCatalog::new()
        .identify_as("stuck", Reply::Hang)
        .knows("fresh", "Fresh");
    let analyzer = harness.analyzer(catalog);
    analyzer.select_files(vec![upload("1.png", "stuck")]).unwrap();
    let cancel = CancellationToken::new();

    let first = analyzer.start(cancel.clone());
    let second = async {
        while !analyzer.is_running() {
            tokio::task::yield_now().await;
        }
        let rejected = analyzer.start(CancellationToken::new()).await;
        assert!(matches!(
            rejected,
            Err(AnimeLensError::Batch(anime_lens::BatchError::AlreadyRunning))
        ));
        assert!(analyzer.intake_disabled());
        cancel.cancel();
    };
    let (summary, ()) = tokio::join!(first, second);
    assert!(summary.unwrap().cancelled);

    assert!(!analyzer.intake_disabled());
    assert_eq!(
        analyzer.select_files(vec![upload("2.png", "fresh")]).unwrap(),
        Some(1)
    );
    analyzer.start(CancellationToken::new()).await.unwrap();
    assert_eq!(analyzer.rows()[0].status, ItemStatus::Complete);
}

#[tokio::test]
async fn test_zero_progress_capacity_still_reports() {
    let config = anime_lens::config::Config {
        progress_channel_capacity: 0,
        ..Default::default()
    };
    let analyzer = anime_lens::Analyzer::new(&config, ScriptedCatalog::new().knows("a", "Alpha"));
    let mut events = analyzer.subscribe();

    analyzer.select_files(vec![upload("a.png", "a")]).unwrap();
    analyzer.start(CancellationToken::new()).await.unwrap();

    // Only the latest event survives in a one-slot channel
    let mut last = None;
    loop {
        match events.try_recv() {
            Ok(event) => last = Some(event),
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert_eq!(last.unwrap().status, ItemStatus::Complete);
}
