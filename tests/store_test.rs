//! 保存データ管理の統合テスト
//!
//! 作業指示ごとの保存・読み込み・一覧・削除・コピーを検証

use bid_writer::error::BidWriterError;
use bid_writer::session::Session;
use bid_writer::store::StateStore;
use bid_writer_common::{Catalog, InstanceId, InstanceUpdate};
use tempfile::tempdir;

fn kilz() -> InstanceId {
    InstanceId::new("Mold", "Kilz", 1)
}

/// 保存した入力がそのまま復元される
#[test]
fn test_save_and_reopen_keeps_inputs() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path());
    let catalog = Catalog::default_catalog();

    let mut session = Session::create(&store, &catalog, "1234", false).unwrap();
    let second = session.sheet.add_instance(&catalog, "Mold", "Kilz").unwrap();
    assert_eq!(second, InstanceId::new("Mold", "Kilz", 2));

    session
        .sheet
        .update(
            &kilz(),
            InstanceUpdate {
                quantity: Some("120".into()),
                location: Some("bathroom".into()),
                conjunction_key: Some(" a ".into()),
                selected: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    let path = session.save(&store).unwrap();
    assert_eq!(path, dir.path().join("WO_1234.json"));

    let reopened = Session::open(&store, &catalog, "1234").unwrap();
    let inst = reopened.sheet.get(&kilz()).unwrap();
    assert_eq!(inst.quantity, "120");
    assert_eq!(inst.location, "bathroom");
    assert_eq!(inst.conjunction().as_deref(), Some("A"));
    assert!(inst.selected);
    assert!(reopened.sheet.get(&second).is_some());
    assert_eq!(inst.total(), 60.0);
}

/// 存在しない作業指示
#[test]
fn test_open_missing_work_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path());

    let result = Session::open(&store, &Catalog::default_catalog(), "404");
    assert!(matches!(result, Err(BidWriterError::StateNotFound(_))));
}

/// 一覧は作業指示番号で絞り込める
#[test]
fn test_list_and_search() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path());
    let catalog = Catalog::default_catalog();

    for wo in ["1001", "1002", "AutoSave_1700000000"] {
        Session::create(&store, &catalog, wo, false)
            .unwrap()
            .save(&store)
            .unwrap();
    }
    // 保存データ以外のファイルは無視
    std::fs::write(dir.path().join("catalog_cache.csv"), "Category,Item,Template,Unit Price\n").unwrap();

    let all = store.list(None).unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|e| e.bid_count == 4 && e.selected_count == 0));

    let found = store.list(Some("100")).unwrap();
    let mut names: Vec<&str> = found.iter().map(|e| e.work_order.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["1001", "1002"]);

    assert_eq!(store.list(Some("autosave")).unwrap().len(), 1);
}

/// 存在しないディレクトリの一覧は空
#[test]
fn test_list_missing_dir() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path().join("not-yet"));
    assert!(store.list(None).unwrap().is_empty());
}

/// 削除とコピー
#[test]
fn test_delete_and_export_to() {
    let dir = tempdir().expect("Failed to create temp dir");
    let out = tempdir().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path());

    Session::create(&store, &Catalog::default_catalog(), "77", false)
        .unwrap()
        .save(&store)
        .unwrap();

    let copied = store.export_to("77", out.path()).unwrap();
    assert_eq!(copied, out.path().join("WO_77.json"));
    assert!(copied.is_file());

    let renamed = store.export_to("77", &out.path().join("backup/wo77.json")).unwrap();
    assert!(renamed.is_file());

    store.delete("77").unwrap();
    assert!(!store.exists("77"));
    assert!(matches!(store.delete("77"), Err(BidWriterError::StateNotFound(_))));
    assert!(matches!(
        store.export_to("77", out.path()),
        Err(BidWriterError::StateNotFound(_))
    ));
}

/// 旧形式の保存データも読める
#[test]
fn test_load_legacy_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path());

    let legacy = r#"{
        "selected_items": {
            "Mold": {
                "Kilz": {
                    "original_name": "Kilz",
                    "instance_info": {"instance_id": 1},
                    "qty": "100",
                    "unit_price": "0.50",
                    "location": "garage",
                    "add_info": ""
                }
            }
        },
        "item_photos": {}
    }"#;
    std::fs::write(dir.path().join("WO_555.json"), legacy).unwrap();

    let session = Session::open(&store, &Catalog::default_catalog(), "555").unwrap();
    assert_eq!(session.work_order, "555");
    let inst = session.sheet.get(&kilz()).unwrap();
    assert_eq!(inst.location, "garage");
    assert_eq!(inst.total(), 50.0);
    // カタログの他の明細は #1 が補われる
    assert_eq!(session.sheet.len(), 4);
}
