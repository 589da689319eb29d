use std::sync::Arc;
use std::time::Duration;

use hr_recap::io::{CacheKey, WorkbookCache};
use hr_recap::model::{Sheet, Table, Workbook};

fn workbook(name: &str) -> Workbook {
    Workbook {
        sheets: vec![Sheet {
            name: name.to_string(),
            table: Table::default(),
        }],
    }
}

#[test]
fn entries_are_keyed_by_source_and_selector() {
    let mut cache = WorkbookCache::new(Duration::from_secs(3600));
    cache.insert(CacheKey::new("db.xlsx", "sheet:#0"), Arc::new(workbook("a")));
    cache.insert(CacheKey::new("db.xlsx", "all:detect"), Arc::new(workbook("b")));
    cache.insert(CacheKey::new("org.xlsx", "all:detect"), Arc::new(workbook("c")));

    let hit = cache
        .get(&CacheKey::new("db.xlsx", "all:detect"))
        .expect("cached");
    assert_eq!(hit.sheets[0].name, "b");

    assert_eq!(cache.invalidate_source("db.xlsx"), 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&CacheKey::new("db.xlsx", "sheet:#0")).is_none());

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn expired_entries_are_evicted_on_access() {
    let mut cache = WorkbookCache::new(Duration::ZERO);
    let key = CacheKey::new("db.xlsx", "sheet:#0");
    cache.insert(key.clone(), Arc::new(workbook("a")));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());
}

#[test]
fn loader_errors_are_not_stored() {
    let mut cache = WorkbookCache::new(Duration::from_secs(60));
    let key = CacheKey::new("db.xlsx", "sheet:#0");

    let failed: Result<_, &str> = cache.get_or_try_insert(key.clone(), || Err("offline"));
    assert_eq!(failed.unwrap_err(), "offline");
    assert!(cache.is_empty());

    let loaded = cache
        .get_or_try_insert(key.clone(), || Ok::<_, &str>(workbook("fresh")))
        .expect("loaded");
    let again = cache
        .get_or_try_insert(key, || Err("should not run"))
        .expect("served from cache");
    assert!(Arc::ptr_eq(&loaded, &again));
}
