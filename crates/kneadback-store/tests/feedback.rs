use kneadback_core::domain::{
    ContactPreference, Demographic, Gender, NewFeedback, Ratings, Usage, UsageMode,
};
use kneadback_store::Store;
use tempfile::TempDir;

fn sample(nps: u8, notes: &str) -> NewFeedback {
    NewFeedback {
        user_id: "guest".to_string(),
        demographic: Demographic {
            gender: Gender::Undisclosed,
            age: 35,
        },
        product_model: "chair::Zen 3".to_string(),
        usage: Usage {
            mode: UsageMode::FullBody,
            intensity: 3,
            heat_enabled: true,
            duration_minutes: 20,
            context: "store trial".to_string(),
        },
        ratings: Ratings {
            relax: 4,
            pain_relief: 4,
            noise: 3,
            heat_fit: 5,
        },
        pain_areas: "shoulder".to_string(),
        issues: String::new(),
        nps,
        notes: notes.to_string(),
        contact: ContactPreference {
            allowed: true,
            phone: "0912345678".to_string(),
            email: "someone@example.com".to_string(),
        },
    }
}

fn migrated_store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

#[test]
fn create_assigns_increasing_ids_and_returns_stored_row() {
    let store = migrated_store();
    let now = 1_700_000_000;

    let first = store.feedback().create(now, &sample(8, "A")).expect("create");
    let second = store.feedback().create(now + 1, &sample(6, "B")).expect("create");
    let third = store.feedback().create(now + 2, &sample(10, "C")).expect("create");

    assert!(first.id < second.id && second.id < third.id);
    assert_eq!(first.submitted_at, now);
    assert_eq!(first.feedback, sample(8, "A"));

    let fetched = store
        .feedback()
        .get(second.id)
        .expect("get")
        .expect("row exists");
    assert_eq!(fetched, second);
}

#[test]
fn list_recent_returns_newest_first() {
    let store = migrated_store();
    let now = 1_700_000_000;
    for (offset, notes) in ["A", "B", "C"].iter().enumerate() {
        store
            .feedback()
            .create(now + offset as i64, &sample(7, notes))
            .expect("create");
    }

    let recent = store.feedback().list_recent(2).expect("list");
    let notes: Vec<&str> = recent.iter().map(|r| r.feedback.notes.as_str()).collect();
    assert_eq!(notes, vec!["C", "B"]);

    let all = store.feedback().list_recent(100).expect("list");
    assert_eq!(all.len(), 3);
}

#[test]
fn insights_on_empty_table() {
    let store = migrated_store();
    let insights = store.feedback().insights().expect("insights");
    assert_eq!(insights.count, 0);
    assert_eq!(insights.average_nps, 0.0);
    assert!(insights.top_issue.is_none());
}

#[test]
fn insights_average_nps() {
    let store = migrated_store();
    for nps in [8, 6, 10] {
        store
            .feedback()
            .create(1_700_000_000, &sample(nps, ""))
            .expect("create");
    }
    let insights = store.feedback().insights().expect("insights");
    assert_eq!(insights.count, 3);
    assert_eq!(insights.average_nps, 8.0);

    store
        .feedback()
        .create(1_700_000_000, &sample(9, ""))
        .expect("create");
    let insights = store.feedback().insights().expect("insights");
    assert_eq!(insights.average_nps, 8.25);
    assert_eq!(store.feedback().count().expect("count"), 4);
}

#[test]
fn ids_are_not_reused_after_reopen() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("data").join("kneadback.sqlite3");

    let first_id = {
        let store = Store::open(&path).expect("open");
        store.migrate().expect("migrate");
        store.feedback().create(1, &sample(5, "")).expect("create").id
    };

    let store = Store::open(&path).expect("reopen");
    store.migrate().expect("migrate");
    let second_id = store.feedback().create(2, &sample(5, "")).expect("create").id;
    assert!(second_id > first_id);
}

#[test]
fn ping_succeeds_on_open_store() {
    let store = migrated_store();
    store.feedback().ping().expect("ping");
}
