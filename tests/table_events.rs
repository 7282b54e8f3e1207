mod common;

use common::{stub_config, stub_item, stub_key};
use cuckoo_table::{Action, Config, HashMap, Item, Location, TableId};
use std::sync::{Arc, Mutex};
use test_log::test;

type Shadow = Arc<Mutex<HashMap<Vec<u8>, Location>>>;

/// Maintains a copy of the key -> slot index from events alone
fn shadow_listener(shadow: Shadow) -> impl FnMut(&Action) + Send {
    move |action: &Action| {
        let mut shadow = shadow.lock().expect("lock is poisoned");
        let key = action.item().key_bytes().to_vec();

        match action.destination() {
            Some(to) => shadow.insert(key, to),
            None => shadow.remove(&key),
        };
    }
}

#[test]
fn table_events_shadow_index() -> cuckoo_table::Result<()> {
    let shadow = Shadow::default();

    let mut table = Config::new(4)
        .bucket_size(2)
        .max_depth(4)
        .event_listener(shadow_listener(shadow.clone()))
        .build()?;

    let mut inserted = vec![];

    for idx in 0..table.capacity() {
        let key = format!("flow-{idx}");

        if table.insert(Item::new(key.as_str(), idx as u64)).is_ok() {
            inserted.push(key);
        }

        let shadow = shadow.lock().expect("lock is poisoned");
        assert_eq!(inserted.len(), shadow.len());

        for key in &inserted {
            let (_, location) = table.lookup_verbose(key)?.expect("should exist");
            assert_eq!(Some(&location), shadow.get(key.as_bytes()));
        }
    }

    for key in inserted.drain(..).step_by(3) {
        table.remove(key.as_str())?;
        assert!(!shadow
            .lock()
            .expect("lock is poisoned")
            .contains_key(key.as_bytes()));
    }

    Ok(())
}

#[test]
fn table_events_relocation_order() -> cuckoo_table::Result<()> {
    let events = Arc::new(Mutex::new(vec![]));
    let sink = events.clone();

    let mut table = stub_config(1)
        .bucket_size(1)
        .max_depth(2)
        .event_listener(move |action: &Action| {
            sink.lock().expect("lock is poisoned").push(action.clone());
        })
        .build()?;

    table.insert(stub_item("a", 0, 1, 0, 1))?;
    table.insert(stub_item("b", 1, 2, 1, 2))?;
    table.insert(stub_item("c", 0, 3, 1, 3))?;
    events.lock().expect("lock is poisoned").clear();

    table.insert(stub_item("d", 1, 4, 1, 4))?;

    let loc = |table, bucket| Location {
        table,
        bucket,
        slot: 0,
    };

    assert_eq!(
        vec![
            Action::Moved {
                item: stub_item("a", 0, 1, 0, 1),
                from: loc(TableId::First, 0),
                to: loc(TableId::Second, 0),
            },
            Action::Moved {
                item: stub_item("c", 0, 3, 1, 3),
                from: loc(TableId::Second, 1),
                to: loc(TableId::First, 0),
            },
            Action::Added {
                item: stub_item("d", 1, 4, 1, 4),
                to: loc(TableId::Second, 1),
            },
        ],
        *events.lock().expect("lock is poisoned"),
    );

    // Failed inserts and flushes are silent
    events.lock().expect("lock is poisoned").clear();
    assert!(table.insert(stub_item("e", 0, 5, 0, 5)).is_err());
    table.flush();
    assert!(events.lock().expect("lock is poisoned").is_empty());

    table.insert(stub_item("a", 0, 1, 0, 1))?;
    assert_eq!(1, table.remove(stub_key("a", 0, 1, 0))?);

    assert_eq!(
        vec![
            Action::Added {
                item: stub_item("a", 0, 1, 0, 1),
                to: loc(TableId::First, 0),
            },
            Action::Removed {
                item: stub_item("a", 0, 1, 0, 1),
                from: loc(TableId::First, 0),
            },
        ],
        *events.lock().expect("lock is poisoned"),
    );

    Ok(())
}
