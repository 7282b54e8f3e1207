mod common;

use common::{stub_config, stub_item, stub_key};
use cuckoo_table::{
    Config, CuckooTable, Error, Item, ItemKey, Location, TableId, MAX_BUCKET_SIZE, MAX_DEPTH,
};
use std::time::{Duration, Instant};
use test_log::test;

// Two buckets per table, one slot each
//
// a: T1[0] or T2[0]
// b: T1[1] or T2[1]
// c: T1[0] or T2[1]
// d: T1[1] or T2[1]
fn keys() -> [(ItemKey, u64); 4] {
    [
        (stub_key("a", 0, 1, 0), 1),
        (stub_key("b", 1, 2, 1), 2),
        (stub_key("c", 0, 3, 1), 3),
        (stub_key("d", 1, 4, 1), 4),
    ]
}

fn location(table: TableId, bucket: u32) -> Location {
    Location {
        table,
        bucket,
        slot: 0,
    }
}

#[test]
fn table_capacity_fill_with_relocation() -> cuckoo_table::Result<()> {
    let mut table = stub_config(1).bucket_size(1).max_depth(2).build()?;
    assert_eq!(4, table.capacity());

    table.insert(stub_item("a", 0, 1, 0, 1))?;
    table.insert(stub_item("b", 1, 2, 1, 2))?;
    table.insert(stub_item("c", 0, 3, 1, 3))?;

    // Both candidates of d are taken, d takes T2[1] from c, c takes T1[0] from a
    table.insert(stub_item("d", 1, 4, 1, 4))?;
    assert_eq!(4, table.len());

    assert_eq!(
        Some((3, location(TableId::First, 0))),
        table.lookup_verbose(stub_key("c", 0, 3, 1))?
    );
    assert_eq!(
        Some((2, location(TableId::First, 1))),
        table.lookup_verbose(stub_key("b", 1, 2, 1))?
    );
    assert_eq!(
        Some((1, location(TableId::Second, 0))),
        table.lookup_verbose(stub_key("a", 0, 1, 0))?
    );
    assert_eq!(
        Some((4, location(TableId::Second, 1))),
        table.lookup_verbose(stub_key("d", 1, 4, 1))?
    );

    Ok(())
}

#[test]
fn table_capacity_full_is_atomic() -> cuckoo_table::Result<()> {
    let mut table = stub_config(1).bucket_size(1).max_depth(8).build()?;

    for (key, value) in keys() {
        table.insert(cuckoo_table::Item::with_hash(
            key.bytes().clone(),
            key.hash(),
            value,
        ))?;
    }

    let before = keys()
        .into_iter()
        .map(|(key, _)| table.lookup_verbose(key))
        .collect::<cuckoo_table::Result<Vec<_>>>()?;

    assert!(matches!(
        table.insert(stub_item("e", 0, 5, 0, 5)),
        Err(Error::Full)
    ));
    assert!(matches!(
        table.insert(stub_item("f", 1, 6, 0, 6)),
        Err(Error::Full)
    ));

    let after = keys()
        .into_iter()
        .map(|(key, _)| table.lookup_verbose(key))
        .collect::<cuckoo_table::Result<Vec<_>>>()?;

    assert_eq!(before, after);
    assert!(after.iter().all(Option::is_some));
    assert_eq!(4, table.len());
    assert_eq!(None, table.lookup(stub_key("e", 0, 5, 0))?);

    Ok(())
}

#[test]
fn table_capacity_depth_bound() -> cuckoo_table::Result<()> {
    let mut table = stub_config(1).bucket_size(1).max_depth(1).build()?;

    table.insert(stub_item("a", 0, 1, 0, 1))?;
    table.insert(stub_item("b", 1, 2, 1, 2))?;
    table.insert(stub_item("c", 0, 3, 1, 3))?;

    // d needs two relocations
    assert!(matches!(
        table.insert(stub_item("d", 1, 4, 1, 4)),
        Err(Error::Full)
    ));
    assert_eq!(3, table.len());
    assert_eq!(
        Some((3, location(TableId::Second, 1))),
        table.lookup_verbose(stub_key("c", 0, 3, 1))?
    );

    Ok(())
}

#[test]
fn table_capacity_single_relocation() -> cuckoo_table::Result<()> {
    let mut table = stub_config(1).bucket_size(1).build()?;

    table.insert(stub_item("a", 0, 1, 1, 1))?;
    table.insert(stub_item("c", 0, 3, 0, 3))?;

    // T1[0] and T2[0] are taken, a can make room by moving to T2[1]
    table.insert(stub_item("b", 0, 2, 0, 2))?;

    assert_eq!(
        Some((2, location(TableId::First, 0))),
        table.lookup_verbose(stub_key("b", 0, 2, 0))?
    );
    assert_eq!(
        Some((1, location(TableId::Second, 1))),
        table.lookup_verbose(stub_key("a", 0, 1, 1))?
    );

    Ok(())
}

#[test]
fn table_capacity_signature_collision() -> cuckoo_table::Result<()> {
    let mut table = stub_config(0).bucket_size(4).build()?;

    table.insert(stub_item("a", 0, 9, 0, 1))?;
    table.insert(stub_item("b", 0, 9, 0, 2))?;

    // Both buckets have free slots, but both already hold signature 9
    assert!(matches!(
        table.insert(stub_item("c", 0, 9, 0, 3)),
        Err(Error::Full)
    ));

    assert_eq!(Some(1), table.lookup(stub_key("a", 0, 9, 0))?);
    assert_eq!(Some(2), table.lookup(stub_key("b", 0, 9, 0))?);

    Ok(())
}

fn placements(table: &CuckooTable, keys: &[String]) -> cuckoo_table::Result<Vec<(u64, Location)>> {
    keys.iter()
        .map(|key| {
            table
                .lookup_verbose(key)
                .map(|found| found.expect("stored key should be found"))
        })
        .collect()
}

#[test]
fn table_capacity_full_at_max_depth() -> cuckoo_table::Result<()> {
    for (power, bucket_size) in [(3, 2), (3, 4), (3, MAX_BUCKET_SIZE), (6, 4)] {
        let mut table = Config::new(power)
            .bucket_size(bucket_size)
            .max_depth(MAX_DEPTH)
            .build()?;

        let mut stored = Vec::new();
        let mut full = 0;

        for (idx, value) in (0..2 * table.capacity()).zip(0_u64..) {
            let key = format!("flow-{idx}");
            let before = placements(&table, &stored)?;

            let start = Instant::now();
            let result = table.insert(Item::new(key.as_str(), value));
            let elapsed = start.elapsed();

            assert!(
                elapsed < Duration::from_secs(1),
                "insert of {key} into 2^{power}x{bucket_size} took {elapsed:?}",
            );

            match result {
                Ok(()) => stored.push(key),
                Err(Error::Full) => {
                    full += 1;
                    assert_eq!(before, placements(&table, &stored)?);
                    assert_eq!(None, table.lookup(&key)?);
                }
                Err(e) => return Err(e),
            }
        }

        assert!(full > 0);
        assert_eq!(stored.len(), table.len());
        assert_eq!(stored.len(), table.iter().count());
    }

    Ok(())
}
