//! End-to-end flow: Arrow batch -> read relation -> grid build from the
//! temporal coordinates -> range search -> selection vector -> projected
//! relation.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tempora::{
    AppendRelation, BufferAllocator, ColumnFactory, FlatPoints, GridBuilder, GridConfig,
    ReadRelation, Result, Value, copy_rel_from,
};

/// Four documents with (system_from, valid_from) coordinates.
fn ingest_batch() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("doc", DataType::Utf8, false),
        Field::new("system_from", DataType::Int64, false),
        Field::new("valid_from", DataType::Int64, false),
    ]));
    let doc: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "c", "d"]));
    let system_from: ArrayRef = Arc::new(Int64Array::from(vec![100, 100, 200, 300]));
    let valid_from: ArrayRef = Arc::new(Int64Array::from(vec![10, 20, 10, 40]));
    Ok(RecordBatch::try_new(schema, vec![doc, system_from, valid_from])?)
}

#[test]
fn batch_to_grid_to_selection() -> Result<()> {
    let alloc = BufferAllocator::unbounded();
    let rel = ReadRelation::from_batch(&ingest_batch()?)?;

    // Index the (system_from, valid_from) coordinates; remember which row
    // each point came from by packing the row id as a third coordinate.
    let sys = rel.column("system_from").unwrap();
    let valid = rel.column("valid_from").unwrap();
    let mut coords = Vec::with_capacity(rel.row_count() * 3);
    for i in 0..rel.row_count() {
        coords.extend_from_slice(&[sys.get_long(i), valid.get_long(i), i as i64]);
    }
    let grid = GridBuilder::new(
        alloc.clone(),
        3,
        GridConfig {
            cell_size: 16,
            ..GridConfig::default()
        },
    )?
    .build(&FlatPoints::new(3, coords)?)?;

    // Everything recorded at system time 100, any valid time, any row.
    let hits: Vec<i32> = grid
        .range_search(&[100, i64::MIN + 1, 0], &[100, i64::MAX - 1, i64::MAX - 1])
        .map(|g| grid.point_coord(g, 2).unwrap() as i32)
        .collect();

    let mut selected = rel.select(&hits)?;
    assert_eq!(selected.row_count(), 2);
    let docs: Vec<Value> = (0..2)
        .map(|i| selected.column("doc").unwrap().get_value(i))
        .collect();
    assert_eq!(
        docs,
        vec![Value::Str("a".into()), Value::Str("b".into())]
    );

    // Materialize the selection into fresh storage and compare.
    let mut out = AppendRelation::new(ColumnFactory::Fresh {
        allocator: alloc.clone(),
    });
    copy_rel_from(&mut out, &selected, 0, selected.row_count())?;
    let copied = out.read()?;
    for col in copied.columns() {
        let src = selected.column(col.name()).unwrap();
        for i in 0..copied.row_count() {
            assert_eq!(col.get_value(i), src.get_value(i));
        }
    }

    out.close();
    selected.close();
    assert_eq!(alloc.allocated_bytes(), grid_bytes(&grid));
    Ok(())
}

/// Bytes still reserved must belong to the grid alone once relations close.
fn grid_bytes(grid: &tempora::SimpleGrid) -> usize {
    grid.total() * grid.k() * 8
}
