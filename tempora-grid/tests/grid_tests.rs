use rand::{Rng, SeedableRng, rngs::StdRng};
use tempora_buffer::BufferAllocator;
use tempora_grid::{FlatPoints, GridBuilder, GridConfig, PointSource, SimpleGrid};
use tempora_result::{Error, Result};

fn config(cell_size: usize) -> GridConfig {
    GridConfig {
        cell_size,
        ..GridConfig::default()
    }
}

fn build<P: AsRef<[i64]>>(k: usize, cell_size: usize, points: &[P]) -> Result<SimpleGrid> {
    GridBuilder::new(BufferAllocator::unbounded(), k, config(cell_size))?.build(points)
}

fn decoded(grid: &SimpleGrid, globals: impl IntoIterator<Item = i64>) -> Vec<Vec<i64>> {
    globals
        .into_iter()
        .map(|g| grid.get_point(g).expect("emitted index must decode"))
        .collect()
}

#[test]
fn point_lookup_in_single_cell() -> Result<()> {
    let points: Vec<[i64; 4]> = vec![
        [0, 0, 0, 0],
        [0, 0, 0, 1],
        [10, 10, 10, 10],
        [10, 10, 10, 11],
    ];
    let grid = build(4, 16, &points)?;
    assert_eq!(grid.total(), 4);

    let hits = decoded(
        &grid,
        grid.range_search(&[10, 10, 10, 10], &[10, 10, 10, 11]),
    );
    assert_eq!(hits, vec![vec![10, 10, 10, 10], vec![10, 10, 10, 11]]);
    Ok(())
}

#[test]
fn every_point_routes_and_retrieves() -> Result<()> {
    let mut points: Vec<[i64; 3]> = Vec::new();
    for x in 0..8 {
        for y in 0..8 {
            points.push([x * 3, y * 5, x + y]);
        }
    }
    let grid = build(3, 4, &points)?;
    for p in &points {
        let found = decoded(&grid, grid.range_search(p, p));
        assert!(
            found.iter().any(|q| q == p),
            "point {p:?} not found in its own box"
        );
    }
    Ok(())
}

#[test]
fn full_range_covers_every_point_exactly_once() -> Result<()> {
    let points: Vec<[i64; 3]> = (0..257)
        .map(|i| [i % 13, (i * 7) % 29, i])
        .collect();
    let grid = build(3, 8, &points)?;

    let globals: Vec<i64> = grid.range_search(grid.mins(), grid.maxs()).collect();
    assert_eq!(globals.len(), grid.total());
    let mut unique = globals.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), globals.len(), "indices must not repeat");

    let mut got = decoded(&grid, globals);
    let mut expected: Vec<Vec<i64>> = points.iter().map(|p| p.to_vec()).collect();
    got.sort();
    expected.sort();
    assert_eq!(got, expected);
    Ok(())
}

#[test]
fn cells_are_sorted_on_last_axis() -> Result<()> {
    let points: Vec<[i64; 2]> = (0..512).map(|i| [(i * 37) % 64, (i * 53) % 97]).collect();
    let grid = build(2, 8, &points)?;

    let mut last_seen: Option<(i64, i64)> = None;
    for global in grid.points() {
        let cell = global >> grid.cell_shift();
        let coord = grid.point_coord(global, grid.k() - 1).unwrap();
        if let Some((prev_cell, prev_coord)) = last_seen
            && prev_cell == cell
        {
            assert!(
                prev_coord <= coord,
                "cell {cell} not sorted: {prev_coord} then {coord}"
            );
        }
        last_seen = Some((cell, coord));
    }
    Ok(())
}

#[test]
fn partial_leading_axis_narrows_to_bucket() -> Result<()> {
    let points: Vec<[i64; 2]> = (0..64).map(|i| [i, i]).collect();
    let grid = build(2, 2, &points)?;
    assert!(grid.cells_per_dimension() > 1);

    // Axis 1 fully covered, axis 0 narrowed to one value.
    let hits = decoded(&grid, grid.range_search(&[10, grid.mins()[1]], &[10, grid.maxs()[1]]));
    assert_eq!(hits, vec![vec![10, 10]]);
    Ok(())
}

#[test]
fn disjoint_range_is_empty_not_an_error() -> Result<()> {
    let points: Vec<[i64; 2]> = (0..16).map(|i| [i, i]).collect();
    let grid = build(2, 4, &points)?;
    assert_eq!(grid.range_search(&[100, 100], &[200, 200]).count(), 0);
    assert_eq!(grid.range_search(&[5, 5], &[2, 2]).count(), 0);
    Ok(())
}

#[test]
fn randomized_searches_match_brute_force() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xB17E_3579);
    let points: Vec<[i64; 3]> = (0..500)
        .map(|_| {
            [
                rng.random_range(-50..50),
                rng.random_range(0..1000),
                rng.random_range(-200..200),
            ]
        })
        .collect();
    let grid = build(3, 16, &points)?;

    for _ in 0..50 {
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for d in 0..3 {
            let a = rng.random_range(-250..250);
            let b = rng.random_range(-250..250);
            lo[d] = a.min(b);
            hi[d] = a.max(b);
        }
        let mut got = decoded(&grid, grid.range_search(&lo, &hi));
        let mut expected: Vec<Vec<i64>> = points
            .iter()
            .filter(|p| (0..3).all(|d| lo[d] <= p[d] && p[d] <= hi[d]))
            .map(|p| p.to_vec())
            .collect();
        got.sort();
        expected.sort();
        assert_eq!(got, expected, "query {lo:?}..{hi:?}");
    }
    Ok(())
}

#[test]
fn grid_is_sealed_after_build() -> Result<()> {
    let points: Vec<[i64; 2]> = vec![[1, 2], [3, 4]];
    let mut grid = build(2, 4, &points)?;
    assert!(matches!(
        grid.insert(&[5, 6]),
        Err(Error::OperationNotSupported(_))
    ));
    assert!(matches!(
        grid.delete(&[1, 2]),
        Err(Error::OperationNotSupported(_))
    ));
    Ok(())
}

#[test]
fn empty_build_and_search() -> Result<()> {
    let points: Vec<[i64; 2]> = Vec::new();
    let grid = build(2, 4, &points)?;
    assert_eq!(grid.total(), 0);
    assert_eq!(grid.range_search(&[0, 0], &[10, 10]).count(), 0);
    Ok(())
}

#[test]
fn grid_feeds_a_rebuild() -> Result<()> {
    let flat = FlatPoints::new(2, (0..128i64).flat_map(|i| [i % 11, i]).collect())?;
    let first = GridBuilder::new(BufferAllocator::unbounded(), 2, config(8))?.build(&flat)?;
    let second = GridBuilder::new(BufferAllocator::unbounded(), 2, config(8))?.build(&first)?;
    assert_eq!(second.total(), first.total());

    let mut a = decoded(&first, first.points());
    let mut b = decoded(&second, second.points());
    a.sort();
    b.sort();
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn allocation_failure_surfaces_from_build() -> Result<()> {
    let points: Vec<[i64; 2]> = (0..1024).map(|i| [i, i]).collect();
    let tiny = BufferAllocator::new(64);
    let err = GridBuilder::new(tiny, 2, config(4))?
        .build(points.as_slice())
        .expect_err("64 bytes cannot hold 1024 points");
    assert!(matches!(err, Error::AllocationFailed { .. }));
    Ok(())
}

#[test]
fn close_is_idempotent() -> Result<()> {
    let points: Vec<[i64; 2]> = (0..32).map(|i| [i, i]).collect();
    let mut grid = build(2, 4, &points)?;
    grid.close();
    assert_eq!(grid.total(), 0);
    assert_eq!(grid.range_search(&[0, 0], &[100, 100]).count(), 0);
    grid.close();
    Ok(())
}

#[test]
fn point_source_contract_on_grid() -> Result<()> {
    let points: Vec<[i64; 2]> = (0..10).map(|i| [i, 10 - i]).collect();
    let grid = build(2, 4, &points)?;
    assert_eq!(grid.arity(), 2);
    assert_eq!(PointSource::count(&grid), 10);
    let mut seen = 0;
    grid.visit(&mut |p| {
        assert_eq!(p.len(), 2);
        seen += 1;
    });
    assert_eq!(seen, 10);
    Ok(())
}
