use rand::{Rng, SeedableRng, rngs::StdRng};
use tempora_grid::Histogram;

#[test]
fn uniform_monotone_under_random_streams() {
    let mut rng = StdRng::seed_from_u64(0x5EED_CAFE);
    for round in 0..20 {
        let mut h = Histogram::with_max_bins(32);
        let n = rng.random_range(1..2000);
        for _ in 0..n {
            h.update(rng.random_range(-1e6..1e6));
        }
        for buckets in [1usize, 2, 7, 64] {
            let q = h.uniform(buckets);
            assert_eq!(q.len(), buckets);
            for w in q.windows(2) {
                assert!(
                    w[0] <= w[1],
                    "round {round}: uniform({buckets}) decreased: {q:?}"
                );
            }
            assert!(*q.last().unwrap() <= h.max().unwrap());
            assert!(q[0] >= h.min().unwrap());
        }
    }
}

#[test]
fn quantiles_bracket_the_distribution() {
    let mut h = Histogram::with_max_bins(64);
    for i in 0..10_000 {
        h.update((i % 100) as f64);
    }
    let q = h.uniform(10);
    assert_eq!(*q.last().unwrap(), 99.0);
    // Deciles of a uniform 0..100 stream land near 10, 20, ... 90.
    for (j, v) in q.iter().take(9).enumerate() {
        let ideal = 10.0 * (j as f64 + 1.0);
        assert!(
            (v - ideal).abs() < 5.0,
            "decile {j} expected near {ideal}, got {v} ({q:?})"
        );
    }
}
