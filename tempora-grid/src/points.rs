//! Point sources for grid construction.
//!
//! Build streams the input twice (once to calibrate histograms, once to
//! route points into cells), so a source must be re-iterable rather than a
//! one-shot iterator.

use tempora_result::{Error, Result};

/// A finite, re-iterable source of k-dimensional integer points.
pub trait PointSource {
    /// Point arity, i.e. `k`. Sources with no points may report 0.
    fn arity(&self) -> usize;

    /// Number of points.
    fn count(&self) -> usize;

    /// Call `f` once per point, in a stable order.
    fn visit(&self, f: &mut dyn FnMut(&[i64]));
}

impl<P: AsRef<[i64]>> PointSource for [P] {
    fn arity(&self) -> usize {
        self.first().map(|p| p.as_ref().len()).unwrap_or(0)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn visit(&self, f: &mut dyn FnMut(&[i64])) {
        for p in self {
            f(p.as_ref());
        }
    }
}

/// Points packed row-major into one flat buffer.
#[derive(Debug, Clone)]
pub struct FlatPoints {
    arity: usize,
    data: Vec<i64>,
}

impl FlatPoints {
    pub fn new(arity: usize, data: Vec<i64>) -> Result<FlatPoints> {
        if arity == 0 {
            return Err(Error::InvalidArgumentError(
                "point arity must be positive".into(),
            ));
        }
        if data.len() % arity != 0 {
            return Err(Error::InvalidArgumentError(format!(
                "flat buffer of {} values is not a multiple of arity {arity}",
                data.len()
            )));
        }
        Ok(FlatPoints { arity, data })
    }
}

impl PointSource for FlatPoints {
    fn arity(&self) -> usize {
        self.arity
    }

    fn count(&self) -> usize {
        self.data.len() / self.arity
    }

    fn visit(&self, f: &mut dyn FnMut(&[i64])) {
        for row in self.data.chunks_exact(self.arity) {
            f(row);
        }
    }
}
