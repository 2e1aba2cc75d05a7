//! Backend-independent geometry: arc widths, arc shapes, and coverage steps.

use crate::errors::Error;
use crate::errors::Result;
use crate::region::event::ArcDirection;
use crate::region::GenomicInterval;
use crate::region::JunctionId;

/// Width of the arc for the least-supported junction.
pub const MIN_ARC_WIDTH: f64 = 0.5;

/// Width of the arc for the best-supported junction.
pub const MAX_ARC_WIDTH: f64 = 1.5;

/// Width of an arc for a junction without reads.
pub const ZERO_READ_ARC_WIDTH: f64 = 0.25;

/// Arc height, as a fraction of the panel's peak coverage, before curvature
/// scaling.
pub const ARC_HEIGHT_FRACTION: f64 = 0.5;

/// Number of straight segments used to approximate an arc.
pub const ARC_SEGMENTS: usize = 64;

/// A point in data coordinates (genomic position, depth).
pub type Point = (f64, f64);

//============//
// Line width //
//============//

/// Maps read counts linearly onto `[MIN_ARC_WIDTH, MAX_ARC_WIDTH]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineWidthScale {
    min: u64,
    max: u64,
}

impl LineWidthScale {
    /// Builds the scale from every read count that will be drawn. Fails when
    /// there are no counts at all.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let (min, max) = counts
            .into_iter()
            .fold(None, |acc: Option<(u64, u64)>, reads| match acc {
                Some((min, max)) => Some((min.min(reads), max.max(reads))),
                None => Some((reads, reads)),
            })
            .ok_or(Error::NoJunctionsToRender)?;

        Ok(Self { min, max })
    }

    /// The stroke width for a junction with `reads` reads.
    pub fn width(&self, reads: u64) -> f64 {
        if reads == 0 {
            return ZERO_READ_ARC_WIDTH;
        }

        if self.max == self.min {
            return MIN_ARC_WIDTH;
        }

        let factor = (MAX_ARC_WIDTH - MIN_ARC_WIDTH) / (self.max - self.min) as f64;
        MIN_ARC_WIDTH + reads.saturating_sub(self.min) as f64 * factor
    }
}

//=====//
// Arc //
//=====//

/// Scales arc height down as junctions get longer, so that long junctions do
/// not dwarf the coverage track.
pub fn curvature(span: u64) -> f64 {
    match span {
        0..=999 => 1.0,
        1000..=2499 => 0.8,
        2500..=4999 => 0.6,
        5000..=9999 => 0.45,
        _ => 0.3,
    }
}

/// A cubic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    /// The start point.
    pub p0: Point,

    /// The first control point.
    pub p1: Point,

    /// The second control point.
    pub p2: Point,

    /// The end point.
    pub p3: Point,
}

impl CubicBezier {
    /// Evaluates the curve at `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);

        (
            a * self.p0.0 + b * self.p1.0 + c * self.p2.0 + d * self.p3.0,
            a * self.p0.1 + b * self.p1.1 + c * self.p2.1 + d * self.p3.1,
        )
    }

    /// The point at `t = 0.5`, where the read count label goes.
    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// Approximates the curve with `segments` straight segments.
    pub fn flatten(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }
}

/// Computes the arc for `junction` over a panel showing `coverage` for
/// `interval`.
///
/// The arc runs from the base preceding the junction to the base following
/// it. Junctions whose flanking bases are not strictly inside the interval are
/// not drawn and yield `None`.
pub fn junction_arc(
    interval: &GenomicInterval,
    coverage: &[u64],
    junction: &JunctionId,
    direction: ArcDirection,
    panel_peak: u64,
) -> Result<Option<CubicBezier>> {
    let (_, start, end) = junction.coordinates()?;

    let left = match start.checked_sub(1) {
        Some(left) => left,
        None => return Ok(None),
    };
    if !(interval.strictly_contains(left) && interval.strictly_contains(end)) {
        return Ok(None);
    }

    let height_at = |position: u64| {
        coverage
            .get((position - interval.start()) as usize)
            .copied()
            .unwrap_or(0) as f64
    };

    let (y0, y3) = match direction {
        ArcDirection::FromCoverage => (height_at(left), height_at(end)),
        ArcDirection::Baseline => (0.0, 0.0),
    };

    let lift = ARC_HEIGHT_FRACTION * panel_peak as f64 * curvature(end - left);
    let (x0, x3) = (left as f64, end as f64);

    Ok(Some(CubicBezier {
        p0: (x0, y0),
        p1: (x0, y0 + lift),
        p2: (x3, y3 + lift),
        p3: (x3, y3),
    }))
}

//==========//
// Coverage //
//==========//

/// The outline of a coverage track drawn as a "pre" step function: each value
/// holds over the base leading up to its position.
pub fn step_points(start: u64, coverage: &[u64]) -> Vec<Point> {
    let mut points = Vec::with_capacity(coverage.len() * 2);

    for (i, depth) in coverage.iter().enumerate() {
        let x = (start + i as u64) as f64;
        let y = *depth as f64;

        if i > 0 {
            points.push((x - 1.0, y));
        }
        points.push((x, y));
    }

    points
}

/// Tick positions along the x axis: from the interval start in steps of a
/// tenth of the interval length.
pub fn tick_positions(interval: &GenomicInterval) -> Vec<u64> {
    let step = (interval.len() / 10).max(1);
    (interval.start()..interval.end())
        .step_by(step as usize)
        .collect()
}
