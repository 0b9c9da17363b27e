use log::{debug, warn};
use nalgebra::Matrix2;
use sv_core::Point2f;
use sv_topo::{EdgeId, TopologicalGraph, TopologyError};

use crate::FitError;
use crate::bezier::{CubicBezier, bernstein};

/// Relative determinant below which the normal equations count as singular.
const SINGULAR_EPS: f64 = 1e-9;

/// Curve owned by one topological edge.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    pub edge: EdgeId,
    pub bezier: CubicBezier,
    /// Width-weighted RMS deviation of the chain from the curve.
    pub error: f32,
    /// True when the straight-line fallback replaced the least-squares fit.
    pub fallback: bool,
}

/// Arc-length parameter of every chain point, walking `start -> points -> end`.
///
/// Values lie strictly inside `(0, 1)` whenever the walk has positive length.
pub fn chord_parametrize(start: Point2f, points: &[Point2f], end: Point2f) -> Vec<f32> {
    let mut ts = Vec::with_capacity(points.len());
    let mut acc = 0.0_f32;
    let mut prev = start;
    for &p in points {
        acc += prev.distance(p);
        ts.push(acc);
        prev = p;
    }
    let total = acc + prev.distance(end);

    if total <= f32::EPSILON {
        let n = points.len() as f32 + 1.0;
        return (1..=points.len()).map(|i| i as f32 / n).collect();
    }

    for t in &mut ts {
        *t /= total;
    }
    ts
}

/// Closed-form least-squares cubic with fixed endpoints.
///
/// The inner controls `P1`, `P2` solve the 2x2 normal equations shared by
/// both coordinate axes.
pub fn fit_cubic(
    p0: Point2f,
    p3: Point2f,
    points: &[Point2f],
    ts: &[f32],
) -> Result<CubicBezier, FitError> {
    let n = points.len().min(ts.len());
    if n < 2 {
        return Err(FitError::NonConvergentFit {
            samples: n,
            determinant: 0.0,
        });
    }

    let (mut a11, mut a12, mut a22) = (0.0_f64, 0.0_f64, 0.0_f64);
    let mut rhs = Matrix2::<f64>::zeros();
    for (&p, &t) in points.iter().zip(ts) {
        let [b0, b1, b2, b3] = bernstein(t).map(f64::from);
        let rx = f64::from(p.x) - b0 * f64::from(p0.x) - b3 * f64::from(p3.x);
        let ry = f64::from(p.y) - b0 * f64::from(p0.y) - b3 * f64::from(p3.y);

        a11 += b1 * b1;
        a12 += b1 * b2;
        a22 += b2 * b2;
        rhs[(0, 0)] += b1 * rx;
        rhs[(0, 1)] += b1 * ry;
        rhs[(1, 0)] += b2 * rx;
        rhs[(1, 1)] += b2 * ry;
    }

    let normal = Matrix2::new(a11, a12, a12, a22);
    let determinant = normal.determinant();
    if determinant.abs() <= SINGULAR_EPS * (a11 * a22).max(f64::MIN_POSITIVE) {
        return Err(FitError::NonConvergentFit {
            samples: n,
            determinant,
        });
    }

    let solved = normal
        .lu()
        .solve(&rhs)
        .filter(|m| m.iter().all(|v| v.is_finite()))
        .ok_or(FitError::NonConvergentFit {
            samples: n,
            determinant,
        })?;

    Ok(CubicBezier {
        p0,
        p1: Point2f::new(solved[(0, 0)] as f32, solved[(0, 1)] as f32),
        p2: Point2f::new(solved[(1, 0)] as f32, solved[(1, 1)] as f32),
        p3,
    })
}

/// Width-weighted RMS error `sqrt((1/N) * sum (1 - w/2) * |B(t) - p|^2)`.
///
/// Weights are clamped at zero so that strokes wider than two pixels never
/// contribute a negative term.
pub fn chain_error(curve: &CubicBezier, points: &[Point2f], ts: &[f32], widths: &[u32]) -> f32 {
    if points.is_empty() {
        return 0.0;
    }

    let mut sum = 0.0_f32;
    for ((&p, &t), &w) in points.iter().zip(ts).zip(widths) {
        sum += width_weight(w) * curve.eval(t).distance_sq(p);
    }
    (sum / points.len() as f32).max(0.0).sqrt()
}

/// Index of the chain point farthest from its curve position.
pub fn max_error_index(curve: &CubicBezier, points: &[Point2f], ts: &[f32]) -> Option<usize> {
    let mut best = None;
    let mut best_d2 = -1.0_f32;
    for (i, (&p, &t)) in points.iter().zip(ts).enumerate() {
        let d2 = curve.eval(t).distance_sq(p);
        if d2 > best_d2 {
            best_d2 = d2;
            best = Some(i);
        }
    }
    best
}

#[inline]
pub fn width_weight(w: u32) -> f32 {
    (1.0 - w as f32 / 2.0).max(0.0)
}

/// Fits one edge of `graph`, falling back to a straight segment when the
/// least-squares system is singular.
pub fn fit_edge(graph: &TopologicalGraph, id: EdgeId) -> Result<FittedCurve, FitError> {
    let edge = graph.edge(id).ok_or(FitError::UnknownEdge(id))?;
    let anchor = |n| {
        graph
            .node(n)
            .map(|node| node.anchor)
            .ok_or(TopologyError::UnknownNode(n))
    };
    let p0 = anchor(edge.a)?;
    let p3 = anchor(edge.b)?;

    let points: Vec<Point2f> = edge.points().collect();
    let ts = chord_parametrize(p0, &points, p3);

    let (bezier, fallback) = match fit_cubic(p0, p3, &points, &ts) {
        Ok(c) => (c, false),
        Err(FitError::NonConvergentFit {
            samples,
            determinant,
        }) => {
            if samples < 2 {
                debug!("edge {id}: {samples} samples, using straight segment");
            } else {
                warn!("edge {id}: singular fit (det {determinant:e}), using straight segment");
            }
            (CubicBezier::line(p0, p3), true)
        }
        Err(e) => return Err(e),
    };

    Ok(FittedCurve {
        edge: id,
        error: chain_error(&bezier, &points, &ts, &edge.widths),
        bezier,
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use sv_core::Point2f;
    use sv_topo::{NodeKind, TopologicalGraph};

    use super::{
        chain_error, chord_parametrize, fit_cubic, fit_edge, max_error_index, width_weight,
    };
    use crate::FitError;
    use crate::bezier::CubicBezier;

    fn close(a: Point2f, b: Point2f) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn parametrization_is_monotone_and_interior() {
        let pts: Vec<Point2f> = (1..5).map(|x| Point2f::new(x as f32, 0.0)).collect();
        let ts = chord_parametrize(Point2f::new(0.0, 0.0), &pts, Point2f::new(5.0, 0.0));
        assert_eq!(ts.len(), 4);
        for (i, t) in ts.iter().enumerate() {
            assert!((t - (i + 1) as f32 / 5.0).abs() < 1e-6);
        }

        let p = Point2f::new(2.0, 2.0);
        let degenerate = chord_parametrize(p, &[p, p], p);
        assert_eq!(degenerate.len(), 2);
        assert!(degenerate[0] < degenerate[1]);
    }

    #[test]
    fn recovers_exact_cubic() {
        let truth = CubicBezier::new(
            Point2f::new(0.0, 0.0),
            Point2f::new(2.0, 8.0),
            Point2f::new(9.0, 7.0),
            Point2f::new(12.0, 1.0),
        );
        let ts: Vec<f32> = (1..20).map(|i| i as f32 / 20.0).collect();
        let pts: Vec<Point2f> = ts.iter().map(|&t| truth.eval(t)).collect();

        let fit = fit_cubic(truth.p0, truth.p3, &pts, &ts).expect("well-posed system");
        assert!(close(fit.p1, truth.p1));
        assert!(close(fit.p2, truth.p2));
        assert!(chain_error(&fit, &pts, &ts, &vec![0; pts.len()]) < 1e-3);
    }

    #[test]
    fn too_few_samples_is_non_convergent() {
        let p = Point2f::new(0.0, 0.0);
        let q = Point2f::new(4.0, 0.0);
        let err = fit_cubic(p, q, &[Point2f::new(2.0, 0.0)], &[0.5]).unwrap_err();
        assert_eq!(
            err,
            FitError::NonConvergentFit {
                samples: 1,
                determinant: 0.0
            }
        );

        // Samples sharing one parameter leave the system rank deficient.
        let pts = [Point2f::new(2.0, 1.0), Point2f::new(2.0, -1.0)];
        assert!(matches!(
            fit_cubic(p, q, &pts, &[0.5, 0.5]),
            Err(FitError::NonConvergentFit { samples: 2, .. })
        ));
    }

    #[test]
    fn error_is_weighted_by_width() {
        let line = CubicBezier::line(Point2f::new(0.0, 0.0), Point2f::new(4.0, 0.0));
        let pts = [Point2f::new(2.0, 2.0)];
        let ts = [0.5];

        assert!((chain_error(&line, &pts, &ts, &[0]) - 2.0).abs() < 1e-5);
        assert!((chain_error(&line, &pts, &ts, &[1]) - 2.0_f32.sqrt()).abs() < 1e-5);
        assert_eq!(chain_error(&line, &pts, &ts, &[6]), 0.0);
        assert_eq!(width_weight(4), 0.0);
        assert_eq!(max_error_index(&line, &pts, &ts), Some(0));
        assert_eq!(chain_error(&line, &[], &[], &[]), 0.0);
    }

    #[test]
    fn empty_chain_falls_back_to_line() {
        let mut g = TopologicalGraph::new(8, 8);
        let a = g.add_node(NodeKind::Junction, (1, 1), vec![(1, 1)]);
        let b = g.add_node(NodeKind::Corner, (2, 2), vec![(2, 2)]);
        let e = g.add_edge(a, b, Vec::new(), Vec::new()).expect("valid edge");

        let fit = fit_edge(&g, e).expect("edge exists");
        assert!(fit.fallback);
        assert_eq!(fit.error, 0.0);
        assert_eq!(
            fit.bezier,
            CubicBezier::line(Point2f::new(1.0, 1.0), Point2f::new(2.0, 2.0))
        );

        assert_eq!(fit_edge(&g, 99), Err(FitError::UnknownEdge(99)));
    }

    #[test]
    fn ring_curve_starts_and_ends_on_its_anchor_pixel() {
        let ring = vec![
            (2, 0),
            (3, 0),
            (4, 0),
            (5, 1),
            (5, 2),
            (4, 3),
            (3, 3),
            (2, 3),
            (1, 2),
            (1, 1),
        ];
        let mut g = TopologicalGraph::new(8, 8);
        let a = g.add_node(NodeKind::LoopAnchor, ring[0], vec![ring[0]]);
        let e = g.add_edge(a, a, ring.clone(), vec![0; ring.len()]).expect("valid loop");

        let fit = fit_edge(&g, e).expect("edge exists");
        let anchor = Point2f::new(2.0, 0.0);
        assert!(!fit.fallback);
        assert_eq!(fit.bezier.p0, anchor);
        assert_eq!(fit.bezier.p3, anchor);

        let points: Vec<Point2f> = g.edge(e).expect("live").points().collect();
        let ts = chord_parametrize(anchor, &points, anchor);
        assert_eq!(ts[0], 0.0);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
    }
}
