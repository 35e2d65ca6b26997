//! Polyline simplification
//!
//! Runs of `LineTo` vertices that stay within a perpendicular distance of the
//! current direction vector are collapsed. For each run the furthest point
//! forward along the vector and the furthest point behind its start are kept,
//! in the order they occurred, so back-and-forth scribbles in dense data keep
//! their full extent.

use grain_core::{PathCommand, PathSource, Point, Vertex};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, Default)]
struct Extreme {
    norm2: f64,
    point: Point,
    seq: usize,
}

/// Collapses nearly collinear line runs
#[derive(Clone, Debug)]
pub struct PathSimplifier<S> {
    source: S,
    enabled: bool,
    threshold_sq: f64,
    queue: SmallVec<[Vertex; 8]>,
    queue_pos: usize,
    done: bool,

    has_vector: bool,
    origin: Point,
    dir: (f64, f64),
    dir_norm2: f64,
    forward: Extreme,
    backward: Extreme,
    last: Point,
    last_is_extreme: bool,
    seq: usize,

    subpath_start: Point,
    pending_move: bool,
}

impl<S: PathSource> PathSimplifier<S> {
    /// `threshold` is the perpendicular tolerance in device pixels.
    pub fn new(source: S, enabled: bool, threshold: f64) -> Self {
        Self {
            source,
            enabled,
            threshold_sq: threshold * threshold,
            queue: SmallVec::new(),
            queue_pos: 0,
            done: false,
            has_vector: false,
            origin: Point::ZERO,
            dir: (0.0, 0.0),
            dir_norm2: 0.0,
            forward: Extreme::default(),
            backward: Extreme::default(),
            last: Point::ZERO,
            last_is_extreme: false,
            seq: 0,
            subpath_start: Point::ZERO,
            pending_move: false,
        }
    }

    fn start_vector(&mut self, to: Point) {
        let dx = to.x - self.last.x;
        let dy = to.y - self.last.y;
        let norm2 = dx * dx + dy * dy;
        if norm2 == 0.0 {
            self.has_vector = false;
            return;
        }
        self.seq += 1;
        self.has_vector = true;
        self.origin = self.last;
        self.dir = (dx, dy);
        self.dir_norm2 = norm2;
        self.forward = Extreme {
            norm2,
            point: to,
            seq: self.seq,
        };
        self.backward = Extreme::default();
        self.last = to;
        self.last_is_extreme = true;
    }

    /// Queue the extremes of the current run, then its last point if that
    /// was not already one of them.
    fn flush_run(&mut self) {
        if !self.has_vector {
            return;
        }
        self.has_vector = false;

        let forward = self.forward;
        let backward = self.backward;
        if backward.norm2 > 0.0 && backward.seq < forward.seq {
            self.queue.push(Vertex::line_to(backward.point.x, backward.point.y));
            self.queue.push(Vertex::line_to(forward.point.x, forward.point.y));
        } else {
            self.queue.push(Vertex::line_to(forward.point.x, forward.point.y));
            if backward.norm2 > 0.0 {
                self.queue.push(Vertex::line_to(backward.point.x, backward.point.y));
            }
        }
        if !self.last_is_extreme {
            self.queue.push(Vertex::line_to(self.last.x, self.last.y));
        }
    }

    fn add_line(&mut self, p: Point) {
        if !self.has_vector {
            if self.pending_move {
                self.queue.push(Vertex::move_to(self.last.x, self.last.y));
                self.pending_move = false;
            }
            self.start_vector(p);
            return;
        }

        let tot_x = p.x - self.origin.x;
        let tot_y = p.y - self.origin.y;
        let tot_dot = self.dir.0 * tot_x + self.dir.1 * tot_y;
        let para_x = tot_dot * self.dir.0 / self.dir_norm2;
        let para_y = tot_dot * self.dir.1 / self.dir_norm2;
        let perp_x = tot_x - para_x;
        let perp_y = tot_y - para_y;
        let perp_norm2 = perp_x * perp_x + perp_y * perp_y;

        if perp_norm2 < self.threshold_sq {
            self.seq += 1;
            let para_norm2 = para_x * para_x + para_y * para_y;
            self.last_is_extreme = false;
            if tot_dot > 0.0 {
                if para_norm2 > self.forward.norm2 {
                    self.forward = Extreme {
                        norm2: para_norm2,
                        point: p,
                        seq: self.seq,
                    };
                    self.last_is_extreme = true;
                }
            } else if para_norm2 > self.backward.norm2 {
                self.backward = Extreme {
                    norm2: para_norm2,
                    point: p,
                    seq: self.seq,
                };
                self.last_is_extreme = true;
            }
            self.last = p;
            return;
        }

        self.flush_run();
        self.start_vector(p);
    }

    fn fill_queue(&mut self) -> bool {
        self.queue.clear();
        self.queue_pos = 0;

        while self.queue.is_empty() {
            if self.done {
                return false;
            }
            let Some(v) = self.source.next_vertex() else {
                self.flush_run();
                self.done = true;
                continue;
            };
            let p = v.point();

            match v.cmd {
                PathCommand::MoveTo => {
                    self.flush_run();
                    self.last = p;
                    self.subpath_start = p;
                    self.pending_move = true;
                }
                PathCommand::LineTo => self.add_line(p),
                PathCommand::Close => {
                    self.flush_run();
                    if !self.pending_move {
                        self.queue.push(v);
                    }
                    self.last = self.subpath_start;
                    self.pending_move = true;
                }
                PathCommand::Curve3 | PathCommand::Curve4 => {
                    self.flush_run();
                    if self.pending_move {
                        self.queue.push(Vertex::move_to(self.last.x, self.last.y));
                        self.pending_move = false;
                    }
                    self.queue.push(v);
                    self.last = p;
                }
            }
        }
        true
    }
}

impl<S: PathSource> PathSource for PathSimplifier<S> {
    fn rewind(&mut self) {
        self.source.rewind();
        self.queue.clear();
        self.queue_pos = 0;
        self.done = false;
        self.has_vector = false;
        self.pending_move = false;
        self.last = Point::ZERO;
        self.seq = 0;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if !self.enabled {
            return self.source.next_vertex();
        }
        if self.queue_pos >= self.queue.len() && !self.fill_queue() {
            return None;
        }
        let v = self.queue[self.queue_pos];
        self.queue_pos += 1;
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::{collect_vertices, Path};

    fn simplify(points: &[(f64, f64)]) -> Vec<Vertex> {
        let path = Path::polyline(points);
        collect_vertices(&mut PathSimplifier::new(path.iter(), true, 1.0 / 9.0))
    }

    #[test]
    fn test_collinear_run_collapses() {
        let out = simplify(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.01), (3.0, 0.0), (4.0, 0.0)]);
        assert_eq!(out, vec![Vertex::move_to(0.0, 0.0), Vertex::line_to(4.0, 0.0)]);
    }

    #[test]
    fn test_corner_kept() {
        let out = simplify(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        assert_eq!(
            out,
            vec![
                Vertex::move_to(0.0, 0.0),
                Vertex::line_to(5.0, 0.0),
                Vertex::line_to(5.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_backtrack_keeps_extremes() {
        let out = simplify(&[(0.0, 0.0), (2.0, 0.0), (10.0, 0.0), (-3.0, 0.0), (1.0, 0.0)]);
        assert_eq!(
            out,
            vec![
                Vertex::move_to(0.0, 0.0),
                Vertex::line_to(10.0, 0.0),
                Vertex::line_to(-3.0, 0.0),
                Vertex::line_to(1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_close_preserved() {
        let path = Path::rectangle(0.0, 0.0, 4.0, 4.0);
        let out = collect_vertices(&mut PathSimplifier::new(path.iter(), true, 1.0 / 9.0));
        assert_eq!(out.len(), 5);
        assert_eq!(out[4].cmd, PathCommand::Close);
    }

    #[test]
    fn test_output_stays_near_input() {
        let points: Vec<(f64, f64)> = (0..200)
            .map(|i| (i as f64 * 0.5, ((i as f64) * 0.7).sin() * 0.05))
            .collect();
        let out = simplify(&points);
        assert!(out.len() < points.len());
        for (x, y) in points {
            let near = out
                .windows(2)
                .any(|w| distance_to_segment((x, y), w[0].point(), w[1].point()) < 2.0 / 9.0 + 1e-9);
            assert!(near, "({x}, {y}) drifted from the simplified line");
        }
    }

    fn distance_to_segment(p: (f64, f64), a: Point, b: Point) -> f64 {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len2 = dx * dx + dy * dy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((p.0 - a.x) * dx + (p.1 - a.y) * dy) / len2).clamp(0.0, 1.0)
        };
        Point::new(p.0, p.1).distance(Point::new(a.x + t * dx, a.y + t * dy))
    }
}
