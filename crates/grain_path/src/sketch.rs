//! Hand-drawn wobble
//!
//! The flattened polyline is cut into short pieces and each piece end is
//! pushed sideways along a sine wave whose phase advances at a random rate.
//! The random stream restarts on every rewind, so a path always wobbles the
//! same way.

use grain_core::{PathCommand, PathSource, Point, Vertex};
use std::f64::consts::PI;

/// Sketch parameters in device pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SketchParams {
    /// Amplitude of the perpendicular wiggle; 0 disables sketching
    pub scale: f64,
    /// Wavelength along the line
    pub length: f64,
    /// Scale factor by which the wavelength is shrunk or expanded
    pub randomness: f64,
}

impl Default for SketchParams {
    fn default() -> Self {
        Self {
            scale: 0.0,
            length: 128.0,
            randomness: 16.0,
        }
    }
}

/// Linear congruential generator with the classic MSVC constants
#[derive(Clone, Debug)]
struct Lcg {
    seed: u32,
}

impl Lcg {
    const A: u32 = 214_013;
    const C: u32 = 2_531_011;

    fn new(seed: u32) -> Self {
        Self { seed }
    }

    fn next_f64(&mut self) -> f64 {
        self.seed = self.seed.wrapping_mul(Self::A).wrapping_add(Self::C);
        self.seed as f64 / 4_294_967_296.0
    }
}

/// Cuts line segments into pieces about `1 / scale` pixels long
#[derive(Clone, Debug)]
struct Segmenter<S> {
    source: S,
    approximation_scale: f64,
    from: Point,
    to: Point,
    start: Point,
    step: f64,
    t: f64,
    active: bool,
    close_pending: bool,
}

impl<S: PathSource> Segmenter<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            approximation_scale: 1.0,
            from: Point::ZERO,
            to: Point::ZERO,
            start: Point::ZERO,
            step: 1.0,
            t: 0.0,
            active: false,
            close_pending: false,
        }
    }

    fn begin_line(&mut self, to: Point) {
        let len = self.from.distance(to) * self.approximation_scale;
        self.to = to;
        self.step = 1.0 / len.max(1e-30);
        if self.step > 1.0 {
            self.step = 1.0;
        }
        self.t = 0.0;
        self.active = true;
    }

    fn rewind(&mut self) {
        self.source.rewind();
        self.active = false;
        self.close_pending = false;
        self.from = Point::ZERO;
        self.start = Point::ZERO;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        loop {
            if self.active {
                self.t += self.step;
                if self.t >= 1.0 - 1e-12 {
                    self.active = false;
                    self.from = self.to;
                    return Some(Vertex::line_to(self.to.x, self.to.y));
                }
                let p = self.from.lerp(self.to, self.t);
                return Some(Vertex::line_to(p.x, p.y));
            }

            if self.close_pending {
                self.close_pending = false;
                return Some(Vertex::close());
            }

            let v = self.source.next_vertex()?;
            match v.cmd {
                PathCommand::MoveTo => {
                    self.from = v.point();
                    self.start = v.point();
                    return Some(v);
                }
                PathCommand::Close => {
                    if self.from != self.start {
                        self.close_pending = true;
                        let start = self.start;
                        self.begin_line(start);
                        continue;
                    }
                    return Some(v);
                }
                _ => {
                    self.begin_line(v.point());
                }
            }
        }
    }
}

/// Displaces a flattened polyline perpendicular to its direction
#[derive(Clone, Debug)]
pub struct Sketch<S> {
    segmented: Segmenter<S>,
    params: SketchParams,
    p_scale: f64,
    log_randomness: f64,
    rand: Lcg,
    p: f64,
    last: Option<Point>,
}

impl<S: PathSource> Sketch<S> {
    /// A `scale` of zero, or a non-positive `length` or `randomness`,
    /// yields a pass-through stage.
    pub fn new(source: S, params: SketchParams) -> Self {
        let mut segmented = Segmenter::new(source);
        segmented.approximation_scale = 1.0;
        Self {
            segmented,
            params,
            p_scale: (2.0 * PI) / (params.length * params.randomness),
            log_randomness: 2.0 * params.randomness.ln(),
            rand: Lcg::new(0),
            p: 0.0,
            last: None,
        }
    }

    /// Sketch stage that only passes vertices through.
    pub fn disabled(source: S) -> Self {
        Self::new(source, SketchParams::default())
    }

    /// Piece length of the segmenter, in pixels.
    pub fn with_segment_length(mut self, length: f64) -> Self {
        if length > 0.0 {
            self.segmented.approximation_scale = 1.0 / length;
        }
        self
    }

    fn enabled(&self) -> bool {
        let SketchParams {
            scale,
            length,
            randomness,
        } = self.params;
        scale != 0.0
            && scale.is_finite()
            && length > 0.0
            && randomness > 0.0
            && self.p_scale.is_finite()
            && self.log_randomness.is_finite()
    }
}

impl<S: PathSource> PathSource for Sketch<S> {
    fn rewind(&mut self) {
        self.last = None;
        self.p = 0.0;
        self.rand = Lcg::new(0);
        self.segmented.rewind();
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if !self.enabled() {
            return self.segmented.source.next_vertex();
        }

        let mut v = self.segmented.next_vertex()?;
        if v.cmd == PathCommand::Close {
            return Some(v);
        }
        if v.cmd == PathCommand::MoveTo {
            self.last = None;
            self.p = 0.0;
        }

        match self.last {
            Some(last) => {
                let u = self.rand.next_f64();
                self.p += (u * self.log_randomness).exp();
                let den = last.x - v.x;
                let num = last.y - v.y;
                let len2 = num * num + den * den;
                self.last = Some(v.point());
                if len2 != 0.0 {
                    let len = len2.sqrt();
                    let r = (self.p * self.p_scale).sin() * self.params.scale;
                    let r_over_len = r / len;
                    v.x += r_over_len * num;
                    v.y -= r_over_len * den;
                }
            }
            None => self.last = Some(v.point()),
        }
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::{collect_vertices, Path};

    fn params() -> SketchParams {
        SketchParams {
            scale: 2.0,
            length: 20.0,
            randomness: 3.0,
        }
    }

    #[test]
    fn test_lcg_sequence() {
        let mut rng = Lcg::new(0);
        assert_eq!(rng.next_f64(), 2_531_011.0 / 4_294_967_296.0);
        let second = rng.next_f64();
        assert!((0.0..1.0).contains(&second));
    }

    #[test]
    fn test_zero_scale_passes_through() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 0.0)]);
        let out = collect_vertices(&mut Sketch::disabled(path.iter()));
        assert_eq!(out, vec![Vertex::move_to(0.0, 0.0), Vertex::line_to(10.0, 0.0)]);
    }

    #[test]
    fn test_degenerate_params_keep_vertices_finite() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 5.0)]);
        for (length, randomness) in [(20.0, 0.0), (0.0, 3.0), (20.0, -1.0)] {
            let params = SketchParams {
                scale: 2.0,
                length,
                randomness,
            };
            let out = collect_vertices(&mut Sketch::new(path.iter(), params));
            assert_eq!(out, vec![Vertex::move_to(0.0, 0.0), Vertex::line_to(10.0, 5.0)]);
        }
    }

    #[test]
    fn test_wobble_is_bounded_and_deterministic() {
        let path = Path::polyline(&[(0.0, 0.0), (100.0, 0.0)]);
        let mut sketch = Sketch::new(path.iter(), params());
        let first = collect_vertices(&mut sketch);
        let second = collect_vertices(&mut sketch);
        assert_eq!(first, second);

        // Roughly one vertex per pixel of length.
        assert!(first.len() >= 100);
        assert!(first.iter().all(|v| v.y.abs() <= 2.0 + 1e-9));
        assert!(first.iter().any(|v| v.y.abs() > 0.1));
    }

    #[test]
    fn test_closed_path_segments_back_to_start() {
        let path = Path::rectangle(0.0, 0.0, 10.0, 10.0);
        let out = collect_vertices(&mut Sketch::new(path.iter(), params()));
        assert_eq!(out.last().map(|v| v.cmd), Some(PathCommand::Close));
        assert!(out.len() > 40);
    }
}
