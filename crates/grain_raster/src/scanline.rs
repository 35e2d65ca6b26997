//! Recorded coverage
//!
//! [`ScanlineStorage`] is a [`SpanSink`] that keeps the spans it receives so a
//! shape rasterized once can be stamped many times at integer offsets.

use grain_core::PixelRect;
use smallvec::SmallVec;

use crate::error::{RasterError, Result};
use crate::rasterizer::SpanSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StoredSpan {
    y: i32,
    x: i32,
    len: u32,
    offset: u32,
}

/// Spans recorded from a rasterizer sweep
#[derive(Clone, Debug, Default)]
pub struct ScanlineStorage {
    covers: SmallVec<[u8; 512]>,
    spans: Vec<StoredSpan>,
    bounds: Option<PixelRect>,
    error: Option<RasterError>,
}

impl ScanlineStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all spans and any allocation failure.
    pub fn reset(&mut self) {
        self.covers.clear();
        self.spans.clear();
        self.bounds = None;
        self.error = None;
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Pixel bounds of everything recorded.
    pub fn bounds(&self) -> Option<PixelRect> {
        self.bounds
    }

    /// Reports the first allocation failure hit while recording.
    pub fn status(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Re-emit every span shifted by (dx, dy).
    pub fn replay<K: SpanSink + ?Sized>(&self, dx: i32, dy: i32, sink: &mut K) {
        for span in &self.spans {
            let start = span.offset as usize;
            let covers = &self.covers[start..start + span.len as usize];
            sink.blend_span(span.y + dy, span.x + dx, covers);
        }
    }

    fn record(&mut self, y: i32, x: i32, covers: &[u8]) -> Result<()> {
        self.covers
            .try_reserve(covers.len())
            .map_err(|_| RasterError::StorageAllocation {
                requested: covers.len(),
            })?;
        self.spans
            .try_reserve(1)
            .map_err(|_| RasterError::StorageAllocation {
                requested: std::mem::size_of::<StoredSpan>(),
            })?;

        let offset = self.covers.len() as u32;
        self.covers.extend_from_slice(covers);
        self.spans.push(StoredSpan {
            y,
            x,
            len: covers.len() as u32,
            offset,
        });

        let span_rect = PixelRect::new(x, y, x + covers.len() as i32, y + 1);
        self.bounds = Some(match self.bounds {
            None => span_rect,
            Some(b) => PixelRect::new(
                b.x1.min(span_rect.x1),
                b.y1.min(span_rect.y1),
                b.x2.max(span_rect.x2),
                b.y2.max(span_rect.y2),
            ),
        });
        Ok(())
    }
}

impl SpanSink for ScanlineStorage {
    fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
        if self.error.is_some() || covers.is_empty() {
            return;
        }
        if let Err(err) = self.record(y, x, covers) {
            tracing::warn!(%err, "dropping recorded spans");
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rasterizer;
    use grain_core::Path;

    #[derive(Default)]
    struct Collect(Vec<(i32, i32, Vec<u8>)>);

    impl SpanSink for Collect {
        fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
            self.0.push((y, x, covers.to_vec()));
        }
    }

    #[test]
    fn test_replay_with_offset() {
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(0.0, 0.0, 2.0, 2.0).iter());
        let mut storage = ScanlineStorage::new();
        ras.sweep(&mut storage);
        assert_eq!(storage.span_count(), 2);
        assert_eq!(storage.bounds(), Some(PixelRect::new(0, 0, 2, 2)));
        assert!(storage.status().is_ok());

        let mut out = Collect::default();
        storage.replay(10, 20, &mut out);
        assert_eq!(
            out.0,
            vec![(20, 10, vec![255, 255]), (21, 10, vec![255, 255])]
        );
    }

    #[test]
    fn test_reset_clears() {
        let mut storage = ScanlineStorage::new();
        storage.blend_span(3, 4, &[10, 20]);
        storage.reset();
        assert!(storage.is_empty());
        assert_eq!(storage.bounds(), None);
    }
}
