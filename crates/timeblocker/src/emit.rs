//! Hands a finished layout to its consumer.

use crate::allocate::Layout;
use crate::error::Result;
use crate::interval::LanedInterval;

/// Consumer of laned intervals, fed in the order the allocator produced them
pub trait LayoutSink {
    fn emit(&mut self, laned: &LanedInterval) -> Result<()>;

    /// Called once after the last interval
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl LayoutSink for Vec<LanedInterval> {
    fn emit(&mut self, laned: &LanedInterval) -> Result<()> {
        self.push(*laned);
        Ok(())
    }
}

impl<S: LayoutSink + ?Sized> LayoutSink for Box<S> {
    fn emit(&mut self, laned: &LanedInterval) -> Result<()> {
        (**self).emit(laned)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Passes every interval through unchanged, then finishes the sink.
/// Returns the number of intervals emitted.
pub fn emit_layout<S: LayoutSink + ?Sized>(layout: &Layout, sink: &mut S) -> Result<usize> {
    for laned in &layout.intervals {
        sink.emit(laned)?;
    }
    sink.finish()?;
    Ok(layout.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::{AllocatorOptions, GroupOrder, allocate};
    use crate::error::TimeblockError;
    use crate::interval::Interval;
    use crate::quantize::TimeStep;

    struct FailingSink {
        accepted: usize,
        finished: bool,
    }

    impl LayoutSink for FailingSink {
        fn emit(&mut self, _laned: &LanedInterval) -> Result<()> {
            if self.accepted == 1 {
                return Err(TimeblockError::Render("sink full".to_string()));
            }
            self.accepted += 1;
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn sample_layout() -> Layout {
        let opts = AllocatorOptions {
            time_step: TimeStep::new(2).unwrap(),
            min_time_block_offset: 0,
            group_order: GroupOrder::LongestFirst,
        };
        allocate(
            [(4, 6), (4, 8), (6, 10), (6, 8)].map(|(b, e)| Interval::new(b, e)),
            &opts,
        )
    }

    #[test]
    fn test_emit_preserves_flush_order() {
        let layout = sample_layout();
        let mut sink: Vec<LanedInterval> = Vec::new();
        let count = emit_layout(&layout, &mut sink).unwrap();
        assert_eq!(count, 4);
        assert_eq!(sink, layout.intervals);
    }

    #[test]
    fn test_emit_through_boxed_sink() {
        let layout = sample_layout();
        let mut sink: Box<dyn LayoutSink> = Box::new(Vec::<LanedInterval>::new());
        assert_eq!(emit_layout(&layout, &mut sink).unwrap(), 4);
    }

    #[test]
    fn test_sink_error_propagates() {
        let layout = sample_layout();
        let mut sink = FailingSink {
            accepted: 0,
            finished: false,
        };
        let err = emit_layout(&layout, &mut sink).unwrap_err();
        assert_eq!(err.to_string(), "Render error: sink full");
        assert!(!sink.finished);
    }

    #[test]
    fn test_empty_layout_still_finishes() {
        let mut sink = FailingSink {
            accepted: 0,
            finished: false,
        };
        assert_eq!(emit_layout(&Layout::default(), &mut sink).unwrap(), 0);
        assert!(sink.finished);
    }
}
