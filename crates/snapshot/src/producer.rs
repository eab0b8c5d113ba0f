//! Write-side record producers
//!
//! The writer pulls records one at a time from a [`RecordProducer`] until it
//! reports exhaustion with `Ok(None)`. Every section uses the same signal.
//!
//! Producers over a live ledger must keep it from being mutated for the
//! whole sweep, typically by holding a read lock (see
//! [`LedgerReadGuard`](crate::ledger::LedgerReadGuard)).

use crate::error::CallbackError;

/// Pull-based source of records
pub trait RecordProducer<T> {
    /// Next record, `Ok(None)` once exhausted.
    ///
    /// After returning `Ok(None)` or an error the producer is not polled
    /// again.
    fn next(&mut self) -> Result<Option<T>, CallbackError>;
}

impl<T, F> RecordProducer<T> for F
where
    F: FnMut() -> Result<Option<T>, CallbackError>,
{
    fn next(&mut self) -> Result<Option<T>, CallbackError> {
        self()
    }
}

/// Producer over an infallible iterator
#[derive(Debug, Clone)]
pub struct IterProducer<I> {
    iter: I,
}

impl<I> IterProducer<I> {
    /// Wrap an iterator
    pub fn new(iter: I) -> Self {
        IterProducer { iter }
    }

    /// Unwrap the iterator
    pub fn into_inner(self) -> I {
        self.iter
    }
}

impl<I: Iterator> RecordProducer<I::Item> for IterProducer<I> {
    fn next(&mut self) -> Result<Option<I::Item>, CallbackError> {
        Ok(self.iter.next())
    }
}

/// Create a producer from anything iterable
pub fn from_iter<I: IntoIterator>(iter: I) -> IterProducer<I::IntoIter> {
    IterProducer::new(iter.into_iter())
}

/// Producer that is exhausted from the start.
///
/// Used as the output producer of delta snapshots, which have no outputs
/// section.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecords;

impl<T> RecordProducer<T> for NoRecords {
    fn next(&mut self) -> Result<Option<T>, CallbackError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T, P: RecordProducer<T>>(producer: &mut P) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(item) = producer.next().unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_iter_producer() {
        let mut producer = from_iter(vec![1u32, 2, 3]);
        assert_eq!(drain(&mut producer), vec![1, 2, 3]);
        assert!(producer.next().unwrap().is_none());
    }

    #[test]
    fn test_closure_producer() {
        let mut remaining = 2u32;
        let mut producer = || -> Result<Option<u32>, CallbackError> {
            if remaining == 0 {
                return Ok(None);
            }
            remaining -= 1;
            Ok(Some(remaining))
        };
        assert_eq!(drain(&mut producer), vec![1, 0]);
    }

    #[test]
    fn test_closure_producer_error() {
        let mut producer = || -> Result<Option<u32>, CallbackError> { Err("store closed".into()) };
        let err = RecordProducer::next(&mut producer).unwrap_err();
        assert_eq!(err.to_string(), "store closed");
    }

    #[test]
    fn test_no_records() {
        let mut producer = NoRecords;
        assert!(RecordProducer::<u8>::next(&mut producer).unwrap().is_none());
    }
}
