//! Coarse-grained progress reporting and cooperative cancellation for long computations.

use crate::error::{Error, Result};

/// Receives progress notifications from long-running computations.
///
/// Both methods have no-op defaults so an observer only implements what it needs. The unit type
/// implements the trait for callers that don't care.
pub trait Observer {
    /// Called with the amount of work done so far, out of `total`.
    fn progress(&mut self, _done: usize, _total: usize) {}

    /// Polled by the computation; returning `true` aborts it with [`Error::Cancelled`].
    fn cancelled(&self) -> bool {
        false
    }
}

impl Observer for () {}

/// Turns fine-grained ticks into percentage steps and polls the observer for cancellation on
/// each step.
pub(crate) struct Progress<'a> {
    observer: &'a mut dyn Observer,
    total: usize,
    done: usize,
    last_percent: usize,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(observer: &'a mut dyn Observer, total: usize) -> Self {
        Self {
            observer,
            total,
            done: 0,
            last_percent: 0,
        }
    }

    /// Records one unit of work.
    pub(crate) fn tick(&mut self) -> Result<()> {
        self.advance(1)
    }

    /// Records `n` units of work.
    pub(crate) fn advance(&mut self, n: usize) -> Result<()> {
        self.done = (self.done + n).min(self.total);

        let percent = if self.total == 0 {
            100
        } else {
            self.done * 100 / self.total
        };

        if percent != self.last_percent || self.done == self.total {
            self.last_percent = percent;
            self.observer.progress(self.done, self.total);

            if self.observer.cancelled() {
                return Err(Error::Cancelled);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every notification and cancels after a number of them.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) calls: Vec<(usize, usize)>,
        pub(crate) cancel_after: Option<usize>,
    }

    impl Observer for Recorder {
        fn progress(&mut self, done: usize, total: usize) {
            self.calls.push((done, total));
        }

        fn cancelled(&self) -> bool {
            self.cancel_after
                .map_or(false, |limit| self.calls.len() >= limit)
        }
    }

    #[test]
    fn percentage_steps() {
        let mut recorder = Recorder::default();
        let mut progress = Progress::new(&mut recorder, 1000);

        for _ in 0..1000 {
            progress.tick().unwrap();
        }

        // One notification per percent.
        assert_eq!(recorder.calls.len(), 100);
        assert_eq!(recorder.calls.last(), Some(&(1000, 1000)));
    }

    #[test]
    fn cancellation() {
        let mut recorder = Recorder {
            cancel_after: Some(3),
            ..Default::default()
        };
        let mut progress = Progress::new(&mut recorder, 10);

        assert!(progress.tick().is_ok());
        assert!(progress.tick().is_ok());
        assert_eq!(progress.tick(), Err(Error::Cancelled));
    }

    #[test]
    fn unit_observer() {
        let mut observer = ();
        let mut progress = Progress::new(&mut observer, 2);

        assert!(progress.advance(2).is_ok());
    }
}
