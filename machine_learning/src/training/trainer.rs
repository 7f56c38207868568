use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::{debug, warn};

use crate::Result;

/// Something that can be trained one step at a time.
pub trait Trainer {
    /// What a single step reports back.
    type Progress;

    /// Runs exactly one training step.
    fn step(&mut self) -> Result<Self::Progress>;
}

impl<T: Trainer + ?Sized> Trainer for &mut T {
    type Progress = T::Progress;

    fn step(&mut self) -> Result<Self::Progress> {
        (**self).step()
    }
}

/// A cancellation flag shared between a training loop and whoever wants to stop it.
///
/// Clones share the same flag, so it can be set from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every loop holding this flag to stop before its next step.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives a `Trainer` as an iterator, every `next` running one step.
///
/// The loop ends when its stop flag is set, when its step limit is reached or right after a step
/// fails; the failing step's error is the last item yielded.
pub struct TrainingLoop<T: Trainer> {
    trainer: T,
    stop: StopFlag,
    limit: Option<usize>,
    steps: usize,
    failed: bool,
}

impl<T: Trainer> TrainingLoop<T> {
    /// Creates a new `TrainingLoop`.
    ///
    /// # Arguments
    /// * `trainer` - The trainer to drive.
    /// * `stop` - The flag checked between steps.
    /// * `limit` - The maximum amount of steps, `None` to run until stopped.
    pub fn new(trainer: T, stop: StopFlag, limit: Option<usize>) -> Self {
        Self {
            trainer,
            stop,
            limit,
            steps: 0,
            failed: false,
        }
    }

    /// The amount of steps run so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    /// Ends the loop, giving back its trainer.
    pub fn into_inner(self) -> T {
        self.trainer
    }
}

impl<T: Trainer> Iterator for TrainingLoop<T> {
    type Item = Result<T::Progress>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.limit.is_some_and(|limit| self.steps >= limit) {
            return None;
        }

        if self.stop.is_stopped() {
            debug!(steps = self.steps; "training loop stopped");
            return None;
        }

        self.steps += 1;
        let progress = self.trainer.step();

        if let Err(e) = &progress {
            warn!(step = self.steps; "training step failed: {e}");
            self.failed = true;
        }

        Some(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MlErr;

    struct Counter {
        count: usize,
        fail_at: Option<usize>,
        stop_at: Option<(usize, StopFlag)>,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                count: 0,
                fail_at: None,
                stop_at: None,
            }
        }
    }

    impl Trainer for Counter {
        type Progress = usize;

        fn step(&mut self) -> Result<usize> {
            self.count += 1;

            if self.fail_at == Some(self.count) {
                return Err(MlErr::InvalidInput("boom"));
            }

            if let Some((at, stop)) = &self.stop_at {
                if *at == self.count {
                    stop.stop();
                }
            }

            Ok(self.count)
        }
    }

    #[test]
    fn runs_up_to_the_limit() {
        let mut training = TrainingLoop::new(Counter::new(), StopFlag::new(), Some(3));

        let steps: Vec<usize> = training.by_ref().map(|p| p.unwrap()).collect();

        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(training.steps(), 3);
        assert!(training.next().is_none());
        assert_eq!(training.into_inner().count, 3);
    }

    #[test]
    fn a_set_flag_stops_before_the_next_step() {
        let stop = StopFlag::new();
        let mut counter = Counter::new();
        counter.stop_at = Some((4, stop.clone()));

        let steps: Vec<usize> = TrainingLoop::new(counter, stop.clone(), None)
            .map(|p| p.unwrap())
            .collect();

        assert_eq!(steps, vec![1, 2, 3, 4]);
        assert!(stop.is_stopped());
    }

    #[test]
    fn a_stopped_flag_runs_nothing() {
        let stop = StopFlag::new();
        stop.stop();

        let mut training = TrainingLoop::new(Counter::new(), stop, Some(10));

        assert!(training.next().is_none());
        assert_eq!(training.trainer().count, 0);
    }

    #[test]
    fn halts_after_yielding_an_error() {
        let mut counter = Counter::new();
        counter.fail_at = Some(2);

        let items: Vec<Result<usize>> = TrainingLoop::new(counter, StopFlag::new(), None).collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(1));
        assert!(items[1].is_err());
    }
}
