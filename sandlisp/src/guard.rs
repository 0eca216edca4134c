use crate::config::Config;
use crate::eval::EvalErr;
use std::time::{Duration, Instant};

/// Accounting for a single top-level evaluation: counts steps, watches the
/// clock and tracks how deep evaluation is nested.
#[derive(Debug)]
pub struct ExecutionGuard {
    operations: u64,
    max_operations: u64,
    started: Instant,
    timeout: Duration,
    depth: usize,
    max_depth: usize,
}

impl ExecutionGuard {
    pub fn new(config: &Config) -> Self {
        ExecutionGuard{
            operations: 0,
            max_operations: config.max_operations,
            started: Instant::now(),
            timeout: config.timeout,
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    pub fn reset(&mut self) {
        self.operations = 0;
        self.depth = 0;
        self.started = Instant::now();
    }

    /// Account for one evaluation step that nests one level deeper.
    /// Each successful `enter` must be paired with a `leave`.
    pub fn enter(&mut self) -> Result<(), EvalErr> {
        self.operations += 1;
        if self.operations > self.max_operations {
            return Err(EvalErr::ExecutionLimitExceeded("too many operations".to_string()));
        }
        let elapsed = self.started.elapsed();
        if elapsed > self.timeout {
            return Err(EvalErr::ExecutionTimeout(self.timeout));
        }
        if self.depth >= self.max_depth {
            return Err(EvalErr::ExecutionLimitExceeded(
                "maximum evaluation depth exceeded".to_string()));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn operations(&self) -> u64 { self.operations }

    pub fn elapsed(&self) -> Duration { self.started.elapsed() }
}

#[cfg(test)]
mod tests {
    use super::ExecutionGuard;
    use crate::config::Config;
    use crate::eval::EvalErr;
    use std::time::Duration;

    #[test]
    fn operation_ceiling() {
        let mut guard = ExecutionGuard::new(&Config::default().with_max_operations(3));
        for _ in 0..3 {
            assert!(guard.enter().is_ok());
            guard.leave();
        }
        assert!(matches!(guard.enter(), Err(EvalErr::ExecutionLimitExceeded(_))));
        guard.reset();
        assert!(guard.enter().is_ok());
        assert_eq!(guard.operations(), 1);
    }

    #[test]
    fn depth_ceiling() {
        let mut guard = ExecutionGuard::new(&Config::default().with_max_depth(2));
        assert!(guard.enter().is_ok());
        assert!(guard.enter().is_ok());
        assert_eq!(guard.enter(), Err(EvalErr::ExecutionLimitExceeded(
            "maximum evaluation depth exceeded".into())));
        guard.leave();
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn wall_clock_ceiling() {
        let mut guard = ExecutionGuard::new(&Config::default().with_timeout(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(guard.enter(), Err(EvalErr::ExecutionTimeout(Duration::from_millis(5))));
        guard.reset();
        assert!(guard.enter().is_ok());
    }
}
