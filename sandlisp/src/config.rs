use std::time::Duration;

/// Resource ceilings applied to every top-level evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Evaluation steps allowed, one per expression node visited.
    pub max_operations: u64,
    /// Wall-clock budget measured from the start of the evaluation.
    pub timeout: Duration,
    /// How deep evaluation may nest before it's cut off. Recursion isn't
    /// tail-call optimized so this is what protects the host's stack.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config{
            max_operations: 100_000,
            timeout: Duration::from_secs(5),
            max_depth: 512,
        }
    }
}

impl Config {
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
