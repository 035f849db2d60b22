//! VM configuration.
//!
//! Defines runtime limits for the Slate virtual machine. Configuration
//! specifies limits only; enforcement is handled by the VM. Both limits are
//! off by default: the operand stack grows as needed and programs run to
//! completion or to a fault.

/// Runtime limits for one VM execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of values on the operand stack, or `None` for no limit.
    pub max_stack_depth: Option<usize>,

    /// Maximum number of instructions to execute, or `None` for no limit.
    pub step_limit: Option<u64>,
}

impl VmConfig {
    /// Create a new configuration with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = Some(depth);
        self
    }

    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = Some(steps);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unbounded() {
        let config = VmConfig::new();
        assert_eq!(config.max_stack_depth, None);
        assert_eq!(config.step_limit, None);
    }

    #[test]
    fn builders_override_defaults() {
        let config = VmConfig::new()
            .with_max_stack_depth(16)
            .with_step_limit(1_000);
        assert_eq!(config.max_stack_depth, Some(16));
        assert_eq!(config.step_limit, Some(1_000));
    }
}
