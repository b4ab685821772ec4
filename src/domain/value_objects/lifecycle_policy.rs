use chrono::Duration;

/// Timing rules for alert escalation and repeat suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// A condition held this long is forced to CRITICAL
    pub escalation: Duration,
    /// Minimum gap between two notifications of an unchanged condition
    pub cooldown: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            escalation: Duration::minutes(30),
            cooldown: Duration::minutes(10),
        }
    }
}

/// Retention bounds applied to every room window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    pub retention: Duration,
    pub max_readings: usize,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            retention: Duration::minutes(10),
            max_readings: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = LifecyclePolicy::default();
        assert_eq!(policy.escalation.num_minutes(), 30);
        assert_eq!(policy.cooldown.num_minutes(), 10);

        let limits = WindowLimits::default();
        assert_eq!(limits.retention.num_minutes(), 10);
        assert_eq!(limits.max_readings, 50);
    }
}
