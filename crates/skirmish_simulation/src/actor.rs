//! Общие характеристики акторов: Health, Lifecycle

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }
}

/// Lifecycle transient entity (projectile, enemy)
///
/// `Active → MarkedForRemoval → Removed`. Removed не хранится: entity
/// просто исчезает из коллекции в deferred removal pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Active,
    MarkedForRemoval,
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, Lifecycle::MarkedForRemoval)
    }

    /// Active → MarkedForRemoval. `false` если уже помечен (переход идемпотентен).
    pub fn mark(&mut self) -> bool {
        if self.is_marked() {
            return false;
        }
        *self = Lifecycle::MarkedForRemoval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(3);
        health.take_damage(1);
        assert_eq!(health.current, 2);
        assert!(health.is_alive());

        health.take_damage(10); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut state = Lifecycle::default();
        assert!(state.is_active());

        assert!(state.mark());
        assert!(!state.mark());
        assert!(state.is_marked());
    }
}
