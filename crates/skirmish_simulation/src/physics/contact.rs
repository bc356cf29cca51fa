//! Contact counter: сигнал "grounded" для игрока
//!
//! Считает одновременные контакты игрока со static (mass == 0) телами.
//! Инвариант: count ≥ 0. End без парного Begin (тело удалили/усыпили
//! посреди контакта) не уводит счётчик в минус: clamp на нуле.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactCounter {
    count: u32,
}

impl ContactCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn end(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_grounded(&self) -> bool {
        self.count > 0
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_end_pairs() {
        let mut counter = ContactCounter::new();
        assert!(!counter.is_grounded());

        counter.begin();
        counter.begin();
        assert_eq!(counter.count(), 2);
        assert!(counter.is_grounded());

        counter.end();
        assert!(counter.is_grounded());
        counter.end();
        assert!(!counter.is_grounded());
    }

    #[test]
    fn test_end_without_begin_clamps_at_zero() {
        let mut counter = ContactCounter::new();
        counter.end();
        counter.end();
        assert_eq!(counter.count(), 0);

        counter.begin();
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_never_negative_for_arbitrary_sequences() {
        // Детерминированный "шум": begin/end в разных пропорциях
        for pattern in 0u32..256 {
            let mut counter = ContactCounter::new();
            let mut expected: i64 = 0;

            for bit in 0..8 {
                if pattern & (1 << bit) != 0 {
                    counter.begin();
                    expected += 1;
                } else {
                    counter.end();
                    expected = (expected - 1).max(0);
                }
                assert_eq!(counter.count() as i64, expected, "pattern {:08b}", pattern);
            }
        }
    }
}
