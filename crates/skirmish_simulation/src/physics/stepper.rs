//! Fixed sub-stepping
//!
//! Кадр приходит с переменным dt, физика шагает фиксированным sub-step.
//! `max_substeps` ограничивает worst-case стоимость кадра: если кадр
//! слишком длинный, backlog сверх лимита выбрасывается (симуляция
//! замедляется, а не догоняет лавиной шагов).

/// Допуск на накопленную ошибку float (60 кадров по 1/60 ≠ ровно 1.0)
const ACCUMULATOR_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepper {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedStepper {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Накопить `frame_dt`, вернуть число sub-steps для этого кадра
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !(frame_dt > 0.0) {
            return 0;
        }

        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator + ACCUMULATOR_EPSILON >= self.step && substeps < self.max_substeps {
            self.accumulator = (self.accumulator - self.step).max(0.0);
            substeps += 1;
        }

        if self.accumulator >= self.step {
            // Лимит исчерпан: оставляем только дробную часть шага
            self.accumulator %= self.step;
        }

        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
