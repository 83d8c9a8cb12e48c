#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepProgress {
    index: usize,
    step_count: usize,
}

impl StepProgress {
    pub fn new(step_count: usize) -> Self {
        Self {
            index: 0,
            step_count,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn step_count(self) -> usize {
        self.step_count
    }

    pub fn is_final(self) -> bool {
        self.index + 1 >= self.step_count
    }

    pub fn advanced(self) -> Self {
        if self.is_final() {
            return self;
        }
        Self {
            index: self.index + 1,
            ..self
        }
    }

    pub fn retreated(self) -> Self {
        Self {
            index: self.index.saturating_sub(1),
            ..self
        }
    }
}
