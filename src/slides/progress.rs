use serde::Serialize;

/// Visual state of one progress dot. `active` and `skip` never hold together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DotState {
    pub active: bool,
    pub skip: bool,
    pub error: bool,
    pub success: bool,
    /// Counts towards the completed total; never set on skipped dots.
    pub completed: bool,
}

impl DotState {
    pub fn css_classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["slide-progress-dot"];
        if self.active {
            classes.push("active");
        }
        if self.skip {
            classes.push("step-skip");
        }
        if self.error {
            classes.push("step-error");
        }
        if self.success {
            classes.push("step-success");
        }
        classes
    }

    pub fn is_clickable(&self) -> bool {
        !self.skip
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotsUpdate {
    /// Slide count changed; every dot was rebuilt.
    Rebuilt,
    /// Same slide count; only the listed dots changed state.
    Patched(Vec<usize>),
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressDots {
    dots: Vec<DotState>,
    completed: usize,
    total: usize,
}

impl ProgressDots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dots(&self) -> &[DotState] {
        &self.dots
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of slides that are not skipped.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn update(&mut self, states: Vec<DotState>) -> DotsUpdate {
        let outcome = if states.len() != self.dots.len() {
            self.dots = states;
            DotsUpdate::Rebuilt
        } else {
            let changed: Vec<usize> = self
                .dots
                .iter()
                .zip(&states)
                .enumerate()
                .filter(|(_, (old, new))| old != new)
                .map(|(idx, _)| idx)
                .collect();
            for &idx in &changed {
                self.dots[idx] = states[idx];
            }
            if changed.is_empty() {
                DotsUpdate::Unchanged
            } else {
                DotsUpdate::Patched(changed)
            }
        };
        self.total = self.dots.iter().filter(|dot| !dot.skip).count();
        self.completed = self
            .dots
            .iter()
            .filter(|dot| dot.completed && !dot.skip)
            .count();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(active: bool, skip: bool) -> DotState {
        DotState {
            active,
            skip,
            ..DotState::default()
        }
    }

    #[test]
    fn same_length_updates_patch_only_changed_dots() {
        let mut progress = ProgressDots::new();
        assert_eq!(
            progress.update(vec![dot(true, false), dot(false, false), dot(false, true)]),
            DotsUpdate::Rebuilt
        );
        assert_eq!(progress.total(), 2);

        assert_eq!(
            progress.update(vec![dot(false, false), dot(true, false), dot(false, true)]),
            DotsUpdate::Patched(vec![0, 1])
        );
        assert_eq!(
            progress.update(vec![dot(false, false), dot(true, false), dot(false, true)]),
            DotsUpdate::Unchanged
        );
        assert_eq!(progress.update(vec![dot(true, false)]), DotsUpdate::Rebuilt);
        assert_eq!(progress.total(), 1);
    }

    #[test]
    fn css_classes_reflect_state() {
        let state = DotState {
            active: false,
            skip: false,
            error: true,
            success: true,
            completed: true,
        };
        assert_eq!(
            state.css_classes(),
            vec!["slide-progress-dot", "step-error", "step-success"]
        );
        assert!(!dot(false, true).is_clickable());
    }
}
