//! Orderer
//!
//! Enforces the sequence shape the executor relies on: a viewport step (if
//! any) first, a screenshot step last. Never drops a caller-supplied step.

use crate::steps::CanonicalStep;
use serde::Serialize;

/// Result of ordering a sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReport {
    /// The ordered sequence
    pub steps: Vec<CanonicalStep>,
    /// Original index of the viewport step moved to the front
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_viewport_from: Option<usize>,
    /// Whether a default screenshot step was appended
    pub appended_screenshot: bool,
}

impl OrderReport {
    /// Whether the sequence differs from the input
    #[must_use]
    pub fn changed(&self) -> bool {
        self.moved_viewport_from.is_some() || self.appended_screenshot
    }

    /// Where the step at `index` of the input ended up in `steps`
    #[must_use]
    pub fn ordered_index(&self, index: usize) -> usize {
        match self.moved_viewport_from {
            Some(from) if index == from => 0,
            Some(from) if index < from => index + 1,
            _ => index,
        }
    }
}

/// Order a sequence.
///
/// 1. The first viewport step moves to index 0 (later ones stay in place).
/// 2. A default screenshot is appended when none exists.
/// 3. Nothing else moves.
#[must_use]
pub fn order(steps: Vec<CanonicalStep>) -> OrderReport {
    let mut steps = steps;

    let moved_viewport_from = match steps.iter().position(CanonicalStep::is_viewport) {
        Some(index) if index > 0 => {
            let viewport = steps.remove(index);
            steps.insert(0, viewport);
            Some(index)
        }
        _ => None,
    };

    let appended_screenshot = !steps.iter().any(CanonicalStep::is_screenshot);
    if appended_screenshot {
        steps.push(CanonicalStep::screenshot());
    }

    OrderReport {
        steps,
        moved_viewport_from,
        appended_screenshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_moves_to_front() {
        let report = order(vec![
            CanonicalStep::click("button"),
            CanonicalStep::viewport_device("mobile"),
        ]);
        assert!(report.steps[0].is_viewport());
        assert_eq!(report.moved_viewport_from, Some(1));
        assert!(report.appended_screenshot);
        assert!(report.steps.last().is_some_and(CanonicalStep::is_screenshot));
        assert_eq!(report.steps.len(), 3);
    }

    #[test]
    fn test_ordered_index_follows_the_moved_viewport() {
        let report = order(vec![
            CanonicalStep::wait_for(".x"),
            CanonicalStep::click("#go"),
            CanonicalStep::viewport_device("mobile"),
            CanonicalStep::screenshot(),
        ]);
        assert_eq!(
            (0..4).map(|i| report.ordered_index(i)).collect::<Vec<_>>(),
            vec![1, 2, 0, 3]
        );

        let unchanged = order(vec![CanonicalStep::click("#go")]);
        assert_eq!(unchanged.ordered_index(0), 0);
    }

    #[test]
    fn test_only_first_viewport_moves() {
        let report = order(vec![
            CanonicalStep::click("a"),
            CanonicalStep::viewport_device("Laptop"),
            CanonicalStep::click("b"),
            CanonicalStep::viewport_device("iPhone 14"),
            CanonicalStep::screenshot(),
        ]);
        assert_eq!(
            report.steps,
            vec![
                CanonicalStep::viewport_device("Laptop"),
                CanonicalStep::click("a"),
                CanonicalStep::click("b"),
                CanonicalStep::viewport_device("iPhone 14"),
                CanonicalStep::screenshot(),
            ]
        );
        assert!(!report.appended_screenshot);
    }

    #[test]
    fn test_already_ordered_is_unchanged() {
        let input = vec![
            CanonicalStep::viewport_device("Laptop"),
            CanonicalStep::wait_ms(10),
            CanonicalStep::screenshot(),
        ];
        let report = order(input.clone());
        assert_eq!(report.steps, input);
        assert!(!report.changed());
    }

    #[test]
    fn test_empty_sequence_gets_screenshot() {
        let report = order(Vec::new());
        assert_eq!(report.steps, vec![CanonicalStep::screenshot()]);
    }

    #[test]
    fn test_steps_after_screenshot_are_kept() {
        let report = order(vec![CanonicalStep::screenshot(), CanonicalStep::click("a")]);
        assert_eq!(report.steps.len(), 2);
        assert!(!report.appended_screenshot);
    }

    #[test]
    fn test_ordering_invariant_over_mixed_sequences() {
        let pool = [
            CanonicalStep::viewport_device("Laptop"),
            CanonicalStep::click("a"),
            CanonicalStep::wait_ms(5),
            CanonicalStep::screenshot(),
            CanonicalStep::fill("#q", "x"),
        ];
        // Every sequence of length 0..=3 drawn from the pool
        let mut sequences: Vec<Vec<CanonicalStep>> = vec![Vec::new()];
        let mut frontier: Vec<Vec<CanonicalStep>> = vec![Vec::new()];
        for _ in 0..3 {
            frontier = frontier
                .iter()
                .flat_map(|seq| {
                    pool.iter().map(move |step| {
                        let mut extended = seq.clone();
                        extended.push(step.clone());
                        extended
                    })
                })
                .collect();
            sequences.extend(frontier.iter().cloned());
        }

        for input in sequences {
            let had_viewport = input.iter().any(CanonicalStep::is_viewport);
            let ends_with_screenshot = input.last().is_some_and(CanonicalStep::is_screenshot);
            let had_screenshot = input.iter().any(CanonicalStep::is_screenshot);
            let report = order(input.clone());

            assert_eq!(report.steps.len(), input.len() + usize::from(!had_screenshot));
            if had_viewport {
                assert!(report.steps[0].is_viewport(), "{:?}", input);
            }
            if !had_screenshot || ends_with_screenshot {
                assert!(report.steps.last().is_some_and(CanonicalStep::is_screenshot));
            }
        }
    }
}
