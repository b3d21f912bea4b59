//! Classification of raw CLI output lines into progress events
//!
//! The CLI only speaks free text, so milestones are recognised by marker
//! substrings. Anything else is forwarded as a plain log line.

use regex::Regex;

use events::ProgressEvent;

/// Turns one line of CLI stdout into at most one event.
pub trait ProgressClassifier: Send + Sync {
    fn classify(&self, line: &str) -> Option<ProgressEvent>;
}

/// Literal markers in table order. Earlier rows win ties.
const LITERAL_MARKERS: &[(&str, &str)] = &[
    ("Generating driver", "Generating initial driver code..."),
    ("Running TIS", "Validating with TIS Analyzer..."),
    ("SUCCESS", "Driver generation successful!"),
    ("FAILED", "Driver generation failed"),
];

/// Table position of the iteration marker, between "Running TIS" and "SUCCESS"
const ITERATION_RANK: usize = 2;

/// Marker table classifier for the text output of `tischiron gen -v`.
///
/// When several markers occur in one line the longest matched text wins,
/// and equal lengths fall back to table order.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    iteration: Regex,
}

impl MarkerClassifier {
    pub fn new() -> Self {
        Self {
            iteration: Regex::new(r"(?i)\biteration\s+(\d+)").expect("Invalid iteration pattern"),
        }
    }

    fn iteration_marker(&self, line: &str) -> Option<Candidate> {
        let caps = self.iteration.captures(line)?;
        let whole = caps.get(0)?;
        let digits = caps.get(1)?.as_str();
        let number = digits
            .parse::<u64>()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| digits.to_string());

        Some(Candidate {
            len: whole.as_str().len(),
            rank: ITERATION_RANK,
            message: format!("Refinement iteration {}...", number),
        })
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new()
    }
}

struct Candidate {
    len: usize,
    rank: usize,
    message: String,
}

impl ProgressClassifier for MarkerClassifier {
    fn classify(&self, line: &str) -> Option<ProgressEvent> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let literals = LITERAL_MARKERS
            .iter()
            .enumerate()
            .filter(|(_, (needle, _))| line.contains(needle))
            .map(|(i, (needle, message))| Candidate {
                len: needle.len(),
                // literals after the iteration row shift down by one
                rank: if i < ITERATION_RANK { i } else { i + 1 },
                message: (*message).to_string(),
            });

        let best = literals
            .chain(self.iteration_marker(line))
            .fold(None::<Candidate>, |best, candidate| match best {
                Some(b) if b.len > candidate.len => Some(b),
                Some(b) if b.len == candidate.len && b.rank < candidate.rank => Some(b),
                _ => Some(candidate),
            });

        Some(match best {
            Some(marker) => ProgressEvent::status(marker.message),
            None => ProgressEvent::log(line),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Option<ProgressEvent> {
        MarkerClassifier::new().classify(line)
    }

    #[test]
    fn test_iteration_marker() {
        assert_eq!(
            classify("Iteration 3 of 5"),
            Some(ProgressEvent::status("Refinement iteration 3..."))
        );
        assert_eq!(
            classify("[Refine] ITERATION 12"),
            Some(ProgressEvent::status("Refinement iteration 12..."))
        );
    }

    #[test]
    fn test_blank_lines_produce_nothing() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   \t"), None);
        assert_eq!(classify("\r"), None);
    }

    #[test]
    fn test_unrecognised_line_is_log() {
        assert_eq!(
            classify("random compiler note"),
            Some(ProgressEvent::log("random compiler note"))
        );
    }

    #[test]
    fn test_carriage_return_stripped() {
        assert_eq!(
            classify("warning: unused variable\r"),
            Some(ProgressEvent::log("warning: unused variable"))
        );
    }

    #[test]
    fn test_literal_markers() {
        assert_eq!(
            classify("Generating driver for: json_object_get"),
            Some(ProgressEvent::status("Generating initial driver code..."))
        );
        assert_eq!(
            classify("Running TIS analyzer"),
            Some(ProgressEvent::status("Validating with TIS Analyzer..."))
        );
        assert_eq!(
            classify("SUCCESS: Driver written to drivers/Driver_for_f.c"),
            Some(ProgressEvent::status("Driver generation successful!"))
        );
        assert_eq!(
            classify("FAILED after 5 iterations"),
            Some(ProgressEvent::status("Driver generation failed"))
        );
    }

    #[test]
    fn test_markers_are_case_sensitive_except_iteration() {
        assert_eq!(classify("success"), Some(ProgressEvent::log("success")));
        assert_eq!(
            classify("running tis"),
            Some(ProgressEvent::log("running tis"))
        );
    }

    #[test]
    fn test_longest_match_wins() {
        // "Generating driver" (17) beats "FAILED" (6)
        assert_eq!(
            classify("Generating driver FAILED"),
            Some(ProgressEvent::status("Generating initial driver code..."))
        );
        // "Iteration 2" (11) beats "SUCCESS" (7)
        assert_eq!(
            classify("SUCCESS on iteration 2"),
            Some(ProgressEvent::status("Refinement iteration 2..."))
        );
    }

    #[test]
    fn test_equal_length_falls_back_to_table_order() {
        // "Running TIS" and "iteration 2" are both 11 bytes
        assert_eq!(
            classify("Running TIS (iteration 2)"),
            Some(ProgressEvent::status("Validating with TIS Analyzer..."))
        );
    }

    #[test]
    fn test_iteration_without_number_is_log() {
        assert_eq!(
            classify("Iterations exhausted"),
            Some(ProgressEvent::log("Iterations exhausted"))
        );
    }
}
