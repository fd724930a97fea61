//! # Error Collector
//!
//! Accumulates [`ValidationError`]s during one walk of the validation
//! engine. A collector is created per call (or per subschema probe) and is
//! never shared between threads or calls.
//!
//! A *fail-fast* collector records only the first error and then reports
//! itself saturated, letting the engine abandon a branch early. The engine
//! uses one for every subschema whose errors are never reported
//! (`anyOf`, `oneOf`, `not`, `if`, `contains`, `propertyNames`), where only
//! pass/fail matters.

use crate::result::ValidationError;

/// Ordered list of validation errors for one run.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<ValidationError>,
    fail_fast: bool,
}

impl ErrorCollector {
    /// A collector that keeps every error.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fail-fast collector for pass/fail probes.
    pub fn probe() -> Self {
        Self {
            errors: Vec::new(),
            fail_fast: true,
        }
    }

    /// Record an error. A saturated fail-fast collector drops it.
    pub fn push(&mut self, error: ValidationError) {
        if !self.saturated() {
            self.errors.push(error);
        }
    }

    /// Record several errors, in order.
    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        for error in errors {
            if self.saturated() {
                break;
            }
            self.errors.push(error);
        }
    }

    /// Forget everything recorded so far.
    pub fn reset(&mut self) {
        self.errors.clear();
    }

    /// Whether further checks can be skipped.
    pub fn saturated(&self) -> bool {
        self.fail_fast && !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Keyword;

    fn error(n: usize) -> ValidationError {
        ValidationError::violation(
            format!("/{n}"),
            format!("[{n}]"),
            "Does not have a value in the enumeration".into(),
            Keyword::Enum,
            "mem:///s.json#",
        )
    }

    #[test]
    fn keeps_errors_in_order() {
        let mut collector = ErrorCollector::new();
        collector.push(error(0));
        collector.extend([error(1), error(2)]);
        assert_eq!(collector.len(), 3);
        assert!(!collector.saturated());
        let pointers: Vec<_> = collector
            .errors()
            .iter()
            .map(|e| e.pointer.clone().unwrap_or_default())
            .collect();
        assert_eq!(pointers, ["/0", "/1", "/2"]);
    }

    #[test]
    fn reset_clears() {
        let mut collector = ErrorCollector::new();
        collector.push(error(0));
        collector.reset();
        assert!(collector.is_empty());
        assert!(collector.into_errors().is_empty());
    }

    #[test]
    fn probe_stops_at_first_error() {
        let mut probe = ErrorCollector::probe();
        assert!(!probe.saturated());
        probe.extend([error(0), error(1)]);
        probe.push(error(2));
        assert!(probe.saturated());
        assert_eq!(probe.len(), 1);
    }
}
