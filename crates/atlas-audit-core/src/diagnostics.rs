use serde::{Deserialize, Serialize};

/// Severity ranks used by the classifier rule tables.
///
/// 0 = clean, 1 = informational, 2 = warning, 3 = likely build duplicate.
/// Presentation layers typically highlight level 2 and above.
pub const SEVERITY_INFO: u8 = 1;
pub const SEVERITY_WARNING: u8 = 2;
pub const SEVERITY_DUPLICATE: u8 = 3;

/// Monotonic severity plus an append-only, evaluation-ordered warning list.
///
/// There is deliberately no way to lower the severity or remove a warning:
/// every rule that fires during a scan only ever adds to this state, so the
/// final severity is the maximum of everything offered to [`raise`].
///
/// [`raise`]: Diagnostics::raise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    severity: u8,
    warnings: Option<Vec<String>>,
}

impl Diagnostics {
    pub fn severity(&self) -> u8 {
        self.severity
    }

    /// Raises the severity to `level` if it is higher than the current one.
    /// Lower or equal offers are ignored; order of calls does not matter.
    pub fn raise(&mut self, level: u8) {
        if level > self.severity {
            self.severity = level;
        }
    }

    /// Appends a warning message. Messages keep evaluation order, not
    /// severity order. The list is allocated on first use.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings
            .get_or_insert_with(Vec::new)
            .push(message.into());
    }

    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_is_monotonic_and_order_independent() {
        let mut a = Diagnostics::default();
        for level in [1, 2, 1, 0, 2] {
            a.raise(level);
        }
        let mut b = Diagnostics::default();
        for level in [2, 0, 1, 2, 1] {
            b.raise(level);
        }
        assert_eq!(a.severity(), 2);
        assert_eq!(a.severity(), b.severity());
    }

    #[test]
    fn warnings_keep_insertion_order() {
        let mut d = Diagnostics::default();
        assert!(d.warnings().is_empty());
        d.add_warning("first");
        d.add_warning("second");
        assert_eq!(d.warnings(), ["first", "second"]);
    }
}
