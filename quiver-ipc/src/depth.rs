use quiver_error::{QuiverResult, quiver_bail};

/// The remaining nesting budget of a recursive encode or decode.
///
/// Every visit of a type or array consumes one level, and visiting its children hands them
/// the remainder. The budget is checked before anything is read from or written for the
/// visited level.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecursionBudget(usize);

impl RecursionBudget {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self(max_depth)
    }

    /// Consume one level, returning the budget left for the children of the visited level.
    pub(crate) fn descend(self) -> QuiverResult<Self> {
        match self.0.checked_sub(1) {
            Some(remaining) => Ok(Self(remaining)),
            None => quiver_bail!(InvalidFormat: "exceeded maximum nesting depth"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RecursionBudget;

    #[test]
    fn exhausts() {
        let budget = RecursionBudget::new(2);
        let child = budget.descend().unwrap();
        let grandchild = child.descend().unwrap();
        assert!(grandchild.descend().unwrap_err().is_invalid_format());
    }
}
