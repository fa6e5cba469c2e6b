/// Collection budget for one anchor's paginated children
///
/// Counts how many items have been admitted against a ceiling. Admission
/// saturates: a step never admits more than the remaining capacity, so
/// `collected <= requested` holds after every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionBudget {
    requested: usize,
    collected: usize,
}

impl CollectionBudget {
    /// Creates a budget with the given ceiling
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            collected: 0,
        }
    }

    /// Creates a budget with no ceiling
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Creates a budget from an optional limit (None means no ceiling)
    pub fn from_limit(limit: Option<usize>) -> Self {
        limit.map_or_else(Self::unbounded, Self::new)
    }

    /// Lowers the ceiling to `cap` if it is currently higher
    pub fn clamp_to(self, cap: usize) -> Self {
        Self {
            requested: self.requested.min(cap),
            collected: self.collected.min(cap),
        }
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn is_unbounded(&self) -> bool {
        self.requested == usize::MAX
    }

    /// Remaining capacity
    pub fn remaining(&self) -> usize {
        self.requested.saturating_sub(self.collected)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Admits up to `batch_len` items and returns how many were admitted
    ///
    /// # Examples
    ///
    /// ```
    /// use fbscrape::CollectionBudget;
    ///
    /// let mut budget = CollectionBudget::new(5);
    /// assert_eq!(budget.admit(3), 3);
    /// assert_eq!(budget.admit(10), 2);
    /// assert_eq!(budget.admit(1), 0);
    /// assert_eq!(budget.collected(), 5);
    /// ```
    pub fn admit(&mut self, batch_len: usize) -> usize {
        let admitted = self.remaining().min(batch_len);
        self.collected += admitted;
        admitted
    }
}

impl Default for CollectionBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_is_min_of_remaining_and_batch() {
        for requested in [0usize, 1, 3, 7, 20] {
            for already in 0..=requested {
                for batch in [0usize, 1, 2, 5, 10, 25] {
                    let mut budget = CollectionBudget::new(requested);
                    budget.admit(already);

                    let admitted = budget.admit(batch);

                    assert_eq!(admitted, (requested - already).min(batch));
                    assert!(budget.collected() <= budget.requested());
                }
            }
        }
    }

    #[test]
    fn test_three_remaining_batch_of_ten() {
        let mut budget = CollectionBudget::new(10);
        budget.admit(7);
        assert_eq!(budget.admit(10), 3);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_unbounded_never_exhausts() {
        let mut budget = CollectionBudget::unbounded();
        assert!(budget.is_unbounded());
        for _ in 0..100 {
            assert_eq!(budget.admit(1_000), 1_000);
        }
        assert!(!budget.is_exhausted());
    }

    #[test]
    fn test_from_limit() {
        assert!(CollectionBudget::from_limit(None).is_unbounded());
        assert_eq!(CollectionBudget::from_limit(Some(4)).requested(), 4);
    }

    #[test]
    fn test_clamp_to_site_reported_total() {
        assert_eq!(CollectionBudget::unbounded().clamp_to(12).requested(), 12);
        assert_eq!(CollectionBudget::new(5).clamp_to(12).requested(), 5);
        assert!(CollectionBudget::new(5).clamp_to(0).is_exhausted());
    }
}
