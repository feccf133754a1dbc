use std::collections::HashSet;

use crate::identifiers::Doi;

/// A set of DOIs that remembers first-insertion order, so a run's output
/// order is reproducible.
#[derive(Debug, Clone, Default)]
pub struct DoiSet {
    order: Vec<Doi>,
    seen: HashSet<Doi>,
}

impl DoiSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the DOI was already present.
    pub fn insert(&mut self, doi: Doi) -> bool {
        if self.seen.contains(&doi) {
            return false;
        }
        self.seen.insert(doi.clone());
        self.order.push(doi);
        true
    }

    pub fn contains(&self, doi: &Doi) -> bool {
        self.seen.contains(doi)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Doi> {
        self.order.iter()
    }

    pub fn into_vec(self) -> Vec<Doi> {
        self.order
    }
}

impl PartialEq for DoiSet {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for DoiSet {}

impl Extend<Doi> for DoiSet {
    fn extend<I: IntoIterator<Item = Doi>>(&mut self, iter: I) {
        for doi in iter {
            self.insert(doi);
        }
    }
}

impl FromIterator<Doi> for DoiSet {
    fn from_iter<I: IntoIterator<Item = Doi>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a DoiSet {
    type Item = &'a Doi;
    type IntoIter = std::slice::Iter<'a, Doi>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Union of both sources' DOIs. Matching is exact and case-sensitive.
pub fn reconcile(first: &[Doi], second: &[Doi]) -> DoiSet {
    first.iter().chain(second).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dois(values: &[&str]) -> Vec<Doi> {
        values.iter().map(|v| Doi::from(*v)).collect()
    }

    fn sorted(set: &DoiSet) -> Vec<&str> {
        let mut out: Vec<_> = set.iter().map(Doi::as_str).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn union_of_overlapping_lists() {
        let set = reconcile(&dois(&["10.1/a", "10.1/b"]), &dois(&["10.1/b", "10.1/c"]));
        assert_eq!(set.len(), 3);
        assert_eq!(sorted(&set), vec!["10.1/a", "10.1/b", "10.1/c"]);
    }

    #[test]
    fn order_is_first_seen() {
        let set = reconcile(&dois(&["10.1/z", "10.1/a"]), &dois(&["10.1/m", "10.1/z"]));
        assert_eq!(set.into_vec(), dois(&["10.1/z", "10.1/a", "10.1/m"]));
    }

    #[test]
    fn empty_inputs() {
        assert!(reconcile(&[], &[]).is_empty());
        let only_second = reconcile(&[], &dois(&["10.1/a", "10.1/a"]));
        assert_eq!(only_second.into_vec(), dois(&["10.1/a"]));
        let only_first = reconcile(&dois(&["10.1/b"]), &[]);
        assert_eq!(only_first.into_vec(), dois(&["10.1/b"]));
    }

    #[test]
    fn case_variants_are_distinct() {
        let set = reconcile(&dois(&["10.1/ABC"]), &dois(&["10.1/abc"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn every_distinct_input_appears_exactly_once() {
        let cases: Vec<(Vec<&str>, Vec<&str>)> = vec![
            (vec!["a", "a", "b"], vec!["b", "c", "c"]),
            (vec!["x"], vec!["x"]),
            (vec!["p", "q", "r"], vec![]),
            (vec![], vec!["s", "t", "s"]),
            (vec!["m", "n"], vec!["o", "p"]),
        ];

        for (left, right) in cases {
            let (left, right) = (dois(&left), dois(&right));
            let set = reconcile(&left, &right);

            let expected: HashSet<&Doi> = left.iter().chain(&right).collect();
            assert_eq!(set.len(), expected.len());
            for doi in &expected {
                assert!(set.contains(doi));
            }
            for doi in &set {
                assert!(expected.contains(doi));
            }
        }
    }

    #[test]
    fn equality_ignores_order() {
        let a: DoiSet = dois(&["1", "2"]).into_iter().collect();
        let b: DoiSet = dois(&["2", "1"]).into_iter().collect();
        assert_eq!(a, b);
    }
}
