//! Output file name reservation.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::warn;

use crate::util::path::disambiguate;

/// Insert-if-absent set of output names for one category of one model.
#[derive(Debug, Default)]
pub struct NameTable {
    taken: Mutex<HashSet<String>>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `name`, or `name_#<id>` if taken. Returns `None` (with a
    /// warning) when both are taken.
    pub fn reserve(&self, what: &str, name: &str, id: i64) -> Option<String> {
        let mut taken = self.taken.lock();
        if taken.insert(name.to_string()) {
            return Some(name.to_string());
        }
        let alt = disambiguate(name, id);
        if taken.insert(alt.clone()) {
            return Some(alt);
        }
        warn!("{} '{}' collides with '{}' and '{}', dropped", what, name, name, alt);
        None
    }

    pub fn len(&self) -> usize {
        self.taken.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_chain() {
        let names = NameTable::new();
        assert_eq!(names.reserve("texture", "body", 10).as_deref(), Some("body"));
        assert_eq!(names.reserve("texture", "body", 11).as_deref(), Some("body_#11"));
        assert_eq!(names.reserve("texture", "body", 11), None);
        assert_eq!(names.reserve("texture", "body", 12).as_deref(), Some("body_#12"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_shared_across_threads() {
        use rayon::prelude::*;

        let names = NameTable::new();
        let won: usize = (0..64i64)
            .into_par_iter()
            .map(|i| usize::from(names.reserve("motion", "idle", i).as_deref() == Some("idle")))
            .sum();
        assert_eq!(won, 1);
        assert_eq!(names.len(), 65);
    }
}
