// src/import/positions.rs

//! Position conflict resolution for ordered siblings
//!
//! Incoming modules and assignment groups carry desired positions that may
//! collide with objects already in the container. Each family first maps
//! the desired position to an effective one, then the union of incoming and
//! untouched siblings is renumbered to a contiguous `1..=N`.
//!
//! Ties on effective position put incoming objects before untouched ones;
//! among themselves incoming objects keep batch order and untouched ones
//! keep id order.

/// How a family turns desired positions into effective ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPolicy {
    /// New objects land after everything already present
    ///
    /// Used for modules: a new object's effective position is its desired
    /// position plus the highest existing position. Objects matched by
    /// migration id take their desired position as is.
    AppendNew,
    /// Every incoming object takes its desired position
    ///
    /// Used for assignment groups.
    Desired,
}

impl PositionPolicy {
    /// Effective position for one incoming object
    pub fn effective(&self, desired: i64, matched_existing: bool, max_existing: i64) -> i64 {
        match self {
            PositionPolicy::AppendNew if !matched_existing => desired + max_existing,
            _ => desired,
        }
    }
}

/// One sibling taking part in renumbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sibling {
    pub id: i64,
    pub position: i64,
    /// Touched by this run
    pub incoming: bool,
    /// Batch index for incoming siblings
    pub order: usize,
}

impl Sibling {
    pub fn incoming(id: i64, position: i64, order: usize) -> Self {
        Self {
            id,
            position,
            incoming: true,
            order,
        }
    }

    pub fn untouched(id: i64, position: i64) -> Self {
        Self {
            id,
            position,
            incoming: false,
            order: 0,
        }
    }
}

/// Final `(id, position)` pairs, in display order
pub fn renumber(mut siblings: Vec<Sibling>) -> Vec<(i64, i64)> {
    siblings.sort_by_key(|s| {
        let tiebreak = if s.incoming { s.order as i64 } else { s.id };
        (s.position, !s.incoming, tiebreak)
    });

    siblings
        .into_iter()
        .enumerate()
        .map(|(i, s)| (s.id, i as i64 + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // existing: ponies (id 1, position 1), monsters (id 2, position 2)
    // incoming: monkeys 1, ponies 2 (same object as existing ponies), last 3
    const PONIES: i64 = 1;
    const MONSTERS: i64 = 2;
    const MONKEYS: i64 = 3;
    const LAST: i64 = 4;

    fn merged(policy: PositionPolicy) -> Vec<i64> {
        let max_existing = 2;
        let siblings = vec![
            Sibling::incoming(MONKEYS, policy.effective(1, false, max_existing), 0),
            Sibling::incoming(PONIES, policy.effective(2, true, max_existing), 1),
            Sibling::incoming(LAST, policy.effective(3, false, max_existing), 2),
            Sibling::untouched(MONSTERS, 2),
        ];
        renumber(siblings).into_iter().map(|(id, _)| id).collect()
    }

    #[test]
    fn test_module_policy_appends_new() {
        assert_eq!(
            merged(PositionPolicy::AppendNew),
            vec![PONIES, MONSTERS, MONKEYS, LAST]
        );
    }

    #[test]
    fn test_group_policy_uses_desired() {
        assert_eq!(
            merged(PositionPolicy::Desired),
            vec![MONKEYS, PONIES, MONSTERS, LAST]
        );
    }

    #[test]
    fn test_renumber_is_contiguous() {
        let result = renumber(vec![
            Sibling::untouched(10, 7),
            Sibling::untouched(11, 7),
            Sibling::incoming(12, 40, 0),
        ]);
        assert_eq!(result, vec![(10, 1), (11, 2), (12, 3)]);
    }
}
