//! Canonical form of the undirected friend edge.

use uuid::Uuid;

/// A friendship between two distinct users, stored with the smaller id first.
///
/// Both `FriendPair::new(a, b)` and `FriendPair::new(b, a)` produce the same value,
/// so one row (or one set entry) represents the relation from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FriendPair {
    low: Uuid,
    high: Uuid,
}

impl FriendPair {
    /// `None` when both ids are the same user.
    pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    /// The other member of the pair, if `user` is one of them.
    pub fn other(&self, user: Uuid) -> Option<Uuid> {
        if user == self.low {
            Some(self.high)
        } else if user == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}
