use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Two sessions that start within this window are considered simultaneous
/// and fall through to the peer-id tie-break instead of last-starter-wins.
const RACE_WINDOW_MS: i64 = 1_000;

/// Broadcast whenever a session transitions Idle <-> Active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareAnnouncement {
    pub peer: Uuid,
    pub active: bool,
    pub generation: u64,
    pub sent_at: DateTime<Utc>,
}

/// Best-effort exclusivity bus between peer sessions. There is no leader
/// election or lock handshake: whoever announces "active" pushes everyone
/// else out, and a simultaneous start is settled by [`should_yield`].
pub struct ShareBus {
    tx: broadcast::Sender<ShareAnnouncement>,
}

impl ShareBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    #[must_use]
    pub fn sender(&self) -> broadcast::Sender<ShareAnnouncement> {
        self.tx.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShareAnnouncement> {
        self.tx.subscribe()
    }
}

impl Default for ShareBus {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Decide whether an active session yields to a foreign "active" announcement.
///
/// Outside the race window the receiver always yields (the latest starter
/// wins). Within the window both sides apply the same rule, so exactly one
/// survives: the lexicographically lower peer id keeps ownership.
#[must_use]
pub fn should_yield(
    own_peer: Uuid,
    own_started_at: DateTime<Utc>,
    announcement: &ShareAnnouncement,
) -> bool {
    let skew_ms = (announcement.sent_at - own_started_at)
        .num_milliseconds()
        .abs();
    if skew_ms <= RACE_WINDOW_MS {
        own_peer > announcement.peer
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn announcement(peer: Uuid, sent_at: DateTime<Utc>) -> ShareAnnouncement {
        ShareAnnouncement {
            peer,
            active: true,
            generation: 1,
            sent_at,
        }
    }

    #[test]
    fn later_starter_wins_outside_the_race_window() {
        let started = Utc::now();
        let foreign = announcement(Uuid::new_v4(), started + Duration::seconds(30));
        assert!(should_yield(Uuid::new_v4(), started, &foreign));
    }

    #[test]
    fn simultaneous_start_is_settled_by_lower_peer_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(u128::MAX);
        let started = Utc::now();
        let sent_at = started + Duration::milliseconds(200);

        // The lower id keeps ownership, the higher id yields.
        assert!(!should_yield(low, started, &announcement(high, sent_at)));
        assert!(should_yield(high, started, &announcement(low, sent_at)));
    }

    #[test]
    fn tie_break_is_symmetric_exactly_one_survivor() {
        let a = Uuid::from_u128(7);
        let b = Uuid::from_u128(9);
        let now = Utc::now();

        let a_yields = should_yield(a, now, &announcement(b, now));
        let b_yields = should_yield(b, now, &announcement(a, now));
        assert_ne!(a_yields, b_yields);
    }
}
