use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Password credential for a user.
///
/// Only one credential per user is `active`. The three timestamps feed the
/// signing-secret derivation: `updated_at` for access tokens and
/// `rotation_checkpoint` for refresh tokens, both combined with `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Credential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub rotation_checkpoint: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which timestamps a credential bump touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Bump `updated_at` only. Outstanding access tokens die, refresh tokens survive.
    AccessOnly,
    /// Bump `updated_at` and `rotation_checkpoint`. Every outstanding token dies.
    All,
}

impl Rotation {
    pub fn touches_checkpoint(&self) -> bool {
        matches!(self, Rotation::All)
    }
}

/// Next value for a rotated timestamp: `now`, or one microsecond past the
/// previous value when the clock has not moved far enough to change it.
pub fn next_checkpoint(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::microseconds(1);
    if now.timestamp_micros() >= floor.timestamp_micros() {
        now
    } else {
        floor
    }
}

impl Credential {
    /// Apply a rotation in memory. Mirrors the single-statement update the
    /// Postgres adapter performs.
    pub fn rotated(&self, rotation: Rotation, now: DateTime<Utc>) -> Credential {
        let mut next = self.clone();
        next.updated_at = next_checkpoint(self.updated_at, now);
        if rotation.touches_checkpoint() {
            next.rotation_checkpoint = next_checkpoint(self.rotation_checkpoint, now);
        }
        next
    }
}
