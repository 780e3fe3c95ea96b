//! Per-player notification inbox.

use archipel_types::{Notification, NotificationId, NotificationKind, PlayerId};
use archipel_world::World;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Deliver a message to a player.
pub fn notify(
    world: &mut World,
    player: PlayerId,
    kind: NotificationKind,
    message: impl Into<String>,
    now: DateTime<Utc>,
) -> NotificationId {
    let id = NotificationId::new();
    world.notifications_mut(player).push(Notification {
        id,
        message: message.into(),
        kind,
        timestamp: now,
        read: false,
    });
    debug!(%player, ?kind, "Notification delivered");
    id
}

/// A player's notifications, newest first.
pub fn list(world: &World, player: PlayerId) -> Vec<Notification> {
    let mut all = world.notifications(player).to_vec();
    all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    all
}

/// Mark every notification as read, returning how many changed.
pub fn mark_all_read(world: &mut World, player: PlayerId) -> usize {
    let mut changed = 0_usize;
    for n in world.notifications_mut(player).iter_mut().filter(|n| !n.read) {
        n.read = true;
        changed = changed.saturating_add(1);
    }
    changed
}

/// Count unread notifications, optionally of one kind.
pub fn unread_count(world: &World, player: PlayerId, kind: Option<NotificationKind>) -> usize {
    world
        .notifications(player)
        .iter()
        .filter(|n| !n.read && kind.is_none_or(|k| n.kind == k))
        .count()
}
