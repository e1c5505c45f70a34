//! Access gate for locked categories
//!
//! A category may carry a lock: an external asset address plus the name of a
//! membership group. Topics in a locked category are only visible to members
//! of that group and to administrators.
//!
//! The gate is a predicate. It runs after the standard visibility checks of
//! the topic view pipeline and before the topic is serialized; a `Deny` result
//! is handed to [`crate::routes::denial`] which turns it into a 402 response.

pub mod model;

use std::sync::Arc;
use tracing::debug;

use crate::store::MembershipStore;
use crate::types::Result;

pub use model::{
    Category, CategoryLock, Topic, Viewer, CF_LOCK_ADDRESS, CF_LOCK_GROUP, CF_LOCK_ICON,
};

/// Context attached to a denied view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub topic_id: i64,
    pub category_id: i64,
    pub lock_address: String,
}

/// Outcome of the lock stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Permit,
    Deny(Denial),
}

/// Decides whether a viewer is locked out of a topic
#[derive(Clone)]
pub struct AccessGate {
    memberships: Arc<dyn MembershipStore>,
}

impl AccessGate {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    /// Whether `topic` is locked for `viewer`
    ///
    /// Missing lock configuration means unlocked. A missing membership means
    /// locked. Membership store failures are returned to the caller untouched.
    pub async fn is_locked(&self, viewer: &Viewer, topic: &Topic) -> Result<bool> {
        if viewer.is_admin {
            return Ok(false);
        }

        let lock = topic.lock();
        if !lock.is_configured() {
            return Ok(false);
        }

        let (Some(user_id), Some(group)) = (viewer.user_id, lock.required_group()) else {
            return Ok(true);
        };

        let member = self.memberships.is_member(user_id, group).await?;
        debug!(
            topic_id = topic.id,
            user_id,
            group,
            member,
            "Checked lock membership"
        );
        Ok(!member)
    }

    /// Run the lock stage, returning the denial context when locked
    pub async fn check(&self, viewer: &Viewer, topic: &Topic) -> Result<AccessDecision> {
        if !self.is_locked(viewer, topic).await? {
            return Ok(AccessDecision::Permit);
        }

        Ok(AccessDecision::Deny(Denial {
            topic_id: topic.id,
            category_id: topic.category.id,
            lock_address: topic.lock().address().unwrap_or_default().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContentStore;
    use crate::types::GateError;
    use async_trait::async_trait;

    struct OfflineMemberships;

    #[async_trait]
    impl MembershipStore for OfflineMemberships {
        async fn is_member(&self, _user_id: i64, _group: &str) -> Result<bool> {
            Err(GateError::Database("group_users unreachable".into()))
        }
    }

    fn premium_topic() -> Topic {
        let category =
            Category::new(5, "Premium", "premium").locked(CategoryLock::new("0xABC", "members"));
        Topic::new(42, "alpha", "Alpha", category)
    }

    fn open_topic() -> Topic {
        Topic::new(43, "lobby", "Lobby", Category::new(6, "General", "general"))
    }

    fn gate_with(store: &Arc<MemoryContentStore>) -> AccessGate {
        AccessGate::new(Arc::clone(store) as Arc<dyn MembershipStore>)
    }

    #[tokio::test]
    async fn test_admin_bypasses_lock() {
        let gate = AccessGate::new(Arc::new(OfflineMemberships));
        let admin = Viewer::admin(1, "root");

        assert!(!gate.is_locked(&admin, &premium_topic()).await.unwrap());
        assert!(!gate.is_locked(&admin, &open_topic()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlocked_category_skips_membership_query() {
        let store = Arc::new(MemoryContentStore::new());
        let gate = gate_with(&store);

        for viewer in [Viewer::anonymous(), Viewer::user(7, "alice")] {
            assert!(!gate.is_locked(&viewer, &open_topic()).await.unwrap());
        }

        let mut blank = open_topic();
        blank.category.lock = CategoryLock {
            lock_address: Some(String::new()),
            lock_icon: None,
            required_group: Some("members".into()),
        };
        assert!(!gate.is_locked(&Viewer::user(7, "alice"), &blank).await.unwrap());

        assert_eq!(store.membership_queries(), 0);
    }

    #[tokio::test]
    async fn test_member_is_admitted() {
        let store = Arc::new(MemoryContentStore::new());
        store.add_member(7, "members");
        let gate = gate_with(&store);

        let decision = gate.check(&Viewer::user(7, "alice"), &premium_topic()).await.unwrap();
        assert_eq!(decision, AccessDecision::Permit);
    }

    #[tokio::test]
    async fn test_non_member_is_denied() {
        let store = Arc::new(MemoryContentStore::new());
        store.add_member(7, "other-group");
        let gate = gate_with(&store);

        let decision = gate.check(&Viewer::user(7, "alice"), &premium_topic()).await.unwrap();
        assert_eq!(
            decision,
            AccessDecision::Deny(Denial {
                topic_id: 42,
                category_id: 5,
                lock_address: "0xABC".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_anonymous_viewer_is_denied() {
        let store = Arc::new(MemoryContentStore::new());
        let gate = gate_with(&store);

        assert!(gate.is_locked(&Viewer::anonymous(), &premium_topic()).await.unwrap());
        assert_eq!(store.membership_queries(), 0);
    }

    #[tokio::test]
    async fn test_lock_without_group_denies_everyone_but_admins() {
        let store = Arc::new(MemoryContentStore::new());
        store.add_member(7, "members");
        let gate = gate_with(&store);

        let mut topic = premium_topic();
        topic.category.lock.required_group = None;

        assert!(gate.is_locked(&Viewer::user(7, "alice"), &topic).await.unwrap());
        assert!(!gate.is_locked(&Viewer::admin(1, "root"), &topic).await.unwrap());
    }

    #[tokio::test]
    async fn test_membership_changes_take_effect_immediately() {
        let store = Arc::new(MemoryContentStore::new());
        let gate = gate_with(&store);
        let alice = Viewer::user(7, "alice");

        assert!(gate.is_locked(&alice, &premium_topic()).await.unwrap());
        store.add_member(7, "members");
        assert!(!gate.is_locked(&alice, &premium_topic()).await.unwrap());
        store.remove_member(7, "members");
        assert!(gate.is_locked(&alice, &premium_topic()).await.unwrap());
    }

    #[tokio::test]
    async fn test_membership_failure_propagates() {
        let gate = AccessGate::new(Arc::new(OfflineMemberships));

        let err = gate
            .check(&Viewer::user(7, "alice"), &premium_topic())
            .await
            .unwrap_err();
        assert!(err.is_infrastructure());

        // Unlocked categories never reach the store
        assert!(!gate.is_locked(&Viewer::user(7, "alice"), &open_topic()).await.unwrap());
    }
}
