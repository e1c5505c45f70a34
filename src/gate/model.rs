//! Data model consumed by the access gate
//!
//! Categories, topics and viewers are owned by the content store; lockgate
//! only reads them.

use serde::{Deserialize, Serialize};

/// Category custom field holding the external lock address
pub const CF_LOCK_ADDRESS: &str = "unlock-lock";
/// Category custom field holding the lock display icon
pub const CF_LOCK_ICON: &str = "unlock-icon";
/// Category custom field holding the required membership group
pub const CF_LOCK_GROUP: &str = "unlock-group";

/// Lock attached to a category
///
/// A blank `lock_address` means the category is unlocked, whatever the other
/// fields say.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLock {
    pub lock_address: Option<String>,
    pub lock_icon: Option<String>,
    pub required_group: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl CategoryLock {
    /// A lock keyed by `address` that admits members of `group`
    pub fn new(address: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            lock_address: Some(address.into()),
            lock_icon: None,
            required_group: Some(group.into()),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.lock_icon = Some(icon.into());
        self
    }

    /// Lock address, if one is configured
    pub fn address(&self) -> Option<&str> {
        non_blank(&self.lock_address)
    }

    /// Lock icon, if one is configured
    pub fn icon(&self) -> Option<&str> {
        non_blank(&self.lock_icon)
    }

    /// Group whose members may read the category
    pub fn required_group(&self) -> Option<&str> {
        non_blank(&self.required_group)
    }

    pub fn is_configured(&self) -> bool {
        self.address().is_some()
    }
}

/// A content category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub lock: CategoryLock,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            lock: CategoryLock::default(),
        }
    }

    pub fn locked(mut self, lock: CategoryLock) -> Self {
        self.lock = lock;
        self
    }
}

/// A discussion topic; inherits the lock of its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub category: Category,
    /// Unlisted topics are only visible to staff
    pub visible: bool,
}

impl Topic {
    pub fn new(id: i64, slug: impl Into<String>, title: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: title.into(),
            category,
            visible: true,
        }
    }

    /// Canonical relative URL, e.g. `/t/welcome/42`
    pub fn relative_url(&self) -> String {
        format!("/t/{}/{}", self.slug, self.id)
    }

    pub fn lock(&self) -> &CategoryLock {
        &self.category.lock
    }
}

/// The identity and role of whoever is asking to view a resource
///
/// Group memberships are not carried here: they are queried live through
/// [`crate::store::MembershipStore`] so that changes apply immediately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub is_admin: bool,
    pub is_moderator: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn admin(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::user(user_id, username)
        }
    }

    pub fn is_staff(&self) -> bool {
        self.is_admin || self.is_moderator
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}
