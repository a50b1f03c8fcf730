//! User accounts and projects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{EntitySchema, Persistable};

/// A service user account.
///
/// `allocations` mirrors the allocations this user owns, so entitlement
/// checks can work from the user record alone when the store is consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub first: String,
    pub last: String,
    pub email: String,
    pub organization: String,
    pub identity_id: Option<String>,
    pub sshpubstring: Option<String>,
    pub allocations: Vec<String>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl User {
    /// Defines a new user. Pure constructor, no store side effect.
    pub fn new(
        name: impl Into<String>,
        first: impl Into<String>,
        last: impl Into<String>,
        email: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let user = Self {
            owner: name.clone(),
            name,
            state: "new".to_string(),
            first: first.into(),
            last: last.into(),
            email: email.into(),
            organization: organization.into(),
            identity_id: None,
            sshpubstring: None,
            allocations: Vec::new(),
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(user = %user.name, "defined user");
        user
    }

    /// Records an allocation owned by this user, de-duplicated.
    pub fn add_allocation(&mut self, allocation: &str) {
        if !self.allocations.iter().any(|a| a == allocation) {
            self.allocations.push(allocation.to_string());
        }
    }

    /// Drops an allocation from this user's mirror list.
    pub fn remove_allocation(&mut self, allocation: &str) {
        self.allocations.retain(|a| a != allocation);
    }
}

impl Persistable for User {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "user",
        attributes: &[
            "name",
            "state",
            "owner",
            "first",
            "last",
            "email",
            "organization",
            "identity_id",
            "sshpubstring",
            "allocations",
            "description",
            "displayname",
            "url",
            "docurl",
        ],
    };

    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn is_new(&self) -> bool {
        self.fresh
    }

    fn mark_stored(&mut self) {
        self.fresh = false;
    }
}

/// A project: a named group of users sharing allocations.
///
/// Invariant: the owner is always a member. Construction inserts the owner;
/// the member mutators never remove them implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub members: Vec<String>,
    pub allocations: Vec<String>,
    pub blueprints: Vec<String>,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Project {
    /// Defines a new project. The owner is inserted into `members` whether
    /// or not the supplied list names them.
    pub fn new(name: impl Into<String>, owner: impl Into<String>, members: &[String]) -> Self {
        let owner = owner.into();
        let mut all_members = vec![owner.clone()];
        for m in members {
            if !all_members.contains(m) {
                all_members.push(m.clone());
            }
        }
        let project = Self {
            name: name.into(),
            state: "new".to_string(),
            owner,
            members: all_members,
            allocations: Vec::new(),
            blueprints: Vec::new(),
            organization: None,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(project = %project.name, owner = %project.owner, "defined project");
        project
    }

    /// Adds a member, de-duplicated.
    pub fn add_member(&mut self, user: &str) {
        if !self.members.iter().any(|m| m == user) {
            self.members.push(user.to_string());
        }
    }

    /// Removes a member. The owner stays a member regardless.
    pub fn remove_member(&mut self, user: &str) {
        if user == self.owner {
            return;
        }
        self.members.retain(|m| m != user);
    }

    /// Attaches an allocation name, de-duplicated.
    pub fn add_allocation(&mut self, allocation: &str) {
        if !self.allocations.iter().any(|a| a == allocation) {
            self.allocations.push(allocation.to_string());
        }
    }

    /// Detaches an allocation name.
    pub fn remove_allocation(&mut self, allocation: &str) {
        self.allocations.retain(|a| a != allocation);
    }
}

impl Persistable for Project {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "project",
        attributes: &[
            "name",
            "state",
            "owner",
            "members",
            "allocations",
            "blueprints",
            "organization",
            "description",
            "displayname",
            "url",
            "docurl",
        ],
    };

    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn is_new(&self) -> bool {
        self.fresh
    }

    fn mark_stored(&mut self) {
        self.fresh = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_always_a_member() {
        let p = Project::new("p1", "alice", &[]);
        assert_eq!(p.members, vec!["alice"]);

        let p = Project::new("p2", "alice", &["bob".into(), "alice".into()]);
        assert_eq!(p.members, vec!["alice", "bob"]);
    }

    #[test]
    fn owner_cannot_be_removed() {
        let mut p = Project::new("p1", "alice", &["bob".into()]);
        p.remove_member("alice");
        assert!(p.members.contains(&"alice".to_string()));
        p.remove_member("bob");
        assert_eq!(p.members, vec!["alice"]);
    }

    #[test]
    fn member_add_deduplicates() {
        let mut p = Project::new("p1", "alice", &[]);
        p.add_member("bob");
        p.add_member("bob");
        assert_eq!(p.members, vec!["alice", "bob"]);
    }

    #[test]
    fn allocation_attach_detach() {
        let mut p = Project::new("p1", "alice", &[]);
        p.add_allocation("alice.cluster1");
        p.add_allocation("alice.cluster1");
        assert_eq!(p.allocations.len(), 1);
        p.remove_allocation("alice.cluster1");
        assert!(p.allocations.is_empty());
    }
}
