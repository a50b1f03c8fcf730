//! Requests, balancing policies, and provisioners.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{EntitySchema, Persistable};

/// Externally-observed lifecycle of a request. The client never writes this
/// directly; the provisioning service advances it in response to `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    New,
    Initializing,
    Pending,
    Running,
    Terminating,
    Cleanup,
    Terminated,
    Failure,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::New => "new",
            RequestState::Initializing => "initializing",
            RequestState::Pending => "pending",
            RequestState::Running => "running",
            RequestState::Terminating => "terminating",
            RequestState::Cleanup => "cleanup",
            RequestState::Terminated => "terminated",
            RequestState::Failure => "failure",
        }
    }

    /// Terminal states have no outgoing edges.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Terminated | RequestState::Failure)
    }

    /// Whether the provisioner may advance a request from `self` to `next`.
    /// The happy path is a straight line; `Failure` is reachable from every
    /// non-terminal state.
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        use RequestState::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failure {
            return true;
        }
        matches!(
            (self, next),
            (New, Initializing)
                | (Initializing, Pending)
                | (Pending, Running)
                | (Running, Terminating)
                | (Terminating, Cleanup)
                | (Cleanup, Terminated)
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-driven trigger observed by the provisioning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    New,
    Run,
    Terminate,
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestAction::New => "new",
            RequestAction::Run => "run",
            RequestAction::Terminate => "terminate",
        })
    }
}

/// Allocation-balancing strategy selector, e.g. `static-balanced`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub pluginname: String,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Policy {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        pluginname: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            pluginname: pluginname.into(),
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        }
    }
}

impl Persistable for Policy {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "policy",
        attributes: &[
            "name",
            "state",
            "owner",
            "pluginname",
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

/// A concrete cluster-instantiation request.
///
/// `queuesconf` and `authconf` hold base64-encoded configuration payloads;
/// `statusraw`/`statusinfo` are filled in by the provisioning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub name: String,
    pub state: RequestState,
    pub state_reason: Option<String>,
    pub owner: String,
    pub action: RequestAction,
    pub expiration: Option<String>,
    pub project: String,
    pub queuesconf: Option<String>,
    pub authconf: Option<String>,
    pub headnode: Option<String>,
    pub policy: Option<String>,
    pub allocations: Vec<String>,
    pub environments: Vec<String>,
    pub cluster: Option<String>,
    pub statusraw: Option<String>,
    pub statusinfo: Option<String>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Request {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        project: impl Into<String>,
        cluster: Option<String>,
        allocations: &[String],
        environments: &[String],
    ) -> Self {
        let request = Self {
            name: name.into(),
            state: RequestState::New,
            state_reason: Some("new".to_string()),
            owner: owner.into(),
            action: RequestAction::New,
            expiration: None,
            project: project.into(),
            queuesconf: None,
            authconf: None,
            headnode: None,
            policy: None,
            allocations: allocations.to_vec(),
            environments: environments.to_vec(),
            cluster,
            statusraw: None,
            statusinfo: None,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(request = %request.name, project = %request.project, "defined request");
        request
    }
}

impl Persistable for Request {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "request",
        attributes: &[
            "name",
            "state",
            "state_reason",
            "owner",
            "action",
            "expiration",
            "project",
            "queuesconf",
            "authconf",
            "headnode",
            "policy",
            "allocations",
            "environments",
            "cluster",
            "statusraw",
            "statusinfo",
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

/// A running factory instance backing request provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provisioner {
    pub name: String,
    pub state: String,
    pub owner: String,
    #[serde(rename = "type")]
    pub provisioner_type: String,
    pub authconfig: Option<String>,
    pub queuesconfig: Option<String>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Provisioner {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        provisioner_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            provisioner_type: provisioner_type.into(),
            authconfig: None,
            queuesconfig: None,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        }
    }
}

impl Persistable for Provisioner {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "provisioner",
        attributes: &[
            "name",
            "state",
            "owner",
            "type",
            "authconfig",
            "queuesconfig",
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
    fn happy_path_transitions() {
        use RequestState::*;
        let path = [New, Initializing, Pending, Running, Terminating, Cleanup, Terminated];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn failure_reachable_from_non_terminal_only() {
        use RequestState::*;
        for s in [New, Initializing, Pending, Running, Terminating, Cleanup] {
            assert!(s.can_transition_to(Failure));
        }
        assert!(!Terminated.can_transition_to(Failure));
        assert!(!Failure.can_transition_to(Failure));
    }

    #[test]
    fn no_skipping_ahead() {
        use RequestState::*;
        assert!(!New.can_transition_to(Running));
        assert!(!Pending.can_transition_to(Terminated));
        assert!(!Terminated.can_transition_to(New));
    }

    #[test]
    fn request_defaults() {
        let r = Request::new("r1", "alice", "p1", None, &[], &[]);
        assert_eq!(r.state, RequestState::New);
        assert_eq!(r.action, RequestAction::New);
        assert!(r.is_new());
    }
}
