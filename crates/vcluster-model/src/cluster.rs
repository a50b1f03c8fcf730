//! Cluster templates, node groups, and software environments.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{EntitySchema, Persistable};

/// Per-node hardware descriptor referenced by nodesets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nodeinfo {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub cores: Option<u32>,
    pub memory_mb: Option<u64>,
    pub storage_mb: Option<u64>,
    pub native_os: Option<String>,
    pub features: Vec<String>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Nodeinfo {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            cores: None,
            memory_mb: None,
            storage_mb: None,
            native_os: None,
            features: Vec::new(),
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        }
    }
}

impl Persistable for Nodeinfo {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "nodeinfo",
        attributes: &[
            "name",
            "state",
            "owner",
            "cores",
            "memory_mb",
            "storage_mb",
            "native_os",
            "features",
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

/// Role a nodeset plays inside a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppRole {
    HeadNode,
    WorkerNodes,
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppRole::HeadNode => "head-node",
            AppRole::WorkerNodes => "worker-nodes",
        })
    }
}

/// Which workers a scale-down removes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillOrder {
    Newest,
    Oldest,
}

/// A homogeneous group of nodes running one application role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nodeset {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub node_number: u32,
    pub app_type: String,
    pub app_role: AppRole,
    pub nodeinfo: Option<String>,
    pub environment: Option<String>,
    pub app_host: Option<String>,
    pub app_port: Option<u16>,
    pub app_sectoken: Option<String>,
    pub app_peaceful: Option<bool>,
    pub app_lingertime: Option<u64>,
    pub app_killorder: Option<KillOrder>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Nodeset {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        node_number: u32,
        app_type: impl Into<String>,
        app_role: AppRole,
    ) -> Self {
        let nodeset = Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            node_number,
            app_type: app_type.into(),
            app_role,
            nodeinfo: None,
            environment: None,
            app_host: None,
            app_port: None,
            app_sectoken: None,
            app_peaceful: None,
            app_lingertime: None,
            app_killorder: None,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(nodeset = %nodeset.name, role = %nodeset.app_role, "defined nodeset");
        nodeset
    }
}

impl Persistable for Nodeset {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "nodeset",
        attributes: &[
            "name",
            "state",
            "owner",
            "node_number",
            "app_type",
            "app_role",
            "nodeinfo",
            "environment",
            "app_host",
            "app_port",
            "app_sectoken",
            "app_peaceful",
            "app_lingertime",
            "app_killorder",
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

/// A cluster layout: an ordered list of nodeset names. Marked `public` it
/// becomes a template shareable across projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub nodesets: Vec<String>,
    pub public: bool,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Cluster {
    pub fn new(name: impl Into<String>, owner: impl Into<String>, nodesets: &[String]) -> Self {
        let cluster = Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            nodesets: nodesets.to_vec(),
            public: false,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(cluster = %cluster.name, "defined cluster");
        cluster
    }

    /// Appends a nodeset name, de-duplicated, preserving order.
    pub fn add_nodeset(&mut self, nodeset: &str) {
        if !self.nodesets.iter().any(|n| n == nodeset) {
            self.nodesets.push(nodeset.to_string());
        }
    }

    /// Removes a nodeset name.
    pub fn remove_nodeset(&mut self, nodeset: &str) {
        self.nodesets.retain(|n| n != nodeset);
    }
}

impl Persistable for Cluster {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "cluster",
        attributes: &[
            "name",
            "state",
            "owner",
            "nodesets",
            "public",
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

/// Node- and job-level software environment for a user task.
///
/// `files` maps file names to base64-encoded payloads so arbitrary content
/// survives the text-only store documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub packagelist: Vec<String>,
    pub envmap: HashMap<String, String>,
    pub files: HashMap<String, String>,
    pub command: Option<String>,
    pub required_os: Option<String>,
    pub builder_extra_args: Option<Vec<String>>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Environment {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            packagelist: Vec::new(),
            envmap: HashMap::new(),
            files: HashMap::new(),
            command: None,
            required_os: None,
            builder_extra_args: None,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        }
    }
}

impl Persistable for Environment {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "environment",
        attributes: &[
            "name",
            "state",
            "owner",
            "packagelist",
            "envmap",
            "files",
            "command",
            "required_os",
            "builder_extra_args",
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
    use crate::schema::to_document;

    #[test]
    fn app_role_wire_names() {
        let ns = Nodeset::new("head", "alice", 1, "htcondor", AppRole::HeadNode);
        let doc = to_document(&ns).unwrap();
        let attrs = doc.get("head").unwrap();
        assert_eq!(attrs.get("app_role").unwrap(), "head-node");

        let ns = Nodeset::new("workers", "alice", 8, "htcondor", AppRole::WorkerNodes);
        let doc = to_document(&ns).unwrap();
        assert_eq!(
            doc.get("workers").unwrap().get("app_role").unwrap(),
            "worker-nodes"
        );
    }

    #[test]
    fn cluster_nodeset_order_and_dedup() {
        let mut c = Cluster::new("c1", "alice", &[]);
        c.add_nodeset("head");
        c.add_nodeset("workers");
        c.add_nodeset("head");
        assert_eq!(c.nodesets, vec!["head", "workers"]);
        c.remove_nodeset("head");
        assert_eq!(c.nodesets, vec!["workers"]);
    }
}
