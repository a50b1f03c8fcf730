//! Compute resources, allocations, and private token material.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{EntitySchema, Persistable};

/// A registered compute resource (batch cluster, grid site, cloud).
///
/// Owner is the administrator who registered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub accesstype: String,
    pub accessmethod: String,
    pub accessflavor: String,
    pub accesshost: String,
    pub accessport: String,
    pub accessgateway: Option<String>,
    pub nodeinfo: Option<String>,
    pub scratchdir: Option<String>,
    pub gridresource: Option<String>,
    pub cloudspotprice: Option<String>,
    pub cloudinstancetype: Option<String>,
    pub mfa: bool,
    pub public: bool,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Resource {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        accesstype: impl Into<String>,
        accessmethod: impl Into<String>,
        accessflavor: impl Into<String>,
        accesshost: impl Into<String>,
        accessport: impl Into<String>,
    ) -> Self {
        let resource = Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            accesstype: accesstype.into(),
            accessmethod: accessmethod.into(),
            accessflavor: accessflavor.into(),
            accesshost: accesshost.into(),
            accessport: accessport.into(),
            accessgateway: None,
            nodeinfo: None,
            scratchdir: None,
            gridresource: None,
            cloudspotprice: None,
            cloudinstancetype: None,
            mfa: false,
            public: false,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(resource = %resource.name, "defined resource");
        resource
    }
}

impl Persistable for Resource {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "resource",
        attributes: &[
            "name",
            "state",
            "owner",
            "accesstype",
            "accessmethod",
            "accessflavor",
            "accesshost",
            "accessport",
            "accessgateway",
            "nodeinfo",
            "scratchdir",
            "gridresource",
            "cloudspotprice",
            "cloudinstancetype",
            "mfa",
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

/// Lifecycle of an allocation. Validation is one-way and
/// administrator-driven; there is no edge back to `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationState {
    New,
    Validated,
}

impl AllocationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationState::New => "new",
            AllocationState::Validated => "validated",
        }
    }
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access granted to a user on a resource.
///
/// `owner`, `resource`, `accountname`, and `url` are fixed at creation; the
/// authorization layer rejects stores that change any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub name: String,
    pub state: AllocationState,
    pub state_reason: Option<String>,
    pub owner: String,
    pub resource: String,
    pub accountname: String,
    pub action: Option<String>,
    #[serde(rename = "type")]
    pub allocation_type: Option<String>,
    pub quantity: Option<String>,
    pub units: Option<String>,
    pub sectype: Option<String>,
    pub pubtoken: Option<String>,
    pub privtoken: Option<String>,
    pub pubtokendocurl: Option<String>,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl Allocation {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        resource: impl Into<String>,
        accountname: impl Into<String>,
    ) -> Self {
        let allocation = Self {
            name: name.into(),
            state: AllocationState::New,
            state_reason: None,
            owner: owner.into(),
            resource: resource.into(),
            accountname: accountname.into(),
            action: None,
            allocation_type: None,
            quantity: None,
            units: None,
            sectype: None,
            pubtoken: None,
            privtoken: None,
            pubtokendocurl: None,
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        };
        debug!(allocation = %allocation.name, "defined allocation");
        allocation
    }

    /// True once an administrator has validated this allocation.
    pub fn is_validated(&self) -> bool {
        self.state == AllocationState::Validated
    }
}

impl Persistable for Allocation {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "allocation",
        attributes: &[
            "name",
            "state",
            "state_reason",
            "owner",
            "resource",
            "accountname",
            "action",
            "type",
            "quantity",
            "units",
            "sectype",
            "pubtoken",
            "privtoken",
            "pubtokendocurl",
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

/// Sensitive key material held separately from the allocation record so it
/// can be access-controlled on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateToken {
    pub name: String,
    pub state: String,
    pub owner: String,
    pub data: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub description: Option<String>,
    pub displayname: Option<String>,
    pub url: Option<String>,
    pub docurl: Option<String>,
    #[serde(skip, default)]
    fresh: bool,
}

impl PrivateToken {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        data: impl Into<String>,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state: "new".to_string(),
            owner: owner.into(),
            data: data.into(),
            token_type: token_type.into(),
            description: None,
            displayname: None,
            url: None,
            docurl: None,
            fresh: true,
        }
    }
}

impl Persistable for PrivateToken {
    const SCHEMA: EntitySchema = EntitySchema {
        category: "privatetoken",
        attributes: &[
            "name",
            "state",
            "owner",
            "data",
            "type",
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
    use crate::schema::{from_document, to_document};

    #[test]
    fn allocation_states_serialize_lowercase() {
        let mut a = Allocation::new("alice.cluster1", "alice", "cluster1", "aadams");
        let doc = to_document(&a).unwrap();
        let attrs = doc.get("alice.cluster1").unwrap();
        assert_eq!(attrs.get("state").unwrap(), "new");

        a.state = AllocationState::Validated;
        let doc = to_document(&a).unwrap();
        let attrs = doc.get("alice.cluster1").unwrap();
        assert_eq!(attrs.get("state").unwrap(), "validated");
    }

    #[test]
    fn allocation_type_uses_wire_name() {
        let mut a = Allocation::new("alice.cluster1", "alice", "cluster1", "aadams");
        a.allocation_type = Some("quota".to_string());
        let doc = to_document(&a).unwrap();
        let attrs = doc.get("alice.cluster1").unwrap();
        assert_eq!(attrs.get("type").unwrap(), "quota");

        let back: Allocation = from_document(&doc).unwrap();
        assert_eq!(back.allocation_type.as_deref(), Some("quota"));
    }
}
