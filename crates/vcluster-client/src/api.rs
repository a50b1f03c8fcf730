//! The authorization and cascade engine.
//!
//! [`ClientApi`] wraps every mutating or listing operation with policy
//! checks against a [`Caller`] identity before anything reaches the store.
//! The gate table is fixed:
//!
//! - validity: a caller identity must name a stored user;
//! - ownership: project/resource/allocation/cluster/request mutation and
//!   deletion require the caller to be the entity's owner, with the member
//!   self-removal and allocation-attach exceptions;
//! - entitlement: creating a project, and storing or listing clusters,
//!   require a validated allocation or an existing project membership;
//! - reference: allocations must point at a real resource and never change
//!   their immutable fields;
//! - cross-entity: a request's allocations must be attached to its project.
//!
//! Read-only single-entity calls skip the gates and go straight to the
//! store.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, info, warn};

use vcluster_model::{
    Allocation, Cluster, Environment, Nodeinfo, Nodeset, Persistable, Policy, PrivateToken,
    Project, Provisioner, Request, RequestAction, RequestState, Resource, User,
};

use crate::error::{ClientError, Result};
use crate::store::{self, InfoStore};

/// The identity an operation is authorized as.
///
/// There is deliberately no "no identity" value: unauthenticated trust is
/// expressed only by the explicit, greppable [`Caller::System`], reserved
/// for trusted service components (the provisioner, admin tooling).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Privileged service identity; policy gates are skipped.
    System,
    /// A named user; every gate applies.
    User(String),
}

impl Caller {
    /// Convenience constructor for a user caller.
    pub fn user(name: impl Into<String>) -> Self {
        Caller::User(name.into())
    }
}

/// Which embedded configuration payload of a request to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfKind {
    Queues,
    Auth,
}

/// Client API over an [`InfoStore`].
///
/// `define_*` construction is pure and lives on the model types; `store_*`
/// here persists (first store = create, subsequent = update), `get_*` /
/// `list_*` read, `delete_*` remove.
pub struct ClientApi {
    store: Arc<dyn InfoStore>,
}

impl ClientApi {
    pub fn new(store: Arc<dyn InfoStore>) -> Self {
        Self { store }
    }

    fn store(&self) -> &dyn InfoStore {
        self.store.as_ref()
    }

    /// Base64-encodes an opaque payload for embedding in store documents.
    pub fn encode(payload: &str) -> String {
        BASE64.encode(payload.as_bytes())
    }

    /// Decodes a base64 payload back to text.
    pub fn decode(payload: &str) -> Result<String> {
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Gate helpers
    // ------------------------------------------------------------------

    /// Validity gate: resolves the caller to a policy user name, or `None`
    /// for the privileged system identity. An identity that does not name a
    /// stored user is refused outright.
    async fn policy_user(&self, caller: &Caller) -> Result<Option<String>> {
        match caller {
            Caller::System => Ok(None),
            Caller::User(name) => {
                if store::get_entity::<User>(self.store(), name).await?.is_none() {
                    warn!(user = %name, "policy check by unknown user");
                    return Err(ClientError::denied(name, "not a valid user"));
                }
                Ok(Some(name.clone()))
            }
        }
    }

    /// Whether `user` owns at least one allocation in state `validated`.
    async fn has_validated_allocation(&self, user: &str) -> Result<bool> {
        let allocations: Vec<Allocation> = store::list_entities(self.store()).await?;
        Ok(allocations
            .iter()
            .any(|a| a.owner == user && a.is_validated()))
    }

    /// Whether `user` owns or belongs to any project.
    async fn has_project(&self, user: &str) -> Result<bool> {
        let projects: Vec<Project> = store::list_entities(self.store()).await?;
        Ok(projects
            .iter()
            .any(|p| p.owner == user || p.members.iter().any(|m| m == user)))
    }

    /// Entitlement gate: a validated allocation or an existing project.
    async fn require_entitled(&self, user: &str) -> Result<()> {
        if self.has_validated_allocation(user).await? || self.has_project(user).await? {
            return Ok(());
        }
        Err(ClientError::denied(
            user,
            "no validated allocation and no project membership",
        ))
    }

    fn require_owner(user: &str, owner: &str, what: &str) -> Result<()> {
        if user == owner {
            return Ok(());
        }
        Err(ClientError::denied(
            user,
            format!("only the owner '{owner}' may modify {what}"),
        ))
    }

    /// Create-vs-update store with the conflict rules: a newly defined
    /// entity must not collide with an existing name, an update must find
    /// one.
    async fn persist<E: Persistable>(&self, entity: &mut E) -> Result<()> {
        let exists = store::entity_exists::<E>(self.store(), entity.name()).await?;
        if entity.is_new() && exists {
            return Err(ClientError::EntityExists(entity.name().to_string()));
        }
        if !entity.is_new() && !exists {
            return Err(ClientError::EntityUpdateMissing(entity.name().to_string()));
        }
        store::put_entity(self.store(), entity).await?;
        entity.mark_stored();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Stores a user record. Registration is a bootstrap operation and is
    /// not policy-gated; see DESIGN.md.
    pub async fn store_user(&self, user: &mut User, _caller: &Caller) -> Result<()> {
        self.persist(user).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_user(&self, name: &str) -> Result<Option<User>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_user(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<User>(self.store(), name).await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Stores a project. Creating one requires entitlement; creating or
    /// updating requires ownership.
    pub async fn store_project(&self, project: &mut Project, caller: &Caller) -> Result<()> {
        if let Some(user) = self.policy_user(caller).await? {
            if project.is_new() {
                self.require_entitled(&user).await?;
            }
            Self::require_owner(&user, &project.owner, &format!("project '{}'", project.name))?;
        }
        self.persist(project).await?;
        info!(project = %project.name, "stored project");
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_project(&self, name: &str) -> Result<Option<Project>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_project(&self, name: &str, caller: &Caller) -> Result<()> {
        let project = self
            .get_project(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &project.owner, &format!("project '{name}'"))?;
        }
        store::delete_entity::<Project>(self.store(), name).await
    }

    pub async fn projects_of_owner(&self, owner: &str) -> Result<Vec<Project>> {
        let projects = self.list_projects().await?;
        Ok(projects.into_iter().filter(|p| p.owner == owner).collect())
    }

    pub async fn projects_of_user(&self, user: &str) -> Result<Vec<Project>> {
        let projects = self.list_projects().await?;
        Ok(projects
            .into_iter()
            .filter(|p| p.members.iter().any(|m| m == user))
            .collect())
    }

    /// Adds a member to a project. Only the project owner may add.
    pub async fn add_user_to_project(
        &self,
        username: &str,
        projectname: &str,
        caller: &Caller,
    ) -> Result<()> {
        let mut project = self
            .get_project(projectname)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(projectname.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &project.owner, &format!("project '{projectname}'"))?;
        }
        project.add_member(username);
        self.persist(&mut project).await
    }

    /// Removes a member. The owner may remove anyone; a member may remove
    /// themself.
    pub async fn remove_user_from_project(
        &self,
        username: &str,
        projectname: &str,
        caller: &Caller,
    ) -> Result<()> {
        let mut project = self
            .get_project(projectname)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(projectname.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            if user != project.owner && user != username {
                return Err(ClientError::denied(
                    user,
                    format!("may not remove '{username}' from project '{projectname}'"),
                ));
            }
        }
        project.remove_member(username);
        self.persist(&mut project).await
    }

    /// Attaches an allocation to a project. The caller must own the
    /// allocation; the project's owner has no say here.
    pub async fn add_allocation_to_project(
        &self,
        allocationname: &str,
        projectname: &str,
        caller: &Caller,
    ) -> Result<()> {
        let mut project = self
            .get_project(projectname)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(projectname.to_string()))?;
        let allocation = self
            .get_allocation(allocationname)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(allocationname.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(
                &user,
                &allocation.owner,
                &format!("allocation '{allocationname}'"),
            )?;
        }
        project.add_allocation(allocationname);
        self.persist(&mut project).await
    }

    /// Detaches an allocation from a project; same gate as attach.
    pub async fn remove_allocation_from_project(
        &self,
        allocationname: &str,
        projectname: &str,
        caller: &Caller,
    ) -> Result<()> {
        let mut project = self
            .get_project(projectname)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(projectname.to_string()))?;
        let allocation = self
            .get_allocation(allocationname)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(allocationname.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(
                &user,
                &allocation.owner,
                &format!("allocation '{allocationname}'"),
            )?;
        }
        project.remove_allocation(allocationname);
        self.persist(&mut project).await
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub async fn store_resource(&self, resource: &mut Resource, caller: &Caller) -> Result<()> {
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &resource.owner, &format!("resource '{}'", resource.name))?;
        }
        self.persist(resource).await
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_resource(&self, name: &str) -> Result<Option<Resource>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_resource(&self, name: &str, caller: &Caller) -> Result<()> {
        let resource = self
            .get_resource(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &resource.owner, &format!("resource '{name}'"))?;
        }
        store::delete_entity::<Resource>(self.store(), name).await
    }

    // ------------------------------------------------------------------
    // Allocations
    // ------------------------------------------------------------------

    /// Stores an allocation. Gated calls re-validate the resource reference
    /// and, on update, that none of the immutable fields (`owner`,
    /// `resource`, `accountname`, `url`) changed — even for the owner.
    pub async fn store_allocation(
        &self,
        allocation: &mut Allocation,
        caller: &Caller,
    ) -> Result<()> {
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(
                &user,
                &allocation.owner,
                &format!("allocation '{}'", allocation.name),
            )?;
            if self.get_resource(&allocation.resource).await?.is_none() {
                return Err(ClientError::denied(
                    user,
                    format!("resource '{}' does not exist", allocation.resource),
                ));
            }
            if let Some(stored) = self.get_allocation(&allocation.name).await? {
                let unchanged = stored.owner == allocation.owner
                    && stored.resource == allocation.resource
                    && stored.accountname == allocation.accountname
                    && stored.url == allocation.url;
                if !unchanged {
                    return Err(ClientError::denied(
                        user,
                        format!(
                            "allocation '{}' immutable fields may not change",
                            allocation.name
                        ),
                    ));
                }
            }
        }
        self.persist(allocation).await
    }

    pub async fn list_allocations(&self) -> Result<Vec<Allocation>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_allocation(&self, name: &str) -> Result<Option<Allocation>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_allocation(&self, name: &str, caller: &Caller) -> Result<()> {
        let allocation = self
            .get_allocation(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &allocation.owner, &format!("allocation '{name}'"))?;
        }
        store::delete_entity::<Allocation>(self.store(), name).await
    }

    /// Decoded public token of an allocation, if one is attached.
    pub async fn allocation_pub_token(&self, name: &str) -> Result<Option<String>> {
        let allocation = self
            .get_allocation(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        match allocation.pubtoken.as_deref() {
            Some(token) => Ok(Some(Self::decode(token)?)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Nodeinfo / Nodesets / Environments / Policies / Provisioners / Tokens
    // ------------------------------------------------------------------

    pub async fn store_nodeinfo(&self, nodeinfo: &mut Nodeinfo, _caller: &Caller) -> Result<()> {
        self.persist(nodeinfo).await
    }

    pub async fn list_nodeinfos(&self) -> Result<Vec<Nodeinfo>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_nodeinfo(&self, name: &str) -> Result<Option<Nodeinfo>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_nodeinfo(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<Nodeinfo>(self.store(), name).await
    }

    pub async fn store_nodeset(&self, nodeset: &mut Nodeset, _caller: &Caller) -> Result<()> {
        self.persist(nodeset).await
    }

    pub async fn list_nodesets(&self) -> Result<Vec<Nodeset>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_nodeset(&self, name: &str) -> Result<Option<Nodeset>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_nodeset(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<Nodeset>(self.store(), name).await
    }

    pub async fn store_environment(
        &self,
        environment: &mut Environment,
        _caller: &Caller,
    ) -> Result<()> {
        self.persist(environment).await
    }

    pub async fn list_environments(&self) -> Result<Vec<Environment>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_environment(&self, name: &str) -> Result<Option<Environment>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_environment(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<Environment>(self.store(), name).await
    }

    pub async fn store_policy(&self, policy: &mut Policy, _caller: &Caller) -> Result<()> {
        self.persist(policy).await
    }

    pub async fn list_policies(&self) -> Result<Vec<Policy>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_policy(&self, name: &str) -> Result<Option<Policy>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_policy(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<Policy>(self.store(), name).await
    }

    pub async fn store_provisioner(
        &self,
        provisioner: &mut Provisioner,
        _caller: &Caller,
    ) -> Result<()> {
        self.persist(provisioner).await
    }

    pub async fn list_provisioners(&self) -> Result<Vec<Provisioner>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_provisioner(&self, name: &str) -> Result<Option<Provisioner>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_provisioner(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<Provisioner>(self.store(), name).await
    }

    pub async fn store_private_token(
        &self,
        token: &mut PrivateToken,
        _caller: &Caller,
    ) -> Result<()> {
        self.persist(token).await
    }

    pub async fn list_private_tokens(&self) -> Result<Vec<PrivateToken>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_private_token(&self, name: &str) -> Result<Option<PrivateToken>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_private_token(&self, name: &str, _caller: &Caller) -> Result<()> {
        store::delete_entity::<PrivateToken>(self.store(), name).await
    }

    // ------------------------------------------------------------------
    // Clusters
    // ------------------------------------------------------------------

    /// Stores a cluster. Requires entitlement and ownership.
    pub async fn store_cluster(&self, cluster: &mut Cluster, caller: &Caller) -> Result<()> {
        if let Some(user) = self.policy_user(caller).await? {
            self.require_entitled(&user).await?;
            Self::require_owner(&user, &cluster.owner, &format!("cluster '{}'", cluster.name))?;
        }
        self.persist(cluster).await
    }

    /// Lists clusters. Listing is entitlement-gated, unlike other reads:
    /// templates describe site capacity and are not world-readable.
    pub async fn list_clusters(&self, caller: &Caller) -> Result<Vec<Cluster>> {
        if let Some(user) = self.policy_user(caller).await? {
            self.require_entitled(&user).await?;
        }
        store::list_entities(self.store()).await
    }

    pub async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        store::get_entity(self.store(), name).await
    }

    pub async fn delete_cluster(&self, name: &str, caller: &Caller) -> Result<()> {
        let cluster = self
            .get_cluster(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &cluster.owner, &format!("cluster '{name}'"))?;
        }
        store::delete_entity::<Cluster>(self.store(), name).await
    }

    pub async fn add_nodeset_to_cluster(
        &self,
        nodesetname: &str,
        clustername: &str,
        caller: &Caller,
    ) -> Result<()> {
        let mut cluster = self
            .get_cluster(clustername)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(clustername.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &cluster.owner, &format!("cluster '{clustername}'"))?;
        }
        cluster.add_nodeset(nodesetname);
        self.persist(&mut cluster).await
    }

    pub async fn remove_nodeset_from_cluster(
        &self,
        nodesetname: &str,
        clustername: &str,
        caller: &Caller,
    ) -> Result<()> {
        let mut cluster = self
            .get_cluster(clustername)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(clustername.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &cluster.owner, &format!("cluster '{clustername}'"))?;
        }
        cluster.remove_nodeset(nodesetname);
        self.persist(&mut cluster).await
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Stores a request. Gated calls require ownership, an existing
    /// project, and that every requested allocation is attached to it.
    pub async fn store_request(&self, request: &mut Request, caller: &Caller) -> Result<()> {
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &request.owner, &format!("request '{}'", request.name))?;
            let project = match self.get_project(&request.project).await? {
                Some(p) => p,
                None => {
                    return Err(ClientError::denied(
                        user,
                        format!("project '{}' does not exist", request.project),
                    ));
                }
            };
            for allocation in &request.allocations {
                if !project.allocations.iter().any(|a| a == allocation) {
                    return Err(ClientError::denied(
                        user,
                        format!(
                            "allocation '{allocation}' is not attached to project '{}'",
                            project.name
                        ),
                    ));
                }
            }
        }
        self.persist(request).await
    }

    pub async fn list_requests(&self) -> Result<Vec<Request>> {
        store::list_entities(self.store()).await
    }

    pub async fn get_request(&self, name: &str) -> Result<Option<Request>> {
        store::get_entity(self.store(), name).await
    }

    /// Deletes a request together with its cloned cluster and that
    /// cluster's nodesets.
    ///
    /// The cascade is an ordered sequence of independent store calls. A
    /// failing step propagates immediately; earlier deletions stay deleted
    /// and nothing is rolled back.
    pub async fn delete_request(&self, name: &str, caller: &Caller) -> Result<()> {
        let request = self
            .get_request(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &request.owner, &format!("request '{name}'"))?;
        }

        if let Some(clustername) = &request.cluster {
            let cluster = self
                .get_cluster(clustername)
                .await?
                .ok_or_else(|| ClientError::EntityMissing(clustername.to_string()))?;
            for nodeset in &cluster.nodesets {
                info!(request = name, nodeset, "cascade: deleting nodeset");
                store::delete_entity::<Nodeset>(self.store(), nodeset).await?;
            }
            info!(request = name, cluster = %clustername, "cascade: deleting cluster");
            store::delete_entity::<Cluster>(self.store(), clustername).await?;
        }

        info!(request = name, "deleting request");
        store::delete_entity::<Request>(self.store(), name).await
    }

    /// Asks the provisioner to tear the cluster down: sets
    /// `action = terminate`, the only action mutation a client may make.
    pub async fn terminate_request(&self, name: &str, caller: &Caller) -> Result<()> {
        let mut request = self
            .get_request(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        if let Some(user) = self.policy_user(caller).await? {
            Self::require_owner(&user, &request.owner, &format!("request '{name}'"))?;
        }
        debug!(request = name, "setting action to terminate");
        request.action = RequestAction::Terminate;
        self.persist(&mut request).await
    }

    /// Raw status pair `(statusraw, statusinfo)` as reported by the
    /// provisioning service.
    pub async fn request_status(&self, name: &str) -> Result<(Option<String>, Option<String>)> {
        let request = self
            .get_request(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        Ok((request.statusraw, request.statusinfo))
    }

    /// Lifecycle pair `(state, state_reason)`.
    pub async fn request_state(&self, name: &str) -> Result<(RequestState, Option<String>)> {
        let request = self
            .get_request(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        Ok((request.state, request.state_reason))
    }

    /// Decoded text of a request's embedded queues/auth configuration.
    pub async fn conf_string(&self, kind: ConfKind, name: &str) -> Result<String> {
        let request = self
            .get_request(name)
            .await?
            .ok_or_else(|| ClientError::EntityMissing(name.to_string()))?;
        let (payload, label) = match kind {
            ConfKind::Queues => (request.queuesconf, "queues"),
            ConfKind::Auth => (request.authconf, "auth"),
        };
        match payload {
            Some(encoded) => Self::decode(&encoded),
            None => Err(ClientError::Decode(format!(
                "request '{name}' has no {label} configuration"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Pairing
    // ------------------------------------------------------------------

    /// Requests an X.509 pairing; returns the one-time code.
    pub async fn request_pairing(&self, common_name: &str) -> Result<String> {
        self.store.request_pairing(common_name).await
    }

    /// Retrieves `(cert, key)` for a pairing code once satisfied.
    pub async fn get_pairing(&self, code: &str) -> Result<(String, String)> {
        self.store.get_pairing(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryInfoStore;
    use vcluster_model::{AllocationState, AppRole};

    fn api() -> ClientApi {
        ClientApi::new(Arc::new(MemoryInfoStore::new()))
    }

    async fn seed_user(api: &ClientApi, name: &str) {
        let mut user = User::new(name, "Test", "User", "test@lab.edu", "Example Lab");
        api.store_user(&mut user, &Caller::System).await.unwrap();
    }

    /// Creates resource `resource` and a validated allocation on it owned
    /// by `owner`, returning the allocation name.
    async fn seed_validated_allocation(api: &ClientApi, owner: &str, resource: &str) -> String {
        let mut res = Resource::new(resource, "sysadmin", "batch", "ssh", "slurm", "login.host", "22");
        api.store_resource(&mut res, &Caller::System).await.unwrap();

        let name = format!("{owner}.{resource}");
        let mut alloc = Allocation::new(&name, owner, resource, owner);
        alloc.state = AllocationState::Validated;
        api.store_allocation(&mut alloc, &Caller::System).await.unwrap();
        name
    }

    #[tokio::test]
    async fn unknown_policy_user_is_refused() {
        let api = api();
        let mut project = Project::new("p1", "ghost", &[]);
        let err = api
            .store_project(&mut project, &Caller::user("ghost"))
            .await
            .unwrap_err();
        assert!(err.is_denied(), "expected denial, got {err:?}");
    }

    #[tokio::test]
    async fn entitlement_scenario() {
        // User with no validated allocation and no project: project
        // creation is denied; once a validated allocation exists it
        // succeeds and the owner is a member.
        let api = api();
        seed_user(&api, "alice").await;

        let mut project = Project::new("p1", "alice", &[]);
        let err = api
            .store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        seed_validated_allocation(&api, "alice", "cluster1").await;

        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        let projects = api.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "p1");
        assert_eq!(projects[0].members, vec!["alice"]);
    }

    #[tokio::test]
    async fn project_store_requires_ownership() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_user(&api, "mallory").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;
        seed_validated_allocation(&api, "mallory", "cluster2").await;

        let mut project = Project::new("p1", "alice", &[]);
        let err = api
            .store_project(&mut project, &Caller::user("mallory"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn member_may_remove_themself_only() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_user(&api, "bob").await;
        seed_user(&api, "carol").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut project = Project::new("p1", "alice", &["bob".into(), "carol".into()]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        // A member may not remove another member.
        let err = api
            .remove_user_from_project("carol", "p1", &Caller::user("bob"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        // Self-removal succeeds even though bob is not the owner.
        api.remove_user_from_project("bob", "p1", &Caller::user("bob"))
            .await
            .unwrap();

        // The owner may remove anyone.
        api.remove_user_from_project("carol", "p1", &Caller::user("alice"))
            .await
            .unwrap();

        let project = api.get_project("p1").await.unwrap().unwrap();
        assert_eq!(project.members, vec!["alice"]);
    }

    #[tokio::test]
    async fn member_addition_is_owner_only() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_user(&api, "bob").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut project = Project::new("p1", "alice", &["bob".into()]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        let err = api
            .add_user_to_project("bob2", "p1", &Caller::user("bob"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        api.add_user_to_project("bob2", "p1", &Caller::user("alice"))
            .await
            .unwrap();
        let project = api.get_project("p1").await.unwrap().unwrap();
        assert!(project.members.contains(&"bob2".to_string()));
    }

    #[tokio::test]
    async fn allocation_attach_requires_allocation_owner() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_user(&api, "bob").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;
        let bobs = seed_validated_allocation(&api, "bob", "cluster2").await;

        let mut project = Project::new("p1", "alice", &["bob".into()]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        // The project owner does not own bob's allocation.
        let err = api
            .add_allocation_to_project(&bobs, "p1", &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        // The allocation's owner may attach it, project ownership aside.
        api.add_allocation_to_project(&bobs, "p1", &Caller::user("bob"))
            .await
            .unwrap();
        let project = api.get_project("p1").await.unwrap().unwrap();
        assert_eq!(project.allocations, vec![bobs.clone()]);

        api.remove_allocation_from_project(&bobs, "p1", &Caller::user("bob"))
            .await
            .unwrap();
        let project = api.get_project("p1").await.unwrap().unwrap();
        assert!(project.allocations.is_empty());
    }

    #[tokio::test]
    async fn allocation_requires_existing_resource() {
        let api = api();
        seed_user(&api, "alice").await;

        let mut alloc = Allocation::new("alice.nowhere", "alice", "nowhere", "alice");
        let err = api
            .store_allocation(&mut alloc, &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn allocation_immutable_fields_are_frozen() {
        let api = api();
        seed_user(&api, "alice").await;
        let name = seed_validated_allocation(&api, "alice", "cluster1").await;

        // Changing an immutable field is refused even for the owner.
        let mut tampered = api.get_allocation(&name).await.unwrap().unwrap();
        tampered.accountname = "someone-else".to_string();
        let err = api
            .store_allocation(&mut tampered, &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        // Presentation-only changes go through.
        let mut relabeled = api.get_allocation(&name).await.unwrap().unwrap();
        relabeled.displayname = Some("Alice @ cluster1".to_string());
        relabeled.description = Some("batch allocation".to_string());
        api.store_allocation(&mut relabeled, &Caller::user("alice"))
            .await
            .unwrap();

        let stored = api.get_allocation(&name).await.unwrap().unwrap();
        assert_eq!(stored.displayname.as_deref(), Some("Alice @ cluster1"));
        assert_eq!(stored.accountname, "alice");
    }

    #[tokio::test]
    async fn cluster_store_and_list_are_entitlement_gated() {
        let api = api();
        seed_user(&api, "alice").await;

        let mut cluster = Cluster::new("c1", "alice", &[]);
        let err = api
            .store_cluster(&mut cluster, &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());
        let err = api.list_clusters(&Caller::user("alice")).await.unwrap_err();
        assert!(err.is_denied());

        seed_validated_allocation(&api, "alice", "cluster1").await;
        api.store_cluster(&mut cluster, &Caller::user("alice"))
            .await
            .unwrap();
        let clusters = api.list_clusters(&Caller::user("alice")).await.unwrap();
        assert_eq!(clusters.len(), 1);
    }

    #[tokio::test]
    async fn request_allocations_must_belong_to_project() {
        let api = api();
        seed_user(&api, "alice").await;
        let attached = seed_validated_allocation(&api, "alice", "cluster1").await;
        let stray = seed_validated_allocation(&api, "alice", "cluster2").await;

        let mut project = Project::new("p1", "alice", &[]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();
        api.add_allocation_to_project(&attached, "p1", &Caller::user("alice"))
            .await
            .unwrap();

        let mut bad = Request::new("r-bad", "alice", "p1", None, &[stray.clone()], &[]);
        let err = api
            .store_request(&mut bad, &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        let mut good = Request::new("r-good", "alice", "p1", None, &[attached.clone()], &[]);
        api.store_request(&mut good, &Caller::user("alice"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn request_project_must_exist() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut request = Request::new("r1", "alice", "no-such-project", None, &[], &[]);
        let err = api
            .store_request(&mut request, &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn delete_request_cascades_through_cluster_and_nodesets() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut head = Nodeset::new("n1", "alice", 1, "htcondor", AppRole::HeadNode);
        let mut workers = Nodeset::new("n2", "alice", 8, "htcondor", AppRole::WorkerNodes);
        api.store_nodeset(&mut head, &Caller::System).await.unwrap();
        api.store_nodeset(&mut workers, &Caller::System).await.unwrap();

        let mut cluster = Cluster::new("c1", "alice", &["n1".into(), "n2".into()]);
        api.store_cluster(&mut cluster, &Caller::user("alice"))
            .await
            .unwrap();

        let mut project = Project::new("p1", "alice", &[]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        let mut request = Request::new("r1", "alice", "p1", Some("c1".into()), &[], &[]);
        api.store_request(&mut request, &Caller::user("alice"))
            .await
            .unwrap();

        api.delete_request("r1", &Caller::user("alice")).await.unwrap();

        assert!(api.get_nodeset("n1").await.unwrap().is_none());
        assert!(api.get_nodeset("n2").await.unwrap().is_none());
        assert!(api.get_cluster("c1").await.unwrap().is_none());
        assert!(api.get_request("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cascade_aborts_on_missing_member_without_rollback() {
        // A cascade step that fails propagates immediately; members deleted
        // before the failing step stay deleted, later ones survive.
        let api = api();
        seed_user(&api, "alice").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut head = Nodeset::new("n1", "alice", 1, "htcondor", AppRole::HeadNode);
        let mut workers = Nodeset::new("n2", "alice", 8, "htcondor", AppRole::WorkerNodes);
        api.store_nodeset(&mut head, &Caller::System).await.unwrap();
        api.store_nodeset(&mut workers, &Caller::System).await.unwrap();

        let mut cluster = Cluster::new("c1", "alice", &["n1".into(), "n2".into()]);
        api.store_cluster(&mut cluster, &Caller::user("alice"))
            .await
            .unwrap();
        let mut project = Project::new("p1", "alice", &[]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();
        let mut request = Request::new("r1", "alice", "p1", Some("c1".into()), &[], &[]);
        api.store_request(&mut request, &Caller::user("alice"))
            .await
            .unwrap();

        // Second nodeset vanishes out from under the cascade.
        api.delete_nodeset("n2", &Caller::System).await.unwrap();

        let err = api
            .delete_request("r1", &Caller::user("alice"))
            .await
            .unwrap_err();
        assert!(err.is_missing(), "expected missing-entity error, got {err:?}");

        // n1 went before the failure and stays gone; the cluster and the
        // request were never reached.
        assert!(api.get_nodeset("n1").await.unwrap().is_none());
        assert!(api.get_cluster("c1").await.unwrap().is_some());
        assert!(api.get_request("r1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn private_tokens_are_listable() {
        let api = api();
        let mut t1 = PrivateToken::new("t1", "alice", "REDACTED1", "ssh-private-key");
        let mut t2 = PrivateToken::new("t2", "bob", "REDACTED2", "x509-proxy");
        api.store_private_token(&mut t1, &Caller::System).await.unwrap();
        api.store_private_token(&mut t2, &Caller::System).await.unwrap();

        let mut names: Vec<String> = api
            .list_private_tokens()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn terminate_request_is_owner_only() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_user(&api, "mallory").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut project = Project::new("p1", "alice", &[]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();
        let mut request = Request::new("r1", "alice", "p1", None, &[], &[]);
        api.store_request(&mut request, &Caller::user("alice"))
            .await
            .unwrap();

        let err = api
            .terminate_request("r1", &Caller::user("mallory"))
            .await
            .unwrap_err();
        assert!(err.is_denied());

        api.terminate_request("r1", &Caller::user("alice"))
            .await
            .unwrap();
        let stored = api.get_request("r1").await.unwrap().unwrap();
        assert_eq!(stored.action, RequestAction::Terminate);
        // The provisioner, not the client, advances state.
        assert_eq!(stored.state, vcluster_model::RequestState::New);
    }

    #[tokio::test]
    async fn create_conflict_and_update_of_missing() {
        let api = api();
        seed_user(&api, "alice").await;

        // Creating over an existing name conflicts.
        let mut duplicate = User::new("alice", "Other", "Person", "other@lab.edu", "X");
        let err = api
            .store_user(&mut duplicate, &Caller::System)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::EntityExists(ref n) if n == "alice"));

        // Updating a deleted name fails as update-of-missing.
        let mut loaded = api.get_user("alice").await.unwrap().unwrap();
        api.delete_user("alice", &Caller::System).await.unwrap();
        loaded.displayname = Some("Alice".into());
        let err = api
            .store_user(&mut loaded, &Caller::System)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::EntityUpdateMissing(ref n) if n == "alice"));
    }

    #[tokio::test]
    async fn conf_string_round_trips_base64() {
        let api = api();
        seed_user(&api, "alice").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;
        let mut project = Project::new("p1", "alice", &[]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        let conf = "[queue1]\nsched = slurm\n";
        let mut request = Request::new("r1", "alice", "p1", None, &[], &[]);
        request.queuesconf = Some(ClientApi::encode(conf));
        api.store_request(&mut request, &Caller::user("alice"))
            .await
            .unwrap();

        let decoded = api.conf_string(ConfKind::Queues, "r1").await.unwrap();
        assert_eq!(decoded, conf);

        let err = api.conf_string(ConfKind::Auth, "r1").await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn project_membership_entitles_without_allocation() {
        // A plain member of someone else's project may store clusters.
        let api = api();
        seed_user(&api, "alice").await;
        seed_user(&api, "bob").await;
        seed_validated_allocation(&api, "alice", "cluster1").await;

        let mut project = Project::new("p1", "alice", &["bob".into()]);
        api.store_project(&mut project, &Caller::user("alice"))
            .await
            .unwrap();

        let mut cluster = Cluster::new("c-bob", "bob", &[]);
        api.store_cluster(&mut cluster, &Caller::user("bob"))
            .await
            .unwrap();
    }
}
