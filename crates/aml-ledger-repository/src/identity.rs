//! Acting-organization resolution
//!
//! Every record operation executes on behalf of one organization, the one
//! bound to the caller's credential. Writes can additionally be pinned to
//! the organization of the node executing them, so that a remote
//! organization cannot originate writes through another organization's
//! node.
//!
//! Identity is always passed in explicitly as a request-scoped value.

use aml_ledger_types::OrgId;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Source of the organizations involved in a request.
pub trait IdentitySource: Send + Sync {
    /// Organization bound to the authenticated caller's credential.
    fn caller_org(&self) -> LedgerResult<OrgId>;

    /// Organization of the node executing the request.
    fn node_org(&self) -> LedgerResult<OrgId>;
}

/// Request-scoped identity, extracted by the transport layer from the
/// caller's credential and the executing node's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct RequestContext {
    /// MSP id carried by the caller's certificate
    #[builder(into)]
    pub caller_org: Option<OrgId>,
    /// MSP id of the executing node
    #[builder(into)]
    pub node_org: Option<OrgId>,
}

impl RequestContext {
    /// Context for a caller and node of the given organizations.
    pub fn new(caller_org: impl Into<OrgId>, node_org: impl Into<OrgId>) -> Self {
        Self { caller_org: Some(caller_org.into()), node_org: Some(node_org.into()) }
    }

    /// Context for a caller whose node belongs to the same organization.
    pub fn local(org: impl Into<OrgId>) -> Self {
        let org = org.into();
        Self { caller_org: Some(org.clone()), node_org: Some(org) }
    }
}

impl IdentitySource for RequestContext {
    fn caller_org(&self) -> LedgerResult<OrgId> {
        match &self.caller_org {
            Some(org) if !org.is_blank() => Ok(org.clone()),
            _ => Err(LedgerError::Identity(
                "caller credential carries no organization".to_string(),
            )),
        }
    }

    fn node_org(&self) -> LedgerResult<OrgId> {
        match &self.node_org {
            Some(org) if !org.is_blank() => Ok(org.clone()),
            _ => Err(LedgerError::Identity("executing node has no organization".to_string())),
        }
    }
}

/// Resolve the organization an operation acts for.
///
/// With `verify_matches_node`, the caller's organization must equal the
/// executing node's, otherwise the request fails with
/// [`LedgerError::Authorization`].
pub fn resolve_acting_org<I>(identity: &I, verify_matches_node: bool) -> LedgerResult<OrgId>
where
    I: IdentitySource + ?Sized,
{
    let client_org = identity.caller_org()?;

    if verify_matches_node {
        let node_org = identity.node_org()?;
        if client_org != node_org {
            return Err(LedgerError::Authorization { client_org, node_org });
        }
    }

    Ok(client_org)
}
