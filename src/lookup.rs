//! Policy record lookups
//!
//! Thin query builders over [`QueryExecutor`]: user check/reply/groups
//! against the users collection, group check/reply against the groups
//! collection. Filters are single-field equality; projections select exactly
//! one field per lookup.

use crate::config::ModuleConfig;
use crate::error::{AuthzError, Result};
use crate::pool::ConnectionPool;
use crate::query::QueryExecutor;
use crate::store::{eq_filter, Projection, QuerySpec};
use crate::types::AttributeList;
use std::sync::Arc;

/// Attribute name synthesized for bare entries in a user's `groups` array.
pub const GROUP_ATTR: &str = "Group";

pub struct PolicyLookup {
    executor: QueryExecutor,
    col_users: String,
    col_groups: String,
}

impl PolicyLookup {
    pub fn new(config: &ModuleConfig, pool: Arc<ConnectionPool>) -> Self {
        Self {
            executor: QueryExecutor::new(pool),
            col_users: config.users_collection(),
            col_groups: config.groups_collection(),
        }
    }

    /// Check attributes from the user's policy records.
    pub fn user_check(&self, username: &str, out: &mut AttributeList) -> Result<usize> {
        self.user_query(username, "check", None, out)
    }

    /// Reply attributes from the user's policy records.
    pub fn user_reply(&self, username: &str, out: &mut AttributeList) -> Result<usize> {
        self.user_query(username, "reply", None, out)
    }

    /// The user's group memberships, as `Group == name` attributes in record
    /// order.
    pub fn user_groups(&self, username: &str, out: &mut AttributeList) -> Result<usize> {
        self.user_query(username, "groups", Some(GROUP_ATTR), out)
    }

    /// Check attributes for one group. An empty group name is a precondition
    /// violation, not a "not found".
    pub fn group_check(&self, groupname: &str, out: &mut AttributeList) -> Result<usize> {
        self.group_query(groupname, "check", out)
    }

    /// Reply attributes for one group.
    pub fn group_reply(&self, groupname: &str, out: &mut AttributeList) -> Result<usize> {
        self.group_query(groupname, "reply", out)
    }

    fn user_query(
        &self,
        username: &str,
        field: &str,
        default_attr: Option<&str>,
        out: &mut AttributeList,
    ) -> Result<usize> {
        let spec = QuerySpec::new(
            self.col_users.clone(),
            eq_filter("username", username),
            Projection::select(field),
        );
        self.executor.run(&spec, default_attr, out)
    }

    fn group_query(&self, groupname: &str, field: &str, out: &mut AttributeList) -> Result<usize> {
        if groupname.is_empty() {
            return Err(AuthzError::EmptyGroupName);
        }
        let spec = QuerySpec::new(
            self.col_groups.clone(),
            eq_filter("groupname", groupname),
            Projection::select(field),
        );
        self.executor.run(&spec, None, out)
    }
}
