//! Authorization decision state machine
//!
//! One pass sequences user-check, user-reply, and group-membership
//! resolution with a fallthrough continuation rule:
//!
//! ```text
//! Start ── no identity ──────────────────────────────→ Noop
//!   │
//! UserCheck ── lookup error ─────────────────────────→ Fail
//!   ├─ no record / comparator mismatch ─┐
//!   └─ matched → merge check → UserReply │
//!                    │ (may clear fallthrough)
//!                    ▼                   ▼
//!               GroupPhase (while fallthrough holds)
//!                    ├─ lookup error ───────────────→ Fail
//!                    └─ per group: check → compare →
//!                       merge check+reply, recompute fallthrough
//!                    ▼
//! Decided: matched anywhere → Ok, else NotFound
//! ```

use crate::config::ModuleConfig;
use crate::error::Result;
use crate::lookup::PolicyLookup;
use crate::pool::ConnectionPool;
use crate::types::{AttributeList, AuthzOutcome};
use std::sync::Arc;
use tracing::{debug, error};

/// Pseudo-attribute gating whether group policy lookup continues after a
/// match.
pub const FALL_THROUGH_ATTR: &str = "Fall-Through";

/// Request-local session state for one authorization pass.
///
/// Nothing here outlives the request: check and reply lists produced along
/// the way are merged into `config_items` / `reply_attrs` or dropped.
#[derive(Debug, Default)]
pub struct AuthzRequest {
    /// Identity under evaluation; absent means there is nothing to evaluate
    pub username: Option<String>,
    /// Attributes carried by the incoming request packet
    pub request_attrs: AttributeList,
    /// Merged check/config attributes
    pub config_items: AttributeList,
    /// Merged reply attributes
    pub reply_attrs: AttributeList,
}

impl AuthzRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// A request with no identity; authorizing it is a no-op.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Matches request attributes against a record's check attributes.
///
/// Called once per check record found; implementations may append to the
/// reply list but must not mutate the check attributes.
pub trait PairComparator: Send + Sync {
    fn compare(
        &self,
        request: &AttributeList,
        check: &AttributeList,
        reply: &mut AttributeList,
    ) -> bool;
}

/// Result of the group phase.
enum GroupPhase {
    Found,
    NotFound,
}

pub struct AuthzEngine {
    lookup: PolicyLookup,
    comparator: Arc<dyn PairComparator>,
    read_groups: bool,
}

impl AuthzEngine {
    pub fn new(
        config: &ModuleConfig,
        pool: Arc<ConnectionPool>,
        comparator: Arc<dyn PairComparator>,
    ) -> Self {
        Self {
            lookup: PolicyLookup::new(config, pool),
            comparator,
            read_groups: config.read_groups,
        }
    }

    /// Run one authorization pass, merging matched policy into the request's
    /// session state.
    pub fn authorize(&self, request: &mut AuthzRequest) -> AuthzOutcome {
        let Some(username) = request.username.clone() else {
            return AuthzOutcome::Noop;
        };

        let mut dofallthrough = true;
        let mut matched = match self.check_user(request, &username, &mut dofallthrough) {
            Ok(matched) => matched,
            Err(err) => {
                error!(%username, error = %err, "user lookup failed; rejecting user");
                return AuthzOutcome::Fail;
            }
        };

        if dofallthrough {
            match self.process_groups(request, &username, &mut dofallthrough) {
                Ok(GroupPhase::Found) => matched = true,
                Ok(GroupPhase::NotFound) => {}
                Err(err) => {
                    error!(%username, error = %err, "error processing groups; rejecting user");
                    return AuthzOutcome::Fail;
                }
            }
        }

        if matched {
            AuthzOutcome::Ok
        } else {
            AuthzOutcome::NotFound
        }
    }

    /// UserCheck and UserReply states. Returns whether the user's own check
    /// record matched; a missing record or a comparator mismatch is not an
    /// error, since group policy may still apply.
    fn check_user(
        &self,
        request: &mut AuthzRequest,
        username: &str,
        dofallthrough: &mut bool,
    ) -> Result<bool> {
        let mut check_items = AttributeList::new();
        let count = self.lookup.user_check(username, &mut check_items)?;
        debug!(%username, count, "documents found in user check collection");
        if count == 0
            || !self
                .comparator
                .compare(&request.request_attrs, &check_items, &mut request.reply_attrs)
        {
            return Ok(false);
        }
        check_items.move_into(&mut request.config_items);

        let mut reply_items = AttributeList::new();
        let count = self.lookup.user_reply(username, &mut reply_items)?;
        debug!(%username, count, "documents found in user reply collection");
        if count > 0 {
            if !self.read_groups {
                *dofallthrough = fallthrough(&reply_items);
            }
            reply_items.move_into(&mut request.reply_attrs);
        }
        Ok(true)
    }

    /// GroupPhase state: expand membership and evaluate per-group policy in
    /// record order while fallthrough holds.
    fn process_groups(
        &self,
        request: &mut AuthzRequest,
        username: &str,
        dofallthrough: &mut bool,
    ) -> Result<GroupPhase> {
        let mut groups = AttributeList::new();
        let count = self.lookup.user_groups(username, &mut groups)?;
        debug!(%username, count, groups = groups.len(), "group memberships fetched");
        if count == 0 {
            return Ok(GroupPhase::NotFound);
        }

        let mut found = GroupPhase::NotFound;
        for group in groups.iter() {
            if !*dofallthrough {
                break;
            }

            let mut check_items = AttributeList::new();
            let count = self
                .lookup
                .group_check(&group.value, &mut check_items)
                .map_err(|err| {
                    error!(group = %group.value, "error retrieving check pairs for group");
                    err
                })?;
            if count == 0 {
                continue;
            }
            if !self
                .comparator
                .compare(&request.request_attrs, &check_items, &mut request.reply_attrs)
            {
                // No match: on to the next group, fallthrough untouched.
                continue;
            }

            debug!(%username, group = %group.value, "user is in group");
            found = GroupPhase::Found;

            let mut reply_items = AttributeList::new();
            self.lookup.group_reply(&group.value, &mut reply_items)?;
            *dofallthrough = fallthrough(&reply_items);
            check_items.move_into(&mut request.config_items);
            reply_items.move_into(&mut request.reply_attrs);
        }
        Ok(found)
    }
}

/// Read the `Fall-Through` pseudo-attribute from a reply list; absent reads
/// as false.
pub fn fallthrough(reply: &AttributeList) -> bool {
    reply
        .find(FALL_THROUGH_ATTR)
        .map(|attr| truthy(&attr.value))
        .unwrap_or(false)
}

fn truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
}
