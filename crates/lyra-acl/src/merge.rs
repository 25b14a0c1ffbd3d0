//! Narrowing merge of role grants with whitelist overrides

use lyra_core::{canonical_user, Acl, Operation, Resource};

use crate::whitelist::{WhitelistTable, KEEP_AUTH_USER};

/// Resources a whitelist entry can narrow
const OVERRIDABLE: [Resource; 3] = [Resource::Object, Resource::State, Resource::File];

/// Merge a role-based grant with the whitelist entry for an address.
///
/// For every operation the entry overrides, the effective permission is
/// `role AND override` - the whitelist can only narrow, never widen. If
/// the entry carries a user other than the literal `"auth"`, the resolved
/// identity is replaced. Deterministic; the table is never mutated.
pub fn merge_acl(role: &Acl, address: &str, table: Option<&WhitelistTable>) -> Acl {
    let mut acl = role.clone();

    let Some(entry) = table.and_then(|t| t.entry_for(address)) else {
        return acl;
    };

    tracing::debug!(address, user = %entry.user, "applying whitelist override");

    for resource in OVERRIDABLE {
        let over = match resource {
            Resource::Object => &entry.object,
            Resource::State => &entry.state,
            Resource::File => &entry.file,
            _ => unreachable!(),
        };
        let grant = acl.grant_mut(resource);
        for op in Operation::ALL {
            if let Some(allowed) = over.get(op) {
                grant.set(op, grant.get(op) && allowed);
            }
        }
    }

    if entry.user != KEEP_AUTH_USER {
        acl.user = canonical_user(&entry.user);
    }

    acl
}
