//! Capability sets (ACLs)
//!
//! An ACL is the resolved, per-connection set of allowed operations per
//! resource type. It is computed once at authentication time by merging the
//! role-based grant from the backend with the address whitelist, and is
//! immutable for the life of the connection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The administrative superuser - bypasses all permission checks
pub const ADMIN_USER: &str = "system.user.admin";

/// Prefix every resolved user identity carries
pub const USER_PREFIX: &str = "system.user.";

/// Canonicalize a user identity to the `system.user.` prefix
pub fn canonical_user(user: &str) -> String {
    if user.starts_with(USER_PREFIX) {
        user.to_owned()
    } else {
        format!("{USER_PREFIX}{user}")
    }
}

/// Resource types a command can touch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Object,
    State,
    File,
    Users,
    Other,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resource::Object => "object",
            Resource::State => "state",
            Resource::File => "file",
            Resource::Users => "users",
            Resource::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Operations a command can perform on a resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    List,
    Create,
    Delete,
    Execute,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Read,
        Operation::Write,
        Operation::List,
        Operation::Create,
        Operation::Delete,
        Operation::Execute,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Execute => "execute",
        };
        write!(f, "{s}")
    }
}

/// Per-resource permission grant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub execute: bool,
}

impl Grant {
    /// Grant with every operation allowed
    pub fn all() -> Self {
        Grant {
            read: true,
            write: true,
            list: true,
            create: true,
            delete: true,
            execute: true,
        }
    }

    /// Grant with no operation allowed
    pub fn none() -> Self {
        Grant::default()
    }

    pub fn get(&self, op: Operation) -> bool {
        match op {
            Operation::Read => self.read,
            Operation::Write => self.write,
            Operation::List => self.list,
            Operation::Create => self.create,
            Operation::Delete => self.delete,
            Operation::Execute => self.execute,
        }
    }

    pub fn set(&mut self, op: Operation, allowed: bool) {
        match op {
            Operation::Read => self.read = allowed,
            Operation::Write => self.write = allowed,
            Operation::List => self.list = allowed,
            Operation::Create => self.create = allowed,
            Operation::Delete => self.delete = allowed,
            Operation::Execute => self.execute = allowed,
        }
    }
}

/// Resolved capability set of one connection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    /// Resolved user identity, `system.user.` prefixed
    pub user: String,
    pub object: Grant,
    pub state: Grant,
    pub file: Grant,
    pub users: Grant,
    pub other: Grant,
}

impl Acl {
    /// Full grant for a given user (what the backend returns for admins)
    pub fn superuser(user: &str) -> Self {
        Acl {
            user: canonical_user(user),
            object: Grant::all(),
            state: Grant::all(),
            file: Grant::all(),
            users: Grant::all(),
            other: Grant::all(),
        }
    }

    pub fn grant(&self, resource: Resource) -> &Grant {
        match resource {
            Resource::Object => &self.object,
            Resource::State => &self.state,
            Resource::File => &self.file,
            Resource::Users => &self.users,
            Resource::Other => &self.other,
        }
    }

    pub fn grant_mut(&mut self, resource: Resource) -> &mut Grant {
        match resource {
            Resource::Object => &mut self.object,
            Resource::State => &mut self.state,
            Resource::File => &mut self.file,
            Resource::Users => &mut self.users,
            Resource::Other => &mut self.other,
        }
    }

    /// Whether this capability set allows an operation on a resource
    pub fn allows(&self, resource: Resource, operation: Operation) -> bool {
        self.user == ADMIN_USER || self.grant(resource).get(operation)
    }
}
