//! The command vocabulary
//!
//! The vocabulary is a closed enum with a static permission table as
//! companion lookup, so an unknown command is a detectable error
//! instead of a silent no-op.

use crate::acl::{Operation, Resource};

/// Closed set of commands a remote client can issue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Authenticate,
    Name,

    GetObject,
    GetObjects,
    SetObject,
    DelObject,
    SubscribeObjects,
    UnsubscribeObjects,

    GetState,
    GetStates,
    SetState,
    DelState,
    Subscribe,
    Unsubscribe,

    SubscribeFiles,
    UnsubscribeFiles,

    RequireLog,
    SendTo,

    GetVersion,
    ListPermissions,
    GetUserPermissions,
    Logout,
}

impl Command {
    /// All commands, for enumerating the permission table
    pub const ALL: [Command; 22] = [
        Command::Authenticate,
        Command::Name,
        Command::GetObject,
        Command::GetObjects,
        Command::SetObject,
        Command::DelObject,
        Command::SubscribeObjects,
        Command::UnsubscribeObjects,
        Command::GetState,
        Command::GetStates,
        Command::SetState,
        Command::DelState,
        Command::Subscribe,
        Command::Unsubscribe,
        Command::SubscribeFiles,
        Command::UnsubscribeFiles,
        Command::RequireLog,
        Command::SendTo,
        Command::GetVersion,
        Command::ListPermissions,
        Command::GetUserPermissions,
        Command::Logout,
    ];

    /// Parse a wire command name
    pub fn parse(name: &str) -> Option<Command> {
        match name {
            "authenticate" => Some(Command::Authenticate),
            "name" => Some(Command::Name),
            "getObject" => Some(Command::GetObject),
            "getObjects" => Some(Command::GetObjects),
            "setObject" => Some(Command::SetObject),
            "delObject" => Some(Command::DelObject),
            "subscribeObjects" => Some(Command::SubscribeObjects),
            "unsubscribeObjects" => Some(Command::UnsubscribeObjects),
            "getState" => Some(Command::GetState),
            "getStates" => Some(Command::GetStates),
            "setState" => Some(Command::SetState),
            "delState" => Some(Command::DelState),
            "subscribe" => Some(Command::Subscribe),
            "unsubscribe" => Some(Command::Unsubscribe),
            "subscribeFiles" => Some(Command::SubscribeFiles),
            "unsubscribeFiles" => Some(Command::UnsubscribeFiles),
            "requireLog" => Some(Command::RequireLog),
            "sendTo" => Some(Command::SendTo),
            "getVersion" => Some(Command::GetVersion),
            "listPermissions" => Some(Command::ListPermissions),
            "getUserPermissions" => Some(Command::GetUserPermissions),
            "logout" => Some(Command::Logout),
            _ => None,
        }
    }

    /// Wire name of the command
    pub fn name(self) -> &'static str {
        match self {
            Command::Authenticate => "authenticate",
            Command::Name => "name",
            Command::GetObject => "getObject",
            Command::GetObjects => "getObjects",
            Command::SetObject => "setObject",
            Command::DelObject => "delObject",
            Command::SubscribeObjects => "subscribeObjects",
            Command::UnsubscribeObjects => "unsubscribeObjects",
            Command::GetState => "getState",
            Command::GetStates => "getStates",
            Command::SetState => "setState",
            Command::DelState => "delState",
            Command::Subscribe => "subscribe",
            Command::Unsubscribe => "unsubscribe",
            Command::SubscribeFiles => "subscribeFiles",
            Command::UnsubscribeFiles => "unsubscribeFiles",
            Command::RequireLog => "requireLog",
            Command::SendTo => "sendTo",
            Command::GetVersion => "getVersion",
            Command::ListPermissions => "listPermissions",
            Command::GetUserPermissions => "getUserPermissions",
            Command::Logout => "logout",
        }
    }

    /// Static permission table: resource type and operation a command
    /// requires, or `None` when the command needs no permission at all.
    pub fn permission(self) -> Option<(Resource, Operation)> {
        match self {
            Command::GetObject => Some((Resource::Object, Operation::Read)),
            Command::GetObjects => Some((Resource::Object, Operation::List)),
            Command::SetObject => Some((Resource::Object, Operation::Write)),
            Command::DelObject => Some((Resource::Object, Operation::Delete)),
            Command::SubscribeObjects => Some((Resource::Object, Operation::Read)),
            Command::UnsubscribeObjects => Some((Resource::Object, Operation::Read)),
            // log streaming is gated as an object write
            Command::RequireLog => Some((Resource::Object, Operation::Write)),
            Command::GetUserPermissions => Some((Resource::Object, Operation::Read)),

            Command::GetState => Some((Resource::State, Operation::Read)),
            Command::GetStates => Some((Resource::State, Operation::List)),
            Command::SetState => Some((Resource::State, Operation::Write)),
            Command::DelState => Some((Resource::State, Operation::Delete)),
            Command::Subscribe => Some((Resource::State, Operation::Read)),
            Command::Unsubscribe => Some((Resource::State, Operation::Read)),

            Command::SubscribeFiles => Some((Resource::File, Operation::Read)),
            Command::UnsubscribeFiles => Some((Resource::File, Operation::Read)),

            Command::SendTo => Some((Resource::Other, Operation::Execute)),

            Command::Authenticate
            | Command::Name
            | Command::GetVersion
            | Command::ListPermissions
            | Command::Logout => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for cmd in Command::ALL {
            assert_eq!(Command::parse(cmd.name()), Some(cmd));
        }
    }

    #[test]
    fn test_unknown_command_is_none() {
        assert_eq!(Command::parse("cmdExec"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_permission_table() {
        assert_eq!(
            Command::SetState.permission(),
            Some((Resource::State, Operation::Write))
        );
        assert_eq!(
            Command::SendTo.permission(),
            Some((Resource::Other, Operation::Execute))
        );
        assert_eq!(Command::GetVersion.permission(), None);
    }
}
