//! Process-wide gateway context (spec §9, "Global runtime state").
//!
//! One immutable snapshot, shared for the lifetime of the session, that
//! every component (adapter, gate, projector, tool builder) reads from.
//! `Session` is the one piece of mutable state and is guarded by its own
//! lock; everything else here is fixed after startup.

use std::sync::Arc;

use crate::acl::types::{ObjectAcl, ToolAcl};
use crate::db::adapter::DatabaseAdapter;
use crate::db::privilege::UserPrivilege;

/// Flags controlling how much the gateway discloses and how it treats
/// implicit-session durability. Mirrors the CLI surface in spec §6.
#[derive(Debug, Clone, Copy)]
pub struct GatewayFlags {
    /// When true, implicit sessions commit instead of rolling back.
    pub persist: bool,
    /// Suppress `-- Access: ...` / `Permissions` annotations in schema output.
    pub disable_privilege_annotation: bool,
    /// Force single-tool (`execute`) mode instead of one tool per operation.
    pub disable_fine_grained_tools: bool,
    /// Suppress registration of `begin`/`commit`/`rollback`.
    pub disable_transaction_tools: bool,
    /// Column-count threshold above which schema disclosure becomes two-step.
    pub adaptive_schema_threshold: usize,
}

impl Default for GatewayFlags {
    fn default() -> Self {
        Self {
            persist: false,
            disable_privilege_annotation: false,
            disable_fine_grained_tools: false,
            disable_transaction_tools: false,
            adaptive_schema_threshold: 200,
        }
    }
}

/// The immutable snapshot every component reads from during a session.
pub struct GatewayContext {
    pub adapter: Arc<dyn DatabaseAdapter>,
    pub user_privilege: UserPrivilege,
    pub white_object_acl: ObjectAcl,
    pub black_object_acl: ObjectAcl,
    pub white_tool_acl: ToolAcl,
    pub black_tool_acl: ToolAcl,
    pub flags: GatewayFlags,
    /// Optional embedding backend for `search_relative_column_values`;
    /// absent when no semantic model was configured (the tool is then not
    /// registered at all, matching the original's silent fallback).
    pub value_search: Option<Arc<crate::tools::value_search::ValueSearchBackend>>,
}

impl GatewayContext {
    pub fn new(
        adapter: Arc<dyn DatabaseAdapter>,
        user_privilege: UserPrivilege,
        white_object_acl: ObjectAcl,
        black_object_acl: ObjectAcl,
        white_tool_acl: ToolAcl,
        black_tool_acl: ToolAcl,
        flags: GatewayFlags,
        value_search: Option<Arc<crate::tools::value_search::ValueSearchBackend>>,
    ) -> Self {
        Self {
            adapter,
            user_privilege,
            white_object_acl,
            black_object_acl,
            white_tool_acl,
            black_tool_acl,
            flags,
            value_search,
        }
    }
}
