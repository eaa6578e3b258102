use redb::TableDefinition;

/// Persisted user credentials: identity -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
