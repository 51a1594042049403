//! Player identity records.
//!
//! [`Identity`] is what a session carries once a player has logged in
//! through it. [`PlayerIdentity`] is the fuller player record the login
//! flow works with; its only mutable attributes change through explicit
//! update methods.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identity attributes bound to a session.
///
/// The default value is the unbound state: empty player id and every
/// numeric field zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Player id; empty while unbound.
    pub player_id: String,
    /// Partner (distribution channel) id.
    pub partner_id: i32,
    /// Game server id.
    pub server_id: i32,
    /// Client game version.
    pub game_version_id: i32,
    /// Client resource version.
    pub resource_version_id: i32,
}

impl Identity {
    /// Builds a bound identity.
    pub fn new(
        player_id: impl Into<String>,
        partner_id: i32,
        server_id: i32,
        game_version_id: i32,
        resource_version_id: i32,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            partner_id,
            server_id,
            game_version_id,
            resource_version_id,
        }
    }

    /// Returns `true` once a player id has been bound.
    pub fn is_bound(&self) -> bool {
        !self.player_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PlayerIdentity
// ---------------------------------------------------------------------------

/// A logged-in player's attributes.
///
/// Everything except `name` and `client_id` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    id: String,
    name: String,
    client_id: i32,
    partner_id: i32,
    server_id: i32,
    game_version_id: i32,
    resource_version_id: i32,
}

impl PlayerIdentity {
    /// Creates a player record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        client_id: i32,
        partner_id: i32,
        server_id: i32,
        game_version_id: i32,
        resource_version_id: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            client_id,
            partner_id,
            server_id,
            game_version_id,
            resource_version_id,
        }
    }

    /// Stable player id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the session the player is currently attached to.
    pub fn client_id(&self) -> i32 {
        self.client_id
    }

    /// Partner (distribution channel) id.
    pub fn partner_id(&self) -> i32 {
        self.partner_id
    }

    /// Game server id.
    pub fn server_id(&self) -> i32 {
        self.server_id
    }

    /// Client game version.
    pub fn game_version_id(&self) -> i32 {
        self.game_version_id
    }

    /// Client resource version.
    pub fn resource_version_id(&self) -> i32 {
        self.resource_version_id
    }

    /// Changes the display name.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Moves the player to another session, e.g. after a reconnect.
    pub fn set_client_id(&mut self, client_id: i32) {
        self.client_id = client_id;
    }

    /// The attributes a session binds when this player logs in.
    pub fn session_identity(&self) -> Identity {
        Identity::new(
            self.id.clone(),
            self.partner_id,
            self.server_id,
            self.game_version_id,
            self.resource_version_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerIdentity {
        PlayerIdentity::new("p-100", "Ayla", 7, 3, 12, 40, 41)
    }

    #[test]
    fn test_identity_default_is_unbound() {
        let identity = Identity::default();

        assert!(!identity.is_bound());
        assert_eq!(identity.player_id, "");
        assert_eq!(identity.partner_id, 0);
        assert_eq!(identity.server_id, 0);
        assert_eq!(identity.game_version_id, 0);
        assert_eq!(identity.resource_version_id, 0);
    }

    #[test]
    fn test_identity_new_is_bound() {
        assert!(Identity::new("p-1", 0, 0, 0, 0).is_bound());
    }

    #[test]
    fn test_player_identity_accessors_return_constructed_values() {
        let p = player();

        assert_eq!(p.id(), "p-100");
        assert_eq!(p.name(), "Ayla");
        assert_eq!(p.client_id(), 7);
        assert_eq!(p.partner_id(), 3);
        assert_eq!(p.server_id(), 12);
        assert_eq!(p.game_version_id(), 40);
        assert_eq!(p.resource_version_id(), 41);
    }

    #[test]
    fn test_rename_changes_only_name() {
        let mut p = player();

        p.rename("Brin");

        assert_eq!(p.name(), "Brin");
        assert_eq!(p.id(), "p-100");
        assert_eq!(p.client_id(), 7);
    }

    #[test]
    fn test_set_client_id_changes_only_client_id() {
        let mut p = player();

        p.set_client_id(99);

        assert_eq!(p.client_id(), 99);
        assert_eq!(p.name(), "Ayla");
    }

    #[test]
    fn test_session_identity_copies_binding_fields() {
        let identity = player().session_identity();

        assert_eq!(identity, Identity::new("p-100", 3, 12, 40, 41));
    }

    #[test]
    fn test_player_identity_json_roundtrip_keeps_fields() {
        let p = player();

        let json = serde_json::to_string(&p).unwrap();
        let back: PlayerIdentity = serde_json::from_str(&json).unwrap();

        assert_eq!(back, p);
        assert!(json.contains("\"client_id\":7"));
    }
}
