//! crates/reading_library_core/src/identity.rs
//!
//! The identity resolver: owns the canonical user id slot in the device
//! store, migrates legacy-format ids to UUID v4 exactly once, and handles
//! the profile record and logout cleanup that go with it.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::UserProfile;
use crate::ports::{LocalStore, PortResult, StorageKeys};

/// A canonical id is exactly the hyphenated UUID v4 textual form: version
/// nibble `4`, variant nibble in {8, 9, a, b}, case-insensitive.
pub fn is_canonical_id(candidate: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .unwrap()
    });
    pattern.is_match(candidate)
}

/// Resolves and maintains the canonical user identifier.
///
/// This is the only component that writes the id slot; the progress
/// reconciler just reads it.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn LocalStore>,
    keys: StorageKeys,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn LocalStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    /// Returns the canonical user id, or `None` in guest mode.
    ///
    /// A persisted id that fails the UUID v4 format check is migrated in
    /// place: a fresh random UUID overwrites it, and the stored profile's
    /// embedded id field is updated to match. The migration is idempotent —
    /// the replacement id passes the format check, so a second call changes
    /// nothing.
    pub fn resolve(&self) -> PortResult<Option<String>> {
        let Some(current) = self.store.get(&self.keys.user_id)? else {
            return Ok(None);
        };

        if is_canonical_id(&current) {
            return Ok(Some(current));
        }

        info!(legacy_id = %current, "migrating legacy user id to UUID v4");
        let new_id = Uuid::new_v4().to_string();
        self.store.set(&self.keys.user_id, &new_id)?;
        self.patch_profile_id(&new_id)?;
        Ok(Some(new_id))
    }

    /// Rewrites the stored profile's `id` field to `new_id`, leaving every
    /// other field untouched. A malformed profile is logged and skipped; the
    /// id slot itself has already been migrated by then.
    fn patch_profile_id(&self, new_id: &str) -> PortResult<()> {
        let Some(raw) = self.store.get(&self.keys.user_profile)? else {
            return Ok(());
        };
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(mut profile) => {
                if let Some(object) = profile.as_object_mut() {
                    object.insert(
                        "id".to_string(),
                        serde_json::Value::String(new_id.to_string()),
                    );
                    self.store.set(&self.keys.user_profile, &profile.to_string())?;
                } else {
                    warn!("stored profile is not a JSON object; skipping id update");
                }
            }
            Err(e) => {
                warn!(error = %e, "stored profile is unparsable; skipping id update");
            }
        }
        Ok(())
    }

    /// Persists a user id obtained from authentication. A candidate that is
    /// not in canonical form is replaced by a fresh UUID v4, matching what
    /// `resolve` would later do anyway. Returns the id actually stored.
    pub fn establish(&self, candidate: &str) -> PortResult<String> {
        let id = if is_canonical_id(candidate) {
            candidate.to_string()
        } else {
            warn!(candidate = %candidate, "non-canonical id from auth; generating a fresh one");
            Uuid::new_v4().to_string()
        };
        self.store.set(&self.keys.user_id, &id)?;
        Ok(id)
    }

    /// The stored user profile. A corrupt record reads as absent.
    pub fn profile(&self) -> PortResult<Option<UserProfile>> {
        let Some(raw) = self.store.get(&self.keys.user_profile)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(error = %e, "corrupt profile record; treating as absent");
                Ok(None)
            }
        }
    }

    pub fn set_profile(&self, profile: &UserProfile) -> PortResult<()> {
        let raw = serde_json::to_string(profile)
            .map_err(|e| crate::ports::PortError::Unexpected(e.to_string()))?;
        self.store.set(&self.keys.user_profile, &raw)
    }

    /// Removes the identity, the profile, the auth token, and every locally
    /// stored progress record.
    pub fn logout(&self) -> PortResult<()> {
        self.store.remove(&self.keys.user_id)?;
        self.store.remove(&self.keys.user_profile)?;
        self.store.remove(&self.keys.auth_token)?;

        let prefix = format!("{}_", self.keys.progress_prefix);
        for key in self.store.list_keys()? {
            if key.starts_with(&prefix) {
                self.store.remove(&key)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn resolver(store: &Arc<MemoryStore>) -> IdentityResolver {
        IdentityResolver::new(store.clone() as Arc<dyn LocalStore>, StorageKeys::default())
    }

    #[test]
    fn canonical_id_check_matches_uuid_v4_only() {
        assert!(is_canonical_id("9b2edd6b-9563-4b28-9e28-9b7f32a0e2e1"));
        assert!(is_canonical_id("9B2EDD6B-9563-4B28-9E28-9B7F32A0E2E1"));
        // Wrong version nibble.
        assert!(!is_canonical_id("9b2edd6b-9563-1b28-9e28-9b7f32a0e2e1"));
        // Wrong variant nibble.
        assert!(!is_canonical_id("9b2edd6b-9563-4b28-7e28-9b7f32a0e2e1"));
        assert!(!is_canonical_id("user123"));
        assert!(!is_canonical_id(""));
    }

    #[test]
    fn resolve_returns_none_for_guest() {
        let store = Arc::new(MemoryStore::default());
        assert_eq!(resolver(&store).resolve().unwrap(), None);
    }

    #[test]
    fn resolve_keeps_a_valid_id_untouched() {
        let store = Arc::new(MemoryStore::default());
        store
            .set("user_id", "9b2edd6b-9563-4b28-9e28-9b7f32a0e2e1")
            .unwrap();
        let resolved = resolver(&store).resolve().unwrap().unwrap();
        assert_eq!(resolved, "9b2edd6b-9563-4b28-9e28-9b7f32a0e2e1");
    }

    #[test]
    fn legacy_id_migrates_with_profile() {
        let store = Arc::new(MemoryStore::default());
        store.set("user_id", "user123").unwrap();
        store
            .set("user_data", r#"{"id":"user123","name":"Alice"}"#)
            .unwrap();

        let resolved = resolver(&store).resolve().unwrap().unwrap();
        assert!(is_canonical_id(&resolved));
        assert_eq!(store.get("user_id").unwrap().unwrap(), resolved);

        let profile: serde_json::Value =
            serde_json::from_str(&store.get("user_data").unwrap().unwrap()).unwrap();
        assert_eq!(profile["id"], resolved.as_str());
        assert_eq!(profile["name"], "Alice");
    }

    #[test]
    fn migration_is_idempotent() {
        let store = Arc::new(MemoryStore::default());
        store.set("user_id", "user123").unwrap();
        let resolver = resolver(&store);

        let first = resolver.resolve().unwrap().unwrap();
        let writes_after_first = store.write_count();
        let second = resolver.resolve().unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(store.write_count(), writes_after_first);
    }

    #[test]
    fn malformed_profile_does_not_block_id_migration() {
        let store = Arc::new(MemoryStore::default());
        store.set("user_id", "user123").unwrap();
        store.set("user_data", "{not json").unwrap();

        let resolved = resolver(&store).resolve().unwrap().unwrap();
        assert!(is_canonical_id(&resolved));
        // Profile left as it was.
        assert_eq!(store.get("user_data").unwrap().unwrap(), "{not json");
    }

    #[test]
    fn establish_accepts_canonical_and_replaces_legacy() {
        let store = Arc::new(MemoryStore::default());
        let resolver = resolver(&store);

        let kept = resolver
            .establish("9b2edd6b-9563-4b28-9e28-9b7f32a0e2e1")
            .unwrap();
        assert_eq!(kept, "9b2edd6b-9563-4b28-9e28-9b7f32a0e2e1");

        let minted = resolver.establish("user123").unwrap();
        assert_ne!(minted, "user123");
        assert!(is_canonical_id(&minted));
        assert_eq!(store.get("user_id").unwrap().unwrap(), minted);
    }

    #[test]
    fn logout_clears_identity_and_progress_keys() {
        let store = Arc::new(MemoryStore::default());
        store
            .set("user_id", "9b2edd6b-9563-4b28-9e28-9b7f32a0e2e1")
            .unwrap();
        store.set("user_data", r#"{"name":"Alice"}"#).unwrap();
        store.set("auth_token", "tok").unwrap();
        store.set("reading_progress_b1", "{}").unwrap();
        store.set("reading_progress_b2", "{}").unwrap();
        store.set("unrelated", "keep me").unwrap();

        resolver(&store).logout().unwrap();

        assert_eq!(store.get("user_id").unwrap(), None);
        assert_eq!(store.get("user_data").unwrap(), None);
        assert_eq!(store.get("auth_token").unwrap(), None);
        assert_eq!(store.get("reading_progress_b1").unwrap(), None);
        assert_eq!(store.get("reading_progress_b2").unwrap(), None);
        assert_eq!(store.get("unrelated").unwrap().as_deref(), Some("keep me"));
    }
}
