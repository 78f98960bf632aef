// Directory store
// Both user maps live behind one mutex; every operation holds it for its whole duration

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use idmesh_api::model::{DirectorySnapshot, ListKind, User};
use idmesh_common::IdmeshError;

#[derive(Debug, Default)]
struct UserMaps {
    by_login_name: HashMap<String, User>,
    by_identifier: HashMap<Uuid, User>,
}

impl UserMaps {
    fn insert(&mut self, user: User) {
        self.by_identifier.insert(user.identifier, user.clone());
        self.by_login_name.insert(user.login_name.clone(), user);
    }

    fn remove(&mut self, login_name: &str) -> Option<User> {
        let user = self.by_login_name.remove(login_name)?;
        self.by_identifier.remove(&user.identifier);
        Some(user)
    }
}

/// Login name / identifier directory
#[derive(Debug, Default)]
pub struct DirectoryStore {
    maps: Mutex<UserMaps>,
    verbose: bool,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that logs every operation at info level
    pub fn with_verbose(verbose: bool) -> Self {
        Self {
            maps: Mutex::new(UserMaps::default()),
            verbose,
        }
    }

    fn log_operation(&self, operation: &str, login_name: &str) {
        if self.verbose {
            info!(operation, login_name, "Directory operation");
        } else {
            debug!(operation, login_name, "Directory operation");
        }
    }

    /// Create a user under a fresh random identifier.
    ///
    /// Any non-empty login name is accepted. Fails with `AlreadyExists` when
    /// the login name is taken; the store is left unchanged.
    pub fn create(
        &self,
        login_name: &str,
        display_name: &str,
        credential_hash: Vec<u8>,
    ) -> Result<Uuid, IdmeshError> {
        if login_name.is_empty() {
            return Err(IdmeshError::IllegalArgument(
                "login name must not be empty".to_string(),
            ));
        }

        self.log_operation("create", login_name);

        let mut maps = self.maps.lock();
        if maps.by_login_name.contains_key(login_name) {
            return Err(IdmeshError::AlreadyExists(login_name.to_string()));
        }

        let user = User::new(login_name, display_name, credential_hash);
        let identifier = user.identifier;
        maps.insert(user);

        Ok(identifier)
    }

    pub fn lookup(&self, login_name: &str) -> Result<User, IdmeshError> {
        self.log_operation("lookup", login_name);

        self.maps
            .lock()
            .by_login_name
            .get(login_name)
            .cloned()
            .ok_or_else(|| IdmeshError::UserNotFound(login_name.to_string()))
    }

    pub fn reverse_lookup(&self, identifier: &Uuid) -> Result<User, IdmeshError> {
        self.log_operation("reverse_lookup", &identifier.to_string());

        self.maps
            .lock()
            .by_identifier
            .get(identifier)
            .cloned()
            .ok_or_else(|| IdmeshError::UserNotFound(identifier.to_string()))
    }

    /// Rename a user after checking its credential hash.
    ///
    /// A different user already holding `new_login_name` is overwritten and
    /// evicted from both maps.
    pub fn modify(&self, old_login_name: &str, new_login_name: &str, credential_hash: &[u8]) -> bool {
        self.log_operation("modify", old_login_name);

        if new_login_name.is_empty() {
            debug!(old_login_name, "Rejected modify to an empty login name");
            return false;
        }

        let mut maps = self.maps.lock();
        let matches = match maps.by_login_name.get(old_login_name) {
            Some(user) => user.credential_matches(credential_hash),
            None => {
                debug!(old_login_name, "Modify of unknown user");
                return false;
            }
        };
        if !matches {
            debug!(old_login_name, "Modify rejected, credential mismatch");
            return false;
        }

        let Some(mut user) = maps.remove(old_login_name) else {
            return false;
        };

        if let Some(displaced) = maps.remove(new_login_name) {
            warn!(
                login_name = new_login_name,
                displaced = %displaced.identifier,
                renamed = %user.identifier,
                "Modify overwrote an existing user"
            );
        }

        user.login_name = new_login_name.to_string();
        user.last_modified_at = Utc::now();
        maps.insert(user);

        true
    }

    pub fn delete(&self, login_name: &str, credential_hash: &[u8]) -> bool {
        self.log_operation("delete", login_name);

        let mut maps = self.maps.lock();
        match maps.by_login_name.get(login_name) {
            Some(user) if user.credential_matches(credential_hash) => {
                maps.remove(login_name);
                true
            }
            Some(_) => {
                debug!(login_name, "Delete rejected, credential mismatch");
                false
            }
            None => false,
        }
    }

    pub fn list_login_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.maps.lock().by_login_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn list_identifiers(&self) -> Vec<Uuid> {
        let mut identifiers: Vec<Uuid> = self.maps.lock().by_identifier.keys().copied().collect();
        identifiers.sort();
        identifiers
    }

    pub fn list_all(&self) -> Vec<(String, Uuid)> {
        let mut entries: Vec<(String, Uuid)> = self
            .maps
            .lock()
            .by_login_name
            .iter()
            .map(|(login_name, user)| (login_name.clone(), user.identifier))
            .collect();
        entries.sort();
        entries
    }

    /// Text rendering of one of the enumerations, one entry per line
    pub fn list(&self, kind: ListKind) -> String {
        let lines: Vec<String> = match kind {
            ListKind::Users => self.list_login_names(),
            ListKind::Identifiers => self
                .list_identifiers()
                .iter()
                .map(Uuid::to_string)
                .collect(),
            ListKind::All => self
                .list_all()
                .into_iter()
                .map(|(login_name, identifier)| format!("{}: {}", login_name, identifier))
                .collect(),
        };

        lines.join("\n")
    }

    /// Deep copy of both maps
    pub fn snapshot(&self) -> DirectorySnapshot {
        let maps = self.maps.lock();
        DirectorySnapshot {
            by_login_name: maps
                .by_login_name
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            by_identifier: maps
                .by_identifier
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }

    /// Replace the whole directory with `snapshot`
    pub fn restore(&self, snapshot: DirectorySnapshot) {
        let by_login_name: HashMap<String, User> = snapshot.by_login_name.into_iter().collect();
        let by_identifier: HashMap<Uuid, User> = snapshot.by_identifier.into_iter().collect();

        let mut maps = self.maps.lock();
        maps.by_login_name = by_login_name;
        maps.by_identifier = by_identifier;
    }

    pub fn len(&self) -> usize {
        self.maps.lock().by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_and_lookup() {
        let store = DirectoryStore::new();
        let identifier = store.create("alice", "Alice A", b"hash".to_vec()).unwrap();
        assert!(!identifier.is_nil());

        let user = store.lookup("alice").unwrap();
        assert_eq!(user.identifier, identifier);
        assert_eq!(user.display_name, "Alice A");

        let by_id = store.reverse_lookup(&identifier).unwrap();
        assert_eq!(by_id, user);
    }

    #[test]
    fn test_create_duplicate_leaves_store_unchanged() {
        let store = DirectoryStore::new();
        store.create("alice", "Alice A", b"hash".to_vec()).unwrap();
        let before = store.snapshot();

        let err = store
            .create("alice", "Someone Else", b"other".to_vec())
            .unwrap_err();
        assert_eq!(err, IdmeshError::AlreadyExists("alice".to_string()));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_create_accepts_free_form_login_names() {
        let store = DirectoryStore::new();
        let long_name = "a".repeat(65);
        let names = ["Mary Ann", "José", "o'brien", "a/b", long_name.as_str()];

        for name in names {
            let identifier = store.create(name, "User", vec![1]).unwrap();
            assert_eq!(store.lookup(name).unwrap().identifier, identifier);
            assert_eq!(store.reverse_lookup(&identifier).unwrap().login_name, name);
        }
        assert_eq!(store.len(), names.len());
    }

    #[test]
    fn test_create_rejects_empty_login_name() {
        let store = DirectoryStore::new();
        let err = store.create("", "Nobody", vec![]).unwrap_err();
        assert!(matches!(err, IdmeshError::IllegalArgument(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_modify_to_free_form_login_name() {
        let store = DirectoryStore::new();
        let identifier = store.create("alice", "Alice A", vec![1]).unwrap();

        assert!(!store.modify("alice", "", &[1]));
        assert!(store.modify("alice", "Alice Smith", &[1]));
        assert_eq!(store.lookup("Alice Smith").unwrap().identifier, identifier);
        assert!(store.lookup("alice").is_err());
    }

    #[test]
    fn test_lookup_missing() {
        let store = DirectoryStore::new();
        assert_eq!(
            store.lookup("nobody").unwrap_err(),
            IdmeshError::UserNotFound("nobody".to_string())
        );
        assert!(store.reverse_lookup(&Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_delete_checks_credential() {
        let store = DirectoryStore::new();
        let identifier = store.create("alice", "Alice A", b"right".to_vec()).unwrap();

        assert!(!store.delete("alice", b"wrong"));
        assert!(store.lookup("alice").is_ok());

        assert!(store.delete("alice", b"right"));
        assert!(store.lookup("alice").is_err());
        assert!(store.reverse_lookup(&identifier).is_err());
        assert!(!store.delete("alice", b"right"));
    }

    #[test]
    fn test_modify_rekeys_user() {
        let store = DirectoryStore::new();
        let identifier = store.create("alice", "Alice A", b"hash".to_vec()).unwrap();
        let created = store.lookup("alice").unwrap();

        assert!(!store.modify("alice", "alicia", b"wrong"));
        assert!(!store.modify("nobody", "alicia", b"hash"));
        assert!(store.modify("alice", "alicia", b"hash"));

        assert!(store.lookup("alice").is_err());
        let renamed = store.lookup("alicia").unwrap();
        assert_eq!(renamed.identifier, identifier);
        assert_eq!(renamed.login_name, "alicia");
        assert_eq!(renamed.created_at, created.created_at);
        assert!(renamed.last_modified_at >= created.last_modified_at);
        assert_eq!(store.reverse_lookup(&identifier).unwrap().login_name, "alicia");
    }

    #[test]
    fn test_modify_collision_evicts_displaced_user() {
        let store = DirectoryStore::new();
        let alice = store.create("alice", "Alice A", b"a".to_vec()).unwrap();
        let bob = store.create("bob", "Bob B", b"b".to_vec()).unwrap();

        assert!(store.modify("alice", "bob", b"a"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("bob").unwrap().identifier, alice);
        assert!(store.reverse_lookup(&bob).is_err());
        assert!(store.snapshot().is_consistent());
    }

    #[test]
    fn test_modify_to_same_name() {
        let store = DirectoryStore::new();
        store.create("alice", "Alice A", b"a".to_vec()).unwrap();
        assert!(store.modify("alice", "alice", b"a"));
        assert_eq!(store.len(), 1);
        assert!(store.snapshot().is_consistent());
    }

    #[test]
    fn test_list_kinds() {
        let store = DirectoryStore::new();
        let bob = store.create("bob", "Bob B", vec![1]).unwrap();
        let alice = store.create("alice", "Alice A", vec![2]).unwrap();

        assert_eq!(store.list(ListKind::Users), "alice\nbob");
        assert_eq!(
            store.list(ListKind::All),
            format!("alice: {}\nbob: {}", alice, bob)
        );
        let identifiers = store.list(ListKind::Identifiers);
        assert!(identifiers.contains(&alice.to_string()));
        assert!(identifiers.contains(&bob.to_string()));
        assert_eq!(DirectoryStore::new().list(ListKind::Users), "");
    }

    #[test]
    fn test_snapshot_restore() {
        let store = DirectoryStore::new();
        store.create("alice", "Alice A", vec![1, 2]).unwrap();
        store.create("bob", "Bob B", vec![3]).unwrap();
        let snapshot = store.snapshot();

        store.restore(snapshot.clone());
        assert_eq!(store.snapshot(), snapshot);

        let replica = DirectoryStore::new();
        replica.create("stale", "Stale", vec![]).unwrap();
        replica.restore(snapshot.clone());
        assert!(replica.lookup("stale").is_err());
        assert_eq!(replica.snapshot(), snapshot);
    }

    #[test]
    fn test_snapshot_is_deep_copy() {
        let store = DirectoryStore::new();
        store.create("alice", "Alice A", vec![1]).unwrap();
        let snapshot = store.snapshot();

        assert!(store.delete("alice", &[1]));
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.by_login_name.contains_key("alice"));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Create(usize, u8),
        Modify(usize, usize, u8),
        Delete(usize, u8),
    }

    const NAMES: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..NAMES.len(), 0u8..2).prop_map(|(n, h)| Op::Create(n, h)),
            (0..NAMES.len(), 0..NAMES.len(), 0u8..2).prop_map(|(o, n, h)| Op::Modify(o, n, h)),
            (0..NAMES.len(), 0u8..2).prop_map(|(n, h)| Op::Delete(n, h)),
        ]
    }

    proptest! {
        #[test]
        fn prop_maps_stay_consistent(ops in proptest::collection::vec(op_strategy(), 1..60)) {
            let store = DirectoryStore::new();
            for op in ops {
                match op {
                    Op::Create(n, h) => {
                        let _ = store.create(NAMES[n], "User", vec![h]);
                    }
                    Op::Modify(o, n, h) => {
                        store.modify(NAMES[o], NAMES[n], &[h]);
                    }
                    Op::Delete(n, h) => {
                        store.delete(NAMES[n], &[h]);
                    }
                }
                let snapshot = store.snapshot();
                prop_assert!(snapshot.is_consistent());
                prop_assert_eq!(snapshot.by_login_name.len(), store.len());
            }
        }
    }
}
