// Cluster and directory data models
// Shared between nodes (peer RPC) and clients

use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use idmesh_common::IdmeshError;

/// Identity of one cluster node: its election rank and network address (`host:port`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerId {
    pub rank: u64,
    pub address: String,
}

impl PeerId {
    pub fn new(rank: u64, address: impl Into<String>) -> Self {
        Self {
            rank,
            address: address.into(),
        }
    }

    /// Total order by rank.
    ///
    /// Two distinct nodes sharing a rank is a protocol violation; the comparison
    /// fails with `RankConflict` instead of picking a winner.
    pub fn compare(&self, other: &PeerId) -> Result<Ordering, IdmeshError> {
        match self.rank.cmp(&other.rank) {
            Ordering::Equal if self.address != other.address => Err(IdmeshError::RankConflict {
                rank: self.rank,
                left: self.address.clone(),
                right: other.address.clone(),
            }),
            ordering => Ok(ordering),
        }
    }

    /// Whether `self` strictly outranks `other`
    pub fn outranks(&self, other: &PeerId) -> Result<bool, IdmeshError> {
        Ok(self.compare(other)? == Ordering::Greater)
    }

    /// Highest-ranked peer of a set, `None` for an empty set
    pub fn highest<'a, I>(peers: I) -> Result<Option<&'a PeerId>, IdmeshError>
    where
        I: IntoIterator<Item = &'a PeerId>,
    {
        let mut highest: Option<&PeerId> = None;
        for peer in peers {
            highest = match highest {
                None => Some(peer),
                Some(current) => {
                    if peer.compare(current)? == Ordering::Greater {
                        Some(peer)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        Ok(highest)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.rank)
    }
}

/// Snapshot of a node's cluster state, served for diagnostics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    #[serde(rename = "self")]
    pub self_peer: PeerId,
    pub leader: PeerId,
    pub election_in_progress: bool,
    pub members: Vec<PeerId>,
}

/// A directory entry.
///
/// `credential_hash` is opaque: callers hash before the value reaches the
/// directory, and it is only ever compared byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub identifier: Uuid,
    pub login_name: String,
    pub display_name: String,
    #[serde(with = "crate::remote::base64_bytes")]
    pub credential_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a fresh random identifier, stamped now
    pub fn new(
        login_name: impl Into<String>,
        display_name: impl Into<String>,
        credential_hash: Vec<u8>,
    ) -> Self {
        let now = Utc::now();
        Self {
            identifier: Uuid::new_v4(),
            login_name: login_name.into(),
            display_name: display_name.into(),
            credential_hash,
            created_at: now,
            last_modified_at: now,
        }
    }

    pub fn credential_matches(&self, credential_hash: &[u8]) -> bool {
        self.credential_hash.as_slice() == credential_hash
    }

    pub fn info(&self) -> UserInfo {
        UserInfo {
            identifier: self.identifier,
            login_name: self.login_name.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
            last_modified_at: self.last_modified_at,
        }
    }
}

/// Public view of a user, without the credential hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub identifier: Uuid,
    pub login_name: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Login Name: {}; Real Name: {}; UUID: {}; Last Modified: {}; Time Created: {}",
            self.login_name,
            self.display_name,
            self.identifier,
            self.last_modified_at.to_rfc3339(),
            self.created_at.to_rfc3339()
        )
    }
}

/// Deep copy of both directory maps
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    pub by_login_name: BTreeMap<String, User>,
    pub by_identifier: BTreeMap<Uuid, User>,
}

impl DirectorySnapshot {
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty() && self.by_login_name.is_empty()
    }

    /// Both maps hold the same records, each keyed by its own field
    pub fn is_consistent(&self) -> bool {
        self.by_login_name.len() == self.by_identifier.len()
            && self.by_login_name.iter().all(|(login_name, user)| {
                user.login_name == *login_name
                    && self.by_identifier.get(&user.identifier) == Some(user)
            })
    }
}

/// Enumeration requested through `get`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// All login names
    Users,
    /// All identifiers
    Identifiers,
    /// `login: identifier` lines
    All,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Users => "users",
            ListKind::Identifiers => "uuids",
            ListKind::All => "all",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" => Ok(ListKind::Users),
            "uuids" | "identifiers" | "ids" => Ok(ListKind::Identifiers),
            "all" => Ok(ListKind::All),
            _ => Err(format!("Did not recognize list to get: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_compare_by_rank() {
        let low = PeerId::new(1, "10.0.0.1:5181");
        let high = PeerId::new(2, "10.0.0.2:5181");
        assert_eq!(low.compare(&high).unwrap(), Ordering::Less);
        assert_eq!(high.compare(&low).unwrap(), Ordering::Greater);
        assert_eq!(low.compare(&low.clone()).unwrap(), Ordering::Equal);
        assert!(high.outranks(&low).unwrap());
        assert!(!low.outranks(&high).unwrap());
    }

    #[test]
    fn test_peer_compare_rank_conflict() {
        let a = PeerId::new(7, "10.0.0.1:5181");
        let b = PeerId::new(7, "10.0.0.2:5181");
        let err = a.compare(&b).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_highest_peer() {
        let peers = vec![
            PeerId::new(2, "b:1"),
            PeerId::new(5, "e:1"),
            PeerId::new(3, "c:1"),
        ];
        assert_eq!(PeerId::highest(&peers).unwrap().unwrap().rank, 5);
        assert!(PeerId::highest(&Vec::<PeerId>::new()).unwrap().is_none());

        let conflicting = vec![PeerId::new(5, "e:1"), PeerId::new(5, "f:1")];
        assert!(PeerId::highest(&conflicting).is_err());
    }

    #[test]
    fn test_peer_serialization() {
        let peer = PeerId::new(3, "127.0.0.1:5181");
        let json = serde_json::to_string(&peer).unwrap();
        assert_eq!(json, r#"{"rank":3,"address":"127.0.0.1:5181"}"#);
        assert_eq!(peer.to_string(), "127.0.0.1:5181#3");
    }

    #[test]
    fn test_cluster_view_uses_self_key() {
        let peer = PeerId::new(1, "a:1");
        let view = ClusterView {
            self_peer: peer.clone(),
            leader: peer.clone(),
            election_in_progress: false,
            members: vec![peer],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("self").is_some());
        assert_eq!(json["electionInProgress"], false);
    }

    #[test]
    fn test_user_new() {
        let user = User::new("alice", "Alice A", vec![1, 2, 3]);
        assert!(!user.identifier.is_nil());
        assert_eq!(user.created_at, user.last_modified_at);
        assert!(user.credential_matches(&[1, 2, 3]));
        assert!(!user.credential_matches(&[1, 2]));
    }

    #[test]
    fn test_user_serialization_keeps_every_field() {
        let user = User::new("alice", "Alice A", vec![0, 255, 16, 7]);
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"credentialHash\":\"AP8QBw==\""));
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_user_info_hides_credential() {
        let user = User::new("bob", "Bob B", vec![9; 64]);
        let json = serde_json::to_string(&user.info()).unwrap();
        assert!(!json.contains("credential"));
        assert!(user.info().to_string().starts_with("Login Name: bob; Real Name: Bob B"));
    }

    #[test]
    fn test_snapshot_consistency_check() {
        let user = User::new("carol", "Carol C", vec![1]);
        let mut snapshot = DirectorySnapshot::default();
        assert!(snapshot.is_empty());
        snapshot
            .by_login_name
            .insert(user.login_name.clone(), user.clone());
        assert!(!snapshot.is_consistent());
        snapshot.by_identifier.insert(user.identifier, user);
        assert!(snapshot.is_consistent());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_list_kind_parse() {
        assert_eq!("users".parse::<ListKind>().unwrap(), ListKind::Users);
        assert_eq!("uuids".parse::<ListKind>().unwrap(), ListKind::Identifiers);
        assert_eq!(
            "identifiers".parse::<ListKind>().unwrap(),
            ListKind::Identifiers
        );
        assert_eq!("ALL".parse::<ListKind>().unwrap(), ListKind::All);
        assert!("groups".parse::<ListKind>().is_err());
    }
}
