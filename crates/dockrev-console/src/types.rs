use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub image: ComposeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<IgnoreMatch>,
    pub settings: ServiceSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

/// The image a service currently runs. `resolved_tag`/`resolved_tags` are
/// server-computed: the more specific tag(s) the current digest corresponds
/// to when `tag` itself is a floating alias.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_tags: Option<Vec<String>>,
}

/// The best newer image the backend found for a service, if any.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub tag: String,
    pub digest: String,
    pub arch_match: ArchMatch,
    pub arch: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchMatch {
    Match,
    Mismatch,
    Unknown,
}

impl ArchMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(input: &str) -> Self {
        match input {
            "match" => Self::Match,
            "mismatch" => Self::Mismatch,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreMatch {
    pub matched: bool,
    pub rule_id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSettings {
    pub auto_rollback: bool,
    pub backup_targets: BackupTargetOverrides,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupTargetOverrides {
    pub bind_paths: BTreeMap<String, TernaryChoice>,
    pub volume_names: BTreeMap<String, TernaryChoice>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TernaryChoice {
    Inherit,
    Skip,
    Force,
}

/// One row of the "list selectable candidates for a service" endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCandidateOption {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub arch_match: ArchMatch,
    #[serde(default)]
    pub arch: Vec<String>,
    pub ignored: bool,
}

/// Per-service update opportunity. Derived, never persisted; recomputed from
/// a [`Service`] on every render. Statuses are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowStatus {
    /// No update available. A terminal "nothing to do" state, not a success
    /// indicator.
    Ok,
    Updatable,
    /// Architecture compatibility or tag relationship is unproven; actionable
    /// but requires explicit confirmation.
    Hint,
    /// Candidate belongs to a different tag series; actionable, higher risk.
    CrossTag,
    ArchMismatch,
    /// Suppressed by a user-defined ignore rule.
    Blocked,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Updatable => "updatable",
            Self::Hint => "hint",
            Self::CrossTag => "crossTag",
            Self::ArchMismatch => "archMismatch",
            Self::Blocked => "blocked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_wire_shape_is_camel_case() {
        let raw = r#"{
            "id": "svc_1",
            "name": "web",
            "image": {
                "ref": "ghcr.io/acme/web",
                "tag": "latest",
                "resolvedTag": "5.2.1"
            },
            "candidate": {
                "tag": "5.2.3",
                "digest": "sha256:new",
                "archMatch": "match",
                "arch": ["linux/amd64"]
            },
            "settings": {
                "autoRollback": true,
                "backupTargets": { "bindPaths": {}, "volumeNames": {} }
            }
        }"#;

        let svc: Service = serde_json::from_str(raw).unwrap();
        assert_eq!(svc.image.reference, "ghcr.io/acme/web");
        assert_eq!(svc.image.resolved_tag.as_deref(), Some("5.2.1"));
        assert_eq!(
            svc.candidate.as_ref().unwrap().arch_match,
            ArchMatch::Match
        );
        assert!(svc.ignore.is_none());
    }

    #[test]
    fn row_status_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&RowStatus::CrossTag).unwrap(),
            "\"crossTag\""
        );
        assert_eq!(
            serde_json::to_string(&RowStatus::ArchMismatch).unwrap(),
            "\"archMismatch\""
        );
        assert_eq!(RowStatus::Blocked.as_str(), "blocked");
    }
}
