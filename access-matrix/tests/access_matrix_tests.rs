//! End-to-end tests for access matrix aggregation.
//!
//! These tests drive `AccessMatrixService` through in-memory collaborators and
//! check the resulting relation:
//! 1. Project-level grants cascade to applicable children
//! 2. Direct and inherited roles on the same pair are grouped
//! 3. Non-cascading roles stay on the project
//! 4. Directory and policy search failures are fatal; inventory failures are not
//! 5. Identifier shapes join without substring matching

use access_matrix::sources::{
    Binding, Cursor, InstanceRecord, InventoryRecord, InventorySource, PolicyGetter, PolicyRecord,
    PolicySearch, PrincipalDirectory, ServiceRecord, VecCursor,
};
use access_matrix::{
    AccessMatrixService, InventoryWarning, MatrixConfig, MatrixError, SourceError, SourceResult,
};
use access_model::{CanonicalKey, PrincipalKind, ResourceKind};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PROJECT: &str = "demo-project";
const PROJECT_NAME: &str = "//cloudresourcemanager.googleapis.com/projects/demo-project";
const VM1_ASSET: &str = "//compute.googleapis.com/projects/demo-project/zones/us-east1-b/instances/vm-1";

// =============================================================================
// Fakes
// =============================================================================

/// Directory returning a fixed member list, or failing.
struct FakeDirectory {
    members: Vec<String>,
    fail: bool,
}

impl FakeDirectory {
    fn new(members: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            members: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl PrincipalDirectory for FakeDirectory {
    async fn list_members(&self, project_id: &str) -> SourceResult<Vec<String>> {
        assert_eq!(project_id, PROJECT);
        if self.fail {
            return Err(SourceError::Api {
                status: 403,
                message: "resourcemanager.projects.getIamPolicy denied".to_string(),
            });
        }
        Ok(self.members.clone())
    }
}

/// Policy search over a fixed record list.
struct FakeSearch {
    records: Vec<PolicyRecord>,
    fail_after_records: bool,
    delay: Option<Duration>,
}

impl FakeSearch {
    fn new(records: Vec<PolicyRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            fail_after_records: false,
            delay: None,
        })
    }

    fn failing_mid_stream(records: Vec<PolicyRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            fail_after_records: true,
            delay: None,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            records: Vec::new(),
            fail_after_records: false,
            delay: Some(delay),
        })
    }
}

#[async_trait]
impl PolicySearch for FakeSearch {
    async fn search_all(&self, scope: &str) -> SourceResult<Box<dyn Cursor<PolicyRecord>>> {
        assert_eq!(scope, "projects/demo-project");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let records = self.records.clone();
        if self.fail_after_records {
            Ok(Box::new(VecCursor::failing_after(
                records,
                SourceError::Request("stream reset".to_string()),
            )))
        } else {
            Ok(Box::new(VecCursor::new(records)))
        }
    }
}

/// Inventory backend over a fixed record list.
struct FakeInventory {
    backend: &'static str,
    kind: ResourceKind,
    records: Vec<InventoryRecord>,
    fail: bool,
}

#[async_trait]
impl InventorySource for FakeInventory {
    fn backend(&self) -> &str {
        self.backend
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list(&self, _partition: &str) -> SourceResult<Box<dyn Cursor<InventoryRecord>>> {
        if self.fail {
            return Err(SourceError::Request("connection refused".to_string()));
        }
        Ok(Box::new(VecCursor::new(self.records.clone())))
    }
}

fn vm_inventory(names: &[(&str, u64)]) -> Arc<FakeInventory> {
    Arc::new(FakeInventory {
        backend: "compute",
        kind: ResourceKind::Vm,
        records: names
            .iter()
            .map(|(name, id)| {
                InventoryRecord::Instance(InstanceRecord {
                    id: *id,
                    name: name.to_string(),
                    zone: "us-east1-b".to_string(),
                    self_link: String::new(),
                })
            })
            .collect(),
        fail: false,
    })
}

fn roles(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|r| r.to_string()).collect()
}

fn vm1() -> CanonicalKey {
    CanonicalKey::new(ResourceKind::Vm, "vm-1")
}

fn project_editor() -> PolicyRecord {
    PolicyRecord::new(
        PROJECT_NAME,
        vec![Binding::new("roles/editor", ["user:alice@example.com"])],
    )
}

fn service(
    directory: Arc<dyn PrincipalDirectory>,
    search: Arc<dyn PolicySearch>,
) -> AccessMatrixService {
    AccessMatrixService::new(MatrixConfig::new(PROJECT), directory, search)
        .expect("valid config")
}

// =============================================================================
// Inheritance scenarios
// =============================================================================

/// A project editor with no direct grant on the VM inherits editor on it.
#[tokio::test]
async fn test_project_editor_inherits_on_vm() {
    let matrix = service(
        FakeDirectory::new(&["user:alice@example.com"]),
        FakeSearch::new(vec![project_editor()]),
    )
    .with_inventory(vm_inventory(&[("vm-1", 4419816502436283473)]))
    .compute_access_matrix()
    .await
    .expect("matrix");

    assert_eq!(
        matrix.roles_for("alice@example.com", &vm1()),
        Some(&roles(&["roles/editor"]))
    );

    let vm = matrix.resource(&vm1()).expect("vm tracked");
    assert_eq!(vm.location, "us-east1-b");
    assert_eq!(vm.raw_id, "4419816502436283473");
}

/// An inherited editor and a direct viewer on the same VM are both kept.
#[tokio::test]
async fn test_direct_and_inherited_roles_are_grouped() {
    let matrix = service(
        FakeDirectory::new(&["user:alice@example.com"]),
        FakeSearch::new(vec![
            project_editor(),
            PolicyRecord::new(
                VM1_ASSET,
                vec![Binding::new("roles/viewer", ["user:alice@example.com"])],
            ),
        ]),
    )
    .with_inventory(vm_inventory(&[("vm-1", 1)]))
    .compute_access_matrix()
    .await
    .expect("matrix");

    assert_eq!(
        matrix.roles_for("alice@example.com", &vm1()),
        Some(&roles(&["roles/editor", "roles/viewer"]))
    );
    assert_eq!(matrix.entries_for("alice@example.com").count(), 2);
    assert_eq!(matrix.resources.len(), 2);
}

/// A role with no applicability entry does not reach any child.
#[tokio::test]
async fn test_unlisted_role_does_not_cascade() {
    let matrix = service(
        FakeDirectory::new(&["user:bob@example.com"]),
        FakeSearch::new(vec![PolicyRecord::new(
            PROJECT_NAME,
            vec![Binding::new("roles/pubsub.publisher", ["user:bob@example.com"])],
        )]),
    )
    .with_inventory(vm_inventory(&[("vm-1", 1), ("vm-2", 2)]))
    .compute_access_matrix()
    .await
    .expect("matrix");

    let entries: Vec<_> = matrix.entries_for("bob@example.com").collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].resource_kind, ResourceKind::Project);
    assert_eq!(matrix.roles_for("bob@example.com", &vm1()), None);
}

/// Service roles only reach the kind they belong to.
#[tokio::test]
async fn test_service_role_cascades_to_matching_kind() {
    let services = Arc::new(FakeInventory {
        backend: "run",
        kind: ResourceKind::ManagedService,
        records: vec![InventoryRecord::Service(ServiceRecord {
            name: "projects/demo-project/locations/europe-west1/services/api".to_string(),
            uri: None,
        })],
        fail: false,
    });

    let matrix = service(
        FakeDirectory::new(&["serviceAccount:ci@demo-project.iam.gserviceaccount.com"]),
        FakeSearch::new(vec![PolicyRecord::new(
            PROJECT_NAME,
            vec![Binding::new(
                "roles/run.invoker",
                ["serviceAccount:ci@demo-project.iam.gserviceaccount.com"],
            )],
        )]),
    )
    .with_inventory(vm_inventory(&[("vm-1", 1)]))
    .with_inventory(services)
    .compute_access_matrix()
    .await
    .expect("matrix");

    let ci = "ci@demo-project.iam.gserviceaccount.com";
    let api = CanonicalKey::new(ResourceKind::ManagedService, "api");
    assert_eq!(matrix.roles_for(ci, &api), Some(&roles(&["roles/run.invoker"])));
    assert_eq!(matrix.roles_for(ci, &vm1()), None);
    assert_eq!(matrix.resource(&api).unwrap().location, "europe-west1");
    assert_eq!(
        matrix.principal(ci).map(|p| p.kind),
        Some(PrincipalKind::WorkloadIdentity)
    );
}

// =============================================================================
// Identity and completeness
// =============================================================================

/// Principals holding only resource-level grants still appear in the list.
#[tokio::test]
async fn test_resource_only_principal_is_listed() {
    let matrix = service(
        FakeDirectory::new(&["user:alice@example.com"]),
        FakeSearch::new(vec![PolicyRecord::new(
            "//storage.googleapis.com/audit-logs",
            vec![Binding::new("roles/storage.objectViewer", ["group:auditors@example.com"])],
        )]),
    )
    .compute_access_matrix()
    .await
    .expect("matrix");

    assert_eq!(matrix.principals.len(), 2);
    for entry in &matrix.access {
        assert!(matrix.principal(&entry.principal).is_some(), "{}", entry.principal);
        assert!(!entry.roles.is_empty());
    }

    let bucket = matrix
        .resource(&CanonicalKey::new(ResourceKind::Storage, "audit-logs"))
        .expect("bucket discovered from search");
    assert_eq!(bucket.location, "unknown");
}

/// Resources whose names contain each other stay separate.
#[tokio::test]
async fn test_substring_names_are_not_merged() {
    let matrix = service(
        FakeDirectory::new(&[]),
        FakeSearch::new(vec![PolicyRecord::new(
            "//compute.googleapis.com/projects/demo-project/zones/us-east1-b/instances/vm-10",
            vec![Binding::new("roles/compute.admin", ["user:ops@example.com"])],
        )]),
    )
    .with_inventory(vm_inventory(&[("vm-1", 1)]))
    .compute_access_matrix()
    .await
    .expect("matrix");

    assert_eq!(matrix.resources.len(), 2);
    assert_eq!(matrix.roles_for("ops@example.com", &vm1()), None);
    assert!(matrix
        .roles_for("ops@example.com", &CanonicalKey::new(ResourceKind::Vm, "vm-10"))
        .is_some());
}

/// Two runs over the same inputs produce the same relation.
#[tokio::test]
async fn test_output_is_stable() {
    let svc = service(
        FakeDirectory::new(&["user:alice@example.com", "user:bob@example.com"]),
        FakeSearch::new(vec![
            project_editor(),
            PolicyRecord::new(
                PROJECT_NAME,
                vec![Binding::new("roles/viewer", ["user:bob@example.com"])],
            ),
        ]),
    )
    .with_inventory(vm_inventory(&[("vm-1", 1), ("vm-2", 2), ("vm-3", 3)]));

    let first = svc.compute_access_matrix().await.expect("first");
    let second = svc.compute_access_matrix().await.expect("second");
    assert_eq!(first.access, second.access);
    assert_ne!(first.run_id, second.run_id);
}

// =============================================================================
// Failure handling
// =============================================================================

/// A failing directory aborts the pass.
#[tokio::test]
async fn test_directory_failure_is_fatal() {
    let err = service(FakeDirectory::failing(), FakeSearch::new(vec![]))
        .compute_access_matrix()
        .await
        .unwrap_err();

    assert!(matches!(err, MatrixError::PrincipalDirectory { .. }));
    assert_eq!(err.stage(), "PRINCIPAL_DIRECTORY");
    assert_eq!(err.status_code(), 403);
}

/// A policy stream failing part way aborts the pass.
#[tokio::test]
async fn test_mid_stream_failure_is_fatal() {
    let err = service(
        FakeDirectory::new(&["user:alice@example.com"]),
        FakeSearch::failing_mid_stream(vec![project_editor()]),
    )
    .compute_access_matrix()
    .await
    .unwrap_err();

    match err {
        MatrixError::PolicySearch { scope, source } => {
            assert_eq!(scope, "projects/demo-project");
            assert!(matches!(source, SourceError::Request(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// A failing inventory backend only produces a warning.
#[tokio::test]
async fn test_inventory_failure_is_partial() {
    let broken = Arc::new(FakeInventory {
        backend: "container",
        kind: ResourceKind::Cluster,
        records: Vec::new(),
        fail: true,
    });

    let matrix = service(
        FakeDirectory::new(&["user:alice@example.com"]),
        FakeSearch::new(vec![project_editor()]),
    )
    .with_inventory(broken)
    .with_inventory(vm_inventory(&[("vm-1", 1)]))
    .compute_access_matrix()
    .await
    .expect("matrix");

    assert!(matrix.roles_for("alice@example.com", &vm1()).is_some());
    assert_eq!(
        matrix.warnings,
        vec![InventoryWarning::Backend {
            backend: "container".to_string(),
            message: "Request failed: connection refused".to_string(),
        }]
    );
}

/// Enrichment failures leave grants empty but keep the resource.
#[tokio::test]
async fn test_enrichment_failure_keeps_resource() {
    struct Flaky {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PolicyGetter for Flaky {
        async fn get_policy(&self, _record: &InventoryRecord) -> SourceResult<Vec<Binding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::Api {
                status: 500,
                message: "internal".to_string(),
            })
        }
    }

    let flaky = Arc::new(Flaky {
        calls: AtomicU32::new(0),
    });
    let matrix = service(FakeDirectory::new(&[]), FakeSearch::new(vec![]))
        .with_inventory(vm_inventory(&[("vm-1", 1), ("vm-2", 2)]))
        .with_policy_getter(flaky.clone())
        .compute_access_matrix()
        .await
        .expect("matrix");

    assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    assert_eq!(matrix.resources.len(), 2);
    assert!(matrix.resources.iter().all(|r| r.direct_grants.is_empty()));
    assert_eq!(matrix.warnings.len(), 2);
}

/// The deadline aborts a pass that takes too long.
#[tokio::test(start_paused = true)]
async fn test_deadline_exceeded() {
    let config = MatrixConfig::new(PROJECT).with_deadline(Duration::from_secs(5));
    let svc = AccessMatrixService::new(
        config,
        FakeDirectory::new(&[]),
        FakeSearch::slow(Duration::from_secs(60)),
    )
    .expect("valid config");

    let err = svc.compute_access_matrix().await.unwrap_err();
    assert!(matches!(err, MatrixError::DeadlineExceeded { deadline_secs: 5 }));
    assert_eq!(err.status_code(), 504);
}

/// An invalid configuration is rejected up front.
#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let result = AccessMatrixService::new(
        MatrixConfig::new("  "),
        FakeDirectory::new(&[]),
        FakeSearch::new(vec![]),
    );
    assert!(matches!(result, Err(MatrixError::Config(_))));
}

// =============================================================================
// Separate reads
// =============================================================================

#[tokio::test]
async fn test_list_principals_and_resources() {
    let svc = service(
        FakeDirectory::new(&[
            "user:bob@example.com",
            "user:alice@example.com",
            "user:alice@example.com",
        ]),
        FakeSearch::new(vec![]),
    )
    .with_inventory(vm_inventory(&[("vm-2", 2), ("vm-1", 1)]));

    let principals = svc.list_principals().await.expect("principals");
    let ids: Vec<_> = principals.iter().map(|p| p.identifier.as_str()).collect();
    assert_eq!(ids, vec!["alice@example.com", "bob@example.com"]);

    let resources = svc.list_resources().await;
    let names: Vec<_> = resources.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["vm-1", "vm-2"]);
}
