//! Drive the Azure backend against a scripted stand-in for `az`

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tenant_relocator_azure::{AzCli, GenericListing, TypedListing};
use tenant_relocator_common::{
    LocationProbe, MoveCapability, ProbeError, ResourceKind, ResourceProbe,
};

const FAKE_AZ: &str = r#"#!/bin/sh
case "$1 $2" in
  "keyvault list")
    echo '[{"id":"/kv/1","name":"kv-iqonsticos1","location":"westeurope"}]' ;;
  "servicebus namespace")
    echo 'AuthorizationFailed: no read access on Microsoft.ServiceBus' >&2
    exit 1 ;;
  "resource list")
    echo '[{"id":"/sb/1","name":"sb-iqon-sticos-1","type":"Microsoft.ServiceBus/namespaces"}]' ;;
  "group list")
    echo '[{"name":"rg-a","location":"westeurope"},{"name":"rg-b","location":"westeurope"}]' ;;
  "group exists")
    if [ "$4" = "rg-a" ]; then echo true; else echo false; fi ;;
  "webapp list")
    echo '[{"name":"app-iqon-sticos-1"}]' ;;
  "resource move")
    if [ "$6" = "/kv/locked" ]; then echo 'ResourceMoveFailed' >&2; exit 3; fi ;;
  *)
    echo "unknown command: $*" >&2
    exit 2 ;;
esac
"#;

fn fake_az() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("az");
    fs::write(&path, FAKE_AZ).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

fn cli(path: &Path) -> AzCli {
    AzCli::new().program(path.to_string_lossy().into_owned())
}

#[test]
fn test_typed_listing() {
    let (_dir, path) = fake_az();
    let az = cli(&path);

    let vaults = TypedListing::new(&az)
        .list_resources(ResourceKind::KeyVault, "rg-source")
        .unwrap();
    assert_eq!(vaults.len(), 1);
    assert_eq!(vaults[0].id, "/kv/1");
    assert_eq!(vaults[0].name, "kv-iqonsticos1");
}

#[test]
fn test_typed_failure_surfaces_stderr() {
    let (_dir, path) = fake_az();
    let az = cli(&path);

    let err = TypedListing::new(&az)
        .list_resources(ResourceKind::ServiceBus, "rg-source")
        .unwrap_err();
    match err {
        ProbeError::CommandFailed { stderr, .. } => {
            assert!(stderr.starts_with("AuthorizationFailed"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_generic_listing() {
    let (_dir, path) = fake_az();
    let az = cli(&path);

    let namespaces = GenericListing::new(&az)
        .list_resources(ResourceKind::ServiceBus, "rg-source")
        .unwrap();
    assert_eq!(namespaces[0].name, "sb-iqon-sticos-1");
    assert_eq!(namespaces[0].kind, ResourceKind::ServiceBus);
}

#[test]
fn test_resource_probe_falls_back_to_generic_listing() {
    let (_dir, path) = fake_az();
    let az = cli(&path);

    let namespaces = az
        .resource_probe()
        .list_resources(ResourceKind::ServiceBus, "rg-source")
        .unwrap();
    assert_eq!(namespaces.len(), 1);
    assert_eq!(namespaces[0].id, "/sb/1");
}

#[test]
fn test_location_probe() {
    let (_dir, path) = fake_az();
    let az = cli(&path);

    assert_eq!(
        az.list_locations().unwrap(),
        vec!["rg-a".to_string(), "rg-b".to_string()]
    );
    assert!(az.location_exists("rg-a").unwrap());
    assert!(!az.location_exists("rg-z").unwrap());
    assert_eq!(
        az.list_web_apps("rg-a").unwrap(),
        vec!["app-iqon-sticos-1".to_string()]
    );
}

#[test]
fn test_move_resource() {
    let (_dir, path) = fake_az();
    let az = cli(&path);

    assert!(az.move_resource("/kv/1", "rg-source", "rg-a").is_ok());
    let err = az
        .move_resource("/kv/locked", "rg-source", "rg-a")
        .unwrap_err();
    assert!(matches!(err, ProbeError::CommandFailed { .. }));
}
