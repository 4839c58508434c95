//! Cluster deployer over an in-memory cluster

use std::sync::atomic::Ordering;
use std::sync::Arc;

use kubeship::cluster::deployer::ClusterDeployer;
use kubeship::cluster::manifest;
use kubeship::errors::AppError;
use kubeship::models::deployment::DeploymentSpec;
use tokio_test::{assert_err, assert_ok};

use crate::fakes::{FakeBuilder, FakeCluster, REGISTRY_USER};

fn deployer(cluster: Arc<FakeCluster>, builder: Arc<FakeBuilder>) -> ClusterDeployer {
    ClusterDeployer::new(cluster, builder, None, REGISTRY_USER)
}

#[tokio::test]
async fn test_deploy_creates_deployment_and_service() {
    let cluster = Arc::new(FakeCluster::default());
    let deployer = deployer(cluster.clone(), Arc::new(FakeBuilder::default()));

    let message = assert_ok!(
        deployer
            .deploy(&DeploymentSpec::new("web", "alice/web:latest", 80))
            .await
    );
    assert_eq!(message, "Application deployed successfully: web");

    let deployment = cluster.deployment("web").unwrap();
    assert_eq!(manifest::image_of(&deployment), "alice/web:latest");
    assert_eq!(deployment.spec.as_ref().unwrap().replicas, Some(2));
    assert!(cluster.has_service("web"));
}

#[tokio::test]
async fn test_create_or_update_twice_updates_image() {
    let cluster = Arc::new(FakeCluster::default());
    let deployer = deployer(cluster.clone(), Arc::new(FakeBuilder::default()));

    assert_ok!(
        deployer
            .create_or_update(&DeploymentSpec::new("api", "alice/api:v1", 3000).with_replicas(4))
            .await
    );
    assert_ok!(
        deployer
            .create_or_update(&DeploymentSpec::new("api", "alice/api:v2", 3000))
            .await
    );

    assert_eq!(cluster.deployment_count(), 1);
    let deployment = cluster.deployment("api").unwrap();
    assert_eq!(manifest::image_of(&deployment), "alice/api:v2");
    // Only the image is replaced on update
    assert_eq!(deployment.spec.as_ref().unwrap().replicas, Some(4));
}

#[tokio::test]
async fn test_redeploy_keeps_existing_service() {
    let cluster = Arc::new(FakeCluster::default());
    let deployer = deployer(cluster.clone(), Arc::new(FakeBuilder::default()));
    let spec = DeploymentSpec::new("web", "alice/web:latest", 80);

    assert_ok!(deployer.deploy(&spec).await);
    assert_ok!(deployer.deploy(&spec).await);
    assert!(cluster.has_service("web"));
}

#[tokio::test]
async fn test_create_failure_is_reported() {
    let cluster = Arc::new(FakeCluster::default());
    cluster.fail_create_deployment.store(true, Ordering::SeqCst);
    let deployer = deployer(cluster.clone(), Arc::new(FakeBuilder::default()));

    let err = assert_err!(
        deployer
            .deploy(&DeploymentSpec::new("web", "alice/web:latest", 80))
            .await
    );
    assert!(matches!(err, AppError::ClusterCreateError(_)));
    assert!(err.to_string().starts_with("Deployment failed: "));
    assert!(!cluster.has_service("web"));
}

#[tokio::test]
async fn test_status_and_missing_deployment() {
    let cluster = Arc::new(FakeCluster::default());
    let deployer = deployer(cluster.clone(), Arc::new(FakeBuilder::default()));
    assert_ok!(
        deployer
            .deploy(&DeploymentSpec::new("api", "alice/api:latest", 3000))
            .await
    );

    let record = assert_ok!(deployer.status("api").await);
    assert_eq!(record.name, "api");
    assert_eq!(record.port, 3000);
    assert_eq!(record.replicas, 2);
    assert_eq!(record.available_replicas, 0);

    let err = assert_err!(deployer.status("ghost").await);
    assert!(matches!(err, AppError::ClusterNotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn test_list_falls_back_to_default_port() {
    let cluster = Arc::new(FakeCluster::default());
    let deployer = deployer(cluster.clone(), Arc::new(FakeBuilder::default()));
    assert_ok!(
        deployer
            .deploy(&DeploymentSpec::new("site", "alice/site:latest", 80))
            .await
    );

    let records = assert_ok!(deployer.list().await);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].port, 80);

    cluster.fail_get_service.store(true, Ordering::SeqCst);
    let records = assert_ok!(deployer.list().await);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].port, 8000);
    assert_eq!(records[0].image, "alice/site:latest");
}

#[tokio::test]
async fn test_delete_removes_everything() {
    let cluster = Arc::new(FakeCluster::default());
    let builder = Arc::new(FakeBuilder::default());
    let deployer = deployer(cluster.clone(), builder.clone());
    assert_ok!(
        deployer
            .deploy(&DeploymentSpec::new("web", "alice/web:latest", 80))
            .await
    );

    let report = assert_ok!(deployer.delete("web").await);
    assert_eq!(
        report.message,
        "Deleted deployment and service: web and cleaned up Docker image"
    );
    assert!(report.image_removed);
    assert_eq!(cluster.deployment_count(), 0);
    assert!(!cluster.has_service("web"));
    assert_eq!(builder.calls(), vec!["rmi alice/web:latest"]);
}

#[tokio::test]
async fn test_delete_without_service() {
    let cluster = Arc::new(FakeCluster::default());
    let builder = Arc::new(FakeBuilder::default());
    builder.fail_remove.store(true, Ordering::SeqCst);
    let deployer = deployer(cluster.clone(), builder);
    assert_ok!(
        deployer
            .create_or_update(&DeploymentSpec::new("worker", "alice/worker:latest", 8000))
            .await
    );

    let report = assert_ok!(deployer.delete("worker").await);
    assert_eq!(
        report.message,
        "Deleted deployment: worker (no service to remove) (image cleanup skipped - may be in use)"
    );
    assert!(!report.image_removed);
    assert_eq!(cluster.deployment_count(), 0);
}

#[tokio::test]
async fn test_delete_missing_deployment() {
    let cluster = Arc::new(FakeCluster::default());
    let deployer = deployer(cluster, Arc::new(FakeBuilder::default()));
    let err = assert_err!(deployer.delete("ghost").await);
    assert!(matches!(err, AppError::ClusterNotFound(_)));
}

#[tokio::test]
async fn test_disabled_deployer() {
    let deployer = ClusterDeployer::disabled(Arc::new(FakeBuilder::default()), None, REGISTRY_USER);
    assert!(!deployer.is_configured());

    let spec = DeploymentSpec::new("web", "alice/web:latest", 80);
    assert!(matches!(
        deployer.deploy(&spec).await,
        Err(AppError::ClusterNotConfigured)
    ));
    assert!(matches!(deployer.list().await, Err(AppError::ClusterNotConfigured)));
    assert!(matches!(
        deployer.status("web").await,
        Err(AppError::ClusterNotConfigured)
    ));
    assert!(matches!(
        deployer.delete("web").await,
        Err(AppError::ClusterNotConfigured)
    ));
}
