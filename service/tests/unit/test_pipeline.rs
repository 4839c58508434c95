//! Image build pipeline over fake collaborators

use std::sync::atomic::Ordering;
use std::sync::Arc;

use kubeship::deploy::detect::ProjectKind;
use kubeship::deploy::pipeline::{ImageBuildPipeline, Options};
use kubeship::errors::{AppError, BuildStage};
use kubeship::models::deployment::BuildSpec;
use tokio_test::{assert_err, assert_ok};

use crate::fakes::{credentials, is_empty_dir, FakeBuilder, FakeGit};

fn pipeline(
    work_dir: &std::path::Path,
    git: Arc<FakeGit>,
    builder: Arc<FakeBuilder>,
) -> ImageBuildPipeline {
    ImageBuildPipeline::new(
        git,
        builder,
        credentials(),
        Options {
            work_dir: Some(work_dir.to_path_buf()),
        },
    )
}

#[tokio::test]
async fn test_build_and_push_success() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::with_files(&[("index.html", "<h1>hi</h1>")]));
    let builder = Arc::new(FakeBuilder::default());
    let pipeline = pipeline(work.path(), git.clone(), builder.clone());

    let spec = BuildSpec::new("https://github.com/alice/My_Site.git", "My_Site", "latest");
    let built = assert_ok!(pipeline.build_and_push(&spec).await);

    assert_eq!(built.image.to_string(), "alice/my-site:latest");
    assert_eq!(built.detected, Some(ProjectKind::Static));
    assert_eq!(
        builder.calls(),
        vec![
            "build alice/my-site:latest",
            "login alice",
            "push alice/my-site:latest",
        ]
    );
    assert!(builder.dockerfile().unwrap().starts_with("FROM nginx:alpine"));
}

#[tokio::test]
async fn test_workdir_removed_on_success() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::with_files(&[("main.go", "package main")]));
    let builder = Arc::new(FakeBuilder::default());
    let pipeline = pipeline(work.path(), git.clone(), builder);

    assert_ok!(pipeline.build_and_push(&BuildSpec::new("u", "svc", "latest")).await);

    let checkout = git.last_checkout().unwrap();
    assert!(checkout.starts_with(work.path()));
    assert!(!checkout.exists());
    assert!(is_empty_dir(work.path()));
}

#[tokio::test]
async fn test_workdir_removed_on_failure() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::with_files(&[("index.html", "")]));
    let builder = Arc::new(FakeBuilder::default());
    builder.fail_build.store(true, Ordering::SeqCst);
    let pipeline = pipeline(work.path(), git.clone(), builder.clone());

    let err = assert_err!(pipeline.build_and_push(&BuildSpec::new("u", "site", "latest")).await);
    assert_eq!(err.build_stage(), Some(BuildStage::Build));
    assert!(is_empty_dir(work.path()));
    assert_eq!(builder.calls(), vec!["build alice/site:latest"]);
}

#[tokio::test]
async fn test_clone_failure_skips_build() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::failing());
    let builder = Arc::new(FakeBuilder::default());
    let pipeline = pipeline(work.path(), git, builder.clone());

    let err = assert_err!(pipeline.build_and_push(&BuildSpec::new("u", "site", "latest")).await);
    assert!(matches!(err, AppError::CloneError(_)));
    assert!(builder.calls().is_empty());
    assert!(is_empty_dir(work.path()));
}

#[tokio::test]
async fn test_login_failure_skips_push() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::with_files(&[("index.html", "")]));
    let builder = Arc::new(FakeBuilder::default());
    builder.fail_login.store(true, Ordering::SeqCst);
    let pipeline = pipeline(work.path(), git, builder.clone());

    let err = assert_err!(pipeline.build_and_push(&BuildSpec::new("u", "site", "latest")).await);
    assert_eq!(err.build_stage(), Some(BuildStage::Auth));
    assert!(!builder.calls().iter().any(|c| c.starts_with("push")));
}

#[tokio::test]
async fn test_push_failure() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::with_files(&[("index.html", "")]));
    let builder = Arc::new(FakeBuilder::default());
    builder.fail_push.store(true, Ordering::SeqCst);
    let pipeline = pipeline(work.path(), git, builder);

    let err = assert_err!(pipeline.build_and_push(&BuildSpec::new("u", "site", "latest")).await);
    assert_eq!(err.build_stage(), Some(BuildStage::Push));
}

#[tokio::test]
async fn test_repository_dockerfile_is_built_verbatim() {
    let work = tempfile::tempdir().unwrap();
    let git = Arc::new(FakeGit::with_files(&[
        ("Dockerfile", "FROM busybox\n# keep-me\n"),
        ("package.json", "{}"),
    ]));
    let builder = Arc::new(FakeBuilder::default());
    let pipeline = pipeline(work.path(), git, builder.clone());

    let built = assert_ok!(pipeline.build_and_push(&BuildSpec::new("u", "custom", "latest")).await);
    assert_eq!(built.detected, None);
    assert_eq!(builder.dockerfile().as_deref(), Some("FROM busybox\n# keep-me\n"));
}

#[tokio::test]
async fn test_missing_work_dir_is_created() {
    let work = tempfile::tempdir().unwrap();
    let nested = work.path().join("nested").join("builds");
    let git = Arc::new(FakeGit::with_files(&[("index.html", "")]));
    let builder = Arc::new(FakeBuilder::default());
    let pipeline = pipeline(&nested, git.clone(), builder);

    assert_ok!(pipeline.build_and_push(&BuildSpec::new("u", "site", "latest")).await);
    assert!(git.last_checkout().unwrap().starts_with(&nested));
    assert!(is_empty_dir(&nested));
}
