//! Deployment and Service manifests

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec as K8sDeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, ResourceRequirements, Service, ServicePort,
    ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::models::deployment::{DeploymentRecord, DeploymentSpec, DEFAULT_PORT};

/// Pod selector label key
pub const APP_LABEL: &str = "app";

pub const SERVICE_TYPE: &str = "LoadBalancer";

const CPU_REQUEST: &str = "100m";
const MEMORY_REQUEST: &str = "128Mi";
const CPU_LIMIT: &str = "500m";
const MEMORY_LIMIT: &str = "512Mi";

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ])
}

/// Build the Deployment for `spec`: one container, fixed resource envelope
pub fn deployment(spec: &DeploymentSpec) -> Deployment {
    let labels = app_labels(&spec.name);

    let container = Container {
        name: spec.name.clone(),
        image: Some(spec.image.clone()),
        ports: Some(vec![ContainerPort {
            container_port: i32::from(spec.port),
            ..Default::default()
        }]),
        resources: Some(ResourceRequirements {
            requests: Some(quantities(CPU_REQUEST, MEMORY_REQUEST)),
            limits: Some(quantities(CPU_LIMIT, MEMORY_LIMIT)),
            ..Default::default()
        }),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            ..Default::default()
        },
        spec: Some(K8sDeploymentSpec {
            replicas: Some(spec.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the load balanced Service selecting `app=<name>` pods
pub fn service(name: &str, port: u16) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(app_labels(name)),
            ports: Some(vec![ServicePort {
                port: i32::from(port),
                target_port: Some(IntOrString::Int(i32::from(port))),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            type_: Some(SERVICE_TYPE.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Point the first container of `deployment` at `image`, leaving everything
/// else untouched. Returns false when the Deployment has no container.
pub fn set_image(deployment: &mut Deployment, image: &str) -> bool {
    let container = deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|pod| pod.containers.first_mut());

    match container {
        Some(container) => {
            container.image = Some(image.to_string());
            true
        }
        None => false,
    }
}

/// Image of the first container
pub fn image_of(deployment: &Deployment) -> String {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.containers.first())
        .and_then(|container| container.image.clone())
        .unwrap_or_default()
}

/// Externally reachable port of a Service: the node port for NodePort
/// Services, the declared port otherwise
pub fn exposed_port(service: &Service) -> Option<u16> {
    let spec = service.spec.as_ref()?;
    let first = spec.ports.as_ref()?.first()?;

    let port = if spec.type_.as_deref() == Some("NodePort") {
        first.node_port?
    } else {
        first.port
    };
    u16::try_from(port).ok()
}

/// Summarize a Deployment; `port` comes from its Service
pub fn record(deployment: &Deployment, port: Option<u16>) -> DeploymentRecord {
    let status = deployment.status.as_ref();

    DeploymentRecord {
        name: deployment.metadata.name.clone().unwrap_or_default(),
        replicas: deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        image: image_of(deployment),
        port: port.unwrap_or(DEFAULT_PORT),
    }
}
