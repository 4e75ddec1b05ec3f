//! Provisions the headless driver service that executors use to reach the
//! driver. Owned by the driver pod rather than the application, so the
//! garbage collector removes it as soon as the pod goes away.

use std::collections::BTreeMap;

use crd::constants::LABEL_SPARK_APP_SELECTOR;
use crd::metadata::{ObjectMetaBuilder, OwnerReferenceBuilder};
use crd::spark_application::SparkApplication;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::schema::ConfigSchema;
use crate::store::{
    is_already_exists, is_not_found, retry_on_conflict, ObjectStore, DEFAULT_RETRY_ATTEMPTS,
};
use crate::{Error, Result};

const DRIVER_PORT_NAME: &str = "driver-rpc-port";
const BLOCK_MANAGER_PORT_NAME: &str = "blockmanager";
const UI_PORT_NAME: &str = "spark-ui";
const PROTOCOL: &str = "TCP";
const EXISTENCE_POLL_ATTEMPTS: usize = 5;
const EXISTENCE_POLL_SLEEP: Duration = Duration::from_millis(2000);

/// Builds the driver service. A malformed port in the overlay falls back to
/// the default here; the fatal check already ran during translation.
pub fn build_driver_service(
    app: &SparkApplication,
    service_name: &str,
    namespace: &str,
    application_id: &str,
    selector: &BTreeMap<String, String>,
    driver_pod_name: &str,
    driver_pod_uid: &str,
    schema: &ConfigSchema,
) -> Result<Service> {
    let owner = OwnerReferenceBuilder::new()
        .api_version("v1")
        .kind("Pod")
        .name(driver_pod_name)
        .uid(driver_pod_uid)
        .controller(true)
        .block_owner_deletion(true)
        .build()
        .map_err(|source| Error::FailedBuildOwnerReference {
            name: service_name.to_string(),
            source,
        })?;

    let mut meta_builder = ObjectMetaBuilder::new();
    meta_builder
        .name(service_name)
        .namespace(namespace)
        .ownerreference(owner)
        .with_label(LABEL_SPARK_APP_SELECTOR, application_id);
    if let Some(conf) = app.spark_conf() {
        for (key, value) in conf {
            if let Some(label_key) = key.strip_prefix(schema.driver_service_label_prefix) {
                meta_builder.with_label(label_key, value);
            }
        }
    }
    if let Some(annotations) = &app.spec.driver.annotations {
        meta_builder
            .with_annotations(annotations.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    }

    let ip_family = app
        .conf_value(schema.driver_service_ip_families)
        .unwrap_or("IPv4")
        .to_string();

    Ok(Service {
        metadata: meta_builder.build(),
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".to_string()),
            ports: Some(vec![
                ServicePort {
                    name: Some(DRIVER_PORT_NAME.to_string()),
                    port: lenient_port(app, schema.driver_port, schema.default_driver_port),
                    protocol: Some(PROTOCOL.to_string()),
                    target_port: Some(IntOrString::Int(schema.default_driver_port)),
                    ..ServicePort::default()
                },
                ServicePort {
                    name: Some(BLOCK_MANAGER_PORT_NAME.to_string()),
                    port: lenient_port(
                        app,
                        schema.driver_block_manager_port,
                        schema.default_block_manager_port,
                    ),
                    protocol: Some(PROTOCOL.to_string()),
                    target_port: Some(IntOrString::Int(schema.default_block_manager_port)),
                    ..ServicePort::default()
                },
                ServicePort {
                    name: Some(UI_PORT_NAME.to_string()),
                    port: schema.default_ui_port,
                    protocol: Some(PROTOCOL.to_string()),
                    target_port: Some(IntOrString::Int(schema.default_ui_port)),
                    ..ServicePort::default()
                },
            ]),
            selector: Some(selector.clone()),
            session_affinity: Some("None".to_string()),
            type_: Some("ClusterIP".to_string()),
            ip_families: Some(vec![ip_family]),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    })
}

fn lenient_port(app: &SparkApplication, key: &str, default: i32) -> i32 {
    match app.conf_value(key) {
        Some(value) => match value.parse::<i32>() {
            Ok(port) => port,
            Err(_) => {
                warn!("Failed to parse {key} value [{value}], using default {default}");
                default
            }
        },
        None => default,
    }
}

pub async fn create_or_update<S>(store: &S, service: &Service, namespace: &str) -> Result<()>
where
    S: ObjectStore<Service>,
{
    let name = service
        .metadata
        .name
        .clone()
        .unwrap_or_default();

    retry_on_conflict(DEFAULT_RETRY_ATTEMPTS, || async {
        match store.get(&name).await {
            Err(err) if is_not_found(&err) => {
                info!("Driver service {name} not found, creating");
                store.create(service).await?;
                confirm_existence(store, service, &name).await
            }
            Err(err) => Err(err),
            Ok(mut existing) => {
                info!("Driver service {name} exists, updating");
                existing.metadata.labels = service.metadata.labels.clone();
                existing.metadata.annotations = service.metadata.annotations.clone();
                existing.metadata.owner_references = service.metadata.owner_references.clone();
                existing.spec = service.spec.clone();
                store.update(&existing).await.map(|_| ())
            }
        }
    })
    .await
    .map_err(|source| Error::FailedCreateService {
        name,
        namespace: namespace.to_string(),
        source,
    })
}

/// Bounded post-create poll absorbing read lag in the listing cache. Failing
/// to confirm existence never fails the submission.
async fn confirm_existence<S>(store: &S, service: &Service, name: &str) -> kube::Result<()>
where
    S: ObjectStore<Service>,
{
    for attempt in 0..EXISTENCE_POLL_ATTEMPTS {
        match store.get(name).await {
            Ok(_) => {
                info!("Driver service {name} confirmed on attempt {}", attempt + 1);
                return Ok(());
            }
            Err(err) if is_not_found(&err) => {
                tokio::time::sleep(EXISTENCE_POLL_SLEEP).await;
                info!(
                    "Driver service {name} does not exist yet, attempt {} to recreate",
                    attempt + 2
                );
                if let Err(err) = store.create(service).await {
                    if !is_already_exists(&err) {
                        return Err(err);
                    }
                    info!("Driver service {name} already exists, ignoring create attempt");
                }
            }
            Err(err) => return Err(err),
        }
    }
    warn!("Could not confirm driver service {name} exists, continuing");
    Ok(())
}
