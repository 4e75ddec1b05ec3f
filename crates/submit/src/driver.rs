//! Provisions the driver pod. Pod construction itself sits behind a trait so
//! the surrounding system can supply its own pod shape; the default builder
//! produces a minimal driver that mounts the config map the way Spark's
//! Kubernetes backend expects.

use std::collections::BTreeMap;

use crd::constants::{DEFAULT_SPARK_CONF_DIR, SPARK_CONF_DIR_ENV};
use crd::metadata::ObjectMetaBuilder;
use crd::spark_application::SparkApplication;
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, EnvVar, LocalObjectReference, Pod, PodSpec, Volume,
    VolumeMount,
};
use kube::ResourceExt;
use tracing::info;

use crate::store::{is_not_found, retry_on_conflict, ObjectStore, DEFAULT_RETRY_ATTEMPTS};
use crate::{Error, Result};

const DRIVER_CONTAINER_NAME: &str = "spark-kubernetes-driver";
const CONF_VOLUME_NAME: &str = "spark-conf-volume-driver";

/// Collaborator boundary: turns the application into the driver pod handed to
/// the provisioner.
pub trait DriverPodBuilder {
    fn build(
        &self,
        app: &SparkApplication,
        labels: &BTreeMap<String, String>,
        config_map_name: &str,
        volume_mounts: &[VolumeMount],
        volumes: &[Volume],
    ) -> crd::Result<Pod>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDriverPodBuilder;

impl DriverPodBuilder for DefaultDriverPodBuilder {
    fn build(
        &self,
        app: &SparkApplication,
        labels: &BTreeMap<String, String>,
        config_map_name: &str,
        volume_mounts: &[VolumeMount],
        volumes: &[Volume],
    ) -> crd::Result<Pod> {
        let driver = &app.spec.driver;

        let mut env = vec![EnvVar {
            name: SPARK_CONF_DIR_ENV.to_string(),
            value: Some(DEFAULT_SPARK_CONF_DIR.to_string()),
            ..EnvVar::default()
        }];
        if let Some(env_vars) = &driver.env_vars {
            env.extend(env_vars.iter().map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..EnvVar::default()
            }));
        }
        if let Some(extra) = &driver.env {
            env.extend(extra.iter().cloned());
        }

        let mut pod_volumes = vec![Volume {
            name: CONF_VOLUME_NAME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(config_map_name.to_string()),
                ..ConfigMapVolumeSource::default()
            }),
            ..Volume::default()
        }];
        pod_volumes.extend(volumes.iter().cloned());

        // mounts that resolve to no declared volume are dropped
        let mut mounts = vec![VolumeMount {
            name: CONF_VOLUME_NAME.to_string(),
            mount_path: DEFAULT_SPARK_CONF_DIR.to_string(),
            ..VolumeMount::default()
        }];
        mounts.extend(
            volume_mounts
                .iter()
                .filter(|mount| pod_volumes.iter().any(|volume| volume.name == mount.name))
                .cloned(),
        );

        let container = Container {
            name: DRIVER_CONTAINER_NAME.to_string(),
            image: driver.image.clone().or_else(|| app.spec.image.clone()),
            image_pull_policy: app.spec.image_pull_policy.clone(),
            env: Some(env),
            volume_mounts: Some(mounts),
            ..Container::default()
        };

        let mut meta_builder = ObjectMetaBuilder::new();
        meta_builder
            .name(crate::naming::driver_pod_name(app))
            .namespace(crate::naming::app_namespace(app))
            .with_labels(labels.clone());
        if let Some(annotations) = &driver.annotations {
            meta_builder.with_annotations(annotations.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        }

        Ok(Pod {
            metadata: meta_builder.build(),
            spec: Some(PodSpec {
                containers: vec![container],
                service_account_name: driver.service_account.clone(),
                node_selector: driver
                    .node_selector
                    .clone()
                    .or_else(|| app.spec.node_selector.clone())
                    .map(|selector| selector.into_iter().collect()),
                image_pull_secrets: app.spec.image_pull_secrets.as_ref().map(|secrets| {
                    secrets
                        .iter()
                        .map(|name| LocalObjectReference {
                            name: Some(name.clone()),
                        })
                        .collect()
                }),
                restart_policy: Some("Never".to_string()),
                volumes: Some(pod_volumes),
                ..PodSpec::default()
            }),
            ..Pod::default()
        })
    }
}

/// Creates or updates the driver pod and returns its cluster-assigned uid,
/// which the service provisioner uses as its garbage-collection anchor.
pub async fn create_or_update<S>(
    store: &S,
    pod: &Pod,
    owner: &k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference,
    namespace: &str,
) -> Result<String>
where
    S: ObjectStore<Pod>,
{
    let name = pod.name_any();
    let mut desired = pod.clone();
    desired
        .metadata
        .owner_references
        .get_or_insert_with(Vec::new)
        .push(owner.clone());

    let provisioned = retry_on_conflict(DEFAULT_RETRY_ATTEMPTS, || async {
        match store.get(&name).await {
            Err(err) if is_not_found(&err) => {
                info!("Driver pod {name} not found, creating");
                store.create(&desired).await
            }
            Err(err) => Err(err),
            Ok(mut existing) => {
                info!("Driver pod {name} exists, updating spec");
                existing.spec = desired.spec.clone();
                existing.metadata.labels = desired.metadata.labels.clone();
                existing.metadata.annotations = desired.metadata.annotations.clone();
                store.update(&existing).await
            }
        }
    })
    .await
    .map_err(|source| Error::FailedCreateDriverPod {
        name: name.clone(),
        namespace: namespace.to_string(),
        source,
    })?;

    provisioned
        .metadata
        .uid
        .ok_or(Error::DriverPodUidNotAssigned { name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::FakeStore;
    use crd::spark_application::{DriverSpec, SparkApplicationSpec, SparkApplicationType};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    fn test_app() -> SparkApplication {
        let mut app = SparkApplication::new(
            "test-app",
            SparkApplicationSpec {
                typ: SparkApplicationType::Scala,
                image: Some("spark:3.3.2".to_string()),
                driver: DriverSpec {
                    service_account: Some("spark-sa".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app.metadata.uid = Some("app-uid".to_string());
        app
    }

    fn app_owner() -> OwnerReference {
        OwnerReference {
            api_version: "sparkoperator.k8s.io/v1beta2".to_string(),
            kind: "SparkApplication".to_string(),
            name: "test-app".to_string(),
            uid: "app-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    #[test]
    fn default_builder_mounts_config_map() {
        let app = test_app();
        let labels = BTreeMap::from([("spark-role".to_string(), "driver".to_string())]);
        let pod = DefaultDriverPodBuilder
            .build(&app, &labels, "test-app-driver-conf-map", &[], &[])
            .unwrap();

        assert_eq!(pod.metadata.name.as_deref(), Some("test-app-driver"));
        let spec = pod.spec.as_ref().unwrap();
        assert_eq!(spec.service_account_name.as_deref(), Some("spark-sa"));
        let volume = &spec.volumes.as_ref().unwrap()[0];
        assert_eq!(
            volume.config_map.as_ref().unwrap().name.as_deref(),
            Some("test-app-driver-conf-map")
        );
        let container = &spec.containers[0];
        assert_eq!(container.image.as_deref(), Some("spark:3.3.2"));
        assert_eq!(
            container.volume_mounts.as_ref().unwrap()[0].mount_path,
            "/opt/spark/conf"
        );
    }

    #[test]
    fn unresolved_mounts_are_dropped() {
        use k8s_openapi::api::core::v1::{EmptyDirVolumeSource, Volume, VolumeMount};

        let app = test_app();
        let declared = Volume {
            name: "data".to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Volume::default()
        };
        let mounts = vec![
            VolumeMount {
                name: "data".to_string(),
                mount_path: "/data".to_string(),
                ..VolumeMount::default()
            },
            VolumeMount {
                name: "missing-vol".to_string(),
                mount_path: "/missing".to_string(),
                ..VolumeMount::default()
            },
        ];
        let pod = DefaultDriverPodBuilder
            .build(
                &app,
                &BTreeMap::new(),
                "test-app-driver-conf-map",
                &mounts,
                &[declared],
            )
            .unwrap();

        let container = &pod.spec.as_ref().unwrap().containers[0];
        let mount_names: Vec<&str> = container
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(mount_names, vec!["spark-conf-volume-driver", "data"]);
    }

    #[tokio::test]
    async fn provisioning_returns_pod_uid_and_is_idempotent() {
        let store: FakeStore<Pod> = FakeStore::new();
        let app = test_app();
        let labels = BTreeMap::new();
        let pod = DefaultDriverPodBuilder
            .build(&app, &labels, "test-app-driver-conf-map", &[], &[])
            .unwrap();

        let uid = create_or_update(&store, &pod, &app_owner(), "default")
            .await
            .unwrap();
        assert!(!uid.is_empty());
        assert_eq!(store.len(), 1);

        let uid_again = create_or_update(&store, &pod, &app_owner(), "default")
            .await
            .unwrap();
        assert_eq!(uid, uid_again);
        assert_eq!(store.len(), 1);
    }
}
