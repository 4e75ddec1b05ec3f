//! Sequences one submission: translate the application, then provision the
//! config map, the driver pod and the driver service in order. Later steps
//! depend on the side effects of earlier ones, so nothing here runs in
//! parallel and a failing step short-circuits the rest.

use std::collections::BTreeMap;
use std::env;

use crd::constants::{
    LABEL_LAUNCHED_BY_OPERATOR, LABEL_SPARK_APP_NAME, LABEL_SPARK_APP_NAME_NATIVE,
    LABEL_SPARK_APP_SELECTOR, LABEL_SPARK_ROLE, LABEL_SUBMISSION_ID, SPARK_ROLE_DRIVER,
};
use crd::metadata::OwnerReferenceBuilder;
use crd::spark_application::SparkApplication;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use tracing::info;

use crate::driver::DriverPodBuilder;
use crate::schema::{ConfigSchema, SCHEMA};
use crate::store::ObjectStore;
use crate::{configmap, driver, naming, service, volumes, Error, Result};

const KUBERNETES_SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
const KUBERNETES_SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Injected identifier source so tests can run with deterministic ids.
pub trait IdGenerator {
    fn generate_uid(&self) -> String;
    fn generate_application_id(&self) -> String;
    fn generate_submission_id(&self) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate_uid(&self) -> String {
        common::utils::generate_random_hex(16)
    }

    fn generate_application_id(&self) -> String {
        format!("spark-{}", common::utils::generate_random_hex(16))
    }

    fn generate_submission_id(&self) -> String {
        format!("sub-{}", common::utils::generate_random_hex(8))
    }
}

/// One pipeline instance per namespace, holding the three object stores and
/// the injected collaborators.
pub struct SubmissionPipeline<CS, PS, SS, B, G> {
    config_maps: CS,
    pods: PS,
    services: SS,
    pod_builder: B,
    ids: G,
    schema: &'static ConfigSchema,
}

impl<CS, PS, SS, B, G> SubmissionPipeline<CS, PS, SS, B, G>
where
    CS: ObjectStore<ConfigMap>,
    PS: ObjectStore<Pod>,
    SS: ObjectStore<Service>,
    B: DriverPodBuilder,
    G: IdGenerator,
{
    pub fn new(config_maps: CS, pods: PS, services: SS, pod_builder: B, ids: G) -> Self {
        SubmissionPipeline {
            config_maps,
            pods,
            services,
            pod_builder,
            ids,
            schema: &SCHEMA,
        }
    }

    /// Moves the application from New to Submitted. Creates the config map,
    /// the driver pod and the driver service, in that order. Already created
    /// objects are not rolled back when a later step fails.
    pub async fn submit(&self, app: &mut SparkApplication, submission_id: &str) -> Result<()> {
        let app_name = app.name_any();
        let namespace = naming::app_namespace(app);
        info!("Submitting application {app_name} in namespace {namespace}, submission {submission_id}");

        if app.meta().uid.is_none() {
            // never leave the garbage-collection anchor empty
            app.meta_mut().uid = Some(self.ids.generate_uid());
        }

        let application_id = app
            .status
            .as_ref()
            .and_then(|status| status.spark_application_id.clone())
            .unwrap_or_else(|| self.ids.generate_application_id());

        let status = app.status.get_or_insert_with(Default::default);
        status.spark_application_id = Some(application_id.clone());
        status.submission_id = Some(submission_id.to_string());

        let driver_pod_name = naming::driver_pod_name(app);
        let config_map_name = naming::config_map_name(&driver_pod_name);
        let service_name = naming::service_name(&driver_pod_name);

        let selector_labels = self.service_selector_labels(app, &application_id, submission_id);

        // the pod builder needs the volume lists as the user declared them
        let pod_volumes = app.spec.volumes.clone().unwrap_or_default();
        let pod_volume_mounts = app.spec.driver.volume_mounts.clone().unwrap_or_default();
        let local_dir_options = volumes::extract_local_dir_options(&mut app.spec, self.schema);

        let data = configmap::build_config_map_data(
            app,
            &driver_pod_name,
            submission_id,
            &application_id,
            &service_name,
            &master_url(),
            &local_dir_options,
            self.schema,
        )?;

        let app_owner = application_owner_reference(app)?;
        configmap::create_or_update(
            &self.config_maps,
            &config_map_name,
            &namespace,
            &data,
            &app_owner,
        )
        .await?;
        info!("ConfigMap {config_map_name} provisioned");

        let pod = self
            .pod_builder
            .build(
                app,
                &selector_labels,
                &config_map_name,
                &pod_volume_mounts,
                &pod_volumes,
            )
            .map_err(|source| Error::FailedBuildDriverPod {
                name: driver_pod_name.clone(),
                namespace: namespace.clone(),
                source,
            })?;
        let driver_pod_uid =
            driver::create_or_update(&self.pods, &pod, &app_owner, &namespace).await?;
        info!("Driver pod {driver_pod_name} provisioned with uid {driver_pod_uid}");

        let driver_service = service::build_driver_service(
            app,
            &service_name,
            &namespace,
            &application_id,
            &selector_labels,
            &driver_pod_name,
            &driver_pod_uid,
            self.schema,
        )?;
        service::create_or_update(&self.services, &driver_service, &namespace).await?;
        info!("Driver service {service_name} provisioned");

        Ok(())
    }

    /// Union of fixed identity labels, driver labels, application labels and
    /// overlay driver-label entries, later sources winning on collision.
    fn service_selector_labels(
        &self,
        app: &SparkApplication,
        application_id: &str,
        submission_id: &str,
    ) -> BTreeMap<String, String> {
        let app_name = app.name_any();
        let mut labels = BTreeMap::from([
            (LABEL_SPARK_APP_NAME.to_string(), app_name.clone()),
            (LABEL_SPARK_APP_NAME_NATIVE.to_string(), app_name),
            (
                LABEL_SPARK_APP_SELECTOR.to_string(),
                application_id.to_string(),
            ),
            (LABEL_SPARK_ROLE.to_string(), SPARK_ROLE_DRIVER.to_string()),
            (LABEL_SUBMISSION_ID.to_string(), submission_id.to_string()),
            (LABEL_LAUNCHED_BY_OPERATOR.to_string(), "true".to_string()),
        ]);

        if let Some(driver_labels) = &app.spec.driver.labels {
            labels.extend(driver_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(app_labels) = &app.metadata.labels {
            labels.extend(app_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(conf) = app.spark_conf() {
            for (key, value) in conf {
                if let Some(label_key) = key.strip_prefix(self.schema.driver_label_prefix) {
                    labels.insert(label_key.to_string(), value.clone());
                }
            }
        }
        labels
    }
}

/// Owner reference pointing at the application, used for the config map and
/// the driver pod.
fn application_owner_reference(app: &SparkApplication) -> Result<OwnerReference> {
    OwnerReferenceBuilder::new()
        .initialize_from_resource(app)
        .controller(true)
        .block_owner_deletion(true)
        .build()
        .map_err(|source| Error::FailedBuildOwnerReference {
            name: app.name_any(),
            source,
        })
}

/// Master URL as seen from inside the cluster, with local fallbacks for
/// out-of-cluster runs.
fn master_url() -> String {
    let host =
        env::var(KUBERNETES_SERVICE_HOST_ENV).unwrap_or_else(|_| "localhost".to_string());
    let port = env::var(KUBERNETES_SERVICE_PORT_ENV).unwrap_or_else(|_| "443".to_string());
    format!("k8s://https://{host}:{port}")
}
