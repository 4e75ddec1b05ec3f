//! Provisions the driver config map, the configuration repository the driver
//! and executor pods read. Created before the driver pod since the pod mounts
//! it at startup.

use std::collections::BTreeMap;

use crd::metadata::ObjectMetaBuilder;
use crd::spark_application::SparkApplication;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use tracing::info;

use crate::schema::ConfigSchema;
use crate::store::{is_not_found, retry_on_conflict, ObjectStore, DEFAULT_RETRY_ATTEMPTS};
use crate::{Error, Result};

pub const SPARK_ENV_SCRIPT_FILE_NAME: &str = "spark-env.sh";
pub const SPARK_PROPERTIES_FILE_NAME: &str = "spark.properties";
const SPARK_ENV_SCRIPT_COMMAND: &str = "export SPARK_CONF_DIR=/opt/spark/conf";

/// The config map payload: a fixed environment script, the resolved
/// namespace, and the flattened submission properties.
#[allow(clippy::too_many_arguments)]
pub fn build_config_map_data(
    app: &SparkApplication,
    driver_pod_name: &str,
    submission_id: &str,
    application_id: &str,
    service_name: &str,
    master_url: &str,
    local_dir_options: &[String],
    schema: &ConfigSchema,
) -> Result<BTreeMap<String, String>> {
    let properties = crate::properties::build_submission_properties(
        app,
        driver_pod_name,
        submission_id,
        application_id,
        service_name,
        master_url,
        local_dir_options,
        schema,
    )?;

    let mut data = BTreeMap::new();
    data.insert(
        SPARK_ENV_SCRIPT_FILE_NAME.to_string(),
        SPARK_ENV_SCRIPT_COMMAND.to_string(),
    );
    data.insert(
        schema.namespace.to_string(),
        crate::naming::app_namespace(app),
    );
    data.insert(SPARK_PROPERTIES_FILE_NAME.to_string(), properties);
    Ok(data)
}

/// Idempotent get-then-create-or-update under conflict retry. On resubmission
/// the existing object keeps its identity and only the data is replaced.
pub async fn create_or_update<S>(
    store: &S,
    name: &str,
    namespace: &str,
    data: &BTreeMap<String, String>,
    owner: &OwnerReference,
) -> Result<()>
where
    S: ObjectStore<ConfigMap>,
{
    let desired = ConfigMap {
        metadata: ObjectMetaBuilder::new()
            .name(name)
            .namespace(namespace)
            .ownerreference(owner.clone())
            .build(),
        data: Some(data.clone()),
        ..ConfigMap::default()
    };

    retry_on_conflict(DEFAULT_RETRY_ATTEMPTS, || async {
        match store.get(name).await {
            Err(err) if is_not_found(&err) => {
                info!("ConfigMap {name} not found, creating");
                store.create(&desired).await.map(|_| ())
            }
            Err(err) => Err(err),
            Ok(mut existing) => {
                info!("ConfigMap {name} exists, updating data");
                existing.data = Some(data.clone());
                store.update(&existing).await.map(|_| ())
            }
        }
    })
    .await
    .map_err(|source| Error::FailedCreateConfigMap {
        name: name.to_string(),
        namespace: namespace.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SCHEMA;
    use crate::store::fake::FakeStore;
    use crd::spark_application::{SparkApplicationSpec, SparkApplicationType};

    fn test_app() -> SparkApplication {
        let mut app = SparkApplication::new(
            "test-app",
            SparkApplicationSpec {
                typ: SparkApplicationType::Scala,
                main_application_file: Some("local:///x.jar".to_string()),
                ..Default::default()
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app.metadata.uid = Some("app-uid".to_string());
        app
    }

    fn owner() -> OwnerReference {
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
    fn data_carries_env_script_namespace_and_properties() {
        let app = test_app();
        let data = build_config_map_data(
            &app,
            "test-app-driver",
            "sub-1",
            "spark-app-1",
            "test-app-driver-svc",
            "k8s://https://localhost:443",
            &[],
            &SCHEMA,
        )
        .unwrap();

        assert_eq!(
            data.get("spark-env.sh").map(String::as_str),
            Some("export SPARK_CONF_DIR=/opt/spark/conf")
        );
        assert_eq!(
            data.get("spark.kubernetes.namespace").map(String::as_str),
            Some("default")
        );
        let properties = data.get("spark.properties").unwrap();
        assert!(properties.contains("spark.app.id=spark-app-1\n"));
        assert!(properties.contains("spark.jars=local\\:///x.jar\n"));
    }

    #[tokio::test]
    async fn creates_then_updates_in_place() {
        let store: FakeStore<ConfigMap> = FakeStore::new();
        let data = BTreeMap::from([("k".to_string(), "v1".to_string())]);
        create_or_update(&store, "test-app-driver-conf-map", "default", &data, &owner())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        let stored = store.stored("test-app-driver-conf-map").unwrap();
        assert_eq!(stored.data.as_ref().unwrap().get("k").unwrap(), "v1");
        assert_eq!(
            stored.metadata.owner_references.as_ref().unwrap()[0].kind,
            "SparkApplication"
        );

        let data = BTreeMap::from([("k".to_string(), "v2".to_string())]);
        create_or_update(&store, "test-app-driver-conf-map", "default", &data, &owner())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        let stored = store.stored("test-app-driver-conf-map").unwrap();
        assert_eq!(stored.data.as_ref().unwrap().get("k").unwrap(), "v2");
    }
}
