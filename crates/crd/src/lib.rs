use kube::{CustomResourceExt, Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod constants;
pub mod metadata;
pub mod spark_application;

// error definitions for crd
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Object is missing key: {key}")]
    MissingObjectKey { key: &'static str },

    #[error("Failed to serialize resource [{internal}]")]
    FailedSerializeResource { internal: String },

    #[error("Failed to deserialize object from yaml with internal error: \n {internal}")]
    FailedDeserializeObjectFromYaml { internal: serde_yaml::Error },

    #[error("Resource namespace not exists [{name}]")]
    ResourceNamespaceNotExists { name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Status subresource of a [`spark_application::SparkApplication`]. Only the
/// fields the submission pipeline assigns are modelled here; run-state
/// tracking belongs to the surrounding controller.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[allow(clippy::derive_partial_eq_without_eq)]
#[serde(rename_all = "camelCase")]
pub struct SparkApplicationStatus {
    /// The Spark application id assigned at submission, `spark-<hex>` by convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_application_id: Option<String>,
    /// Correlation token of the submission attempt that produced the cluster objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

// -------------------------
// CRD specification serialization and YAML loading helpers for the CLI

pub(crate) fn serialize_crd_to_string<T: CustomResourceExt>() -> Result<String> {
    let crd = T::crd();
    serde_yaml::to_string(&crd).map_err(|e| Error::FailedSerializeResource {
        internal: e.to_string(),
    })
}

pub fn print_yaml_schema<T: CustomResourceExt>() -> Result<()> {
    let string = serialize_crd_to_string::<T>()?;

    println!("---");
    println!("{string}");
    Ok(())
}

pub fn serialize_crds_to_file(file: &str) -> Result<()> {
    let crd = serialize_crd_to_string::<spark_application::SparkApplication>()?;
    let contents = format!("---\n{}\n", crd);
    std::fs::write(file, contents).unwrap_or_else(|e| {
        println!("Write CRDs Error {:?}", e);
    });
    Ok(())
}

/// Load a [`spark_application::SparkApplication`] from a YAML file, for the
/// offline CLI paths. The resource is given a placeholder uid so owner
/// references can be built without a round trip to the API server.
pub fn application_from_yaml_file(file: &str) -> Result<spark_application::SparkApplication> {
    let contents =
        std::fs::read_to_string(file).map_err(|e| Error::FailedSerializeResource {
            internal: e.to_string(),
        })?;
    let mut resource: spark_application::SparkApplication = serde_yaml::from_str(&contents)
        .map_err(|e| Error::FailedDeserializeObjectFromYaml { internal: e })?;
    let name = resource.name_any();
    resource
        .namespace()
        .ok_or(Error::ResourceNamespaceNotExists { name })?;
    if resource.meta().uid.is_none() {
        resource.meta_mut().uid = Some("offline-uid".to_string());
    }
    Ok(resource)
}
