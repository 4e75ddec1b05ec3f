use std::collections::HashMap;

use k8s_openapi::api::core::v1::{EnvVar, Volume, VolumeMount};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::SparkApplicationStatus;

/// SparkApplicationSpec is the declarative submission request: everything the
/// native submission pipeline needs to translate into a driver config map,
/// driver pod and driver service.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[kube(
    group = "sparkoperator.k8s.io",
    version = "v1beta2",
    kind = "SparkApplication",
    shortname = "sparkapp",
    status = "SparkApplicationStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SparkApplicationSpec {
    // Type tells the type of the Spark application.
    // +kubebuilder:validation:Enum={Java,Python,Scala,R}
    #[serde(rename = "type")]
    pub typ: SparkApplicationType,

    // Mode is the deployment mode of the Spark application.
    // +kubebuilder:validation:Enum={cluster,client,in-cluster-client}
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeployMode>,

    #[serde(default)]
    pub spark_version: String,

    // Image is the container image for the driver, executor, and init-container. Any custom
    // container images for the driver or executor take precedence over this.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,
    // ImagePullSecrets is the list of image-pull secrets.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<String>>,

    // MainClass is the fully-qualified main class of the Spark application.
    // This only applies to Java/Scala Spark applications.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    // MainApplicationFile is the path to a bundled JAR, Python, or R file of the application.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_application_file: Option<String>,
    // Arguments is a list of arguments to be passed to the application.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,

    // This sets the major Python version of the docker image used to run the
    // driver and executor containers.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,

    /// SparkConf carries user-specified Spark configuration properties as they
    /// would use the "--conf" option in spark-submit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_conf: Option<HashMap<String, String>>,
    /// HadoopConf carries user-specified Hadoop configuration properties as they
    /// would use the "--conf" option in spark-submit. The controller flattens
    /// each of them into `spark.hadoop.*` properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hadoop_conf: Option<HashMap<String, String>>,

    // Volumes is the list of Kubernetes volumes that can be mounted by the driver and/or executors.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,

    pub driver: DriverSpec,
    #[serde(default)]
    pub executor: ExecutorSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Dependencies>,

    /// NodeSelector is the Kubernetes node selector to be added to the driver and executor pods.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<HashMap<String, String>>,

    /// MemoryOverheadFactor is the factor of non-heap memory added to JVM
    /// (or non-JVM) memory. Defaults per application type when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_overhead_factor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_allocation: Option<DynamicAllocation>,
}

/// The language binding the application was written against. Scala applications
/// run on the JVM and are normalized to the Java resource type at submission.
#[derive(
    Clone, Debug, Default, Deserialize, Display, EnumString, Eq, JsonSchema, PartialEq, Serialize,
)]
pub enum SparkApplicationType {
    Java,
    #[default]
    Scala,
    Python,
    R,
}

impl SparkApplicationType {
    /// The `spark.kubernetes.resource.type` tag expected by the submission protocol.
    pub fn resource_type(&self) -> &'static str {
        match self {
            SparkApplicationType::Java | SparkApplicationType::Scala => "java",
            SparkApplicationType::Python => "python",
            SparkApplicationType::R => "r",
        }
    }
}

#[derive(
    Clone, Debug, Default, Deserialize, Display, EnumString, Eq, JsonSchema, PartialEq, Serialize,
)]
pub enum DeployMode {
    #[default]
    #[serde(rename = "cluster")]
    #[strum(serialize = "cluster")]
    Cluster,
    #[serde(rename = "client")]
    #[strum(serialize = "client")]
    Client,
    #[serde(rename = "in-cluster-client")]
    #[strum(serialize = "in-cluster-client")]
    InClusterClient,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSpec {
    // PodName is the name of the driver pod that the user creates. This is used for the
    // in-cluster client mode in which the user creates a client pod where the driver of
    // the user application runs. It's an error to set this field if Mode is not
    // in-cluster-client.
    // +optional
    // +kubebuilder:validation:Pattern=[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,

    /// Cores maps to `spark.driver.cores`.
    /// +optional
    /// +kubebuilder:validation:Minimum=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<i32>,
    // CoreRequest is the physical CPU core request for the driver.
    // Maps to `spark.kubernetes.driver.request.cores` that is available since Spark 3.0.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_request: Option<String>,
    /// CoreLimit specifies a hard limit on CPU cores for the pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_limit: Option<String>,
    /// Memory is the amount of memory to request for the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    /// MemoryOverhead is the amount of off-heap memory to allocate in cluster mode,
    /// in MiB unless otherwise specified.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_overhead: Option<String>,

    /// Image is the container image to use for the driver. Overrides Spec.Image if set.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    // ServiceAccount is the name of the custom Kubernetes service account used by the pod.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,

    // JavaOptions is a string of extra JVM options to pass to the driver. For instance,
    // GC settings or other logging.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_options: Option<String>,

    // KubernetesMaster is the URL of the Kubernetes master used by the driver to manage
    // executor pods and other Kubernetes resources. Default to https://kubernetes.default.svc.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_master: Option<String>,

    /// Env carries the environment variables to add to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
    /// EnvVars carries the environment variables to add to the pod.
    /// Deprecated. Consider using `env` instead.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<HashMap<String, String>>,
    /// EnvSecretKeyRefs holds a mapping from environment variable names to SecretKeyRefs.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_secret_key_refs: Option<HashMap<String, NameKey>>,

    /// Secrets carries information of secrets to add to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<SecretInfo>>,

    /// Labels are the Kubernetes labels to be added to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    /// Annotations are the Kubernetes annotations to be added to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
    // ServiceAnnotations defines the annotations to be added to the Kubernetes headless
    // service used by executors to connect to the driver.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_annotations: Option<HashMap<String, String>>,

    /// NodeSelector is the Kubernetes node selector to be added to the driver pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<HashMap<String, String>>,

    /// VolumeMounts specifies the volumes listed in ".spec.volumes" to mount into
    /// the main container's filesystem.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorSpec {
    // Instances is the number of executor instances.
    // +optional
    // +kubebuilder:validation:Minimum=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<i32>,

    /// Cores maps to `spark.executor.cores`. Float values are not allowed.
    /// +optional
    /// +kubebuilder:validation:Minimum=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<i32>,
    // CoreRequest is the physical CPU core request for the executors.
    // Maps to `spark.kubernetes.executor.request.cores` that is available since Spark 2.4.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_request: Option<String>,
    /// CoreLimit specifies a hard limit on CPU cores for the pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_limit: Option<String>,
    /// Memory is the amount of memory to request for the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    /// MemoryOverhead is the amount of off-heap memory to allocate in cluster mode,
    /// in MiB unless otherwise specified.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_overhead: Option<String>,

    /// Image is the container image to use for the executors. Overrides Spec.Image if set.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    // ServiceAccount is the name of the custom Kubernetes service account used by the pod.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,

    // JavaOptions is a string of extra JVM options to pass to the executors.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_options: Option<String>,

    // DeleteOnTermination specify whether executor pods should be deleted in case of
    // failure or normal termination.
    // Maps to `spark.kubernetes.executor.deleteOnTermination` that is available since Spark 3.0.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_on_termination: Option<bool>,

    /// Env carries the environment variables to add to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
    /// EnvVars carries the environment variables to add to the pod.
    /// Deprecated. Consider using `env` instead.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<HashMap<String, String>>,
    /// EnvSecretKeyRefs holds a mapping from environment variable names to SecretKeyRefs.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_secret_key_refs: Option<HashMap<String, NameKey>>,

    /// Secrets carries information of secrets to add to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<SecretInfo>>,

    /// Labels are the Kubernetes labels to be added to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    /// Annotations are the Kubernetes annotations to be added to the pod.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,

    /// NodeSelector is the Kubernetes node selector to be added to the executor pods.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<HashMap<String, String>>,

    /// VolumeMounts specifies the volumes listed in ".spec.volumes" to mount into
    /// the main container's filesystem.
    /// +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
}

// SecretInfo captures information of a secret.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretInfo {
    pub name: String,
    pub path: String,
    #[serde(default, rename = "secretType")]
    pub typ: SecretType,
}

/// GenericType is for secrets that need no special handling.
/// HadoopDelegationToken is for secrets from a Hadoop delegation token that need the
/// environment variable HADOOP_TOKEN_FILE_LOCATION.
/// GCPServiceAccount is for secrets from a GCP service account Json key file that need
/// the environment variable GOOGLE_APPLICATION_CREDENTIALS.
#[derive(
    Clone, Debug, Default, Deserialize, Display, EnumString, Eq, JsonSchema, PartialEq, Serialize,
)]
pub enum SecretType {
    #[default]
    Generic,
    GCPServiceAccount,
    HadoopDelegationToken,
}

// NameKey refers to a specific key within a Secret resource.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameKey {
    pub name: String,
    pub key: String,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    // Jars is a list of JAR files the Spark application depends on.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jars: Option<Vec<String>>,
    // Files is a list of files the Spark application depends on.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    // PyFiles is a list of Python files the Spark application depends on.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub py_files: Option<Vec<String>>,
    // Packages is a list of maven coordinates of jars to include on the driver and executor
    // classpaths. This will search the local maven repo, then maven central and any additional
    // remote repositories given by the "repositories" option.
    // Each package should be of the form "groupId:artifactId:version".
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    // ExcludePackages is a list of "groupId:artifactId", to exclude while resolving the
    // dependencies provided in Packages to avoid dependency conflicts.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_packages: Option<Vec<String>>,
    // Repositories is a list of additional remote repositories to search for the maven
    // coordinates given with the "packages" option.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<String>>,
}

/// MonitoringSpec defines the monitoring specification.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSpec {
    // ExposeDriverMetrics specifies whether to expose metrics on the driver.
    #[serde(default)]
    pub expose_driver_metrics: bool,
    // ExposeExecutorMetrics specifies whether to expose metrics on the executors.
    #[serde(default)]
    pub expose_executor_metrics: bool,
    // MetricsPropertiesFile is the container local path of file metrics.properties
    // for configuring the Spark metric system.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_properties_file: Option<String>,
}

// DynamicAllocation contains configuration options for dynamic allocation.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicAllocation {
    // Enabled controls whether dynamic allocation is enabled or not.
    #[serde(default)]
    pub enabled: bool,
    // InitialExecutors is the initial number of executors to request. If .spec.executor.instances
    // is also set, the initial number of executors is set to the bigger of that and this option.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_executors: Option<i32>,
    // MinExecutors is the lower bound for the number of executors if dynamic allocation is enabled.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_executors: Option<i32>,
    // MaxExecutors is the upper bound for the number of executors if dynamic allocation is enabled.
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_executors: Option<i32>,
    // ShuffleTrackingTimeout controls the timeout in milliseconds for executors that are holding
    // shuffle data if shuffle tracking is enabled (true by default if dynamic allocation is enabled).
    // +optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_tracking_timeout: Option<i64>,
}

impl SparkApplication {
    /// Spark configuration overlay, empty when unset.
    pub fn spark_conf(&self) -> Option<&HashMap<String, String>> {
        self.spec.spark_conf.as_ref()
    }

    /// Look up a key in the spark-conf overlay.
    pub fn conf_value(&self, key: &str) -> Option<&str> {
        self.spec
            .spark_conf
            .as_ref()
            .and_then(|conf| conf.get(key))
            .map(String::as_str)
    }
}
