//! The single table of Spark configuration key names, prefixes and defaults
//! used across the pipeline. Passed by reference into the property builder so
//! that the builder itself stays a pure function over its inputs.

/// Spark configuration key names and fixed defaults, as the downstream
/// spark-submit protocol expects them.
#[derive(Clone, Debug)]
pub struct ConfigSchema {
    // controlled identity keys
    pub driver_host: &'static str,
    pub app_id: &'static str,
    pub master: &'static str,
    pub deploy_mode: &'static str,
    pub namespace: &'static str,
    pub app_name: &'static str,
    pub driver_pod_name: &'static str,

    // dependency artifacts
    pub jars: &'static str,
    pub files: &'static str,
    pub py_files: &'static str,
    pub packages: &'static str,
    pub exclude_packages: &'static str,
    pub repositories: &'static str,

    // container image
    pub container_image: &'static str,
    pub container_image_pull_policy: &'static str,
    pub container_image_pull_secrets: &'static str,
    pub python_version: &'static str,

    pub memory_overhead_factor: &'static str,
    pub wait_app_completion: &'static str,

    // driver
    pub driver_cores: &'static str,
    pub driver_core_request: &'static str,
    pub driver_core_limit: &'static str,
    pub driver_memory: &'static str,
    pub driver_memory_overhead: &'static str,
    pub kubernetes_memory_overhead: &'static str,
    pub driver_container_image: &'static str,
    pub driver_service_account: &'static str,
    pub driver_java_options: &'static str,
    pub driver_kubernetes_master: &'static str,
    pub driver_label_prefix: &'static str,
    pub driver_annotation_prefix: &'static str,
    pub driver_secret_key_ref_prefix: &'static str,
    pub driver_service_annotation_prefix: &'static str,
    pub driver_service_label_prefix: &'static str,
    pub driver_secrets_prefix: &'static str,
    pub driver_env_prefix: &'static str,
    pub driver_node_selector_prefix: &'static str,
    pub driver_volumes_prefix: &'static str,

    // executor
    pub executor_instances: &'static str,
    pub executor_cores: &'static str,
    pub executor_core_request: &'static str,
    pub executor_core_limit: &'static str,
    pub executor_memory: &'static str,
    pub executor_memory_overhead: &'static str,
    pub executor_container_image: &'static str,
    pub executor_service_account: &'static str,
    pub executor_java_options: &'static str,
    pub executor_delete_on_termination: &'static str,
    pub executor_label_prefix: &'static str,
    pub executor_annotation_prefix: &'static str,
    pub executor_secret_key_ref_prefix: &'static str,
    pub executor_secrets_prefix: &'static str,
    pub executor_env_prefix: &'static str,
    pub executor_node_selector_prefix: &'static str,
    pub executor_volumes_prefix: &'static str,

    pub node_selector_prefix: &'static str,
    pub hadoop_conf_prefix: &'static str,

    pub driver_extra_class_path: &'static str,
    pub executor_extra_class_path: &'static str,

    pub submit_in_driver: &'static str,
    pub driver_port: &'static str,
    pub driver_block_manager_port: &'static str,
    pub block_manager_port: &'static str,
    pub resource_type: &'static str,
    pub submit_time: &'static str,
    pub ui_proxy_base: &'static str,
    pub ui_proxy_redirect_uri: &'static str,

    pub metrics_namespace: &'static str,
    pub metrics_conf: &'static str,

    pub dyn_alloc_enabled: &'static str,
    pub dyn_alloc_shuffle_tracking_enabled: &'static str,
    pub dyn_alloc_initial_executors: &'static str,
    pub dyn_alloc_min_executors: &'static str,
    pub dyn_alloc_max_executors: &'static str,
    pub dyn_alloc_shuffle_tracking_timeout: &'static str,

    pub driver_service_ip_families: &'static str,

    // fixed defaults
    pub default_driver_cores: &'static str,
    pub default_driver_memory: &'static str,
    pub default_executor_memory: &'static str,
    pub java_scala_memory_overhead_factor: &'static str,
    pub other_memory_overhead_factor: &'static str,
    pub default_driver_port: i32,
    pub default_block_manager_port: i32,
    pub default_ui_port: i32,

    pub local_dir_volume_prefix: &'static str,
    pub defaults_file_path: &'static str,
    pub hadoop_conf_dir_key: &'static str,
    pub hadoop_conf_dir_path: &'static str,
    pub prometheus_target_annotation: &'static str,
}

pub const SCHEMA: ConfigSchema = ConfigSchema {
    driver_host: "spark.driver.host",
    app_id: "spark.app.id",
    master: "spark.master",
    deploy_mode: "spark.submit.deployMode",
    namespace: "spark.kubernetes.namespace",
    app_name: "spark.app.name",
    driver_pod_name: "spark.kubernetes.driver.pod.name",

    jars: "spark.jars",
    files: "spark.files",
    py_files: "spark.submit.pyFiles",
    packages: "spark.jars.packages",
    exclude_packages: "spark.jars.excludes",
    repositories: "spark.jars.repositories",

    container_image: "spark.kubernetes.container.image",
    container_image_pull_policy: "spark.kubernetes.container.image.pullPolicy",
    container_image_pull_secrets: "spark.kubernetes.container.image.pullSecrets",
    python_version: "spark.kubernetes.pyspark.pythonVersion",

    memory_overhead_factor: "spark.kubernetes.memoryOverheadFactor",
    wait_app_completion: "spark.kubernetes.submission.waitAppCompletion",

    driver_cores: "spark.driver.cores",
    driver_core_request: "spark.kubernetes.driver.request.cores",
    driver_core_limit: "spark.kubernetes.driver.limit.cores",
    driver_memory: "spark.driver.memory",
    driver_memory_overhead: "spark.driver.memoryOverhead",
    kubernetes_memory_overhead: "spark.kubernetes.memoryOverhead",
    driver_container_image: "spark.kubernetes.driver.container.image",
    driver_service_account: "spark.kubernetes.authenticate.driver.serviceAccountName",
    driver_java_options: "spark.driver.extraJavaOptions",
    driver_kubernetes_master: "spark.kubernetes.driver.master",
    driver_label_prefix: "spark.kubernetes.driver.label.",
    driver_annotation_prefix: "spark.kubernetes.driver.annotation.",
    driver_secret_key_ref_prefix: "spark.kubernetes.driver.secretKeyRef.",
    driver_service_annotation_prefix: "spark.kubernetes.driver.service.annotation.",
    driver_service_label_prefix: "spark.kubernetes.driver.service.label.",
    driver_secrets_prefix: "spark.kubernetes.driver.secrets.",
    driver_env_prefix: "spark.kubernetes.driverEnv.",
    driver_node_selector_prefix: "spark.kubernetes.driver.node.selector.",
    driver_volumes_prefix: "spark.kubernetes.driver.volumes.",

    executor_instances: "spark.executor.instances",
    executor_cores: "spark.executor.cores",
    executor_core_request: "spark.kubernetes.executor.request.cores",
    executor_core_limit: "spark.kubernetes.executor.limit.cores",
    executor_memory: "spark.executor.memory",
    executor_memory_overhead: "spark.executor.memoryOverhead",
    executor_container_image: "spark.kubernetes.executor.container.image",
    executor_service_account: "spark.kubernetes.authenticate.executor.serviceAccountName",
    executor_java_options: "spark.executor.extraJavaOptions",
    executor_delete_on_termination: "spark.kubernetes.executor.deleteOnTermination",
    executor_label_prefix: "spark.kubernetes.executor.label.",
    executor_annotation_prefix: "spark.kubernetes.executor.annotation.",
    executor_secret_key_ref_prefix: "spark.kubernetes.executor.secretKeyRef.",
    executor_secrets_prefix: "spark.kubernetes.executor.secrets.",
    executor_env_prefix: "spark.executorEnv.",
    executor_node_selector_prefix: "spark.kubernetes.executor.node.selector.",
    executor_volumes_prefix: "spark.kubernetes.executor.volumes.",

    node_selector_prefix: "spark.kubernetes.node.selector.",
    hadoop_conf_prefix: "spark.hadoop.",

    driver_extra_class_path: "spark.driver.extraClassPath",
    executor_extra_class_path: "spark.executor.extraClassPath",

    submit_in_driver: "spark.kubernetes.submitInDriver",
    driver_port: "spark.driver.port",
    driver_block_manager_port: "spark.driver.blockManager.port",
    block_manager_port: "spark.blockManager.port",
    resource_type: "spark.kubernetes.resource.type",
    submit_time: "spark.app.submitTime",
    ui_proxy_base: "spark.ui.proxyBase",
    ui_proxy_redirect_uri: "spark.ui.proxyRedirectUri",

    metrics_namespace: "spark.metrics.namespace",
    metrics_conf: "spark.metrics.conf",

    dyn_alloc_enabled: "spark.dynamicAllocation.enabled",
    dyn_alloc_shuffle_tracking_enabled: "spark.dynamicAllocation.shuffleTracking.enabled",
    dyn_alloc_initial_executors: "spark.dynamicAllocation.initialExecutors",
    dyn_alloc_min_executors: "spark.dynamicAllocation.minExecutors",
    dyn_alloc_max_executors: "spark.dynamicAllocation.maxExecutors",
    dyn_alloc_shuffle_tracking_timeout: "spark.dynamicAllocation.shuffleTracking.timeout",

    driver_service_ip_families: "spark.kubernetes.driver.service.ipFamilies",

    default_driver_cores: "1",
    default_driver_memory: "1024m",
    default_executor_memory: "1g",
    java_scala_memory_overhead_factor: "0.1",
    other_memory_overhead_factor: "0.4",
    default_driver_port: 7078,
    default_block_manager_port: 7079,
    default_ui_port: 4040,

    local_dir_volume_prefix: "spark-local-dir-",
    defaults_file_path: "/opt/spark/conf/spark-defaults.conf",
    hadoop_conf_dir_key: "HADOOP_CONF_DIR",
    hadoop_conf_dir_path: "/etc/hadoop/conf",
    prometheus_target_annotation: "prometheus.io/targets",
};

/// Keys the pipeline always controls. User overlay entries for these are
/// dropped so that the synthesized identity lines cannot be overridden.
pub const CONTROLLED_KEYS: [&str; 7] = [
    SCHEMA.driver_host,
    SCHEMA.app_id,
    SCHEMA.master,
    SCHEMA.deploy_mode,
    SCHEMA.namespace,
    SCHEMA.app_name,
    SCHEMA.driver_pod_name,
];
