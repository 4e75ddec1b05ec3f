//! Builds the flattened `spark.properties` text stored in the driver config
//! map. The output follows the spark-submit wire conventions, so key names,
//! escaping and default values here are part of the observable contract.

use crd::spark_application::{SecretType, SparkApplication, SparkApplicationType};
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::schema::{ConfigSchema, CONTROLLED_KEYS};
use crate::{Error, Result};

const NONE_MODE: &str = "cluster";

/// Escapes `:` and `=` so the downstream properties parser does not
/// mis-tokenize path-like values.
pub fn add_escape_character(value: &str) -> String {
    value.replace(':', "\\:").replace('=', "\\=")
}

/// Produces the full ordered property text for one submission. The caller has
/// already run the volume partitioner; its emitted lines are passed in via
/// `local_dir_options`. Numeric overlay values that fail to parse abort the
/// submission before any cluster write.
#[allow(clippy::too_many_arguments)]
pub fn build_submission_properties(
    app: &SparkApplication,
    driver_pod_name: &str,
    submission_id: &str,
    application_id: &str,
    service_name: &str,
    master_url: &str,
    local_dir_options: &[String],
    schema: &ConfigSchema,
) -> Result<String> {
    let mut lines: Vec<String> = Vec::new();
    let spec = &app.spec;
    let empty = HashMap::new();
    let conf = spec.spark_conf.as_ref().unwrap_or(&empty);
    let app_name = app
        .metadata
        .name
        .clone()
        .unwrap_or_default();
    let namespace = crate::naming::app_namespace(app);

    // identity lines the pipeline always controls
    lines.push(format!(
        "{}={service_name}.{namespace}.svc",
        schema.driver_host
    ));
    lines.push(format!("{}={application_id}", schema.app_id));
    lines.push(format!(
        "{}={}",
        schema.master,
        add_escape_character(master_url)
    ));
    let mode = spec
        .mode
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| NONE_MODE.to_string());
    lines.push(format!("{}={mode}", schema.deploy_mode));
    lines.push(format!("{}={namespace}", schema.namespace));
    lines.push(format!("{}={app_name}", schema.app_name));
    lines.push(format!("{}={driver_pod_name}", schema.driver_pod_name));

    push_artifacts(&mut lines, app, schema);
    push_container_image(&mut lines, app, schema);

    if let Some(python_version) = &spec.python_version {
        lines.push(format!("{}={python_version}", schema.python_version));
    }

    // overhead factor differs for JVM and non-JVM applications
    if let Some(factor) = &spec.memory_overhead_factor {
        lines.push(format!("{}={factor}", schema.memory_overhead_factor));
    } else if !conf.contains_key(schema.memory_overhead_factor) {
        let factor = match spec.typ {
            SparkApplicationType::Java | SparkApplicationType::Scala => {
                schema.java_scala_memory_overhead_factor
            }
            _ => schema.other_memory_overhead_factor,
        };
        lines.push(format!("{}={factor}", schema.memory_overhead_factor));
    }

    // the pipeline never waits for app completion
    lines.push(format!("{}=false", schema.wait_app_completion));

    push_spark_conf(&mut lines, conf, schema);
    push_hadoop_conf(&mut lines, app, schema);

    lines.push(format!(
        "{}{}={app_name}",
        schema.driver_label_prefix,
        crd::constants::LABEL_SPARK_APP_NAME
    ));
    lines.push(format!(
        "{}{}=true",
        schema.driver_label_prefix,
        crd::constants::LABEL_LAUNCHED_BY_OPERATOR
    ));
    lines.push(format!(
        "{}{}={submission_id}",
        schema.driver_label_prefix,
        crd::constants::LABEL_SUBMISSION_ID
    ));

    if let Some(image) = &spec.driver.image {
        lines.push(format!("{}={image}", schema.driver_container_image));
    }

    push_compute_info(&mut lines, app, conf, schema)?;
    push_memory_info(&mut lines, app, conf, schema)?;

    if let Some(account) = &spec.driver.service_account {
        lines.push(format!("{}={account}", schema.driver_service_account));
    }
    if let Some(java_options) = &spec.driver.java_options {
        lines.push(format!(
            "{}={}",
            schema.driver_java_options,
            add_escape_character(java_options)
        ));
    }
    if let Some(master) = &spec.driver.kubernetes_master {
        lines.push(format!("{}={master}", schema.driver_kubernetes_master));
    }

    // application labels flow down to the driver pod, driver labels win
    let mut driver_labels: HashMap<&String, &String> = HashMap::new();
    if let Some(labels) = &app.metadata.labels {
        driver_labels.extend(labels.iter());
    }
    if let Some(labels) = &spec.driver.labels {
        driver_labels.extend(labels.iter());
    }
    for (key, value) in driver_labels {
        lines.push(format!("{}{key}={value}", schema.driver_label_prefix));
    }

    push_annotations(
        &mut lines,
        spec.driver.annotations.as_ref(),
        schema.driver_annotation_prefix,
        schema,
    );

    if let Some(refs) = &spec.driver.env_secret_key_refs {
        for (key, name_key) in refs {
            lines.push(format!(
                "{}{key}={}:{}",
                schema.driver_secret_key_ref_prefix, name_key.name, name_key.key
            ));
        }
    }
    if let Some(annotations) = &spec.driver.service_annotations {
        for (key, value) in annotations {
            lines.push(format!(
                "{}{key}={value}",
                schema.driver_service_annotation_prefix
            ));
        }
    }

    push_secrets(
        &mut lines,
        spec.driver.secrets.as_deref(),
        schema.driver_secrets_prefix,
        schema.driver_env_prefix,
    );
    push_env(
        &mut lines,
        spec.driver.env_vars.as_ref(),
        spec.driver.env.as_deref(),
        schema.driver_env_prefix,
    );

    lines.push(format!(
        "{}{}={app_name}",
        schema.executor_label_prefix,
        crd::constants::LABEL_SPARK_APP_NAME
    ));
    lines.push(format!(
        "{}{}=true",
        schema.executor_label_prefix,
        crd::constants::LABEL_LAUNCHED_BY_OPERATOR
    ));
    lines.push(format!(
        "{}{}={submission_id}",
        schema.executor_label_prefix,
        crd::constants::LABEL_SUBMISSION_ID
    ));

    if let Some(instances) = spec.executor.instances {
        lines.push(format!("{}={instances}", schema.executor_instances));
    }
    if let Some(image) = &spec.executor.image {
        lines.push(format!("{}={image}", schema.executor_container_image));
    }
    if let Some(account) = &spec.executor.service_account {
        lines.push(format!("{}={account}", schema.executor_service_account));
    }
    if let Some(delete) = spec.executor.delete_on_termination {
        lines.push(format!("{}={delete}", schema.executor_delete_on_termination));
    }

    let mut executor_labels: HashMap<&String, &String> = HashMap::new();
    if let Some(labels) = &app.metadata.labels {
        executor_labels.extend(labels.iter());
    }
    if let Some(labels) = &spec.executor.labels {
        executor_labels.extend(labels.iter());
    }
    for (key, value) in executor_labels {
        lines.push(format!("{}{key}={value}", schema.executor_label_prefix));
    }

    push_annotations(
        &mut lines,
        spec.executor.annotations.as_ref(),
        schema.executor_annotation_prefix,
        schema,
    );

    if let Some(refs) = &spec.executor.env_secret_key_refs {
        for (key, name_key) in refs {
            lines.push(format!(
                "{}{key}={}:{}",
                schema.executor_secret_key_ref_prefix, name_key.name, name_key.key
            ));
        }
    }
    if let Some(java_options) = &spec.executor.java_options {
        lines.push(format!("{}={java_options}", schema.executor_java_options));
    }

    push_secrets(
        &mut lines,
        spec.executor.secrets.as_deref(),
        schema.executor_secrets_prefix,
        schema.executor_env_prefix,
    );
    push_env(
        &mut lines,
        spec.executor.env_vars.as_ref(),
        spec.executor.env.as_deref(),
        schema.executor_env_prefix,
    );

    push_dynamic_allocation(&mut lines, app, schema);

    push_node_selectors(&mut lines, spec.node_selector.as_ref(), schema.node_selector_prefix);
    push_node_selectors(
        &mut lines,
        spec.driver.node_selector.as_ref(),
        schema.driver_node_selector_prefix,
    );
    push_node_selectors(
        &mut lines,
        spec.executor.node_selector.as_ref(),
        schema.executor_node_selector_prefix,
    );

    lines.push(format!("{}=true", schema.submit_in_driver));
    lines.push(format!(
        "{}={}",
        schema.driver_block_manager_port,
        block_manager_port(conf, schema)?
    ));
    lines.push(format!("{}={}", schema.driver_port, driver_port(conf, schema)?));
    lines.push(format!(
        "{}={}",
        schema.resource_type,
        spec.typ.resource_type()
    ));

    let submit_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    lines.push(format!("{}={submit_time}", schema.submit_time));

    lines.push(format!("{}=/{namespace}/{app_name}", schema.ui_proxy_base));
    lines.push(format!("{}=/", schema.ui_proxy_redirect_uri));

    // local defaults file is optional, merged verbatim when present
    for (key, value) in common::properties::load_properties_file(Path::new(schema.defaults_file_path))
    {
        lines.push(format!("{key}={value}"));
    }

    if let Some(monitoring) = &spec.monitoring {
        lines.push(format!(
            "{}={namespace}.{app_name}",
            schema.metrics_namespace
        ));
        if let Some(file) = &monitoring.metrics_properties_file {
            lines.push(format!("{}={file}", schema.metrics_conf));
        }
    }

    lines.extend(local_dir_options.iter().cloned());

    if let Some(main_file) = &spec.main_application_file {
        lines.push(format!(
            "{}={}",
            schema.jars,
            add_escape_character(main_file)
        ));
    }
    if let Some(arguments) = &spec.arguments {
        lines.extend(arguments.iter().cloned());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

fn push_artifacts(lines: &mut Vec<String>, app: &SparkApplication, schema: &ConfigSchema) {
    let Some(deps) = &app.spec.deps else {
        return;
    };
    if let Some(jars) = non_empty(&deps.jars) {
        let escaped: Vec<String> = jars.iter().map(|j| add_escape_character(j)).collect();
        lines.push(format!("{}={}", schema.jars, escaped.join(",")));
    }
    if let Some(files) = non_empty(&deps.files) {
        lines.push(format!("{}={}", schema.files, files.join(",")));
    }
    if let Some(py_files) = non_empty(&deps.py_files) {
        lines.push(format!("{}={}", schema.py_files, py_files.join(",")));
    }
    if let Some(packages) = non_empty(&deps.packages) {
        lines.push(format!("{}={}", schema.packages, packages.join(",")));
    }
    if let Some(excludes) = non_empty(&deps.exclude_packages) {
        lines.push(format!("{}={}", schema.exclude_packages, excludes.join(",")));
    }
    if let Some(repositories) = non_empty(&deps.repositories) {
        lines.push(format!("{}={}", schema.repositories, repositories.join(",")));
    }
}

fn non_empty(list: &Option<Vec<String>>) -> Option<&Vec<String>> {
    list.as_ref().filter(|l| !l.is_empty())
}

fn push_container_image(lines: &mut Vec<String>, app: &SparkApplication, schema: &ConfigSchema) {
    if let Some(image) = &app.spec.image {
        lines.push(format!(
            "{}={}",
            schema.container_image,
            add_escape_character(image)
        ));
    }
    if let Some(policy) = &app.spec.image_pull_policy {
        lines.push(format!("{}={policy}", schema.container_image_pull_policy));
    }
    if let Some(secrets) = non_empty(&app.spec.image_pull_secrets) {
        lines.push(format!(
            "{}={}",
            schema.container_image_pull_secrets,
            secrets.join(",")
        ));
    }
}

/// User overlay entries pass through as-is, except for the keys the pipeline
/// controls and the extra-classpath values that need escaping.
fn push_spark_conf(lines: &mut Vec<String>, conf: &HashMap<String, String>, schema: &ConfigSchema) {
    for (key, value) in conf {
        if CONTROLLED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if key == schema.driver_extra_class_path || key == schema.executor_extra_class_path {
            lines.push(format!("{key}={}", add_escape_character(value)));
        } else {
            lines.push(format!("{key}={value}"));
        }
    }
}

fn push_hadoop_conf(lines: &mut Vec<String>, app: &SparkApplication, schema: &ConfigSchema) {
    let Some(hadoop_conf) = &app.spec.hadoop_conf else {
        return;
    };
    for (key, value) in hadoop_conf {
        lines.push(format!("{}{key}={value}", schema.hadoop_conf_prefix));
    }
    lines.push(format!(
        "{}{}={}",
        schema.driver_env_prefix, schema.hadoop_conf_dir_key, schema.hadoop_conf_dir_path
    ));
}

/// Cores and CPU requests. Structured spec fields win, then overlay values,
/// then the fixed driver default. Non-numeric overlay cores are fatal.
fn push_compute_info(
    lines: &mut Vec<String>,
    app: &SparkApplication,
    conf: &HashMap<String, String>,
    schema: &ConfigSchema,
) -> Result<()> {
    let spec = &app.spec;
    if let Some(cores) = spec.driver.cores {
        lines.push(format!("{}={cores}", schema.driver_cores));
    } else if let Some(value) = conf.get(schema.driver_cores) {
        let cores = parse_numeric(schema.driver_cores, value)?;
        lines.push(format!("{}={cores}", schema.driver_cores));
    } else {
        lines.push(format!(
            "{}={}",
            schema.driver_cores, schema.default_driver_cores
        ));
    }

    if let Some(request) = &spec.driver.core_request {
        lines.push(format!("{}={request}", schema.driver_core_request));
    } else if let Some(request) = conf.get(schema.driver_core_request) {
        lines.push(format!("{}={request}", schema.driver_core_request));
    }

    if let Some(limit) = &spec.driver.core_limit {
        lines.push(format!("{}={limit}", schema.driver_core_limit));
    } else if let Some(limit) = conf.get(schema.driver_core_limit) {
        lines.push(format!("{}={limit}", schema.driver_core_limit));
    }

    if let Some(request) = &spec.executor.core_request {
        lines.push(format!("{}={request}", schema.executor_core_request));
    } else if let Some(request) = conf.get(schema.executor_core_request) {
        lines.push(format!("{}={request}", schema.executor_core_request));
    }
    Ok(())
}

fn push_memory_info(
    lines: &mut Vec<String>,
    app: &SparkApplication,
    conf: &HashMap<String, String>,
    schema: &ConfigSchema,
) -> Result<()> {
    let spec = &app.spec;
    if let Some(memory) = &spec.driver.memory {
        lines.push(format!("{}={memory}", schema.driver_memory));
    } else if !conf.contains_key(schema.driver_memory) {
        lines.push(format!(
            "{}={}",
            schema.driver_memory, schema.default_driver_memory
        ));
    }

    // two alternative overlay spellings for the overhead
    if let Some(overhead) = &spec.driver.memory_overhead {
        lines.push(format!("{}={overhead}", schema.driver_memory_overhead));
    } else if let Some(overhead) = conf.get(schema.driver_memory_overhead) {
        lines.push(format!("{}={overhead}", schema.driver_memory_overhead));
    } else if let Some(overhead) = conf.get(schema.kubernetes_memory_overhead) {
        lines.push(format!("{}={overhead}", schema.driver_memory_overhead));
    }

    // spark.executor.cores does not allow float values
    if let Some(cores) = spec.executor.cores {
        lines.push(format!("{}={cores}", schema.executor_cores));
    } else if let Some(value) = conf.get(schema.executor_cores) {
        let cores = parse_numeric(schema.executor_cores, value)?;
        lines.push(format!("{}={cores}", schema.executor_cores));
    }

    if let Some(limit) = &spec.executor.core_limit {
        lines.push(format!("{}={limit}", schema.executor_core_limit));
    } else if let Some(limit) = conf.get(schema.executor_core_limit) {
        lines.push(format!("{}={limit}", schema.executor_core_limit));
    }

    if let Some(memory) = &spec.executor.memory {
        lines.push(format!("{}={memory}", schema.executor_memory));
    } else if !conf.contains_key(schema.executor_memory) {
        lines.push(format!(
            "{}={}",
            schema.executor_memory, schema.default_executor_memory
        ));
    }

    if let Some(overhead) = &spec.executor.memory_overhead {
        lines.push(format!("{}={overhead}", schema.executor_memory_overhead));
    } else if let Some(overhead) = conf.get(schema.executor_memory_overhead) {
        lines.push(format!("{}={overhead}", schema.executor_memory_overhead));
    } else if let Some(overhead) = conf.get(schema.kubernetes_memory_overhead) {
        lines.push(format!("{}={overhead}", schema.executor_memory_overhead));
    }
    Ok(())
}

fn push_annotations(
    lines: &mut Vec<String>,
    annotations: Option<&HashMap<String, String>>,
    prefix: &str,
    schema: &ConfigSchema,
) {
    let Some(annotations) = annotations else {
        return;
    };
    for (key, value) in annotations {
        if key == schema.prometheus_target_annotation {
            let value = add_escape_character(&value.replace('\n', ""));
            lines.push(format!("{prefix}{key}={value}"));
        } else {
            lines.push(format!("{prefix}{key}={value}"));
        }
    }
}

/// Every secret mount emits its path entry. Cloud-credential and
/// delegation-token secrets additionally synthesize the environment variable
/// their consumers expect, pointing at the well-known file in the mount.
fn push_secrets(
    lines: &mut Vec<String>,
    secrets: Option<&[crd::spark_application::SecretInfo]>,
    secrets_prefix: &str,
    env_prefix: &str,
) {
    let Some(secrets) = secrets else {
        return;
    };
    for secret in secrets {
        lines.push(format!(
            "{secrets_prefix}{}={}",
            secret.name, secret.path
        ));
        match secret.typ {
            SecretType::GCPServiceAccount => lines.push(format!(
                "{env_prefix}{}={}/{}",
                crd::constants::GOOGLE_APPLICATION_CREDENTIALS_ENV,
                secret.path.trim_end_matches('/'),
                crd::constants::GCP_SERVICE_ACCOUNT_JSON_KEY_FILE
            )),
            SecretType::HadoopDelegationToken => lines.push(format!(
                "{env_prefix}{}={}/{}",
                crd::constants::HADOOP_TOKEN_FILE_LOCATION_ENV,
                secret.path.trim_end_matches('/'),
                crd::constants::HADOOP_DELEGATION_TOKEN_FILE
            )),
            SecretType::Generic => {}
        }
    }
}

/// Both env forms are flattened: the key/value map directly, the positional
/// list with the index as the key suffix.
fn push_env(
    lines: &mut Vec<String>,
    env_vars: Option<&HashMap<String, String>>,
    env: Option<&[k8s_openapi::api::core::v1::EnvVar]>,
    prefix: &str,
) {
    if let Some(env_vars) = env_vars {
        for (key, value) in env_vars {
            lines.push(format!("{prefix}{key}={value}"));
        }
    }
    if let Some(env) = env {
        for (index, var) in env.iter().enumerate() {
            lines.push(format!(
                "{prefix}{index}={}={}",
                var.name,
                var.value.as_deref().unwrap_or_default()
            ));
        }
    }
}

fn push_dynamic_allocation(lines: &mut Vec<String>, app: &SparkApplication, schema: &ConfigSchema) {
    let Some(dynamic_allocation) = &app.spec.dynamic_allocation else {
        return;
    };
    lines.push(format!("{}=true", schema.dyn_alloc_enabled));
    // shuffle tracking is always on alongside dynamic allocation
    lines.push(format!("{}=true", schema.dyn_alloc_shuffle_tracking_enabled));
    if let Some(initial) = dynamic_allocation.initial_executors {
        lines.push(format!("{}={initial}", schema.dyn_alloc_initial_executors));
    }
    if let Some(min) = dynamic_allocation.min_executors {
        lines.push(format!("{}={min}", schema.dyn_alloc_min_executors));
    }
    if let Some(max) = dynamic_allocation.max_executors {
        lines.push(format!("{}={max}", schema.dyn_alloc_max_executors));
    }
    if let Some(timeout) = dynamic_allocation.shuffle_tracking_timeout {
        lines.push(format!(
            "{}={timeout}",
            schema.dyn_alloc_shuffle_tracking_timeout
        ));
    }
}

fn push_node_selectors(
    lines: &mut Vec<String>,
    selector: Option<&HashMap<String, String>>,
    prefix: &str,
) {
    let Some(selector) = selector else {
        return;
    };
    for (key, value) in selector {
        lines.push(format!("{prefix}{key}={value}"));
    }
}

pub fn driver_port(conf: &HashMap<String, String>, schema: &ConfigSchema) -> Result<i32> {
    match conf.get(schema.driver_port) {
        Some(value) => parse_numeric(schema.driver_port, value).map(|p| p as i32),
        None => Ok(schema.default_driver_port),
    }
}

/// The driver-scoped spelling wins over the generic one when both are set.
pub fn block_manager_port(conf: &HashMap<String, String>, schema: &ConfigSchema) -> Result<i32> {
    if let Some(value) = conf.get(schema.driver_block_manager_port) {
        return parse_numeric(schema.driver_block_manager_port, value).map(|p| p as i32);
    }
    if let Some(value) = conf.get(schema.block_manager_port) {
        return parse_numeric(schema.block_manager_port, value).map(|p| p as i32);
    }
    Ok(schema.default_block_manager_port)
}

fn parse_numeric(key: &str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|_| Error::NonNumericValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SCHEMA;
    use crd::spark_application::{
        DeployMode, DriverSpec, DynamicAllocation, SecretInfo, SparkApplicationSpec,
    };

    fn test_app(typ: SparkApplicationType) -> SparkApplication {
        let mut app = SparkApplication::new(
            "test-app",
            SparkApplicationSpec {
                typ,
                mode: Some(DeployMode::Cluster),
                main_application_file: Some("local:///x.jar".to_string()),
                ..Default::default()
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app
    }

    fn build(app: &SparkApplication) -> Result<String> {
        build_submission_properties(
            app,
            "test-app-driver",
            "sub-1",
            "spark-app-1",
            "test-app-driver-svc",
            "k8s://https://localhost:443",
            &[],
            &SCHEMA,
        )
    }

    fn lines_of(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn escaping_is_idempotent_on_clean_input() {
        assert_eq!(add_escape_character("plain-value"), "plain-value");
        assert_eq!(add_escape_character("a:b=c"), "a\\:b\\=c");
    }

    #[test]
    fn main_application_file_is_escaped() {
        let app = test_app(SparkApplicationType::Scala);
        let text = build(&app).unwrap();
        assert!(lines_of(&text).contains(&"spark.jars=local\\:///x.jar"));
    }

    #[test]
    fn overhead_factor_defaults_by_language() {
        let scala = build(&test_app(SparkApplicationType::Scala)).unwrap();
        assert!(lines_of(&scala).contains(&"spark.kubernetes.memoryOverheadFactor=0.1"));

        let python = build(&test_app(SparkApplicationType::Python)).unwrap();
        assert!(lines_of(&python).contains(&"spark.kubernetes.memoryOverheadFactor=0.4"));
    }

    #[test]
    fn driver_cores_spec_field_wins() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.driver = DriverSpec {
            cores: Some(3),
            ..Default::default()
        };
        app.spec.spark_conf = Some(HashMap::from([(
            "spark.driver.cores".to_string(),
            "7".to_string(),
        )]));
        let text = build(&app).unwrap();
        assert!(lines_of(&text).contains(&"spark.driver.cores=3"));
    }

    #[test]
    fn non_numeric_overlay_cores_fail_translation() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.spark_conf = Some(HashMap::from([(
            "spark.driver.cores".to_string(),
            "a-lot".to_string(),
        )]));
        let err = build(&app).unwrap_err();
        assert!(matches!(err, Error::NonNumericValue { ref key, .. } if key == "spark.driver.cores"));
    }

    #[test]
    fn driver_cores_default_applies() {
        let text = build(&test_app(SparkApplicationType::Scala)).unwrap();
        assert!(lines_of(&text).contains(&"spark.driver.cores=1"));
        assert!(lines_of(&text).contains(&"spark.driver.memory=1024m"));
        assert!(lines_of(&text).contains(&"spark.executor.memory=1g"));
    }

    #[test]
    fn scala_normalizes_to_java_resource_type() {
        let text = build(&test_app(SparkApplicationType::Scala)).unwrap();
        assert!(lines_of(&text).contains(&"spark.kubernetes.resource.type=java"));
    }

    #[test]
    fn controlled_overlay_keys_are_dropped() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.spark_conf = Some(HashMap::from([
            ("spark.app.name".to_string(), "spoofed".to_string()),
            ("spark.eventLog.enabled".to_string(), "true".to_string()),
        ]));
        let text = build(&app).unwrap();
        let lines = lines_of(&text);
        assert!(lines.contains(&"spark.app.name=test-app"));
        assert!(!lines.contains(&"spark.app.name=spoofed"));
        assert!(lines.contains(&"spark.eventLog.enabled=true"));
    }

    #[test]
    fn extra_class_path_overlay_is_escaped() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.spark_conf = Some(HashMap::from([(
            "spark.driver.extraClassPath".to_string(),
            "local:///jars/*".to_string(),
        )]));
        let text = build(&app).unwrap();
        assert!(lines_of(&text).contains(&"spark.driver.extraClassPath=local\\:///jars/*"));
    }

    #[test]
    fn secret_env_synthesis() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.driver.secrets = Some(vec![
            SecretInfo {
                name: "gcp-key".to_string(),
                path: "/mnt/secrets".to_string(),
                typ: SecretType::GCPServiceAccount,
            },
            SecretInfo {
                name: "token".to_string(),
                path: "/mnt/hadoop".to_string(),
                typ: SecretType::HadoopDelegationToken,
            },
            SecretInfo {
                name: "plain".to_string(),
                path: "/mnt/plain".to_string(),
                typ: SecretType::Generic,
            },
        ]);
        let text = build(&app).unwrap();
        let lines = lines_of(&text);
        assert!(lines.contains(&"spark.kubernetes.driver.secrets.gcp-key=/mnt/secrets"));
        assert!(lines.contains(
            &"spark.kubernetes.driverEnv.GOOGLE_APPLICATION_CREDENTIALS=/mnt/secrets/key.json"
        ));
        assert!(lines.contains(
            &"spark.kubernetes.driverEnv.HADOOP_TOKEN_FILE_LOCATION=/mnt/hadoop/hadoop.token"
        ));
        assert!(lines.contains(&"spark.kubernetes.driver.secrets.plain=/mnt/plain"));
        assert!(!lines.iter().any(|l| l.contains("/mnt/plain/key.json")));
    }

    #[test]
    fn hadoop_conf_flattens_and_sets_conf_dir_env() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.hadoop_conf = Some(HashMap::from([(
            "fs.s3a.endpoint".to_string(),
            "s3.internal".to_string(),
        )]));
        let text = build(&app).unwrap();
        let lines = lines_of(&text);
        assert!(lines.contains(&"spark.hadoop.fs.s3a.endpoint=s3.internal"));
        assert!(lines.contains(&"spark.kubernetes.driverEnv.HADOOP_CONF_DIR=/etc/hadoop/conf"));
    }

    #[test]
    fn dynamic_allocation_block() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.dynamic_allocation = Some(DynamicAllocation {
            enabled: true,
            initial_executors: Some(2),
            max_executors: Some(10),
            ..Default::default()
        });
        let text = build(&app).unwrap();
        let lines = lines_of(&text);
        assert!(lines.contains(&"spark.dynamicAllocation.enabled=true"));
        assert!(lines.contains(&"spark.dynamicAllocation.shuffleTracking.enabled=true"));
        assert!(lines.contains(&"spark.dynamicAllocation.initialExecutors=2"));
        assert!(lines.contains(&"spark.dynamicAllocation.maxExecutors=10"));
        assert!(!lines.iter().any(|l| l.starts_with("spark.dynamicAllocation.minExecutors")));
    }

    #[test]
    fn arguments_appended_unescaped() {
        let mut app = test_app(SparkApplicationType::Scala);
        app.spec.arguments = Some(vec!["--input".to_string(), "s3a://bucket/x".to_string()]);
        let text = build(&app).unwrap();
        let lines = lines_of(&text);
        let jars_idx = lines.iter().position(|l| l.starts_with("spark.jars=")).unwrap();
        assert_eq!(lines[jars_idx + 1], "--input");
        assert_eq!(lines[jars_idx + 2], "s3a://bucket/x");
    }

    #[test]
    fn driver_host_points_at_service() {
        let text = build(&test_app(SparkApplicationType::Scala)).unwrap();
        assert!(lines_of(&text).contains(&"spark.driver.host=test-app-driver-svc.default.svc"));
    }

    #[test]
    fn block_manager_port_overlay_spellings() {
        let conf = HashMap::from([("spark.blockManager.port".to_string(), "8000".to_string())]);
        assert_eq!(block_manager_port(&conf, &SCHEMA).unwrap(), 8000);

        let conf = HashMap::from([
            ("spark.blockManager.port".to_string(), "8000".to_string()),
            ("spark.driver.blockManager.port".to_string(), "9000".to_string()),
        ]);
        assert_eq!(block_manager_port(&conf, &SCHEMA).unwrap(), 9000);

        let conf = HashMap::from([(
            "spark.driver.blockManager.port".to_string(),
            "not-a-port".to_string(),
        )]);
        assert!(block_manager_port(&conf, &SCHEMA).is_err());

        assert_eq!(block_manager_port(&HashMap::new(), &SCHEMA).unwrap(), 7079);
    }
}
