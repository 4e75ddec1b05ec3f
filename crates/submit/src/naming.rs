//! Naming conventions for the objects created per submission. The config map
//! and service names are derived from the driver pod name and are part of the
//! observable contract, the driver pod expects its configuration volume under
//! exactly the name computed here.

use std::time::{SystemTime, UNIX_EPOCH};

use crd::spark_application::SparkApplication;
use kube::ResourceExt;

use crate::schema::SCHEMA;

const CONFIG_MAP_EXTENSION: &str = "-conf-map";
const SERVICE_NAME_EXTENSION: &str = "-svc";
const DRIVER_SERVICE_NAME_EXTENSION: &str = "-driver-svc";
const SPARK_WITH_DASH: &str = "spark-";
const KUBERNETES_DNS_LABEL_NAME_MAX_LENGTH: usize = 63;

/// Driver pod name precedence: explicit spec field, then the overlay key,
/// then `<application-name>-driver`.
pub fn driver_pod_name(app: &SparkApplication) -> String {
    if let Some(name) = &app.spec.driver.pod_name {
        if !name.is_empty() {
            return name.clone();
        }
    }
    match app.conf_value(SCHEMA.driver_pod_name) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}-driver", app.name_any()),
    }
}

pub fn config_map_name(driver_pod_name: &str) -> String {
    format!("{driver_pod_name}{CONFIG_MAP_EXTENSION}")
}

/// Service name for the driver pod. When the deterministic `<pod>-svc` form
/// exceeds the DNS label limit it is replaced with a synthesized unique name,
/// callers must not rely on a stable name in that case.
pub fn service_name(driver_pod_name: &str) -> String {
    let deterministic = format!("{driver_pod_name}{SERVICE_NAME_EXTENSION}");
    if deterministic.len() <= KUBERNETES_DNS_LABEL_NAME_MAX_LENGTH {
        return deterministic;
    }

    let unix_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{SPARK_WITH_DASH}{unix_time}{}{DRIVER_SERVICE_NAME_EXTENSION}",
        common::utils::generate_random_hex(10)
    )
}

/// Namespace the objects are created in. Falls back to the overlay entry and
/// then to "default" when the resource itself carries no namespace.
pub fn app_namespace(app: &SparkApplication) -> String {
    match app.namespace() {
        Some(ns) if !ns.is_empty() => ns,
        _ => app
            .conf_value(SCHEMA.namespace)
            .unwrap_or("default")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crd::spark_application::SparkApplicationSpec;
    use std::collections::HashMap;

    fn app_named(name: &str) -> SparkApplication {
        let mut app = SparkApplication::new(name, SparkApplicationSpec::default());
        app.metadata.namespace = Some("default".to_string());
        app
    }

    #[test]
    fn driver_pod_name_precedence() {
        let mut app = app_named("test-app");
        assert_eq!(driver_pod_name(&app), "test-app-driver");

        app.spec.spark_conf = Some(HashMap::from([(
            "spark.kubernetes.driver.pod.name".to_string(),
            "overlay-driver".to_string(),
        )]));
        assert_eq!(driver_pod_name(&app), "overlay-driver");

        app.spec.driver.pod_name = Some("explicit-driver".to_string());
        assert_eq!(driver_pod_name(&app), "explicit-driver");
    }

    #[test]
    fn config_map_name_extension() {
        assert_eq!(config_map_name("test-app-driver"), "test-app-driver-conf-map");
    }

    #[test]
    fn short_service_name_is_deterministic() {
        assert_eq!(service_name("my-drivr"), "my-drivr-svc");
    }

    #[test]
    fn long_service_name_falls_back() {
        let long_name = "a".repeat(80);
        let name = service_name(&long_name);
        assert!(name.starts_with("spark-"));
        assert!(name.ends_with("-driver-svc"));
        assert!(name.len() <= KUBERNETES_DNS_LABEL_NAME_MAX_LENGTH);
        // 20 hex chars from the 10 random bytes
        assert_ne!(name, service_name(&long_name));
    }

    #[test]
    fn namespace_falls_back_to_overlay() {
        let mut app = SparkApplication::new("test-app", SparkApplicationSpec::default());
        app.spec.spark_conf = Some(HashMap::from([(
            "spark.kubernetes.namespace".to_string(),
            "spark-jobs".to_string(),
        )]));
        assert_eq!(app_namespace(&app), "spark-jobs");

        app.metadata.namespace = Some("prod".to_string());
        assert_eq!(app_namespace(&app), "prod");
    }
}
