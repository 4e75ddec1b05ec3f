//! Splits the user-declared volumes into Spark-managed local scratch volumes
//! and regular volumes. Scratch volumes are removed from the spec and
//! re-expressed as `spark.kubernetes.*.volumes.*` configuration lines so the
//! driver materializes them itself.

use std::collections::HashMap;

use crd::spark_application::SparkApplicationSpec;
use k8s_openapi::api::core::v1::{Volume, VolumeMount};

use crate::schema::ConfigSchema;

/// Removes volumes whose name carries the local scratch prefix from the spec's
/// volume list and from the driver and executor mount lists, and returns the
/// configuration lines describing the removed mounts. Mounts that reference no
/// scratch volume pass through unchanged.
pub fn extract_local_dir_options(
    spec: &mut SparkApplicationSpec,
    schema: &ConfigSchema,
) -> Vec<String> {
    let mut options = Vec::new();

    let mut local_volumes: HashMap<String, Volume> = HashMap::new();
    if let Some(volumes) = spec.volumes.take() {
        let mut kept = Vec::new();
        for volume in volumes {
            if volume.name.starts_with(schema.local_dir_volume_prefix) {
                local_volumes.insert(volume.name.clone(), volume);
            } else {
                kept.push(volume);
            }
        }
        spec.volumes = Some(kept);
    }

    if let Some(mounts) = spec.driver.volume_mounts.take() {
        let (kept, lines) = partition_mounts(mounts, schema.driver_volumes_prefix, &local_volumes);
        spec.driver.volume_mounts = Some(kept);
        options.extend(lines);
    }

    if let Some(mounts) = spec.executor.volume_mounts.take() {
        let (kept, lines) = partition_mounts(mounts, schema.executor_volumes_prefix, &local_volumes);
        spec.executor.volume_mounts = Some(kept);
        options.extend(lines);
    }

    options
}

fn partition_mounts(
    mounts: Vec<VolumeMount>,
    prefix: &str,
    local_volumes: &HashMap<String, Volume>,
) -> (Vec<VolumeMount>, Vec<String>) {
    let mut kept = Vec::new();
    let mut lines = Vec::new();
    for mount in mounts {
        match local_volumes.get(&mount.name) {
            Some(volume) => lines.extend(local_volume_options(prefix, volume, &mount)),
            None => kept.push(mount),
        }
    }
    (kept, lines)
}

/// One mount-path line per volume plus kind-specific option lines: host-path
/// emits its path and optional type, a persistent claim emits its claim name,
/// an in-memory empty dir needs no options.
fn local_volume_options(prefix: &str, volume: &Volume, mount: &VolumeMount) -> Vec<String> {
    let mount_path = |kind: &str| {
        format!(
            "{prefix}{kind}.{}.mount.path={}",
            volume.name, mount.mount_path
        )
    };
    let option = |kind: &str, key: &str, value: &str| {
        format!("{prefix}{kind}.{}.options.{key}={value}", volume.name)
    };

    let mut options = Vec::new();
    if let Some(host_path) = &volume.host_path {
        options.push(mount_path("hostPath"));
        options.push(option("hostPath", "path", &host_path.path));
        if let Some(typ) = &host_path.type_ {
            options.push(option("hostPath", "type", typ));
        }
    } else if volume.empty_dir.is_some() {
        options.push(mount_path("emptyDir"));
    } else if let Some(claim) = &volume.persistent_volume_claim {
        options.push(mount_path("persistentVolumeClaim"));
        options.push(option("persistentVolumeClaim", "claimName", &claim.claim_name));
    }
    options
}
