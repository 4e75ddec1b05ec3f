pub mod configmap;
pub mod driver;
pub mod naming;
pub mod pipeline;
pub mod properties;
pub mod schema;
pub mod service;
pub mod store;
pub mod volumes;

// error definitions for the submission pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Value for configuration key [{key}] should be an integer, got [{value}]")]
    NonNumericValue { key: String, value: String },

    #[error("Failed to build owner reference for [{name}]: {source}")]
    FailedBuildOwnerReference { name: String, source: crd::Error },

    #[error("Failed to build driver pod [{name}] in namespace {namespace}: {source}")]
    FailedBuildDriverPod {
        name: String,
        namespace: String,
        source: crd::Error,
    },

    #[error("Driver pod [{name}] was created without a uid")]
    DriverPodUidNotAssigned { name: String },

    #[error("Error while creating configmap {name} in namespace {namespace}: {source}")]
    FailedCreateConfigMap {
        name: String,
        namespace: String,
        source: kube::Error,
    },

    #[error("Error while creating driver pod {name} in namespace {namespace}: {source}")]
    FailedCreateDriverPod {
        name: String,
        namespace: String,
        source: kube::Error,
    },

    #[error("Error while creating driver service {name} in namespace {namespace}: {source}")]
    FailedCreateService {
        name: String,
        namespace: String,
        source: kube::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
