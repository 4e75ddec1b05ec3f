//! Thin abstraction over the cluster control plane, one namespaced store per
//! object kind. `kube::Api` is the production implementation; tests run
//! against an in-memory store with the same error classification.

use std::fmt::Debug;
use std::future::Future;

use k8s_openapi::NamespaceResourceScope;
use kube::api::PostParams;
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Duration;
use tracing::debug;

pub const DEFAULT_RETRY_ATTEMPTS: usize = 5;
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Get/create/update against one object kind in one namespace.
pub trait ObjectStore<K> {
    fn get(&self, name: &str) -> impl Future<Output = kube::Result<K>> + Send;
    fn create(&self, object: &K) -> impl Future<Output = kube::Result<K>> + Send;
    fn update(&self, object: &K) -> impl Future<Output = kube::Result<K>> + Send;
}

impl<K> ObjectStore<K> for Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync,
{
    async fn get(&self, name: &str) -> kube::Result<K> {
        Api::get(self, name).await
    }

    async fn create(&self, object: &K) -> kube::Result<K> {
        Api::create(self, &PostParams::default(), object).await
    }

    async fn update(&self, object: &K) -> kube::Result<K> {
        Api::replace(self, &object.name_any(), &PostParams::default(), object).await
    }
}

pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 409 && response.reason == "Conflict")
}

pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 409 && response.reason == "AlreadyExists")
}

/// Bounded retry shared by the three provisioners. Only optimistic-concurrency
/// conflicts are retried, every other error propagates immediately.
pub async fn retry_on_conflict<T, F, Fut>(attempts: usize, mut operation: F) -> kube::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = kube::Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_conflict(&err) && attempt + 1 < attempts => {
                attempt += 1;
                debug!("Conflict on attempt {attempt}, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use kube::core::ErrorResponse;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for a namespaced `kube::Api`, returning the same
    /// 404/409 error classes the real control plane would.
    #[derive(Clone, Default)]
    pub(crate) struct FakeStore<K> {
        objects: Arc<Mutex<HashMap<String, K>>>,
        uid_counter: Arc<Mutex<u64>>,
        /// Number of update calls that fail with a conflict before succeeding.
        conflicts_remaining: Arc<Mutex<usize>>,
    }

    impl<K> FakeStore<K>
    where
        K: Resource<DynamicType = ()> + Clone,
    {
        pub(crate) fn new() -> Self {
            FakeStore {
                objects: Arc::new(Mutex::new(HashMap::new())),
                uid_counter: Arc::new(Mutex::new(0)),
                conflicts_remaining: Arc::new(Mutex::new(0)),
            }
        }

        pub(crate) fn failing_updates(conflicts: usize) -> Self {
            let store = Self::new();
            *store.conflicts_remaining.lock().unwrap() = conflicts;
            store
        }

        pub(crate) fn stored(&self, name: &str) -> Option<K> {
            self.objects.lock().unwrap().get(name).cloned()
        }

        pub(crate) fn len(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        fn error(code: u16, reason: &str, message: String) -> kube::Error {
            kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message,
                reason: reason.to_string(),
                code,
            })
        }
    }

    impl<K> ObjectStore<K> for FakeStore<K>
    where
        K: Resource<DynamicType = ()> + Clone + Send + Sync,
    {
        async fn get(&self, name: &str) -> kube::Result<K> {
            self.objects
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| {
                    Self::error(404, "NotFound", format!("object {name} not found"))
                })
        }

        async fn create(&self, object: &K) -> kube::Result<K> {
            let name = object.name_any();
            let mut objects = self.objects.lock().unwrap();
            if objects.contains_key(&name) {
                return Err(Self::error(
                    409,
                    "AlreadyExists",
                    format!("object {name} already exists"),
                ));
            }
            let mut created = object.clone();
            let mut counter = self.uid_counter.lock().unwrap();
            *counter += 1;
            created.meta_mut().uid = Some(format!("uid-{counter}"));
            created.meta_mut().resource_version = Some("1".to_string());
            objects.insert(name, created.clone());
            Ok(created)
        }

        async fn update(&self, object: &K) -> kube::Result<K> {
            let name = object.name_any();
            {
                let mut conflicts = self.conflicts_remaining.lock().unwrap();
                if *conflicts > 0 {
                    *conflicts -= 1;
                    return Err(Self::error(
                        409,
                        "Conflict",
                        format!("object {name} was modified"),
                    ));
                }
            }
            let mut objects = self.objects.lock().unwrap();
            match objects.get(&name) {
                Some(existing) => {
                    let mut updated = object.clone();
                    updated.meta_mut().uid = existing.meta().uid.clone();
                    let version = existing
                        .meta()
                        .resource_version
                        .as_deref()
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(0);
                    updated.meta_mut().resource_version = Some((version + 1).to_string());
                    objects.insert(name, updated.clone());
                    Ok(updated)
                }
                None => Err(Self::error(
                    404,
                    "NotFound",
                    format!("object {name} not found"),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::FakeStore;
    use k8s_openapi::api::core::v1::ConfigMap;

    fn config_map(name: &str) -> ConfigMap {
        let mut cm = ConfigMap::default();
        cm.metadata.name = Some(name.to_string());
        cm
    }

    #[tokio::test]
    async fn fake_store_reports_not_found_then_create() {
        let store: FakeStore<ConfigMap> = FakeStore::new();
        let err = store.get("missing").await.unwrap_err();
        assert!(is_not_found(&err));

        let created = store.create(&config_map("cm")).await.unwrap();
        assert!(created.metadata.uid.is_some());

        let err = store.create(&config_map("cm")).await.unwrap_err();
        assert!(is_already_exists(&err));
        assert!(!is_conflict(&err));
    }

    #[tokio::test]
    async fn retry_recovers_from_bounded_conflicts() {
        let store: FakeStore<ConfigMap> = FakeStore::failing_updates(2);
        store.create(&config_map("cm")).await.unwrap();

        let updated = retry_on_conflict(DEFAULT_RETRY_ATTEMPTS, || {
            let store = store.clone();
            async move { store.update(&config_map("cm")).await }
        })
        .await
        .unwrap();
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn retry_gives_up_after_bounded_attempts() {
        let store: FakeStore<ConfigMap> = FakeStore::failing_updates(10);
        store.create(&config_map("cm")).await.unwrap();

        let err = retry_on_conflict(3, || {
            let store = store.clone();
            async move { store.update(&config_map("cm")).await }
        })
        .await
        .unwrap_err();
        assert!(is_conflict(&err));
    }
}
