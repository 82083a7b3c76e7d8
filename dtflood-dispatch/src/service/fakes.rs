//! In-memory repositories for driving the dispatcher in tests

use async_trait::async_trait;
use dtflood_client::{ClientError, Result};
use dtflood_core::domain::notification::NotificationEvent;
use dtflood_core::domain::service::StorageProvider;
use dtflood_core::dto::cluster::ClusterInfo;
use dtflood_core::dto::service::{MinioProvider, ServiceDefinition, StorageIo, StorageProviders};
use serde_json::Map;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::repository::{EventStream, ObjectStore, ServiceRepository, StoreConnector};

fn minio(endpoint: &str, access_key: &str) -> MinioProvider {
    MinioProvider {
        endpoint: endpoint.to_string(),
        region: String::new(),
        access_key: access_key.to_string(),
        secret_key: "secret".to_string(),
        verify: None,
    }
}

fn io(path: &str) -> StorageIo {
    StorageIo {
        storage_provider: "minio.default".to_string(),
        path: path.to_string(),
        suffix: Vec::new(),
        prefix: Vec::new(),
    }
}

pub fn definition(name: &str) -> ServiceDefinition {
    let mut providers = StorageProviders::default();
    providers
        .minio
        .insert("default".to_string(), minio("https://minio.example.org", "service-ak"));

    ServiceDefinition {
        name: name.to_string(),
        script: Some("echo".to_string()),
        input: vec![io(&format!("{}/in", name))],
        output: vec![io(&format!("{}/out", name))],
        storage_providers: Some(providers),
        extra: Map::new(),
    }
}

/// How the fake cluster answers `create_service`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateBehavior {
    Accept,
    /// Another caller created the service first: 409, but it now exists
    Conflict,
    Reject,
}

/// OSCAR cluster holding services in memory
pub struct FakeCluster {
    reachable: bool,
    strip_credentials: bool,
    create: CreateBehavior,
    services: Mutex<HashMap<String, ServiceDefinition>>,
    creations: AtomicUsize,
}

impl FakeCluster {
    pub fn empty() -> Self {
        Self {
            reachable: true,
            strip_credentials: false,
            create: CreateBehavior::Accept,
            services: Mutex::new(HashMap::new()),
            creations: AtomicUsize::new(0),
        }
    }

    pub fn with_service(name: &str) -> Self {
        let cluster = Self::empty();
        cluster
            .services
            .lock()
            .unwrap()
            .insert(name.to_string(), definition(name));
        cluster
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::empty()
        }
    }

    /// Services are reported without their storage providers
    pub fn without_service_credentials(mut self) -> Self {
        self.strip_credentials = true;
        self
    }

    /// Creation answers 409 while the service appears anyway
    pub fn created_concurrently(mut self) -> Self {
        self.create = CreateBehavior::Conflict;
        self
    }

    /// Creation fails with a server error and nothing is stored
    pub fn rejecting_creation(mut self) -> Self {
        self.create = CreateBehavior::Reject;
        self
    }

    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Writes `<name>.yaml` and its script into `dir`
    pub fn write_template(dir: &Path, name: &str) {
        let fdl = format!(
            "functions:\n  oscar:\n  - oscar-cluster:\n      name: {name}\n      image: example/{name}\n      script: {name}_script.sh\n      input:\n      - storage_provider: minio.default\n        path: {name}/in\n      output:\n      - storage_provider: minio.default\n        path: {name}/out\nstorage_providers:\n  minio:\n    default:\n      endpoint: https://minio.example.org\n      access_key: template-ak\n      secret_key: template-sk\n"
        );
        fs::write(dir.join(format!("{}.yaml", name)), fdl).unwrap();
        fs::write(dir.join(format!("{}_script.sh", name)), "#!/bin/sh\necho run\n").unwrap();
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }
}

#[async_trait]
impl ServiceRepository for FakeCluster {
    fn endpoint(&self) -> &str {
        "http://oscar.test"
    }

    async fn cluster_info(&self) -> Result<ClusterInfo> {
        self.check_reachable()?;
        Ok(ClusterInfo {
            version: "3.0.0".to_string(),
            git_commit: String::new(),
            architecture: "amd64".to_string(),
            kubernetes_version: "v1.29.0".to_string(),
            extra: Map::new(),
        })
    }

    async fn get_service(&self, name: &str) -> Result<ServiceDefinition> {
        self.check_reachable()?;
        let mut service = self
            .services
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;

        if self.strip_credentials {
            service.storage_providers = None;
        }
        Ok(service)
    }

    async fn create_service(&self, service: &ServiceDefinition) -> Result<()> {
        self.check_reachable()?;
        self.creations.fetch_add(1, Ordering::SeqCst);
        if self.create == CreateBehavior::Reject {
            return Err(ClientError::api_error(500, "deployment failed"));
        }

        self.services
            .lock()
            .unwrap()
            .insert(service.name.clone(), service.clone());

        match self.create {
            CreateBehavior::Conflict => Err(ClientError::api_error(409, "service already exists")),
            _ => Ok(()),
        }
    }

    async fn cluster_minio(&self) -> Result<Option<MinioProvider>> {
        self.check_reachable()?;
        Ok(Some(minio("cluster-minio.example.org", "cluster-ak")))
    }
}

/// What the notification stream does once its scripted keys run out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterScript {
    Close,
    Hang,
}

#[derive(Default)]
struct StoreState {
    uploads: Vec<(String, String, Vec<u8>)>,
    subscriptions: Vec<(String, String)>,
}

/// Object store that answers every upload by echoing it back as output
///
/// Scripted notification keys may contain `{id}`, replaced by the execution
/// id of the latest upload when the event is delivered.
pub struct FakeStore {
    script: Vec<String>,
    after: AfterScript,
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn new(script: &[&str], after: AfterScript) -> Self {
        Self {
            script: script.iter().map(|s| s.to_string()).collect(),
            after,
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    /// `(bucket, key)` of every upload so far
    pub fn uploaded_keys(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .uploads
            .iter()
            .map(|(bucket, key, _)| (bucket.clone(), key.clone()))
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().subscriptions.clone()
    }
}

fn execution_id(key: &str) -> String {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name.split('_').next().unwrap_or_default().to_string()
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload(&self, bucket: &str, key: &str, file: &Path) -> Result<u64> {
        let bytes = fs::read(file)?;
        let len = bytes.len() as u64;
        self.state
            .lock()
            .unwrap()
            .uploads
            .push((bucket.to_string(), key.to_string(), bytes));
        Ok(len)
    }

    async fn download(&self, _bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let state = self.state.lock().unwrap();
        let (_, _, bytes) = state
            .uploads
            .iter()
            .find(|(_, uploaded, _)| key.contains(&execution_id(uploaded)))
            .ok_or_else(|| ClientError::NotFound(key.to_string()))?;
        fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }

    async fn subscribe(
        &self,
        bucket: &str,
        prefix: &str,
        _events: &[&str],
    ) -> Result<Box<dyn EventStream>> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .push((bucket.to_string(), prefix.to_string()));

        Ok(Box::new(FakeStream {
            bucket: bucket.to_string(),
            remaining: self.script.iter().cloned().collect(),
            after: self.after,
            state: self.state.clone(),
        }))
    }
}

struct FakeStream {
    bucket: String,
    remaining: VecDeque<String>,
    after: AfterScript,
    state: Arc<Mutex<StoreState>>,
}

#[async_trait]
impl EventStream for FakeStream {
    async fn next_event(&mut self) -> Result<Option<NotificationEvent>> {
        if let Some(template) = self.remaining.pop_front() {
            let id = self
                .state
                .lock()
                .unwrap()
                .uploads
                .last()
                .map(|(_, key, _)| execution_id(key))
                .unwrap_or_default();

            return Ok(Some(NotificationEvent {
                event_name: "s3:ObjectCreated:Put".to_string(),
                bucket: self.bucket.clone(),
                key: template.replace("{id}", &id),
                size: None,
            }));
        }

        match self.after {
            AfterScript::Close => Ok(None),
            AfterScript::Hang => std::future::pending().await,
        }
    }
}

/// Hands out the same store for every provider
pub struct FakeConnector {
    pub store: Arc<FakeStore>,
    pub providers: Mutex<Vec<StorageProvider>>,
}

impl FakeConnector {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self {
            store,
            providers: Mutex::new(Vec::new()),
        }
    }
}

impl StoreConnector for FakeConnector {
    fn connect(&self, provider: &StorageProvider) -> Arc<dyn ObjectStore> {
        self.providers.lock().unwrap().push(provider.clone());
        self.store.clone()
    }
}
