//! Job dispatcher
//!
//! Drives one submission through
//! `UNSUBMITTED -> PACKAGED -> SERVICE_RESOLVED -> UPLOADED ->
//! AWAITING_NOTIFICATION -> DOWNLOADED -> UNPACKED`.
//!
//! The notification subscription is opened before the upload so that an
//! output written while the upload response is still in flight is not
//! missed. The subscription only yields events once the dispatcher starts
//! reading it in AWAITING_NOTIFICATION.

use dtflood_core::domain::job::{JobState, UploadKey};
use dtflood_core::domain::notification::{NotificationEvent, first_match};
use dtflood_core::domain::service::Resolution;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::packager;
use crate::repository::{EventStream, ServiceRepository, StoreConnector};
use crate::service::resolver::ServiceResolver;

/// Result of a completed dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Directory holding the unpacked remote output
    pub output_dir: PathBuf,
    pub execution_id: String,
    /// Object key the output was downloaded from
    pub output_key: String,
    /// Relative paths of the unpacked files
    pub files: Vec<PathBuf>,
    pub resolution: Resolution,
}

/// Submits one job and waits for its output
///
/// A dispatcher is single-use: once a submission has started, a second
/// call fails with an invalid state transition.
pub struct JobDispatcher {
    config: DispatchConfig,
    resolver: ServiceResolver,
    connector: Arc<dyn StoreConnector>,
    state: JobState,
}

impl JobDispatcher {
    pub fn new(
        config: DispatchConfig,
        repository: Arc<dyn ServiceRepository>,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            config,
            resolver: ServiceResolver::new(repository),
            connector,
            state: JobState::Unsubmitted,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn advance(&mut self, to: JobState) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(DispatchError::InvalidState {
                from: self.state,
                to,
            });
        }

        info!("Job state {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Packages `input_dir`, runs it on the configured service and unpacks
    /// the result into the configured output directory
    ///
    /// Uploads at most once. Nothing is retried.
    pub async fn submit_and_await(&mut self, input_dir: &Path) -> Result<DispatchOutcome> {
        if self.state != JobState::Unsubmitted {
            return Err(DispatchError::InvalidState {
                from: self.state,
                to: JobState::Packaged,
            });
        }

        let input = input_dir.to_path_buf();
        let archive = tokio::task::spawn_blocking(move || packager::package(&input))
            .await
            .map_err(|e| DispatchError::TaskFailed(e.to_string()))??;
        self.advance(JobState::Packaged)?;

        let result = self.dispatch(&archive).await;
        if result.is_ok() {
            remove_file(&archive).await;
        }
        result
    }

    async fn dispatch(&mut self, archive: &Path) -> Result<DispatchOutcome> {
        self.resolver.check_connection().await?;
        let (service, resolution) = self
            .resolver
            .resolve(&self.config.service, &self.config.template_dir)
            .await?;
        self.advance(JobState::ServiceResolved)?;

        let store = self.connector.connect(&service.storage);

        let events: Vec<&str> = self.config.listen_events.iter().map(String::as_str).collect();
        let mut stream = store
            .subscribe(&service.output.bucket, &service.output.prefix, &events)
            .await
            .map_err(DispatchError::Storage)?;
        debug!("Subscribed to notifications on {}", service.output);

        let file_name = archive
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let upload_key = UploadKey::generate(&file_name);
        let key = service.input.key_for(&upload_key.to_string());

        info!("Uploading {} to {}/{}", archive.display(), service.input.bucket, key);
        let sent = store
            .upload(&service.input.bucket, &key, archive)
            .await
            .map_err(DispatchError::Storage)?;
        debug!("Uploaded {} bytes", sent);
        self.advance(JobState::Uploaded)?;

        self.advance(JobState::AwaitingNotification)?;
        info!("Waiting for output of execution {}", upload_key.execution_id());
        let wait = wait_for_output(stream.as_mut(), Some(upload_key.execution_id()));
        let event = match self.config.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| DispatchError::WaitTimedOut(limit))??,
            None => wait.await?,
        };
        info!("Output {} is ready", event.key);

        let output_dir = self.config.output_dir.clone();
        fs::create_dir_all(&output_dir).await?;
        let downloaded = output_dir.join(event.file_name());
        store
            .download(&event.bucket, &event.key, &downloaded)
            .await
            .map_err(DispatchError::Storage)?;
        self.advance(JobState::Downloaded)?;

        let (from, into) = (downloaded.clone(), output_dir.clone());
        let files = tokio::task::spawn_blocking(move || packager::unpack(&from, &into))
            .await
            .map_err(|e| DispatchError::TaskFailed(e.to_string()))??;
        remove_file(&downloaded).await;
        self.advance(JobState::Unpacked)?;

        Ok(DispatchOutcome {
            output_dir,
            execution_id: upload_key.execution_id().to_string(),
            output_key: event.key,
            files,
            resolution,
        })
    }
}

/// Reads `stream` until an event for `execution_id` arrives
///
/// Only created objects count; folder markers (keys ending in `/`) are
/// skipped. With no execution id the first object is accepted. Fails when
/// the stream closes first.
pub async fn wait_for_output(
    stream: &mut dyn EventStream,
    execution_id: Option<&str>,
) -> Result<NotificationEvent> {
    while let Some(event) = stream.next_event().await.map_err(DispatchError::Storage)? {
        let wanted = event.is_created()
            && !event.file_name().is_empty()
            && execution_id.is_none_or(|id| first_match([&event], id).is_some());
        if wanted {
            return Ok(event);
        }
        debug!("Ignoring event {} for {}", event.event_name, event.key);
    }

    Err(DispatchError::StreamClosed {
        execution_id: execution_id.unwrap_or_default().to_string(),
    })
}

async fn remove_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ObjectStore;
    use crate::service::fakes::{AfterScript, FakeCluster, FakeConnector, FakeStore};
    use std::time::Duration;

    struct Fixture {
        tmp: tempfile::TempDir,
        input: PathBuf,
        output: PathBuf,
        cluster: Arc<FakeCluster>,
        store: Arc<FakeStore>,
        connector: Arc<FakeConnector>,
    }

    impl Fixture {
        fn new(cluster: FakeCluster, store: FakeStore) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let input = tmp.path().join("job");
            std::fs::create_dir(&input).unwrap();
            std::fs::write(input.join("a.txt"), "rainfall 42mm\n").unwrap();
            std::fs::write(input.join("b.txt"), "discharge 17m3/s\n").unwrap();

            let store = Arc::new(store);
            Self {
                output: tmp.path().join("out"),
                input,
                cluster: Arc::new(cluster),
                connector: Arc::new(FakeConnector::new(store.clone())),
                store,
                tmp,
            }
        }

        fn dispatcher(&self, timeout: Option<Duration>) -> JobDispatcher {
            let config = DispatchConfig::new("wflow", self.tmp.path(), &self.output)
                .with_timeout(timeout);
            JobDispatcher::new(config, self.cluster.clone(), self.connector.clone())
        }
    }

    fn echo_store(after: AfterScript) -> FakeStore {
        FakeStore::new(&["other/xyz_foo.tar", "out/{id}_foo.tar"], after)
    }

    #[tokio::test]
    async fn test_output_mirrors_input() {
        let fx = Fixture::new(FakeCluster::with_service("wflow"), echo_store(AfterScript::Close));
        let mut dispatcher = fx.dispatcher(None);

        let outcome = dispatcher.submit_and_await(&fx.input).await.unwrap();

        assert_eq!(dispatcher.state(), JobState::Unpacked);
        assert_eq!(outcome.resolution, Resolution::Existing);
        assert_eq!(outcome.output_dir, fx.output);
        assert_eq!(outcome.output_key, format!("out/{}_foo.tar", outcome.execution_id));
        for name in ["a.txt", "b.txt"] {
            assert_eq!(
                std::fs::read(fx.output.join(name)).unwrap(),
                std::fs::read(fx.input.join(name)).unwrap()
            );
        }

        // Only the unpacked files remain; both archives are gone.
        let mut names: Vec<_> = std::fs::read_dir(&fx.output)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(!fx.input.with_extension("tar").exists());
    }

    #[tokio::test]
    async fn test_uploads_once_under_execution_key() {
        let fx = Fixture::new(FakeCluster::with_service("wflow"), echo_store(AfterScript::Close));
        let outcome = fx.dispatcher(None).submit_and_await(&fx.input).await.unwrap();

        let uploads = fx.store.uploaded_keys();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "wflow");
        assert_eq!(uploads[0].1, format!("in/{}_job.tar", outcome.execution_id));
        assert_eq!(
            fx.store.subscriptions(),
            vec![("wflow".to_string(), "out".to_string())]
        );
        assert_eq!(
            fx.connector.providers.lock().unwrap()[0].access_key,
            "service-ak"
        );
    }

    #[tokio::test]
    async fn test_two_submissions_use_distinct_keys() {
        let fx = Fixture::new(FakeCluster::with_service("wflow"), echo_store(AfterScript::Close));

        let first = fx.dispatcher(None).submit_and_await(&fx.input).await.unwrap();
        let second = fx.dispatcher(None).submit_and_await(&fx.input).await.unwrap();

        assert_ne!(first.execution_id, second.execution_id);
        let uploads = fx.store.uploaded_keys();
        assert_eq!(uploads.len(), 2);
        assert_ne!(uploads[0].1, uploads[1].1);
    }

    #[tokio::test]
    async fn test_missing_service_is_created() {
        let fx = Fixture::new(FakeCluster::empty(), echo_store(AfterScript::Close));
        FakeCluster::write_template(fx.tmp.path(), "wflow");

        let outcome = fx.dispatcher(None).submit_and_await(&fx.input).await.unwrap();
        assert_eq!(outcome.resolution, Resolution::Created);
        assert_eq!(fx.cluster.creations(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_cluster_uploads_nothing() {
        let fx = Fixture::new(FakeCluster::unreachable(), echo_store(AfterScript::Close));
        let mut dispatcher = fx.dispatcher(None);

        let err = dispatcher.submit_and_await(&fx.input).await.unwrap_err();
        assert!(matches!(err, DispatchError::ClusterUnreachable { .. }));
        assert_eq!(dispatcher.state(), JobState::Packaged);
        assert!(fx.store.uploaded_keys().is_empty());
        assert!(fx.store.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_stream_closed_without_match() {
        let store = FakeStore::new(&["other/xyz_foo.tar"], AfterScript::Close);
        let fx = Fixture::new(FakeCluster::with_service("wflow"), store);
        let mut dispatcher = fx.dispatcher(None);

        let err = dispatcher.submit_and_await(&fx.input).await.unwrap_err();
        assert!(matches!(err, DispatchError::StreamClosed { .. }));
        assert_eq!(dispatcher.state(), JobState::AwaitingNotification);
        assert!(!fx.output.exists());
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let store = FakeStore::new(&[], AfterScript::Hang);
        let fx = Fixture::new(FakeCluster::with_service("wflow"), store);
        let mut dispatcher = fx.dispatcher(Some(Duration::from_millis(50)));

        let err = dispatcher.submit_and_await(&fx.input).await.unwrap_err();
        assert!(matches!(err, DispatchError::WaitTimedOut(_)));
        assert_eq!(err.exit_code(), 124);
    }

    #[tokio::test]
    async fn test_dispatcher_is_single_use() {
        let fx = Fixture::new(FakeCluster::with_service("wflow"), echo_store(AfterScript::Close));
        let mut dispatcher = fx.dispatcher(None);
        dispatcher.submit_and_await(&fx.input).await.unwrap();

        let err = dispatcher.submit_and_await(&fx.input).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidState {
                from: JobState::Unpacked,
                to: JobState::Packaged
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_contact() {
        let fx = Fixture::new(FakeCluster::with_service("wflow"), echo_store(AfterScript::Close));
        let empty = fx.tmp.path().join("empty");
        std::fs::create_dir(&empty).unwrap();

        let mut dispatcher = fx.dispatcher(None);
        let err = dispatcher.submit_and_await(&empty).await.unwrap_err();
        assert!(matches!(err, DispatchError::Package(packager::PackageError::EmptyInput(_))));
        assert_eq!(dispatcher.state(), JobState::Unsubmitted);
    }

    #[test]
    fn test_advance_rejects_skips() {
        let fx = Fixture::new(FakeCluster::with_service("wflow"), echo_store(AfterScript::Close));
        let mut dispatcher = fx.dispatcher(None);

        assert!(dispatcher.advance(JobState::Uploaded).is_err());
        dispatcher.advance(JobState::Packaged).unwrap();
        assert!(dispatcher.advance(JobState::Packaged).is_err());
        assert_eq!(dispatcher.state(), JobState::Packaged);
    }

    #[tokio::test]
    async fn test_folder_marker_is_not_downloaded() {
        let store = FakeStore::new(&["out/{id}_run/", "out/{id}_foo.tar"], AfterScript::Close);
        let fx = Fixture::new(FakeCluster::with_service("wflow"), store);

        let outcome = fx.dispatcher(None).submit_and_await(&fx.input).await.unwrap();
        assert_eq!(outcome.output_key, format!("out/{}_foo.tar", outcome.execution_id));
        assert!(fx.output.join("a.txt").is_file());
    }

    #[tokio::test]
    async fn test_wait_without_id_takes_first_event() {
        let store = FakeStore::new(&["out/anything.tar"], AfterScript::Close);
        let mut stream = store.subscribe("wflow", "out", &[]).await.unwrap();

        let event = wait_for_output(stream.as_mut(), None).await.unwrap();
        assert_eq!(event.key, "out/anything.tar");
    }
}
