//! engine::download
//!
//! Bounded-concurrency archive downloads.
//!
//! # Per-task lifecycle
//!
//! ```text
//! Pending -> SlotAcquired -> RequestSent -> Skipped | Written | Fatal
//! ```
//!
//! Before waiting for a slot a task creates its owner directory and removes
//! any archive left at its target by an earlier run. It holds one of the
//! `concurrency` semaphore permits from the request until its body is
//! written. A refused archive (non-200) is logged and skipped. A failure
//! while streaming an accepted archive is fatal: the remaining tasks are
//! aborted and the error is returned.
//!
//! Every task advances the shared progress counter exactly once.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::BackupError;
use crate::core::paths::BackupPaths;
use crate::core::types::{ArchiveFormat, DownloadTask, RepositoryDescriptor};
use crate::forge::{ArchiveResponse, ArchiveStream, Forge};
use crate::ui::progress::DownloadProgress;

/// How one download task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The archive was written to its target.
    Written {
        /// Bytes written
        bytes: u64,
    },
    /// The forge refused the archive; nothing was written.
    Skipped {
        /// Final HTTP status
        status: u16,
    },
}

/// Totals over all download tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Archives written
    pub written: usize,
    /// Archives skipped
    pub skipped: usize,
    /// Bytes written across all archives
    pub bytes: u64,
    /// Tasks the progress counter saw finish
    pub progressed: usize,
}

impl DownloadSummary {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Written { bytes } => {
                self.written += 1;
                self.bytes += bytes;
            }
            TaskOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// One download task per resolved branch, in discovery order.
pub fn plan_downloads(
    descriptors: Vec<RepositoryDescriptor>,
    paths: &BackupPaths,
    format: ArchiveFormat,
) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();

    for descriptor in descriptors {
        let repository = Arc::new(descriptor);
        for branch in &repository.branches {
            tasks.push(DownloadTask {
                repository: Arc::clone(&repository),
                branch: branch.clone(),
                target: paths.archive_path(
                    &repository.owner_login,
                    &repository.name,
                    branch,
                    format,
                ),
            });
        }
    }

    tasks
}

/// Downloads branch archives with at most `concurrency` in flight.
pub struct ArchiveDownloader {
    forge: Arc<dyn Forge>,
    slots: Arc<Semaphore>,
    format: ArchiveFormat,
}

impl ArchiveDownloader {
    /// Create a downloader with `concurrency` slots (at least one).
    pub fn new(forge: Arc<dyn Forge>, concurrency: usize, format: ArchiveFormat) -> Self {
        Self {
            forge,
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
            format,
        }
    }

    /// Run every task to completion.
    ///
    /// # Errors
    ///
    /// Returns the first fatal task error after aborting the others.
    pub async fn download_all(
        &self,
        tasks: Vec<DownloadTask>,
    ) -> Result<DownloadSummary, BackupError> {
        let progress = Arc::new(DownloadProgress::new(tasks.len()));
        let mut set = JoinSet::new();

        for task in tasks {
            let forge = Arc::clone(&self.forge);
            let slots = Arc::clone(&self.slots);
            let progress = Arc::clone(&progress);
            let format = self.format;

            set.spawn(async move {
                let outcome = download_one(forge.as_ref(), &slots, format, &task).await;
                progress.advance(&format!("{}@{}", task.full_name(), task.branch));
                outcome
            });
        }

        let mut summary = DownloadSummary::default();
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    set.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    set.abort_all();
                    return Err(BackupError::TaskFailed(join_err.to_string()));
                }
            };
            summary.record(outcome);
        }

        summary.progressed = progress.done();
        Ok(summary)
    }
}

/// Download a single archive.
async fn download_one(
    forge: &dyn Forge,
    slots: &Semaphore,
    format: ArchiveFormat,
    task: &DownloadTask,
) -> Result<TaskOutcome, BackupError> {
    prepare_target(&task.target).await?;

    let _permit = slots
        .acquire()
        .await
        .map_err(|_| BackupError::TaskFailed("download slots closed".into()))?;

    let response = forge
        .fetch_archive(task.full_name(), &task.branch, format)
        .await
        .map_err(|source| BackupError::FetchArchive {
            full_name: task.full_name().to_string(),
            branch: task.branch.clone(),
            source,
        })?;

    match response {
        ArchiveResponse::Unavailable { url, status, body } => {
            tracing::warn!(%url, status, %body, "archive unavailable, skipping");
            Ok(TaskOutcome::Skipped { status })
        }
        ArchiveResponse::Ready(stream) => {
            let bytes = write_archive(stream, task).await?;
            tracing::debug!(path = %task.target.display(), bytes, "archive written");
            Ok(TaskOutcome::Written { bytes })
        }
    }
}

/// Create the target's parent directories and remove a stale archive.
async fn prepare_target(target: &Path) -> Result<(), BackupError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(parent, source))?;
    }

    match tokio::fs::remove_file(target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(io_error(target, source)),
    }
}

/// Stream an accepted archive body into a fresh file.
async fn write_archive(mut stream: ArchiveStream, task: &DownloadTask) -> Result<u64, BackupError> {
    let mut file = tokio::fs::File::create(&task.target)
        .await
        .map_err(|source| io_error(&task.target, source))?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| BackupError::Stream {
            full_name: task.full_name().to_string(),
            branch: task.branch.clone(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|source| io_error(&task.target, source))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|source| io_error(&task.target, source))?;

    Ok(written)
}

fn io_error(path: &Path, source: std::io::Error) -> BackupError {
    BackupError::Io {
        path: PathBuf::from(path),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{MockArchive, MockForge};
    use std::time::Duration;
    use tempfile::TempDir;

    fn descriptor(owner: &str, name: &str, branches: &[&str]) -> RepositoryDescriptor {
        RepositoryDescriptor::new(name, owner, format!("{}/{}", owner, name))
            .with_branches(branches.iter().map(|b| b.to_string()).collect())
    }

    mod planning {
        use super::*;

        #[test]
        fn one_task_per_branch() {
            let paths = BackupPaths::new("/backups");
            let tasks = plan_downloads(
                vec![
                    descriptor("o", "a", &["main", "dev"]),
                    descriptor("o", "b", &[]),
                    descriptor("p", "c", &["x", "y", "z"]),
                ],
                &paths,
                ArchiveFormat::Tarball,
            );

            assert_eq!(tasks.len(), 5);
            assert_eq!(tasks[0].full_name(), "o/a");
            assert_eq!(tasks[0].branch, "main");
            assert_eq!(
                tasks[0].target,
                PathBuf::from("/backups/data/o/a-main.tar.gz")
            );
            assert_eq!(tasks[4].target, PathBuf::from("/backups/data/p/c-z.tar.gz"));
        }

        #[test]
        fn tasks_share_descriptor() {
            let paths = BackupPaths::new("/backups");
            let tasks = plan_downloads(
                vec![descriptor("o", "a", &["main", "dev"])],
                &paths,
                ArchiveFormat::Zipball,
            );
            assert!(Arc::ptr_eq(&tasks[0].repository, &tasks[1].repository));
            assert_eq!(tasks[1].target, PathBuf::from("/backups/data/o/a-dev.zip"));
        }
    }

    mod downloading {
        use super::*;

        fn setup(mock: MockForge, concurrency: usize) -> ArchiveDownloader {
            ArchiveDownloader::new(Arc::new(mock), concurrency, ArchiveFormat::Tarball)
        }

        #[tokio::test]
        async fn writes_every_archive() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let tasks = plan_downloads(
                vec![descriptor("o", "a", &["main", "feature/nested"])],
                &paths,
                ArchiveFormat::Tarball,
            );

            let summary = setup(MockForge::new(), 2)
                .download_all(tasks)
                .await
                .unwrap();

            assert_eq!(summary.written, 2);
            assert_eq!(summary.skipped, 0);
            let main = std::fs::read(temp.path().join("data/o/a-main.tar.gz")).unwrap();
            assert_eq!(main, b"o/a@main");
            assert!(temp.path().join("data/o/a-feature/nested.tar.gz").exists());
        }

        #[tokio::test]
        async fn stale_archive_is_replaced() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let target = paths.archive_path("o", "a", "main", ArchiveFormat::Tarball);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(&target, b"an older and much longer archive body").unwrap();

            let tasks = plan_downloads(
                vec![descriptor("o", "a", &["main"])],
                &paths,
                ArchiveFormat::Tarball,
            );
            setup(MockForge::new(), 1)
                .download_all(tasks)
                .await
                .unwrap();

            assert_eq!(std::fs::read(&target).unwrap(), b"o/a@main");
        }

        #[tokio::test]
        async fn refused_archive_is_skipped() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let mock = MockForge::new().with_archive(
                "o/a",
                "gone",
                MockArchive::Status {
                    status: 404,
                    body: "Not Found".into(),
                },
            );
            let tasks = plan_downloads(
                vec![descriptor("o", "a", &["main", "gone", "dev"])],
                &paths,
                ArchiveFormat::Tarball,
            );

            let summary = setup(mock, 3).download_all(tasks).await.unwrap();

            assert_eq!(summary.written, 2);
            assert_eq!(summary.skipped, 1);
            assert!(!temp.path().join("data/o/a-gone.tar.gz").exists());
            assert!(temp.path().join("data/o/a-main.tar.gz").exists());
            assert!(temp.path().join("data/o/a-dev.tar.gz").exists());
        }

        #[tokio::test]
        async fn stream_failure_is_fatal() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let mock = MockForge::new().with_archive("o/a", "main", MockArchive::BrokenStream);
            let tasks = plan_downloads(
                vec![descriptor("o", "a", &["main"])],
                &paths,
                ArchiveFormat::Tarball,
            );

            let err = setup(mock, 1).download_all(tasks).await.unwrap_err();
            assert!(matches!(err, BackupError::Stream { .. }));
        }

        #[tokio::test]
        async fn in_flight_never_exceeds_slots() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let mock = MockForge::new().with_archive_delay(Duration::from_millis(20));
            let branches: Vec<String> = (0..12).map(|i| format!("b{}", i)).collect();
            let refs: Vec<&str> = branches.iter().map(String::as_str).collect();
            let tasks = plan_downloads(
                vec![descriptor("o", "a", &refs)],
                &paths,
                ArchiveFormat::Tarball,
            );

            let summary = setup(mock.clone(), 3).download_all(tasks).await.unwrap();

            assert_eq!(summary.written, 12);
            assert_eq!(mock.archive_requests(), 12);
            assert_eq!(mock.max_in_flight(), 3);
        }

        #[tokio::test]
        async fn slot_is_held_while_body_streams() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let mock = MockForge::new().with_archive_delay(Duration::from_millis(10));
            let tasks = plan_downloads(
                vec![descriptor("o", "a", &["b0", "b1", "b2", "b3", "b4", "b5"])],
                &paths,
                ArchiveFormat::Tarball,
            );

            setup(mock.clone(), 1).download_all(tasks).await.unwrap();

            assert_eq!(mock.max_in_flight(), 1);
        }

        #[tokio::test]
        async fn progress_advances_once_per_task() {
            let temp = TempDir::new().unwrap();
            let paths = BackupPaths::new(temp.path());
            let mock = MockForge::new()
                .with_archive(
                    "o/a",
                    "gone",
                    MockArchive::Status {
                        status: 404,
                        body: "Not Found".into(),
                    },
                )
                .with_archive(
                    "p/b",
                    "main",
                    MockArchive::Status {
                        status: 451,
                        body: "Unavailable For Legal Reasons".into(),
                    },
                );
            let tasks = plan_downloads(
                vec![
                    descriptor("o", "a", &["main", "gone", "dev"]),
                    descriptor("p", "b", &["main"]),
                ],
                &paths,
                ArchiveFormat::Tarball,
            );
            let count = tasks.len();

            let summary = setup(mock, 2).download_all(tasks).await.unwrap();

            assert_eq!(summary.written, 2);
            assert_eq!(summary.skipped, 2);
            assert_eq!(summary.progressed, count);
        }

        #[tokio::test]
        async fn no_tasks() {
            let summary = setup(MockForge::new(), 4)
                .download_all(Vec::new())
                .await
                .unwrap();
            assert_eq!(summary, DownloadSummary::default());
            assert_eq!(summary.progressed, 0);
        }
    }
}
