// THEORY:
// The `parallel_estimator` runs many independent before/after comparisons at once, for
// example one reserve across a series of date pairs. Each comparison is CPU-bound and
// shares nothing with the others, so the only coordination needed is fan-out and
// ordered fan-in.
//
// Layout:
// - A dispatcher task receives jobs and hands them round-robin to a fixed set of
//   workers (one per CPU by default).
// - Each worker owns a copy of the (stateless) estimator and runs every job on tokio's
//   blocking pool so the async runtime is never stalled by pixel loops.
// - Every job carries its own oneshot reply channel. `estimate_all` awaits the replies
//   in submission order, so results line up with inputs regardless of which worker
//   finished first. A failing job yields an `Err` in its slot and nothing else.
//
// `BatchEstimator::new` spawns tasks and must be called from within a tokio runtime.

use crate::core_modules::frame::frame::Frame;
use crate::error::{EstimateError, InputRole};
use crate::estimator::{ChangeEstimator, ChangeReport, EstimatorConfig};
use image::DynamicImage;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Where one side of a comparison comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Decoded(DynamicImage),
    Encoded(Vec<u8>),
    Path(PathBuf),
}

impl ImageSource {
    fn into_frame(self, input: InputRole) -> Result<Frame, EstimateError> {
        match self {
            ImageSource::Decoded(image) => Frame::from_dynamic(&image, input),
            ImageSource::Encoded(bytes) => Frame::decode(&bytes, input),
            ImageSource::Path(path) => Frame::open(path, input),
        }
    }
}

/// A single before/after pair to compare.
#[derive(Debug, Clone)]
pub struct EstimationJob {
    pub before: ImageSource,
    pub after: ImageSource,
}

impl EstimationJob {
    pub fn new(before: ImageSource, after: ImageSource) -> Self {
        Self { before, after }
    }

    fn run(self, estimator: &ChangeEstimator) -> Result<ChangeReport, EstimateError> {
        let before = self.before.into_frame(InputRole::Before)?;
        let after = self.after.into_frame(InputRole::After)?;
        Ok(estimator.estimate_frames(&before, &after))
    }
}

struct EstimationTask {
    job: EstimationJob,
    result_sender: oneshot::Sender<Result<ChangeReport, EstimateError>>,
}

struct WorkerPool {
    task_sender: mpsc::UnboundedSender<EstimationTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    fn new(estimator: ChangeEstimator, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<EstimationTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<EstimationTask>())
            .unzip();

        // Dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!(worker = worker_idx, "estimation worker is gone, dropping task");
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for (worker_idx, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let EstimationTask { job, result_sender } = task;
                    let result = tokio::task::spawn_blocking(move || job.run(&estimator))
                        .await
                        .map_err(EstimateError::from)
                        .and_then(|result| result);
                    if let Err(err) = &result {
                        debug!(worker = worker_idx, error = %err, "estimation job failed");
                    }
                    // The caller may have stopped waiting; nothing to do then.
                    let _ = result_sender.send(result);
                }
            });
            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    fn submit(
        &self,
        job: EstimationJob,
    ) -> Result<oneshot::Receiver<Result<ChangeReport, EstimateError>>, EstimateError> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(EstimationTask { job, result_sender })
            .map_err(|_| EstimateError::PoolClosed)?;
        Ok(result_receiver)
    }
}

/// Runs independent estimations concurrently on a fixed pool of workers.
pub struct BatchEstimator {
    estimator: ChangeEstimator,
    worker_pool: WorkerPool,
}

impl BatchEstimator {
    /// One worker per logical CPU.
    pub fn new(config: EstimatorConfig) -> Result<Self, EstimateError> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: EstimatorConfig, worker_count: usize) -> Result<Self, EstimateError> {
        let estimator = ChangeEstimator::new(config)?;
        Ok(Self {
            estimator,
            worker_pool: WorkerPool::new(estimator, worker_count),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.workers.len()
    }

    pub fn config(&self) -> &EstimatorConfig {
        self.estimator.config()
    }

    pub async fn estimate(&self, job: EstimationJob) -> Result<ChangeReport, EstimateError> {
        let receiver = self.worker_pool.submit(job)?;
        receiver
            .await
            .unwrap_or_else(|_| Err(EstimateError::PoolClosed))
    }

    /// Estimates every job; the result vector is in the same order as `jobs`.
    pub async fn estimate_all(
        &self,
        jobs: Vec<EstimationJob>,
    ) -> Vec<Result<ChangeReport, EstimateError>> {
        let pending: Vec<_> = jobs
            .into_iter()
            .map(|job| self.worker_pool.submit(job))
            .collect();

        futures::future::join_all(pending.into_iter().map(|submitted| async move {
            match submitted {
                Ok(receiver) => receiver
                    .await
                    .unwrap_or_else(|_| Err(EstimateError::PoolClosed)),
                Err(err) => Err(err),
            }
        }))
        .await
    }
}

impl Drop for BatchEstimator {
    fn drop(&mut self) {
        for worker in &self.worker_pool.workers {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::TargetSize;
    use image::{Rgb, RgbImage};

    fn solid(rgb: [u8; 3]) -> ImageSource {
        ImageSource::Decoded(DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb(rgb))))
    }

    fn half_changed() -> ImageSource {
        let mut image = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        for y in 0..20 {
            for x in 0..40 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        ImageSource::Decoded(DynamicImage::ImageRgb8(image))
    }

    fn config() -> EstimatorConfig {
        EstimatorConfig {
            target_size: TargetSize::new(40, 40),
            ..EstimatorConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn results_follow_submission_order() {
        let batch = BatchEstimator::with_workers(config(), 3).expect("batch estimator");
        assert_eq!(batch.worker_count(), 3);

        let jobs = vec![
            EstimationJob::new(solid([0, 0, 0]), solid([255, 255, 255])),
            EstimationJob::new(solid([0, 0, 0]), solid([0, 0, 0])),
            EstimationJob::new(solid([0, 0, 0]), half_changed()),
            EstimationJob::new(solid([9, 9, 9]), solid([9, 9, 9])),
            EstimationJob::new(solid([0, 0, 0]), solid([255, 255, 255])),
        ];
        let percents: Vec<f64> = batch
            .estimate_all(jobs)
            .await
            .into_iter()
            .map(|r| r.expect("estimate").change_percent)
            .collect();

        assert_eq!(percents, vec![100.0, 0.0, 50.0, 0.0, 100.0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_job_does_not_affect_others() {
        let batch = BatchEstimator::with_workers(config(), 2).expect("batch estimator");
        let jobs = vec![
            EstimationJob::new(solid([0, 0, 0]), half_changed()),
            EstimationJob::new(ImageSource::Encoded(b"junk".to_vec()), solid([0, 0, 0])),
            EstimationJob::new(
                solid([0, 0, 0]),
                ImageSource::Path(PathBuf::from("/nonexistent/after.png")),
            ),
        ];
        let results = batch.estimate_all(jobs).await;

        assert_eq!(results[0].as_ref().expect("estimate").change_percent, 50.0);
        assert_eq!(results[1].as_ref().unwrap_err().input(), Some(InputRole::Before));
        assert_eq!(results[2].as_ref().unwrap_err().input(), Some(InputRole::After));
    }

    #[tokio::test]
    async fn single_job_matches_direct_estimate() {
        let batch = BatchEstimator::new(config()).expect("batch estimator");
        assert!(batch.worker_count() >= 1);

        let job = EstimationJob::new(solid([0, 0, 0]), half_changed());
        let direct = job.clone().run(&ChangeEstimator::new(config()).expect("estimator"))
            .expect("estimate");
        let pooled = batch.estimate(job).await.expect("estimate");
        assert_eq!(direct, pooled);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let result = BatchEstimator::new(EstimatorConfig {
            target_size: TargetSize::new(0, 0),
            ..EstimatorConfig::default()
        });
        assert!(matches!(result, Err(EstimateError::TargetSize { .. })));
    }
}
