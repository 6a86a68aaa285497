use crate::config::Settings;
use crate::core_modules::frame::frame::Frame;
use crate::error::{EstimateError, InputRole, MonitorError};
use crate::estimator::{ChangeEstimator, ChangeReport};
use crate::monitor::detection::{DetectionOutcome, IntrusionDetector, PERSON_CLASS};
use crate::monitor::imagery::{BoundingBox, DateRange, ImageryProvider};
use crate::monitor::threat::{ThreatAssessment, ThreatPolicy};
use image::DynamicImage;
use siphasher::sip::SipHasher;
use std::hash::Hasher;
use tracing::{debug, info};

/// Content fingerprint of an uploaded image, used to avoid counting the same
/// photo twice when it is submitted again. SipHash-2-4 with fixed zero keys,
/// so the same bytes give the same digest in every process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = SipHasher::new();
        hasher.write(bytes);
        Fingerprint(hasher.finish())
    }
}

/// What recording one camera-trap detection changed in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrusionUpdate {
    pub intrusion: bool,
    /// People added to the running count by this detection.
    pub newly_counted: u64,
    /// True when the image matched the last counted intrusion and was skipped.
    pub duplicate: bool,
}

/// Output of a satellite before/after analysis for one region.
#[derive(Debug, Clone)]
pub struct RegionAnalysis {
    pub before: DynamicImage,
    pub after: DynamicImage,
    pub report: ChangeReport,
    pub assessment: ThreatAssessment,
    pub monitoring_days: i64,
}

/// Per-operator dashboard state: intrusion flag, running intrusion count and the
/// alert banner.
#[derive(Debug, Clone)]
pub struct MonitorSession {
    estimator: ChangeEstimator,
    policy: ThreatPolicy,
    intrusion: bool,
    alert_active: bool,
    person_count: u64,
    last_counted: Option<Fingerprint>,
}

impl MonitorSession {
    pub fn new(estimator: ChangeEstimator, policy: ThreatPolicy) -> Self {
        Self {
            estimator,
            policy,
            intrusion: false,
            alert_active: false,
            person_count: 0,
            last_counted: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, EstimateError> {
        Ok(Self::new(
            ChangeEstimator::new(settings.estimator)?,
            settings.threat,
        ))
    }

    pub fn intrusion_active(&self) -> bool {
        self.intrusion
    }

    pub fn alert_active(&self) -> bool {
        self.alert_active
    }

    pub fn person_count(&self) -> u64 {
        self.person_count
    }

    pub fn policy(&self) -> &ThreatPolicy {
        &self.policy
    }

    /// Folds a detection result into the session.
    ///
    /// The intrusion flag always mirrors the latest detection. People are only
    /// counted for an intrusion whose image differs from the last counted one.
    pub fn record_detection(
        &mut self,
        fingerprint: Fingerprint,
        outcome: &DetectionOutcome,
    ) -> IntrusionUpdate {
        let intrusion = outcome.is_intrusion();
        self.intrusion = intrusion;

        if !intrusion {
            debug!(labels = ?outcome.labels, "no intrusion in camera-trap image");
            return IntrusionUpdate {
                intrusion,
                newly_counted: 0,
                duplicate: false,
            };
        }

        self.alert_active = true;
        if self.last_counted == Some(fingerprint) {
            debug!(?fingerprint, "intrusion image already counted");
            return IntrusionUpdate {
                intrusion,
                newly_counted: 0,
                duplicate: true,
            };
        }

        let newly_counted = outcome.count(PERSON_CLASS) as u64;
        self.person_count += newly_counted;
        self.last_counted = Some(fingerprint);
        info!(
            newly_counted,
            total = self.person_count,
            "intrusion detected in protected zone"
        );
        IntrusionUpdate {
            intrusion,
            newly_counted,
            duplicate: false,
        }
    }

    /// Decodes an uploaded camera-trap photo, runs the detector on it and records
    /// the result.
    pub fn inspect_camera_trap<D: IntrusionDetector>(
        &mut self,
        detector: &D,
        upload: &[u8],
    ) -> Result<(DetectionOutcome, IntrusionUpdate), MonitorError> {
        let image = image::load_from_memory(upload).map_err(|source| EstimateError::Decode {
            input: InputRole::CameraTrap,
            source,
        })?;
        // Rejects zero-area uploads the same way the estimator does.
        Frame::from_dynamic(&image, InputRole::CameraTrap)?;

        let outcome = detector
            .detect(&image)
            .map_err(|err| MonitorError::Detection(Box::new(err)))?;
        let update = self.record_detection(Fingerprint::of(upload), &outcome);
        Ok((outcome, update))
    }

    /// Scores a change percentage against the current intrusion flag, raising the
    /// alert when the policy threshold is reached.
    pub fn assess_change(&mut self, change_percent: f64) -> ThreatAssessment {
        let assessment = self.policy.assess(change_percent, self.intrusion);
        if assessment.alert {
            self.alert_active = true;
            info!(
                score = assessment.score,
                change_percent,
                intrusion = self.intrusion,
                "high threat score"
            );
        }
        assessment
    }

    /// Fetches imagery for the first and last day of `range`, estimates the change
    /// between them and scores it.
    pub fn analyze_region<P: ImageryProvider>(
        &mut self,
        provider: &P,
        bbox: &BoundingBox,
        range: DateRange,
    ) -> Result<RegionAnalysis, MonitorError> {
        let before = provider
            .fetch(bbox, range.start, range.start)
            .map_err(|err| MonitorError::Imagery(Box::new(err)))?;
        let after = provider
            .fetch(bbox, range.end, range.end)
            .map_err(|err| MonitorError::Imagery(Box::new(err)))?;

        let report = self.estimator.estimate(&before, &after)?;
        let assessment = self.assess_change(report.change_percent);
        debug!(
            %bbox,
            start = %range.start,
            end = %range.end,
            change_percent = report.change_percent,
            "region analysed"
        );

        Ok(RegionAnalysis {
            before,
            after,
            report,
            assessment,
            monitoring_days: range.monitoring_days(),
        })
    }

    pub fn acknowledge_alert(&mut self) {
        if self.alert_active {
            info!("alert acknowledged");
        }
        self.alert_active = false;
    }
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self::new(ChangeEstimator::default(), ThreatPolicy::default())
    }
}
