// THEORY:
// The `monitor` module holds the caller-side policy that sits around the change
// estimator in a forest-threat dashboard: combining a change percentage with an
// intrusion flag into a threat score, counting camera-trap intrusions without
// double-counting a re-submitted photo, and raising/acknowledging alerts.
//
// None of this is part of the estimator. It lives in an explicit `MonitorSession`
// value owned by whichever layer drives the dashboard, rather than in process-wide
// globals. The object detector and the satellite client stay external; they appear
// here only as the `IntrusionDetector` and `ImageryProvider` traits.

pub mod detection;
pub mod imagery;
pub mod session;
pub mod threat;

pub use detection::{DetectionOutcome, IntrusionDetector, THREAT_CLASSES};
pub use imagery::{BoundingBox, DateRange, ImageryProvider, Region};
pub use session::{Fingerprint, IntrusionUpdate, MonitorSession, RegionAnalysis};
pub use threat::{ThreatAssessment, ThreatPolicy};
