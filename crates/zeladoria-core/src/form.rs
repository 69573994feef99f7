//! Report form state and the two user actions it supports.
//!
//! `ReportForm` owns the draft and the current `SubmissionStatus`. Both
//! actions take `&self` so a front end can fire them from independent tasks:
//! location captures are not serialized (the last one to resolve wins), while
//! submissions go through a single-slot in-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ReportPayload, ReportTransport};
use crate::location::Locator;
use crate::models::status::MISSING_PHOTO_OR_LOCATION;
use crate::models::{NetworkFailure, Photo, ReportDraft, SubmissionStatus};

#[derive(Debug, Default)]
struct FormState {
    draft: ReportDraft,
    status: SubmissionStatus,
}

/// Marks a submission as outstanding until dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Transient view state of the report form.
/// Clone is cheap and clones share the same state.
#[derive(Clone, Default)]
pub struct ReportForm {
    state: Arc<Mutex<FormState>>,
    submitting: Arc<AtomicBool>,
}

impl ReportForm {
    pub fn new(draft: ReportDraft) -> Self {
        Self {
            state: Arc::new(Mutex::new(FormState {
                draft,
                status: SubmissionStatus::Idle,
            })),
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn status(&self) -> SubmissionStatus {
        self.state.lock().await.status.clone()
    }

    pub async fn draft(&self) -> ReportDraft {
        self.state.lock().await.draft.clone()
    }

    pub async fn set_photo(&self, photo: Option<Photo>) {
        self.state.lock().await.draft.photo = photo;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    async fn set_status(&self, status: SubmissionStatus) {
        self.state.lock().await.status = status;
    }

    /// Ask the locator for the current position and store it in the draft.
    ///
    /// Failures only show up in the status; the previous position, if any,
    /// is kept. Returns the status this call left behind.
    pub async fn capture_location(&self, locator: &dyn Locator) -> SubmissionStatus {
        self.set_status(SubmissionStatus::CapturingLocation).await;

        let result = locator.current_position().await;

        let mut state = self.state.lock().await;
        let status = match result {
            Ok(coordinate) => {
                debug!(
                    latitude = coordinate.latitude,
                    longitude = coordinate.longitude,
                    "Location captured"
                );
                state.draft.coordinate = Some(coordinate);
                SubmissionStatus::LocationCaptured
            }
            Err(e) => {
                warn!(error = %e, "Location capture failed");
                SubmissionStatus::LocationError(e)
            }
        };
        state.status = status.clone();
        status
    }

    /// Validate the draft and send it through `transport`.
    ///
    /// A draft without photo or position fails locally and no request is made.
    /// While another submission is outstanding this returns the current
    /// status without sending anything.
    pub async fn submit(&self, transport: &dyn ReportTransport) -> SubmissionStatus {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            warn!("Submission already in flight, ignoring");
            return self.status().await;
        };

        let payload = {
            let mut state = self.state.lock().await;
            match ReportPayload::from_draft(&state.draft) {
                Some(payload) => {
                    state.status = SubmissionStatus::Submitting;
                    payload
                }
                None => {
                    debug!(
                        has_photo = state.draft.photo.is_some(),
                        has_location = state.draft.coordinate.is_some(),
                        "Draft incomplete, not submitting"
                    );
                    state.status =
                        SubmissionStatus::ValidationError(MISSING_PHOTO_OR_LOCATION.to_string());
                    return state.status.clone();
                }
            }
        };

        let result = transport.send_report(payload).await;

        let mut state = self.state.lock().await;
        let status = match result {
            Ok(()) => {
                info!(category = state.draft.category, "Report accepted");
                state.draft.clear_after_submit();
                SubmissionStatus::Success
            }
            Err(ApiError::Rejected { status, body }) => {
                warn!(status, body = %body, "Report rejected by server");
                SubmissionStatus::NetworkError(NetworkFailure::Rejected { status })
            }
            Err(ApiError::NetworkError(reason)) => {
                warn!(error = %reason, "Report request failed");
                SubmissionStatus::NetworkError(NetworkFailure::Connection(reason))
            }
            Err(ApiError::InvalidRequest(reason)) => {
                warn!(error = %reason, "Report could not be encoded");
                SubmissionStatus::ValidationError(format!(
                    "Não foi possível preparar o envio: {}",
                    reason
                ))
            }
        };
        state.status = status.clone();
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationError;
    use crate::models::Coordinate;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct RecordingTransport {
        sent: StdMutex<Vec<ReportPayload>>,
        response: Result<(), ApiError>,
        delay: Duration,
    }

    impl RecordingTransport {
        fn new(response: Result<(), ApiError>) -> Self {
            Self {
                sent: StdMutex::new(Vec::new()),
                response,
                delay: Duration::ZERO,
            }
        }

        fn sent(&self) -> Vec<ReportPayload> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportTransport for RecordingTransport {
        async fn send_report(&self, payload: ReportPayload) -> Result<(), ApiError> {
            self.sent.lock().unwrap().push(payload);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }
    }

    struct DelayedLocator {
        delay: Duration,
        result: Result<Coordinate, LocationError>,
    }

    #[async_trait]
    impl Locator for DelayedLocator {
        async fn current_position(&self) -> Result<Coordinate, LocationError> {
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    fn photo() -> Photo {
        Photo::new("buraco.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn complete_form() -> ReportForm {
        let mut draft = ReportDraft::new(1, "Buraco na esquina");
        draft.photo = Some(photo());
        draft.coordinate = Some(Coordinate::new(-22.9, -42.0));
        ReportForm::new(draft)
    }

    #[tokio::test]
    async fn test_submit_without_photo_or_location_sends_nothing() {
        let form = ReportForm::new(ReportDraft::new(1, "Buraco"));
        let transport = RecordingTransport::new(Ok(()));

        let status = form.submit(&transport).await;

        assert!(matches!(status, SubmissionStatus::ValidationError(_)));
        assert_eq!(status.message(), MISSING_PHOTO_OR_LOCATION);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_location_but_no_photo_sends_nothing() {
        let mut draft = ReportDraft::new(1, "Buraco");
        draft.coordinate = Some(Coordinate::new(-22.9, -42.0));
        let form = ReportForm::new(draft);
        let transport = RecordingTransport::new(Ok(()));

        let status = form.submit(&transport).await;

        assert!(matches!(status, SubmissionStatus::ValidationError(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_submit_sends_numeric_coordinates() {
        let form = complete_form();
        let transport = RecordingTransport::new(Ok(()));

        form.submit(&transport).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let payload = &sent[0];
        assert_eq!(payload.field_names().len(), 5);
        assert_eq!(payload.latitude, -22.9);
        assert_eq!(payload.longitude, -42.0);
        assert_eq!(payload.photo, photo());
    }

    #[tokio::test]
    async fn test_success_clears_description_and_photo_only() {
        let form = complete_form();
        let transport = RecordingTransport::new(Ok(()));

        let status = form.submit(&transport).await;

        assert_eq!(status, SubmissionStatus::Success);
        let draft = form.draft().await;
        assert!(draft.description.is_empty());
        assert!(draft.photo.is_none());
        assert_eq!(draft.category, 1);
        assert_eq!(draft.coordinate, Some(Coordinate::new(-22.9, -42.0)));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_rejection_keeps_draft() {
        let form = complete_form();
        let before = form.draft().await;
        let transport = RecordingTransport::new(Err(ApiError::Rejected {
            status: 400,
            body: "{}".to_string(),
        }));

        let status = form.submit(&transport).await;

        assert_eq!(
            status,
            SubmissionStatus::NetworkError(NetworkFailure::Rejected { status: 400 })
        );
        assert!(status.message().contains("tente novamente"));
        assert_eq!(form.draft().await, before);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_reports_connection_error() {
        let form = complete_form();
        let transport = RecordingTransport::new(Err(ApiError::NetworkError(
            "connection refused".to_string(),
        )));

        let status = form.submit(&transport).await;

        assert!(matches!(
            status,
            SubmissionStatus::NetworkError(NetworkFailure::Connection(_))
        ));
        assert_eq!(status.message(), "Erro de conexão com o servidor.");
        assert!(form.draft().await.photo.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_guarded() {
        let form = complete_form();
        let mut transport = RecordingTransport::new(Ok(()));
        transport.delay = Duration::from_millis(100);

        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            form.submit(&transport).await
        };
        let (first, second) = tokio::join!(form.submit(&transport), second);

        assert_eq!(first, SubmissionStatus::Success);
        assert_eq!(second, SubmissionStatus::Submitting);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_location_success() {
        let form = ReportForm::default();
        let locator = DelayedLocator {
            delay: Duration::ZERO,
            result: Ok(Coordinate::new(-22.92, -42.82)),
        };

        let status = form.capture_location(&locator).await;

        assert_eq!(status, SubmissionStatus::LocationCaptured);
        assert_eq!(form.draft().await.coordinate, Some(Coordinate::new(-22.92, -42.82)));
    }

    #[tokio::test]
    async fn test_capture_location_failure_keeps_previous_position() {
        let mut draft = ReportDraft::new(1, "");
        draft.coordinate = Some(Coordinate::new(-22.9, -42.0));
        let form = ReportForm::new(draft);
        let locator = DelayedLocator {
            delay: Duration::ZERO,
            result: Err(LocationError::PermissionDenied),
        };

        let status = form.capture_location(&locator).await;

        assert_eq!(status, SubmissionStatus::LocationError(LocationError::PermissionDenied));
        assert_eq!(form.draft().await.coordinate, Some(Coordinate::new(-22.9, -42.0)));
    }

    #[tokio::test]
    async fn test_last_location_callback_wins() {
        let form = ReportForm::default();
        let slow_success = DelayedLocator {
            delay: Duration::from_millis(80),
            result: Ok(Coordinate::new(-22.9, -42.0)),
        };
        let fast_failure = DelayedLocator {
            delay: Duration::from_millis(10),
            result: Err(LocationError::Timeout),
        };

        tokio::join!(
            form.capture_location(&slow_success),
            form.capture_location(&fast_failure)
        );

        assert_eq!(form.status().await, SubmissionStatus::LocationCaptured);

        let slow_failure = DelayedLocator {
            delay: Duration::from_millis(80),
            result: Err(LocationError::Unsupported),
        };
        let fast_success = DelayedLocator {
            delay: Duration::from_millis(10),
            result: Ok(Coordinate::new(-23.0, -43.0)),
        };

        tokio::join!(
            form.capture_location(&slow_failure),
            form.capture_location(&fast_success)
        );

        assert_eq!(
            form.status().await,
            SubmissionStatus::LocationError(LocationError::Unsupported)
        );
        assert_eq!(form.draft().await.coordinate, Some(Coordinate::new(-23.0, -43.0)));
    }
}
