use super::{Bridge, OperationRequest, decode_json};
use crate::core::{OperationKind, Result};
use crate::host::HostCall;
use crate::models::{ReviewAvailability, ReviewOutcome};

impl Bridge {
    pub async fn can_review(&self) -> Result<ReviewAvailability> {
        let kind = OperationKind::CanReview;
        let request = OperationRequest::singleton(kind, HostCall::CanReview);
        self.call(request, |body| decode_json(kind, body)).await
    }

    /// Show the review prompt. `true` when the player left feedback.
    ///
    /// The platform allows one prompt per player; check [`Bridge::can_review`]
    /// first.
    pub async fn request_review(&self) -> Result<bool> {
        let kind = OperationKind::RequestReview;
        let request = OperationRequest::singleton(kind, HostCall::RequestReview);
        self.call(request, |body| {
            decode_json::<ReviewOutcome>(kind, body).map(|outcome| outcome.feedback_sent)
        })
        .await
    }
}
