use super::{Bridge, OperationRequest};
use crate::core::{OperationKind, Result};
use crate::host::HostCall;

impl Bridge {
    /// Show a fullscreen ad and wait until it is closed
    pub async fn show_interstitial_ad(&self) -> Result<()> {
        let request =
            OperationRequest::singleton(OperationKind::InterstitialAd, HostCall::ShowInterstitialAd);
        self.call(request, |_| Ok(())).await
    }

    /// Show a rewarded video. `true` when the player watched it to the end
    /// and should be rewarded.
    pub async fn show_rewarded_ad(&self) -> Result<bool> {
        let request =
            OperationRequest::singleton(OperationKind::RewardedAd, HostCall::ShowRewardedAd);
        self.call(request, |body| Ok(body.is_some_and(|raw| raw.trim() == "true")))
            .await
    }
}
