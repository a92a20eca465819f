//! Maps `Box<dyn Error>` from trait boundaries to typed `CruiseError`.
//!
//! The traits in `cruise_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `cruise_hardware::HwError` downcasting.

use crate::error::CruiseError;

/// Map a trait-boundary error to a typed `CruiseError`.
///
/// Known hardware error types are downcast first; anything else falls back
/// to string heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> CruiseError {
    #[cfg(feature = "hardware-errors")]
    {
        use cruise_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => CruiseError::Timeout,
                HwError::NoData { .. } | HwError::Malformed(_) | HwError::Simulated(_) => {
                    CruiseError::Hardware(hw.to_string())
                }
                other => CruiseError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        CruiseError::Timeout
    } else {
        CruiseError::Hardware(s)
    }
}
