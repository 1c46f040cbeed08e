use super::types::ReturnProfile;

pub const EQUITY_PROFILE: ReturnProfile = ReturnProfile {
    mean_annual_return: 0.07,
    annual_volatility: 0.18,
};

pub const BOND_PROFILE: ReturnProfile = ReturnProfile {
    mean_annual_return: 0.02,
    annual_volatility: 0.04,
};

/// Linear interpolation between the bond and equity profiles.
///
/// This is a modeling assumption, not a portfolio-theory blend: there is no
/// correlation term, so volatility scales linearly with the equity share.
pub fn blended_profile(equity_fraction: f64) -> ReturnProfile {
    let w = if equity_fraction.is_nan() {
        0.0
    } else {
        equity_fraction.clamp(0.0, 1.0)
    };
    ReturnProfile {
        mean_annual_return: blend(
            BOND_PROFILE.mean_annual_return,
            EQUITY_PROFILE.mean_annual_return,
            w,
        ),
        annual_volatility: blend(
            BOND_PROFILE.annual_volatility,
            EQUITY_PROFILE.annual_volatility,
            w,
        ),
    }
}

/// `bond + (equity - bond) * w`, shared with the historical series blend.
pub(crate) fn blend(bond: f64, equity: f64, w: f64) -> f64 {
    bond + (equity - bond) * w
}
