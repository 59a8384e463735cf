//! Risk vectors.

use serde::{Deserialize, Serialize};

/// The four scored risk factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskFactor {
    /// Heat stress.
    Heatwave,
    /// Air pollution.
    AirQuality,
    /// Ultraviolet exposure.
    UvExposure,
    /// Climate-sensitive disease.
    Disease,
}

impl RiskFactor {
    /// All factors in display order.
    pub const ALL: [Self; 4] = [
        Self::Heatwave,
        Self::AirQuality,
        Self::UvExposure,
        Self::Disease,
    ];

    /// Returns the factor as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heatwave => "heatwave",
            Self::AirQuality => "airQuality",
            Self::UvExposure => "uvExposure",
            Self::Disease => "disease",
        }
    }
}

/// Multi-factor risk scores, each in `[0, 100]`.
///
/// `overall` is always the rounded mean of the four factor scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskVector {
    /// Rounded mean of the factor scores.
    pub overall: u8,
    /// Heat stress score.
    pub heatwave: u8,
    /// Air pollution score.
    pub air_quality: u8,
    /// UV exposure score.
    pub uv_exposure: u8,
    /// Disease score.
    pub disease: u8,
}

impl RiskVector {
    /// Builds a vector from factor scores, deriving `overall`.
    ///
    /// Inputs above 100 are clamped.
    #[must_use]
    pub fn from_factors(heatwave: u8, air_quality: u8, uv_exposure: u8, disease: u8) -> Self {
        let heatwave = heatwave.min(100);
        let air_quality = air_quality.min(100);
        let uv_exposure = uv_exposure.min(100);
        let disease = disease.min(100);
        let sum = u16::from(heatwave)
            + u16::from(air_quality)
            + u16::from(uv_exposure)
            + u16::from(disease);
        // round(sum / 4) with halves rounded up; sum <= 400 so this fits in u8.
        let overall = u8::try_from((sum + 2) / 4).unwrap_or(100);
        Self {
            overall,
            heatwave,
            air_quality,
            uv_exposure,
            disease,
        }
    }

    /// Returns the score for one factor.
    #[must_use]
    pub const fn get(&self, factor: RiskFactor) -> u8 {
        match factor {
            RiskFactor::Heatwave => self.heatwave,
            RiskFactor::AirQuality => self.air_quality,
            RiskFactor::UvExposure => self.uv_exposure,
            RiskFactor::Disease => self.disease,
        }
    }

    /// Factors whose score is strictly above `threshold`, in display order.
    #[must_use]
    pub fn elevated(&self, threshold: u8) -> Vec<RiskFactor> {
        RiskFactor::ALL
            .into_iter()
            .filter(|f| self.get(*f) > threshold)
            .collect()
    }
}
