//! Parameters structure for the estimation pipeline

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the estimation pipeline, loaded from `fuel_est.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Params {
    pub fuel: FuelParams,
    pub rates: RateParams,
    pub files: FileParams,
    pub batch: BatchParams,
}

/// Fuel consumption model used by the projector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FuelParams {
    /// If true the vehicle is mowing, which uses the mowing consumption rate.
    pub mowing: bool,

    /// Fuel consumption while mowing.
    ///
    /// Units: gallons/hour
    pub gph_mowing: f64,

    /// Fuel consumption while not mowing.
    ///
    /// Units: gallons/hour
    pub gph_transit: f64,

    /// Capacity of the vehicle's fuel tank.
    ///
    /// Units: gallons
    pub tank_capacity_gal: f64,

    /// If true the remaining distance is clamped to be non-negative, so progress reported past
    /// the end of a path gives a zero estimate rather than a negative one.
    pub clamp_remaining: bool,
}

/// Outlier rejection applied when reducing per run rates to a representative rate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateParams {
    /// Rates below this are treated as noise and discarded.
    ///
    /// Units: seconds/centimeter
    pub rate_floor: f64,

    /// Rates above the median multiplied by this factor are discarded.
    pub outlier_factor: f64,
}

/// Locations of the data files, relative to the software root unless absolute.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileParams {
    /// JSON telemetry dump of historical runs.
    pub history_dump: PathBuf,

    /// Directory containing one serialized path per file, named by path id.
    pub paths_dir: PathBuf,

    /// CSV table of run summaries.
    pub master_table: PathBuf,

    /// CSV table of representative rates per path.
    pub rate_table: PathBuf,
}

/// Batch estimation options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchParams {
    /// Progress index every path is estimated at in a batch run.
    pub progress_index: usize,
}

/// A parameter value which would make the estimates meaningless.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("fuel.tank_capacity_gal must be positive, found {0}")]
    TankCapacity(f64),

    #[error("fuel.{0} must be non-negative, found {1}")]
    Consumption(&'static str, f64),

    #[error("rates.rate_floor must be non-negative, found {0}")]
    RateFloor(f64),

    #[error("rates.outlier_factor must be positive, found {0}")]
    OutlierFactor(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check that every numeric parameter is finite and in range.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.fuel.validate()?;
        self.rates.validate()
    }
}

impl FuelParams {
    /// The consumption rate for the current mode.
    ///
    /// Units: gallons/hour
    pub fn gallons_per_hour(&self) -> f64 {
        if self.mowing {
            self.gph_mowing
        } else {
            self.gph_transit
        }
    }
}

impl FuelParams {
    fn validate(&self) -> Result<(), ParamsError> {
        if !(self.tank_capacity_gal.is_finite() && self.tank_capacity_gal > 0.0) {
            return Err(ParamsError::TankCapacity(self.tank_capacity_gal));
        }

        let rates = [("gph_mowing", self.gph_mowing), ("gph_transit", self.gph_transit)];
        for (name, gph) in rates.iter() {
            if !(gph.is_finite() && *gph >= 0.0) {
                return Err(ParamsError::Consumption(*name, *gph));
            }
        }

        Ok(())
    }
}

impl RateParams {
    fn validate(&self) -> Result<(), ParamsError> {
        if !(self.rate_floor.is_finite() && self.rate_floor >= 0.0) {
            return Err(ParamsError::RateFloor(self.rate_floor));
        }
        if !(self.outlier_factor.is_finite() && self.outlier_factor > 0.0) {
            return Err(ParamsError::OutlierFactor(self.outlier_factor));
        }

        Ok(())
    }
}

impl Default for FuelParams {
    fn default() -> Self {
        Self {
            mowing: false,
            gph_mowing: 1.33,
            gph_transit: 1.5,
            tank_capacity_gal: 12.0,
            clamp_remaining: true,
        }
    }
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            rate_floor: 0.0009,
            outlier_factor: 5.0,
        }
    }
}

impl FileParams {
    /// Resolve all file paths against the given root directory.
    pub fn resolve<P: AsRef<Path>>(&self, root: P) -> Self {
        let root = root.as_ref();

        Self {
            history_dump: root.join(&self.history_dump),
            paths_dir: root.join(&self.paths_dir),
            master_table: root.join(&self.master_table),
            rate_table: root.join(&self.rate_table),
        }
    }
}

impl Default for FileParams {
    fn default() -> Self {
        Self {
            history_dump: PathBuf::from("data/dump_matching.json"),
            paths_dir: PathBuf::from("data/paths"),
            master_table: PathBuf::from("data/master.csv"),
            rate_table: PathBuf::from("data/paths_info.csv"),
        }
    }
}

impl Default for BatchParams {
    fn default() -> Self {
        Self { progress_index: 20 }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_fill_missing() {
        let params: Params = toml::from_str(
            r#"
            [fuel]
            mowing = true

            [files]
            paths_dir = "/srv/paths"
            "#,
        )
        .unwrap();

        assert!(params.fuel.mowing);
        assert_eq!(params.fuel.gallons_per_hour(), 1.33);
        assert_eq!(params.fuel.tank_capacity_gal, 12.0);
        assert_eq!(params.rates.rate_floor, 0.0009);
        assert_eq!(params.rates.outlier_factor, 5.0);
        assert_eq!(params.batch.progress_index, 20);

        // Absolute paths are unaffected by resolving
        let files = params.files.resolve("/opt/fuel");
        assert_eq!(files.paths_dir, PathBuf::from("/srv/paths"));
        assert_eq!(files.master_table, PathBuf::from("/opt/fuel/data/master.csv"));
    }

    #[test]
    fn test_gallons_per_hour() {
        let mut fuel = FuelParams::default();
        assert_eq!(fuel.gallons_per_hour(), 1.5);

        fuel.mowing = true;
        assert_eq!(fuel.gallons_per_hour(), 1.33);
    }

    #[test]
    fn test_validate() {
        assert!(Params::default().validate().is_ok());

        let params: Params = toml::from_str("[fuel]\ntank_capacity_gal = 0.0\n").unwrap();
        match params.validate() {
            Err(ParamsError::TankCapacity(c)) => assert_eq!(c, 0.0),
            r => panic!("Expected a tank capacity error, got {:?}", r),
        }

        let params: Params = toml::from_str("[fuel]\ntank_capacity_gal = -12.0\n").unwrap();
        assert!(params.validate().is_err());

        let params: Params = toml::from_str("[fuel]\ngph_transit = -1.5\n").unwrap();
        match params.validate() {
            Err(ParamsError::Consumption(name, _)) => assert_eq!(name, "gph_transit"),
            r => panic!("Expected a consumption error, got {:?}", r),
        }

        let params: Params = toml::from_str("[rates]\noutlier_factor = 0.0\n").unwrap();
        match params.validate() {
            Err(ParamsError::OutlierFactor(_)) => (),
            r => panic!("Expected an outlier factor error, got {:?}", r),
        }
    }
}
