//! Common test fixtures: runs, region boxes and NOMADS-shaped OPeNDAP bodies.

use chrono::NaiveDate;
use forecast_common::{ForecastRun, ModelCycle};

/// Region boxes as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    pub const SABU_RAIJUA: (f64, f64, f64, f64) = (121.5, -11.0, 122.3, -10.0);
    pub const NTT: (f64, f64, f64, f64) = (118.5, -11.5, 125.5, -7.5);
    pub const INDONESIA: (f64, f64, f64, f64) = (94.0, -11.5, 142.0, 6.5);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// The run used throughout the tests: 2024-03-05 06Z.
pub fn sample_run() -> ForecastRun {
    ForecastRun::new(
        NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"),
        ModelCycle::Z06,
    )
}

/// GrADS day number of 2024-03-05 00:00 UTC.
pub const SAMPLE_RUN_DAY: f64 = 738_951.0;

/// Canned OPeNDAP responses.
pub mod opendap {
    /// Structure of an hourly GFS 0.25° run, trimmed to the variables the
    /// viewer reads.
    pub const GFS_DDS: &str = "Dataset {
    Float64 time[time = 121];
    Float64 lat[lat = 721];
    Float64 lon[lon = 1440];
    Grid {
     ARRAY:
        Float32 pratesfc[time = 121][lat = 721][lon = 1440];
     MAPS:
        Float64 time[time = 121];
        Float64 lat[lat = 721];
        Float64 lon[lon = 1440];
    } pratesfc;
    Grid {
     ARRAY:
        Float32 tmp2m[time = 121][lat = 721][lon = 1440];
     MAPS:
        Float64 time[time = 121];
        Float64 lat[lat = 721];
        Float64 lon[lon = 1440];
    } tmp2m;
    Grid {
     ARRAY:
        Float32 ugrd10m[time = 121][lat = 721][lon = 1440];
     MAPS:
        Float64 time[time = 121];
        Float64 lat[lat = 721];
        Float64 lon[lon = 1440];
    } ugrd10m;
    Grid {
     ARRAY:
        Float32 vgrd10m[time = 121][lat = 721][lon = 1440];
     MAPS:
        Float64 time[time = 121];
        Float64 lat[lat = 721];
        Float64 lon[lon = 1440];
    } vgrd10m;
    Grid {
     ARRAY:
        Float32 prmslmsl[time = 121][lat = 721][lon = 1440];
     MAPS:
        Float64 time[time = 121];
        Float64 lat[lat = 721];
        Float64 lon[lon = 1440];
    } prmslmsl;
} gfs_0p25_1hr_06z;
";

    /// Error body NOMADS returns for a run that has not been published.
    pub const MISSING_RUN_ERROR: &str = "Error {
    code = 0;
    message = \"/gfs20240305/gfs_0p25_1hr_06z is not an available dataset\";
};
";

    /// A small `pratesfc[0][316:318][486:487]` hyperslab with one fill value.
    pub const PRATE_HYPERSLAB: &str = "pratesfc, [1][3][2]
[0][0], 0.001, 0.002
[0][1], 9.999E20, 0.0
[0][2], 0.0005, 0.0

time, [1]
738951.25
lat, [3]
-11.0, -10.75, -10.5
lon, [2]
121.5, 121.75
";

    /// ASCII listing of a `time,lat,lon` request.
    pub fn axes_body(times: &[f64], lats: &[f64], lons: &[f64]) -> String {
        format!(
            "time, [{}]\n{}\nlat, [{}]\n{}\nlon, [{}]\n{}\n",
            times.len(),
            join(times),
            lats.len(),
            join(lats),
            lons.len(),
            join(lons)
        )
    }

    fn join(values: &[f64]) -> String {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_run() {
        assert_eq!(sample_run().to_string(), "20240305 06z");
    }

    #[test]
    fn test_axes_body_shape() {
        let body = opendap::axes_body(&[1.0, 2.0], &[-1.0], &[0.0, 0.25, 0.5]);
        assert!(body.starts_with("time, [2]\n1, 2\n"));
        assert!(body.contains("lon, [3]\n0, 0.25, 0.5"));
    }
}
