/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */


//! conversion of downloaded CDF orbit data into SWMF .sat files

use std::path::{Path,PathBuf};
use ndarray::{Array2, ArrayD, Axis, Ix2};
use tracing::debug;

use swmf_cdf::{Cdf, CdfError};
use swmf_common::fs::file_in_dir;
use crate::{SatelliteDescriptor, Result, format_error, satorbit::{OrbitAttributes, OrbitRecord}};

/// fallback name of the time variable if the position variable has no DEPEND_0
pub const DEFAULT_TIME_VAR: &str = "Epoch";

/// extract the orbit of `sat` from an opened CDF. The position variable is either a 3-vector
/// per record (N×3 over all records) or a single record holding a whole 3×N component-major
/// (or N×3) array
pub fn read_orbit_record (cdf: &Cdf, sat: &SatelliteDescriptor, sat_id: &str) -> Result<OrbitRecord> {
    let var = cdf.variable( &sat.variable).ok_or_else( || CdfError::NoSuchVariable( sat.variable.clone()))?;
    let time_var = cdf.depend_0( &sat.variable).unwrap_or( DEFAULT_TIME_VAR);
    debug!("{}: reading {} with times from {}", sat_id, sat.variable, time_var);

    let time = cdf.read_times( time_var)?;
    let data = cdf.read_f64( &sat.variable)?;
    let attrs = OrbitAttributes::new( sat_id, &sat.coordinate_frame);
    let dims = var.shape();

    match dims.as_slice() {
        [3] => {
            OrbitRecord::new( time, into_array2( data, &sat.variable)?, attrs)
        }
        [3,_] | [_,3] if data.shape()[0] == 1 => {
            let arr = into_array2( data.index_axis_move( Axis(0), 0), &sat.variable)?;
            if dims[0] == 3 {
                OrbitRecord::from_components( time, arr.view(), attrs)
            } else {
                OrbitRecord::new( time, arr, attrs)
            }
        }
        _ => Err( format_error( format!("{} has shape {:?} for {} times", sat.variable, data.shape(), time.len())))
    }
}

fn into_array2 (data: ArrayD<f64>, var_name: &str) -> Result<Array2<f64>> {
    data.into_dimensionality::<Ix2>().map_err( |_| format_error( format!("{var_name} is not a vector variable")))
}

/// convert the CDF file at `cdf_path` into `<out_dir>/<sat_id>.sat` and return its path
pub fn convert (cdf_path: impl AsRef<Path>, sat: &SatelliteDescriptor, sat_id: &str, out_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let cdf = Cdf::open( cdf_path.as_ref())?;
    let record = read_orbit_record( &cdf, sat, sat_id)?;

    let path = file_in_dir( out_dir, &record.attrs.file)?;
    record.write( &path)?;
    debug!("{}: {} samples written to {:?}", sat_id, record.len(), path);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use swmf_cdf::{Encoding, builder::CdfBuilder};

    fn times (n: usize) -> Vec<chrono::NaiveDateTime> {
        let t0 = NaiveDate::from_ymd_opt(2023,1,1).unwrap().and_hms_opt(0,0,0).unwrap();
        (0..n).map( |i| t0 + chrono::TimeDelta::minutes(i as i64)).collect()
    }

    fn sat () -> SatelliteDescriptor {
        SatelliteDescriptor::new( "cluster1", "C1_CP_AUX_POSGSE_1M", "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", "GSE")
    }

    #[test]
    fn test_read_with_depend_0() {
        let b = CdfBuilder::new( Encoding::Network)
            .epoch_variable( "time_tags", &times(2))
            .real8_variable( "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", &[3], &[1.0,2.0,3.0, 4.0,5.0,6.0])
                .attr( "DEPEND_0", "time_tags");
        let cdf = Cdf::from_bytes( b.to_bytes().unwrap()).unwrap();

        let rec = read_orbit_record( &cdf, &sat(), "cluster1").unwrap();
        assert_eq!( rec.len(), 2);
        assert_eq!( rec.xyz.row(1).to_vec(), vec![4.0,5.0,6.0]);
        assert_eq!( rec.attrs.coor, "GSE");
    }

    #[test]
    fn test_length_mismatch() {
        let b = CdfBuilder::new( Encoding::IbmPc)
            .epoch_variable( "Epoch", &times(3))
            .real8_variable( "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", &[3], &[1.0,2.0,3.0, 4.0,5.0,6.0]);
        let cdf = Cdf::from_bytes( b.to_bytes().unwrap()).unwrap();

        assert!( matches!( read_orbit_record( &cdf, &sat(), "cluster1"), Err(crate::SwmfOrbitError::FormatError(_))));
    }

    #[test]
    fn test_missing_variable() {
        let b = CdfBuilder::new( Encoding::IbmPc).epoch_variable( "Epoch", &times(1));
        let cdf = Cdf::from_bytes( b.to_bytes().unwrap()).unwrap();

        assert!( matches!( read_orbit_record( &cdf, &sat(), "cluster1"), Err(crate::SwmfOrbitError::CdfError(_))));
    }

    #[test]
    fn test_component_major_variable() {
        // one record holding the whole [3,N] array
        let b = CdfBuilder::new( Encoding::IbmPc)
            .epoch_variable( "Epoch", &times(2))
            .real8_variable( "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", &[3,2], &[1.0,2.0, 3.0,4.0, 5.0,6.0]);
        let cdf = Cdf::from_bytes( b.to_bytes().unwrap()).unwrap();

        let rec = read_orbit_record( &cdf, &sat(), "cluster1").unwrap();
        assert_eq!( rec.xyz, ndarray::arr2( &[[1.0,3.0,5.0], [2.0,4.0,6.0]]));

        // N == 3 is still transposed
        let b = CdfBuilder::new( Encoding::Network)
            .epoch_variable( "Epoch", &times(3))
            .real8_variable( "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", &[3,3], &[1.0,2.0,3.0, 4.0,5.0,6.0, 7.0,8.0,9.0]);
        let cdf = Cdf::from_bytes( b.to_bytes().unwrap()).unwrap();

        let rec = read_orbit_record( &cdf, &sat(), "cluster1").unwrap();
        assert_eq!( rec.xyz, ndarray::arr2( &[[1.0,4.0,7.0], [2.0,5.0,8.0], [3.0,6.0,9.0]]));
    }

    #[test]
    fn test_subsecond_times() {
        let t = NaiveDate::from_ymd_opt(2023,1,1).unwrap().and_hms_milli_opt(12,34,56,789).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let cdf_path = dir.path().join("orbit.cdf");

        CdfBuilder::new( Encoding::IbmPc)
            .epoch_variable( "Epoch", &[t])
            .real8_variable( "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", &[3], &[1.0,2.0,3.0])
            .write( &cdf_path).unwrap();

        let sat_path = convert( &cdf_path, &sat(), "cluster1", dir.path()).unwrap();
        let text = std::fs::read_to_string( &sat_path).unwrap();
        let last = text.lines().last().unwrap();
        assert_eq!( last, " 2023 01 01 12 34 56 789  1.0000000E+00  2.0000000E+00  3.0000000E+00");
    }
}
