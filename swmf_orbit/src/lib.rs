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


//! fetch spacecraft orbit data from NASA's CDAweb archive and convert it into SWMF satellite
//! (`.sat`) files. Each configured satellite goes through a strictly sequential two step
//! pipeline: [`cdaweb::CdawebFetcher::fetch`] downloads a CDF for the requested time range,
//! [`convert::convert`] turns it into a `.sat` file

use std::path::{Path,PathBuf};
use chrono::NaiveDateTime;
use serde::{Deserialize,Serialize,de::DeserializeOwned};
use tracing::{info,warn};

use swmf_common::{datetime::{self, add_days, iso_basic_string, truncate_to_day}, fs::remove_file_if_exists};

pub mod errors;
pub use errors::*;

pub mod cdaweb;
use cdaweb::{CdawebFetcher, FetchOutcome};

pub mod satorbit;
pub mod convert;

/// name of the generating tool as recorded in .sat file headers
pub const TOOL_NAME: &str = "swmf_orbit_fetch";

pub const ABOUT: &str = "Fetch orbit data from CDAweb for modern NASA missions and convert into SWMF input files.";

/// the archive identifiers for one satellite
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct SatelliteDescriptor {
    /// our key for the satellite, also the output file stem (e.g. "cluster1")
    pub id: String,
    /// CDAweb dataset id (e.g. "C1_CP_AUX_POSGSE_1M")
    pub dataset_id: String,
    /// name of the position variable within the dataset
    pub variable: String,
    /// coordinate frame label of the position variable (e.g. "GSE")
    pub coordinate_frame: String,
}

impl SatelliteDescriptor {
    pub fn new (id: impl ToString, dataset_id: impl ToString, variable: impl ToString, coordinate_frame: impl ToString)->Self {
        SatelliteDescriptor {
            id: id.to_string(),
            dataset_id: dataset_id.to_string(),
            variable: variable.to_string(),
            coordinate_frame: coordinate_frame.to_string()
        }
    }

    pub fn validate (&self) -> Result<()> {
        if self.dataset_id.trim().is_empty() {
            Err( SwmfOrbitError::DescriptorError( format!("{}: empty dataset id", self.id)))
        } else if self.variable.trim().is_empty() {
            Err( SwmfOrbitError::DescriptorError( format!("{}: empty variable name", self.id)))
        } else {
            Ok(())
        }
    }
}

/// CDAweb access parameters and the ordered table of satellites we process
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct CdawebConfig {
    /// REST root for dataviews (e.g. https://cdaweb.gsfc.nasa.gov/WS/cdasr/1/dataviews)
    pub base_url: String,
    /// the dataview that holds our datasets
    pub dataview: String,
    pub satellites: Vec<SatelliteDescriptor>,
}

impl Default for CdawebConfig {
    fn default() -> Self {
        CdawebConfig {
            base_url: "https://cdaweb.gsfc.nasa.gov/WS/cdasr/1/dataviews".to_string(),
            dataview: "sp_phys".to_string(),
            satellites: (1..=4).map( cluster).collect()
        }
    }
}

/// Cluster spacecraft n: CSA auxiliary 1min position in GSE
fn cluster (n: u8) -> SatelliteDescriptor {
    let dataset_id = format!("C{n}_CP_AUX_POSGSE_1M");
    let variable = format!("sc_r_xyz_gse__{dataset_id}");
    SatelliteDescriptor::new( format!("cluster{n}"), dataset_id, variable, "GSE")
}

impl CdawebConfig {
    pub fn satellite (&self, id: &str) -> Option<&SatelliteDescriptor> {
        self.satellites.iter().find( |s| s.id == id)
    }
}

/// load a RON config file
pub fn load_config<C> (path: impl AsRef<Path>) -> Result<C> where C: DeserializeOwned {
    let data = std::fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( &data)? )
}

/// day-resolution time window of a request. The archive query covers `start@00:00:00` up to
/// `stop@00:00:00`, i.e. data of the stop day itself is not included
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

impl TimeRange {
    /// both ends are truncated to 00:00:00, start <= stop is not checked
    pub fn new (start: NaiveDateTime, stop: NaiveDateTime)->Self {
        TimeRange { start: truncate_to_day(&start), stop: truncate_to_day(&stop) }
    }

    /// the `n` days starting with `start`
    pub fn days (start: NaiveDateTime, n: u32)->Self {
        let start = truncate_to_day(&start);
        TimeRange { start, stop: add_days(&start, n) }
    }

    /// start and stop in ISO 8601 basic format (YYYYMMDDThhmmssZ)
    pub fn query_interval (&self) -> (String,String) {
        (iso_basic_string(&self.start), iso_basic_string(&self.stop))
    }
}

/// build the request window from command line date specs. Without an explicit stop date the
/// range covers `nday` days (default 1)
pub fn parse_time_range (start: &str, stop: Option<&str>, nday: Option<u32>) -> Result<TimeRange> {
    let start_dt = datetime::parse_yyyymmdd(start).ok_or_else(|| SwmfOrbitError::DateError(start.to_string()))?;
    match stop {
        Some(stop) => {
            let stop_dt = datetime::parse_yyyymmdd(stop).ok_or_else(|| SwmfOrbitError::DateError(stop.to_string()))?;
            Ok( TimeRange::new( start_dt, stop_dt))
        }
        None => Ok( TimeRange::days( start_dt, nday.unwrap_or(1)))
    }
}

/// where a satellite ended up in the fetch/convert pipeline
#[derive(Debug,Clone,PartialEq)]
pub enum SatelliteStatus {
    /// .sat file written
    Converted(PathBuf),
    /// archive rejected the request with the given error texts, nothing was downloaded
    FetchFailed(Vec<String>),
}

/// fetch and convert the data for one satellite. Downloaded CDF files are removed after
/// conversion (successful or not) unless `save` is set
pub async fn process_satellite (fetcher: &CdawebFetcher, sat: &SatelliteDescriptor, range: &TimeRange, dir: &Path, save: bool) -> Result<SatelliteStatus> {
    match fetcher.fetch( sat, range, dir).await? {
        FetchOutcome::Rejected(errors) => {
            warn!("skipping {}: archive reported {} error(s)", sat.id, errors.len());
            Ok( SatelliteStatus::FetchFailed(errors) )
        }
        FetchOutcome::Downloaded(cdf_path) => {
            let res = convert::convert( &cdf_path, sat, &sat.id, dir);

            if !save && remove_file_if_exists( &cdf_path)? {
                info!("{}: removed {:?}", sat.id, cdf_path);
            }

            let sat_path = res?;
            info!("{}: wrote {:?}", sat.id, sat_path);
            Ok( SatelliteStatus::Converted(sat_path) )
        }
    }
}
