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


mod mock_cdas;

use std::path::Path;
use axum::http::StatusCode;
use chrono::{Local, NaiveDateTime};
use swmf_cdf::{Encoding, builder::CdfBuilder};
use swmf_common::datetime::{parse_yyyymmdd, TIMESTAMP_FORMAT};
use swmf_orbit::{
    CdawebConfig, SatelliteStatus, TimeRange, TOOL_NAME, load_config, process_satellite,
    cdaweb::CdawebFetcher, satorbit::OrbitRecord
};
use mock_cdas::{start_mock, file_reply, error_reply, CDF_FILE_NAME};

// run with "cargo test -p swmf_orbit --test test_pipeline -- --nocapture"

/// what the archive delivers for cluster1: two minutes of record-major GSE positions
fn two_sample_cdf () -> Vec<u8> {
    let t0 = parse_yyyymmdd("20230101").unwrap();
    let times = vec![ t0, t0 + chrono::TimeDelta::minutes(1) ];

    CdfBuilder::new( Encoding::IbmPc)
        .global_attribute( "Logical_source", "C1_CP_AUX_POSGSE_1M")
        .epoch_variable( "Epoch__C1_CP_AUX_POSGSE_1M", &times)
        .real8_variable( "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M", &[3], &[ 89123.5, -12000.25, 3050.0,  89140.0, -11990.75, 3049.5 ])
            .attr( "DEPEND_0", "Epoch__C1_CP_AUX_POSGSE_1M")
            .attr( "UNITS", "km")
        .to_bytes().unwrap()
}

fn jan_1st () -> TimeRange {
    TimeRange::days( parse_yyyymmdd("20230101").unwrap(), 1)
}

#[tokio::test]
async fn test_fetch_and_convert() {
    let mock = start_mock( StatusCode::OK, &file_reply(), two_sample_cdf()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let status = process_satellite( &fetcher, &config.satellites[0], &jan_1st(), dir.path(), false).await.unwrap();
    let sat_path = dir.path().join("cluster1.sat");
    assert_eq!( status, SatelliteStatus::Converted( sat_path.clone()));

    let rec = OrbitRecord::read( &sat_path).unwrap();
    println!("{}", std::fs::read_to_string( &sat_path).unwrap());

    assert_eq!( rec.len(), 2);
    assert_eq!( rec.xyz.dim(), (2,3));
    assert_eq!( rec.xyz.row(0).to_vec(), vec![ 89123.5, -12000.25, 3050.0 ]);
    assert_eq!( rec.time[1].to_string(), "2023-01-01 00:01:00");
    assert_eq!( rec.attrs.coor, "GSE");
    assert_eq!( rec.attrs.file, "cluster1.sat");

    let prefix = format!("Created by {TOOL_NAME} on ");
    let ts = rec.attrs.head.strip_prefix( &prefix).unwrap();
    assert!( NaiveDateTime::parse_from_str( ts, TIMESTAMP_FORMAT).is_ok());
    assert!( ts.starts_with( &Local::now().format("%Y-%m-%d").to_string()), "not created today: {ts}");

    // downloaded file is removed if not saved
    assert!( !dir.path().join( CDF_FILE_NAME).exists());
}

#[tokio::test]
async fn test_save_keeps_download() {
    let mock = start_mock( StatusCode::OK, &file_reply(), two_sample_cdf()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let status = process_satellite( &fetcher, &config.satellites[0], &jan_1st(), dir.path(), true).await.unwrap();
    assert!( matches!( status, SatelliteStatus::Converted(_)));
    assert!( dir.path().join( CDF_FILE_NAME).is_file());
}

#[tokio::test]
async fn test_rejected_satellite() {
    let mock = start_mock( StatusCode::OK, &error_reply("Invalid dataset"), Vec::new()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let status = process_satellite( &fetcher, &config.satellites[2], &jan_1st(), dir.path(), false).await.unwrap();
    assert_eq!( status, SatelliteStatus::FetchFailed( vec!["Invalid dataset".to_string()]));
    assert!( !dir.path().join("cluster3.sat").exists());
    assert_eq!( mock.num_downloads(), 0);
}

#[tokio::test]
async fn test_corrupt_download_aborts() {
    let mock = start_mock( StatusCode::OK, &file_reply(), b"<html>not a CDF</html>".to_vec()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let res = process_satellite( &fetcher, &config.satellites[0], &jan_1st(), dir.path(), false).await;
    assert!( matches!( res, Err(swmf_orbit::SwmfOrbitError::CdfError(_))));
    assert!( !dir.path().join("cluster1.sat").exists());
    assert!( !dir.path().join( CDF_FILE_NAME).exists());
}

#[tokio::test]
async fn test_corrupt_download_saved() {
    let mock = start_mock( StatusCode::OK, &file_reply(), b"<html>not a CDF</html>".to_vec()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let res = process_satellite( &fetcher, &config.satellites[0], &jan_1st(), dir.path(), true).await;
    assert!( res.is_err());
    assert!( dir.path().join( CDF_FILE_NAME).is_file());
}

#[test]
fn test_shipped_config() {
    let path = Path::new( env!("CARGO_MANIFEST_DIR")).join("configs/cdaweb.ron");
    let config: CdawebConfig = load_config( &path).unwrap();
    assert_eq!( config, CdawebConfig::default());
}
