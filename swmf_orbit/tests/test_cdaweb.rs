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

use axum::http::StatusCode;
use swmf_common::{datetime::parse_yyyymmdd, net::NetError};
use swmf_orbit::{SwmfOrbitError, TimeRange, cdaweb::{CdawebFetcher, FetchOutcome}};
use mock_cdas::{start_mock, file_reply, error_reply, CDF_FILE_NAME};

// run with "cargo test -p swmf_orbit --test test_cdaweb -- --nocapture"

fn jan_1st () -> TimeRange {
    TimeRange::days( parse_yyyymmdd("20230101").unwrap(), 1)
}

#[tokio::test]
async fn test_archive_error_skips_download() {
    let mock = start_mock( StatusCode::OK, &error_reply("No data available for the requested time range"), Vec::new()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let outcome = fetcher.fetch( &config.satellites[0], &jan_1st(), dir.path()).await.unwrap();
    assert_eq!( outcome, FetchOutcome::Rejected( vec!["No data available for the requested time range".to_string()]));

    assert_eq!( mock.num_queries(), 1);
    assert_eq!( mock.num_downloads(), 0);
    assert_eq!( std::fs::read_dir( dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_file_description_download() {
    let data = b"not really a CDF".to_vec();
    let mock = start_mock( StatusCode::OK, &file_reply(), data.clone()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let outcome = fetcher.fetch( &config.satellites[0], &jan_1st(), dir.path()).await.unwrap();
    let expected_path = dir.path().join( CDF_FILE_NAME);
    assert_eq!( outcome, FetchOutcome::Downloaded( expected_path.clone()));
    assert_eq!( std::fs::read( &expected_path).unwrap(), data);

    assert_eq!( mock.num_queries(), 1);
    assert_eq!( mock.num_downloads(), 1);

    let uris = mock.requested_uris();
    println!("requests: {uris:#?}");
    assert_eq!( uris[0], "/dataviews/sp_phys/datasets/C1_CP_AUX_POSGSE_1M/data/20230101T000000Z,20230102T000000Z/sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M?format=cdf");
    assert_eq!( uris[1], format!("/tmp/wsIv0e/{CDF_FILE_NAME}"));
}

#[tokio::test]
async fn test_download_overwrites() {
    let mock = start_mock( StatusCode::OK, &file_reply(), b"new".to_vec()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join( CDF_FILE_NAME);
    std::fs::write( &path, b"old content of a previous run").unwrap();

    fetcher.fetch( &config.satellites[0], &jan_1st(), dir.path()).await.unwrap();
    assert_eq!( std::fs::read( &path).unwrap(), b"new");
}

#[tokio::test]
async fn test_zero_length_window() {
    let mock = start_mock( StatusCode::BAD_REQUEST, &error_reply("Bad Request"), Vec::new()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let t = parse_yyyymmdd("20230101").unwrap();
    let range = TimeRange::new( t, t);

    let outcome = fetcher.fetch( &config.satellites[1], &range, dir.path()).await.unwrap();
    assert!( matches!( outcome, FetchOutcome::Rejected(_)));
    assert!( mock.requested_uris()[0].contains("/data/20230101T000000Z,20230101T000000Z/"));
    assert_eq!( mock.num_downloads(), 0);
}

#[tokio::test]
async fn test_missing_file_description() {
    let xml = r#"<DataResult xmlns="http://cdaweb.gsfc.nasa.gov/schema"><Status>done</Status></DataResult>"#;
    let mock = start_mock( StatusCode::OK, xml, Vec::new()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let res = fetcher.fetch( &config.satellites[0], &jan_1st(), dir.path()).await;
    assert!( matches!( res, Err(SwmfOrbitError::NoFileDescription(ref id)) if id == "cluster1"));
    assert_eq!( mock.num_downloads(), 0);
}

#[tokio::test]
async fn test_unparseable_error_response() {
    let mock = start_mock( StatusCode::SERVICE_UNAVAILABLE, "<html><body>maintenance</body></html>", Vec::new()).await;
    let config = mock.config();
    let fetcher = CdawebFetcher::new( &config);
    let dir = tempfile::tempdir().unwrap();

    let res = fetcher.fetch( &config.satellites[0], &jan_1st(), dir.path()).await;
    assert!( matches!( res, Err(SwmfOrbitError::NetError(NetError::StatusError(status,_))) if status == StatusCode::SERVICE_UNAVAILABLE));
}
