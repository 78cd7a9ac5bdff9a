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


use std::path::Path;
use tracing::{info, Level};
use anyhow::Result;

use swmf_common::{define_cli, check_cli, fs::ensure_writable_dir};
use swmf_orbit::{
    ABOUT, CdawebConfig, SatelliteStatus, load_config, parse_time_range, process_satellite,
    cdaweb::CdawebFetcher
};

define_cli! { ARGS [about=ABOUT] =
    save: bool [help="keep the downloaded CDF files", short, long],
    debug: bool [help="debug output (implies --verbose and --save)", short, long],
    verbose: bool [help="report progress and archive errors", short, long],
    nday: Option<u32> [help="number of days to fetch if no stop date is given [default: 1]", short, long, conflicts_with="stop"],
    config: Option<String> [help="RON file with archive URL and satellite table (default: built-in Cluster table)", short, long],
    output_dir: String [help="directory for .sat and downloaded files", short, long, default_value="."],
    max_sats: Option<usize> [help="process at most this number of satellites", short, long],
    start: String [help="start date (YYYYMMDD)"],
    stop: Option<String> [help="stop date (YYYYMMDD), data of this day is not included"]
}

#[tokio::main]
async fn main() -> Result<()> {
    check_cli!(ARGS);

    let save = ARGS.save || ARGS.debug;
    let verbose = ARGS.verbose || ARGS.debug;
    let level = if ARGS.debug { Level::DEBUG } else if verbose { Level::INFO } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level( level).with_target(false).init();

    let range = match parse_time_range( &ARGS.start, ARGS.stop.as_deref(), ARGS.nday) {
        Ok(range) => range,
        Err(_) => {
            println!("ERROR: Could not parse date!");
            println!("{ABOUT}");
            return Ok(())
        }
    };

    let config: CdawebConfig = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => CdawebConfig::default()
    };

    let out_dir = Path::new( &ARGS.output_dir);
    ensure_writable_dir( out_dir)?;

    let (start,stop) = range.query_interval();
    info!("fetching {} .. {} into {:?}", start, stop, out_dir);

    let fetcher = CdawebFetcher::new( &config);
    let max_sats = ARGS.max_sats.unwrap_or( config.satellites.len());
    let mut n_converted = 0;
    let mut n_failed = 0;

    for sat in config.satellites.iter().take( max_sats) {
        info!("processing {} ({})", sat.id, sat.dataset_id);
        match process_satellite( &fetcher, sat, &range, out_dir, save).await? {
            SatelliteStatus::Converted(path) => {
                n_converted += 1;
                if verbose { println!("{}: {}", sat.id, path.display()) }
            }
            SatelliteStatus::FetchFailed(_) => n_failed += 1
        }
    }

    info!("{} satellite(s) converted, {} failed at fetch", n_converted, n_failed);
    Ok(())
}
