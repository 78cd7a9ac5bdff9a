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


use chrono::{NaiveDate, NaiveDateTime};
use ndarray::arr2;
use swmf_orbit::satorbit::{OrbitAttributes, OrbitRecord};

// run with "cargo test -p swmf_orbit --test test_satorbit -- --nocapture"

fn minutes (n: usize) -> Vec<NaiveDateTime> {
    let t0 = NaiveDate::from_ymd_opt( 2023, 1, 1).unwrap().and_hms_opt( 0, 0, 0).unwrap();
    (0..n).map( |i| t0 + chrono::TimeDelta::minutes( i as i64)).collect()
}

#[test]
fn test_component_transpose() {
    let components = arr2( &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
    let rec = OrbitRecord::from_components( minutes(3), components.view(), OrbitAttributes::new( "cluster1", "GSE")).unwrap();

    assert_eq!( rec.xyz, arr2( &[[1.0, 4.0, 7.0], [2.0, 5.0, 8.0], [3.0, 6.0, 9.0]]));
    assert_eq!( rec.attrs.coor, "GSE");
    assert_eq!( rec.attrs.file, "cluster1.sat");
    assert!( rec.attrs.head.starts_with("Created by swmf_orbit_fetch on "));
}

#[test]
fn test_write_layout() {
    let xyz = arr2( &[[12345.67, -5000.0, 1.0], [0.0, 2.5e-7, -6.3e4]]);
    let mut time = minutes(2);
    time[1] += chrono::TimeDelta::milliseconds(250);

    let attrs = OrbitAttributes { file: "cluster2.sat".into(), coor: "GSE".into(), head: "test header".into() };
    let rec = OrbitRecord::new( time, xyz, attrs).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join( &rec.attrs.file);
    rec.write( &path).unwrap();

    let text = std::fs::read_to_string( &path).unwrap();
    println!("{text}");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!( lines, vec![
        "test header",
        "",
        "#COOR",
        "GSE",
        "",
        "#START",
        " 2023 01 01 00 00 00 000  1.2345670E+04 -5.0000000E+03  1.0000000E+00",
        " 2023 01 01 00 01 00 250  0.0000000E+00  2.5000000E-07 -6.3000000E+04",
    ]);
}

#[test]
fn test_read_back() {
    let xyz = arr2( &[[1.5, -2.25, 3.0], [4.0, 5.0, -6.125], [7.0, 8.0, 9.0]]);
    let rec = OrbitRecord::new( minutes(3), xyz, OrbitAttributes::new( "cluster3", "GSE")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join( &rec.attrs.file);
    rec.write( &path).unwrap();

    let read = OrbitRecord::read( &path).unwrap();
    assert_eq!( read, rec);
}

#[test]
fn test_read_malformed() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("no_coor.sat");
    std::fs::write( &path, "head\n\n#START\n 2023 01 01 00 00 00 000 1 2 3\n").unwrap();
    assert!( OrbitRecord::read( &path).is_err());

    let path = dir.path().join("bad_line.sat");
    std::fs::write( &path, "head\n\n#COOR\nGSE\n\n#START\n 2023 01 01 00 00 00 000 1 2\n").unwrap();
    assert!( OrbitRecord::read( &path).is_err());

    let path = dir.path().join("empty.sat");
    std::fs::write( &path, "").unwrap();
    assert!( OrbitRecord::read( &path).is_err());
}
