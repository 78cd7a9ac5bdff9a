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


//! the SWMF satellite orbit (`.sat`) file model. A .sat file is a text file with a
//! provenance head line, a `#COOR` section naming the coordinate frame and a `#START`
//! section with one line per sample:
//! ```ignore
//! Created by swmf_orbit_fetch on 2025-03-01 12:00:00
//!
//! #COOR
//! GSE
//!
//! #START
//!  2023 01 01 00 00 00 000  1.2345670E+04 -5.0000000E+03  1.0000000E+00
//! ```

use std::{fs::File, io::{BufRead, BufReader, BufWriter, Write}, path::Path};
use chrono::{NaiveDate, NaiveDateTime, Datelike, TimeDelta, Timelike};
use ndarray::{Array2, ArrayView2, Axis};

use swmf_common::{datetime::local_timestamp_string, fs::filename};
use crate::{TOOL_NAME, Result, format_error};

/// field width of position values in .sat data lines
const SCI_WIDTH: usize = 14;

#[derive(Debug,Clone,PartialEq)]
pub struct OrbitAttributes {
    /// output filename (`<satellite-id>.sat`)
    pub file: String,
    /// coordinate frame of the positions
    pub coor: String,
    /// provenance line
    pub head: String,
}

impl OrbitAttributes {
    pub fn new (sat_id: &str, coor: &str)->Self {
        OrbitAttributes {
            file: format!("{sat_id}.sat"),
            coor: coor.to_string(),
            head: format!("Created by {TOOL_NAME} on {}", local_timestamp_string())
        }
    }
}

/// positional time series of a satellite, `xyz` is N×3 (one row per time)
#[derive(Debug,Clone,PartialEq)]
pub struct OrbitRecord {
    pub time: Vec<NaiveDateTime>,
    pub xyz: Array2<f64>,
    pub attrs: OrbitAttributes,
}

impl OrbitRecord {
    pub fn new (time: Vec<NaiveDateTime>, xyz: Array2<f64>, attrs: OrbitAttributes) -> Result<Self> {
        if xyz.ncols() != 3 {
            return Err( format_error( format!("positions need 3 components, got {}", xyz.ncols())))
        }
        if time.len() != xyz.nrows() {
            return Err( format_error( format!("{} times but {} positions", time.len(), xyz.nrows())))
        }
        Ok( OrbitRecord { time, xyz, attrs } )
    }

    /// create record from component-major positions (3×N, one row per axis)
    pub fn from_components (time: Vec<NaiveDateTime>, components: ArrayView2<f64>, attrs: OrbitAttributes) -> Result<Self> {
        if components.nrows() != 3 {
            return Err( format_error( format!("positions need 3 component rows, got {}", components.nrows())))
        }
        let xyz = components.t().as_standard_layout().into_owned();
        Self::new( time, xyz, attrs)
    }

    pub fn len (&self) -> usize {
        self.time.len()
    }

    pub fn is_empty (&self) -> bool {
        self.time.is_empty()
    }

    pub fn write (&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new( File::create( path.as_ref())?);

        writeln!( w, "{}", self.attrs.head)?;
        writeln!( w)?;
        writeln!( w, "#COOR")?;
        writeln!( w, "{}", self.attrs.coor)?;
        writeln!( w)?;
        writeln!( w, "#START")?;

        for (t, pos) in self.time.iter().zip( self.xyz.axis_iter( Axis(0))) {
            let (t, ms) = split_millis( t);
            write!( w, " {:4} {:02} {:02} {:02} {:02} {:02} {:03}", t.year(), t.month(), t.day(), t.hour(), t.minute(), t.second(), ms)?;
            for v in pos.iter() {
                write!( w, " {:>width$}", sci_format(*v), width = SCI_WIDTH)?;
            }
            writeln!( w)?;
        }
        w.flush()?;
        Ok(())
    }

    /// parse a .sat file. The `file` attribute is set from the path
    pub fn read (path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new( File::open( path)?);
        let mut lines = reader.lines();

        let head = lines.next().transpose()?.ok_or_else( || format_error("empty .sat file"))?;
        let mut coor: Option<String> = None;
        let mut time = Vec::new();
        let mut values: Vec<f64> = Vec::new();
        let mut in_data = false;

        while let Some(line) = lines.next() {
            let line = line?;
            let line = line.trim();

            if line == "#COOR" {
                in_data = false;
                for next in lines.by_ref() {
                    let next = next?;
                    if !next.trim().is_empty() {
                        coor = Some( next.trim().to_string());
                        break;
                    }
                }
            } else if line == "#START" {
                in_data = true;
            } else if line.starts_with('#') {
                in_data = false;
            } else if in_data && !line.is_empty() {
                let (t, pos) = parse_data_line( line)?;
                time.push(t);
                values.extend_from_slice( &pos);
            }
        }

        let coor = coor.ok_or_else( || format_error("no #COOR section"))?;
        let file = filename( &path).map( |s| s.to_string()).unwrap_or_default();
        let n = time.len();
        let xyz = Array2::from_shape_vec( (n,3), values).map_err( |e| format_error(e))?;

        Self::new( time, xyz, OrbitAttributes { file, coor, head })
    }
}

/// whole second part of `t` and its milliseconds, rounded to the nearest ms. A leap second
/// (nanos >= 1e9) is reported as `hh:mm:59.999` so that time tags stay ordered
fn split_millis (t: &NaiveDateTime) -> (NaiveDateTime, u32) {
    let nanos = t.nanosecond();
    if nanos >= 1_000_000_000 {
        return (*t, 999)
    }

    let whole = *t - TimeDelta::nanoseconds( nanos as i64);
    let ms = (nanos + 500_000) / 1_000_000;
    if ms == 1000 { (whole + TimeDelta::seconds(1), 0) } else { (whole, ms) }
}

fn parse_data_line (line: &str) -> Result<(NaiveDateTime,[f64;3])> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 10 {
        return Err( format_error( format!("expected 10 fields in data line: '{line}'")))
    }

    let mut t = [0u32;7];
    for (i,f) in fields[..7].iter().enumerate() {
        t[i] = f.parse().map_err( |_| format_error( format!("invalid time field '{f}'")))?;
    }
    let time = NaiveDate::from_ymd_opt( t[0] as i32, t[1], t[2])
        .and_then( |d| d.and_hms_milli_opt( t[3], t[4], t[5], t[6]))
        .ok_or_else( || format_error( format!("invalid time in data line: '{line}'")))?;

    let mut pos = [0f64;3];
    for (i,f) in fields[7..].iter().enumerate() {
        pos[i] = f.parse().map_err( |_| format_error( format!("invalid position value '{f}'")))?;
    }
    Ok( (time,pos) )
}

/// Fortran style `E14.7` formatting: 7 fraction digits and a signed exponent with at
/// least two digits (e.g. `-1.2345670E+03`)
pub fn sci_format (v: f64) -> String {
    let s = format!("{:.7E}", v);
    match s.split_once('E') {
        Some((mantissa, exp)) => {
            match exp.parse::<i32>() {
                Ok(e) => format!("{}E{}{:02}", mantissa, if e < 0 {'-'} else {'+'}, e.abs()),
                Err(_) => s.clone()
            }
        }
        None => s.clone() // NaN, inf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sci_format() {
        assert_eq!( sci_format( 1.0), "1.0000000E+00");
        assert_eq!( sci_format( -12345.67), "-1.2345670E+04");
        assert_eq!( sci_format( 0.0), "0.0000000E+00");
        assert_eq!( sci_format( 2.5e-7), "2.5000000E-07");
        assert_eq!( sci_format( 6.02e123), "6.0200000E+123");
    }

    #[test]
    fn test_millis_rounding() {
        let t = NaiveDate::from_ymd_opt(2023,1,1).unwrap().and_hms_nano_opt(12,34,56,788_999_936).unwrap();
        let (whole, ms) = split_millis( &t);
        assert_eq!( (whole.second(), ms), (56, 789));

        let t = NaiveDate::from_ymd_opt(2023,12,31).unwrap().and_hms_nano_opt(23,59,59,999_600_000).unwrap();
        let (whole, ms) = split_millis( &t);
        assert_eq!( whole.to_string(), "2024-01-01 00:00:00");
        assert_eq!( ms, 0);

        let leap = NaiveDate::from_ymd_opt(2016,12,31).unwrap().and_hms_nano_opt(23,59,59,1_400_000_000).unwrap();
        assert_eq!( split_millis( &leap).1, 999);
    }

    #[test]
    fn test_data_line() {
        let (t,pos) = parse_data_line(" 2023 01 01 00 01 30 250  1.0000000E+00 -2.0000000E+03  3.5000000E-01").unwrap();
        assert_eq!( t.to_string(), "2023-01-01 00:01:30.250");
        assert_eq!( pos, [1.0, -2000.0, 0.35]);

        assert!( parse_data_line(" 2023 13 01 00 00 00 000 1 2 3").is_err());
        assert!( parse_data_line(" 2023 01 01 00 00 00 000 1 2").is_err());
    }

    #[test]
    fn test_shape_checks() {
        let attrs = OrbitAttributes::new( "cluster1", "GSE");
        let t = NaiveDate::from_ymd_opt(2023,1,1).unwrap().and_hms_opt(0,0,0).unwrap();

        assert!( OrbitRecord::new( vec![t], Array2::zeros((1,2)), attrs.clone()).is_err());
        assert!( OrbitRecord::new( vec![t,t], Array2::zeros((1,3)), attrs.clone()).is_err());
        assert!( OrbitRecord::from_components( vec![t], Array2::zeros((2,1)).view(), attrs.clone()).is_err());
        assert!( OrbitRecord::new( vec![], Array2::zeros((0,3)), attrs).unwrap().is_empty());
    }
}
