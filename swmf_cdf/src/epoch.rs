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


//! conversion between CDF time representations and chrono UTC datetimes
//!
//! * CDF_EPOCH: milliseconds since 0000-01-01T00:00:00.000 (f64, no leap seconds)
//! * CDF_EPOCH16: seconds since 0000-01-01 plus picoseconds within that second (2 x f64)
//! * CDF_TIME_TT2000: nanoseconds since J2000 (2000-01-01T12:00:00 TT), including leap seconds

use std::sync::LazyLock;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// milliseconds between 0000-01-01 and 1970-01-01
pub const EPOCH_UNIX_OFFSET_MS: f64 = 62_167_219_200_000.0;

/// seconds between 0000-01-01 and 1970-01-01
const EPOCH16_UNIX_OFFSET_S: i128 = 62_167_219_200;

/// J2000 expressed as TAI-based unix nanoseconds (2000-01-01T11:59:27.816 TAI)
const J2000_TAI_UNIX_NS: i128 = 946_727_967_816_000_000;

/// standard fill values
pub const EPOCH_FILL: f64 = -1.0e31;
pub const TT2000_FILL: i64 = i64::MIN;
pub const TT2000_PAD: i64 = i64::MIN + 1;

/// TAI-UTC (in seconds) and the first UTC day it applies to
const LEAP_TABLE: [(i32,u32,i64);28] = [
    (1972, 1,10), (1972, 7,11), (1973, 1,12), (1974, 1,13), (1975, 1,14), (1976, 1,15), (1977, 1,16),
    (1978, 1,17), (1979, 1,18), (1980, 1,19), (1981, 7,20), (1982, 7,21), (1983, 7,22), (1985, 7,23),
    (1988, 1,24), (1990, 1,25), (1991, 1,26), (1992, 7,27), (1993, 7,28), (1994, 7,29), (1996, 1,30),
    (1997, 7,31), (1999, 1,32), (2006, 1,33), (2009, 1,34), (2012, 7,35), (2015, 7,36), (2017, 1,37),
];

/// (unix seconds of UTC start day, TAI-UTC)
static LEAP_SECONDS: LazyLock<Vec<(i64,i64)>> = LazyLock::new(|| {
    LEAP_TABLE.iter().filter_map( |(y,m,dat)| {
        NaiveDate::from_ymd_opt( *y, *m, 1).map( |d| (d.and_time(NaiveTime::MIN).and_utc().timestamp(), *dat))
    }).collect()
});

/// TAI-UTC for a given UTC instant (pre-1972 offsets are approximated with the 1972 value)
pub fn tai_utc_offset (unix_secs: i64) -> i64 {
    LEAP_SECONDS.iter().rev()
        .find( |(start,_)| *start <= unix_secs)
        .map( |(_,dat)| *dat)
        .unwrap_or(10)
}

fn from_unix_nanos (ns: i128) -> Option<NaiveDateTime> {
    let secs = ns.div_euclid(1_000_000_000);
    let nanos = ns.rem_euclid(1_000_000_000) as u32;
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp( secs, nanos).map( |dt| dt.naive_utc())
}

pub fn epoch_to_datetime (epoch_ms: f64) -> Option<NaiveDateTime> {
    if !epoch_ms.is_finite() || epoch_ms <= EPOCH_FILL {
        return None
    }
    // CDF_EPOCH values near the present only resolve ~8µs, round to whole ms before scaling
    let unix_ms = (epoch_ms - EPOCH_UNIX_OFFSET_MS).round() as i128;
    from_unix_nanos( unix_ms * 1_000_000)
}

pub fn datetime_to_epoch (dt: &NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    utc.timestamp() as f64 * 1000.0 + (utc.timestamp_subsec_nanos() as f64 / 1_000_000.0) + EPOCH_UNIX_OFFSET_MS
}

pub fn epoch16_to_datetime (secs: f64, picos: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() || !picos.is_finite() || secs <= EPOCH_FILL {
        return None
    }
    let unix_s = secs.round() as i128 - EPOCH16_UNIX_OFFSET_S;
    let ns = (picos.round() as i128 + 500) / 1000;
    from_unix_nanos( unix_s * 1_000_000_000 + ns)
}

pub fn tt2000_to_datetime (tt2000: i64) -> Option<NaiveDateTime> {
    if tt2000 == TT2000_FILL || tt2000 == TT2000_PAD {
        return None
    }
    let tai_ns = tt2000 as i128 + J2000_TAI_UNIX_NS;

    // inside an inserted leap second: report 23:59:59 with chrono's leap nanoseconds (>= 1e9)
    for w in LEAP_SECONDS.windows(2) {
        let ((_,prev_dat), (start,dat)) = (w[0], w[1]);
        let leap_begin = (start + prev_dat) as i128 * 1_000_000_000;
        let leap_end = (start + dat) as i128 * 1_000_000_000;
        if tai_ns >= leap_begin && tai_ns < leap_end {
            let nanos = 1_000_000_000 + (tai_ns - leap_begin) as u32;
            return DateTime::from_timestamp( start - 1, nanos).map( |dt| dt.naive_utc())
        }
    }

    let dat = LEAP_SECONDS.iter().rev()
        .find( |(start,dat)| (*start + *dat) as i128 * 1_000_000_000 <= tai_ns)
        .map( |(_,dat)| *dat)
        .unwrap_or(10);

    from_unix_nanos( tai_ns - dat as i128 * 1_000_000_000)
}

pub fn datetime_to_tt2000 (dt: &NaiveDateTime) -> i64 {
    let utc = dt.and_utc();
    let unix_ns = utc.timestamp() as i128 * 1_000_000_000 + utc.timestamp_subsec_nanos() as i128;
    let dat = tai_utc_offset( utc.timestamp()) as i128;
    (unix_ns + dat * 1_000_000_000 - J2000_TAI_UNIX_NS) as i64
}
