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


use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// format of calendar dates on the command line (e.g. 20230101)
pub const CLI_DATE_FORMAT: &str = "%Y%m%d";

/// ISO 8601 basic format as used in CDAweb REST time intervals (e.g. 20230101T000000Z)
pub const ISO_BASIC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// format for human readable provenance timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[inline]
pub fn local_now()->DateTime<Local> {
    Local::now()
}

/// parse a strict `YYYYMMDD` date spec into a NaiveDateTime at 00:00:00
/// chrono itself accepts variable width years, hence the explicit length and digit check
pub fn parse_yyyymmdd (spec: &str) -> Option<NaiveDateTime> {
    if spec.len() != 8 || !spec.bytes().all(|b| b.is_ascii_digit()) {
        return None
    }
    NaiveDate::parse_from_str( spec, CLI_DATE_FORMAT).ok().map( start_of_day)
}

pub fn start_of_day (date: NaiveDate) -> NaiveDateTime {
    date.and_time( NaiveTime::MIN)
}

/// return the given datetime with hour, minute, second and fractions zeroed
pub fn truncate_to_day (dt: &NaiveDateTime) -> NaiveDateTime {
    start_of_day( dt.date())
}

pub fn add_days (dt: &NaiveDateTime, n: u32) -> NaiveDateTime {
    *dt + TimeDelta::days( n as i64)
}

pub fn iso_basic_string (dt: &NaiveDateTime) -> String {
    dt.format( ISO_BASIC_FORMAT).to_string()
}

/// local wall clock time formatted as `YYYY-MM-DD HH:MM:SS`
pub fn local_timestamp_string () -> String {
    local_now().format( TIMESTAMP_FORMAT).to_string()
}
