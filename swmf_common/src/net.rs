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


//! common utility functions for network operations

use std::{fs::File, io::Write, path::{Path,PathBuf}};
use reqwest::{header::{HeaderMap,HeaderValue,ACCEPT}, Client, StatusCode};
use regex::Regex;
use lazy_static::lazy_static;

use crate::{define_error, fs::file_in_dir};

lazy_static! {
    // scheme://[user@]host[:port][/path][?query][#fragment] -> path
    static ref URL_PATH_RE: Regex = Regex::new( r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^/?#]*(/[^?#]*)?").unwrap();
    static ref FNAME_RE: Regex = Regex::new( r"([^/]+)$").unwrap();
}

define_error!{ pub NetError =
    IOError(#[from] std::io::Error) : "IO error: {0}",
    NotFoundError(String) : "not found {0}",
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    StatusError(StatusCode,String) : "response status {0} for {1}",
    OpFailed(String) : "operation failed: {0}"
}

pub type Result<T> = std::result::Result<T, NetError>;

/// get filename part (last path element) of complete URL, ignoring query and fragment
/// NOTE - this does not work for partial (relative) URLs
pub fn url_file_name (url: &str) -> Option<&str> {
    URL_PATH_RE.captures( url)
        .and_then( |cap| cap.get(1))
        .and_then( |p| FNAME_RE.captures( p.as_str()))
        .and_then( |cap| cap.get(1))
        .map( |m| m.as_str())
}

/// GET the text content of a URL with the given `Accept` mime type. Since some REST services
/// report errors in the body of non-2xx responses we return the status along with the text
/// and leave it to the caller to interpret both
pub async fn get_text (client: &Client, url: &str, accept: &'static str) -> Result<(StatusCode,String)> {
    let response = client.get(url)
        .header( ACCEPT, HeaderValue::from_static(accept))
        .send().await?;

    let status = response.status();
    let text = response.text().await?;
    Ok( (status,text) )
}

/// fetch file from URL using HTTP GET method and store it under the URL filename in `dir`,
/// overwriting any existing file with that name. Retrieve in chunks to support large files
/// Note this requires a full URL
pub async fn get_file (client: &Client, url: &str, opt_headers: &Option<HeaderMap>, dir: impl AsRef<Path>) -> Result<(PathBuf,u64)> {
    if let Some(fname) = url_file_name( url) {
        let path = file_in_dir( dir, fname)?;
        let len = download_url( client, url, opt_headers, &path).await?;
        Ok( (path,len) )
    } else {
        Err( NetError::OpFailed(format!("not a file URL: {}", url)) )
    }
}

pub async fn download_url (client: &Client, url: &str, opt_headers: &Option<HeaderMap>, path: impl AsRef<Path>) -> Result<u64> {
    let mut req = client.get(url);
    if let Some(headermap) = &opt_headers {
        req = req.headers(headermap.clone())
    }

    let mut response = req.send().await?;

    match response.status() {
        StatusCode::OK => {
            let mut file = File::create(path)?;
            let mut len: u64 = 0;

            while let Some(chunk) = response.chunk().await? {
                len += chunk.len() as u64;
                file.write_all(&chunk)?;
            }

            file.flush()?;
            Ok(len)
        }
        StatusCode::NOT_FOUND => {
            Err( NetError::NotFoundError(format!("{url}")))
        }
        other => {
            Err( NetError::StatusError(other, url.to_string()))
        }
    }
}
