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


//! client side of the CDAweb (CDAS) REST interface. A data request is a GET for
//! `{base}/{dataview}/datasets/{dataset}/data/{start},{stop}/{variable}?format=cdf` which
//! answers with a `DataResult` XML document that either describes generated files or
//! reports errors

use std::path::Path;
use reqwest::Client;
use roxmltree::{Document, Node};
use tracing::{debug,info,warn};

use swmf_common::net::{get_text, get_file, NetError};
use crate::{CdawebConfig, SatelliteDescriptor, TimeRange, SwmfOrbitError, Result};

/// XML namespace of CDAS web service documents
pub const CDAS_NS: &str = "http://cdaweb.gsfc.nasa.gov/schema";

/// one generated file as announced by the archive
#[derive(Debug,Clone,PartialEq,Default)]
pub struct FileDescription {
    /// full URL of the file
    pub name: String,
    pub mime_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub length: Option<u64>,
}

/// parsed response of a CDAS data request
#[derive(Debug,Clone,PartialEq,Default)]
pub struct DataResult {
    pub files: Vec<FileDescription>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub statuses: Vec<String>,
    pub messages: Vec<String>,
}

impl DataResult {
    pub fn parse (xml: &str) -> Result<DataResult> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if !is_cdas_element( &root, "DataResult") {
            return Err( SwmfOrbitError::OpFailed( format!("unexpected response root element <{}>", root.tag_name().name())))
        }

        let mut result = DataResult::default();
        for node in root.children().filter( |n| n.is_element()) {
            if is_cdas_element( &node, "FileDescription") {
                if let Some(fd) = parse_file_description( &node) {
                    result.files.push(fd);
                }
            } else if is_cdas_element( &node, "Error") {
                result.errors.push( element_text( &node));
            } else if is_cdas_element( &node, "Warning") {
                result.warnings.push( element_text( &node));
            } else if is_cdas_element( &node, "Status") {
                result.statuses.push( element_text( &node));
            } else if is_cdas_element( &node, "Message") {
                result.messages.push( element_text( &node));
            }
        }
        Ok(result)
    }

    pub fn has_errors (&self) -> bool {
        !self.errors.is_empty()
    }
}

// elements without namespace are accepted, foreign namespaces are not
fn is_cdas_element (node: &Node, name: &str) -> bool {
    let tag = node.tag_name();
    tag.name() == name && tag.namespace().map_or( true, |ns| ns == CDAS_NS)
}

fn element_text (node: &Node) -> String {
    node.text().map( |s| s.trim().to_string()).unwrap_or_default()
}

fn child_text (node: &Node, name: &str) -> Option<String> {
    node.children()
        .find( |n| n.is_element() && is_cdas_element( n, name))
        .map( |n| element_text( &n))
        .filter( |s| !s.is_empty())
}

fn parse_file_description (node: &Node) -> Option<FileDescription> {
    let name = child_text( node, "Name")?;
    Some( FileDescription {
        name,
        mime_type: child_text( node, "MimeType"),
        start_time: child_text( node, "StartTime"),
        end_time: child_text( node, "EndTime"),
        length: child_text( node, "Length").and_then( |s| s.parse().ok()),
    })
}

/// typed result of a fetch the caller has to branch on
#[derive(Debug,Clone,PartialEq)]
pub enum FetchOutcome {
    /// file was downloaded to the given path
    Downloaded(std::path::PathBuf),
    /// archive reported errors, nothing was downloaded
    Rejected(Vec<String>),
}

pub struct CdawebFetcher {
    base_url: String,
    dataview: String,
    client: Client,
}

impl CdawebFetcher {
    pub fn new (config: &CdawebConfig)->Self {
        CdawebFetcher {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dataview: config.dataview.clone(),
            client: Client::new()
        }
    }

    pub fn query_url (&self, sat: &SatelliteDescriptor, range: &TimeRange) -> String {
        let (start,stop) = range.query_interval();
        format!("{}/{}/datasets/{}/data/{},{}/{}?format=cdf", self.base_url, self.dataview, sat.dataset_id, start, stop, sat.variable)
    }

    /// run one data request for `sat` and download the (first) announced file into `dir`.
    /// An existing file with the same name is overwritten
    pub async fn fetch (&self, sat: &SatelliteDescriptor, range: &TimeRange, dir: impl AsRef<Path>) -> Result<FetchOutcome> {
        sat.validate()?;

        let url = self.query_url( sat, range);
        debug!("{}: query {}", sat.id, url);

        let (status,text) = get_text( &self.client, &url, "application/xml").await?;
        let result = match DataResult::parse( &text) {
            Ok(result) => result,
            Err(e) => {
                return if status.is_success() { Err(e) } else { Err( NetError::StatusError(status, url).into()) }
            }
        };

        for msg in result.warnings.iter().chain( result.statuses.iter()).chain( result.messages.iter()) {
            debug!("{}: archive says: {}", sat.id, msg);
        }

        if result.has_errors() {
            for err in &result.errors {
                info!("{}: archive error: {}", sat.id, err);
            }
            return Ok( FetchOutcome::Rejected( result.errors))
        }

        if !status.is_success() {
            return Err( NetError::StatusError(status, url).into())
        }

        let Some((file, others)) = result.files.split_first() else {
            return Err( SwmfOrbitError::NoFileDescription( sat.id.clone()))
        };
        for other in others {
            warn!("{}: ignoring additional file {}", sat.id, other.name);
        }

        debug!("{}: download {}", sat.id, file.name);
        let (path,len) = get_file( &self.client, &file.name, &None, dir).await?;
        if let Some(expected) = file.length {
            if expected != len {
                warn!("{}: downloaded {} bytes of {} announced for {}", sat.id, len, expected, file.name);
            }
        }
        info!("{}: downloaded {:?} ({} bytes)", sat.id, path, len);

        Ok( FetchOutcome::Downloaded(path) )
    }
}
