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


use thiserror::Error;
use swmf_cdf::CdfError;
use swmf_common::net::NetError;

pub type Result<T> = std::result::Result<T, SwmfOrbitError>;

#[derive(Error,Debug)]
pub enum SwmfOrbitError {
    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("network error {0}")]
    NetError( #[from] NetError),

    #[error("XML error {0}")]
    XmlError( #[from] roxmltree::Error),

    #[error("CDF error {0}")]
    CdfError( #[from] CdfError),

    #[error("config error {0}")]
    ConfigError( #[from] ron::error::SpannedError),

    #[error("invalid date {0}")]
    DateError(String),

    #[error("invalid satellite descriptor {0}")]
    DescriptorError(String),

    #[error("no FileDescription in archive response for {0}")]
    NoFileDescription(String),

    #[error("orbit format error {0}")]
    FormatError(String),

    /// a generic error
    #[error("operation failed {0}")]
    OpFailed(String)
}

pub fn op_failed (msg: impl ToString)->SwmfOrbitError {
    SwmfOrbitError::OpFailed(msg.to_string())
}

pub fn format_error (msg: impl ToString)->SwmfOrbitError {
    SwmfOrbitError::FormatError(msg.to_string())
}
