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

pub type Result<T> = std::result::Result<T, CdfError>;

#[derive(Error,Debug)]
pub enum CdfError {
    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("not a CDF file: {0}")]
    NotACdf(String),

    #[error("unsupported CDF feature: {0}")]
    Unsupported(String),

    #[error("corrupt CDF record at offset {0}: {1}")]
    CorruptRecord(u64,String),

    #[error("no such variable: {0}")]
    NoSuchVariable(String),

    #[error("variable {0} has incompatible type {1}")]
    TypeMismatch(String,String),

    #[error("decompression failed: {0}")]
    DecompressionError(String),
}

pub fn corrupt (offset: u64, msg: impl ToString)->CdfError {
    CdfError::CorruptRecord( offset, msg.to_string())
}

pub fn unsupported (msg: impl ToString)->CdfError {
    CdfError::Unsupported( msg.to_string())
}
