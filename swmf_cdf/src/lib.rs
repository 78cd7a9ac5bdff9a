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


//! read-only access to NASA Common Data Format (CDF) version 3 files, which is the format
//! in which CDAweb delivers its data sets. Supported are single-file CDFs (uncompressed or
//! GZIP compressed), r- and zVariables with GZIP/RLE compressed values, all numeric and time
//! data types, and global/variable attributes
//!
//! ```ignore
//! let cdf = Cdf::open("c1_cp_aux_posgse_1m.cdf")?;
//! let var = "sc_r_xyz_gse__C1_CP_AUX_POSGSE_1M";
//! let times = cdf.read_times( cdf.depend_0(var).unwrap_or("Epoch"))?;
//! let xyz = cdf.read_f64(var)?; // shape [times.len(), 3]
//! ```

pub mod errors;
pub use errors::*;

pub mod types;
pub use types::{ByteOrder,DataType,Encoding};

pub mod epoch;

mod records;

mod reader;
pub use reader::*;

pub mod builder;
