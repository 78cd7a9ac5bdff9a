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


//! parsers for the internal CDF records. All record fields are big-endian, offsets and
//! record sizes are 8 bytes wide (CDF version 3)

use bytes::Buf;
use crate::errors::{Result,corrupt};
use crate::types::DataType;

pub const CDR: i32 = 1;
pub const GDR: i32 = 2;
pub const RVDR: i32 = 3;
pub const ADR: i32 = 4;
pub const AGREDR: i32 = 5;
pub const VXR: i32 = 6;
pub const VVR: i32 = 7;
pub const ZVDR: i32 = 8;
pub const AZEDR: i32 = 9;
pub const CCR: i32 = 10;
pub const CPR: i32 = 11;
pub const CVVR: i32 = 13;

pub const MAGIC_V3: u32 = 0xCDF3_0001;
pub const MAGIC_V2: u32 = 0xCDF2_6002;
pub const MAGIC_V2_OLD: u32 = 0x0000_FFFF;
pub const MAGIC_UNCOMPRESSED: u32 = 0x0000_FFFF;
pub const MAGIC_COMPRESSED: u32 = 0xCCCC_0001;

pub const NAME_LEN: usize = 256;
pub const RECORD_HEADER_LEN: usize = 12;

/// the body of a record (everything after size and type) plus its file offset for diagnostics
pub struct Fields<'a> {
    pub offset: u64,
    buf: &'a [u8],
}

impl<'a> Fields<'a> {
    fn need (&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            Err( corrupt( self.offset, format!("record truncated, {} bytes missing", n - self.buf.remaining())))
        } else {
            Ok(())
        }
    }

    pub fn i32 (&mut self) -> Result<i32> { self.need(4)?; Ok( self.buf.get_i32()) }

    pub fn i64 (&mut self) -> Result<i64> { self.need(8)?; Ok( self.buf.get_i64()) }

    /// file offsets are signed in the format, with -1 or 0 meaning "none"
    pub fn offset (&mut self) -> Result<u64> {
        let v = self.i64()?;
        Ok( if v < 0 { 0 } else { v as u64 })
    }

    pub fn count (&mut self) -> Result<usize> {
        let v = self.i32()?;
        usize::try_from(v).map_err(|_| corrupt( self.offset, format!("negative count {v}")))
    }

    pub fn count_i64 (&mut self) -> Result<usize> {
        let v = self.i64()?;
        usize::try_from(v).map_err(|_| corrupt( self.offset, format!("invalid size {v}")))
    }

    pub fn skip (&mut self, n: usize) -> Result<()> { self.need(n)?; self.buf.advance(n); Ok(()) }

    pub fn bytes (&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let (head,tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub fn name (&mut self) -> Result<String> {
        Ok( text_from_bytes( self.bytes(NAME_LEN)?))
    }

    pub fn rest (&self) -> &'a [u8] { self.buf }
}

/// NUL terminated/padded text field to String
pub fn text_from_bytes (bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy( &bytes[..end]).trim_end().to_string()
}

/// get type and body of the record at `offset`
pub fn record_at (data: &[u8], offset: u64) -> Result<(i32,Fields<'_>)> {
    let start = usize::try_from(offset).map_err(|_| corrupt(offset, "offset out of range"))?;
    if start.checked_add(RECORD_HEADER_LEN).map_or(true, |end| end > data.len()) {
        return Err( corrupt( offset, "record header beyond end of file"))
    }

    let mut hdr = &data[start..start+RECORD_HEADER_LEN];
    let size = hdr.get_i64();
    let rec_type = hdr.get_i32();

    let size = usize::try_from(size).map_err(|_| corrupt(offset, format!("invalid record size {size}")))?;
    if size < RECORD_HEADER_LEN || start.checked_add(size).map_or(true, |end| end > data.len()) {
        return Err( corrupt( offset, format!("invalid record size {size}")))
    }

    Ok( (rec_type, Fields { offset, buf: &data[start+RECORD_HEADER_LEN .. start+size] }) )
}

pub fn expect_record<'a> (data: &'a [u8], offset: u64, expected: &[i32]) -> Result<(i32,Fields<'a>)> {
    let (rec_type, fields) = record_at( data, offset)?;
    if expected.contains(&rec_type) {
        Ok( (rec_type,fields) )
    } else {
        Err( corrupt( offset, format!("expected record type {expected:?}, found {rec_type}")))
    }
}

/* #region record types *********************************************************************/

#[derive(Debug)]
pub struct Cdr {
    pub gdr_offset: u64,
    pub version: i32,
    pub release: i32,
    pub encoding: i32,
    pub flags: i32,
}

impl Cdr {
    pub fn parse (data: &[u8], offset: u64) -> Result<Cdr> {
        let (_,mut f) = expect_record( data, offset, &[CDR])?;
        let gdr_offset = f.offset()?;
        let version = f.i32()?;
        let release = f.i32()?;
        let encoding = f.i32()?;
        let flags = f.i32()?;
        Ok( Cdr { gdr_offset, version, release, encoding, flags } )
    }

    pub fn is_row_major (&self) -> bool { self.flags & 1 != 0 }
}

#[derive(Debug)]
pub struct Gdr {
    pub r_vdr_head: u64,
    pub z_vdr_head: u64,
    pub adr_head: u64,
    pub n_r_vars: usize,
    pub num_attr: usize,
    pub n_z_vars: usize,
    pub r_dim_sizes: Vec<usize>,
}

impl Gdr {
    pub fn parse (data: &[u8], offset: u64) -> Result<Gdr> {
        let (_,mut f) = expect_record( data, offset, &[GDR])?;
        let r_vdr_head = f.offset()?;
        let z_vdr_head = f.offset()?;
        let adr_head = f.offset()?;
        let _eof = f.i64()?;
        let n_r_vars = f.count()?;
        let num_attr = f.count()?;
        let _r_max_rec = f.i32()?;
        let r_num_dims = f.count()?;
        let n_z_vars = f.count()?;
        let _uir_head = f.i64()?;
        f.skip(12)?; // rfuC, LeapSecondLastUpdated, rfuE
        let r_dim_sizes = (0..r_num_dims).map(|_| f.count()).collect::<Result<Vec<usize>>>()?;

        Ok( Gdr { r_vdr_head, z_vdr_head, adr_head, n_r_vars, num_attr, n_z_vars, r_dim_sizes } )
    }
}

/// rVDR or zVDR
#[derive(Debug)]
pub struct Vdr {
    pub is_z: bool,
    pub next: u64,
    pub data_type: DataType,
    pub max_rec: i32,
    pub vxr_head: u64,
    pub flags: i32,
    pub num_elems: usize,
    pub num: usize,
    pub cpr_offset: u64,
    pub name: String,
    pub dim_sizes: Vec<usize>,
    pub dim_varys: Vec<bool>,
    pub pad: Option<Vec<u8>>,
}

impl Vdr {
    pub fn parse (data: &[u8], offset: u64, r_dim_sizes: &[usize]) -> Result<Vdr> {
        let (rec_type,mut f) = expect_record( data, offset, &[RVDR,ZVDR])?;
        let is_z = rec_type == ZVDR;

        let next = f.offset()?;
        let data_type = DataType::from_code( f.i32()?)?;
        let max_rec = f.i32()?;
        let vxr_head = f.offset()?;
        let _vxr_tail = f.i64()?;
        let flags = f.i32()?;
        f.skip(16)?; // SRecords, rfuB, rfuC, rfuF
        let num_elems = f.count()?;
        let num = f.count()?;
        let cpr_offset = f.offset()?;
        let _blocking_factor = f.i32()?;
        let name = f.name()?;

        let dim_sizes = if is_z {
            let n = f.count()?;
            (0..n).map(|_| f.count()).collect::<Result<Vec<usize>>>()?
        } else {
            r_dim_sizes.to_vec()
        };
        let dim_varys = (0..dim_sizes.len()).map(|_| f.i32().map(|v| v != 0)).collect::<Result<Vec<bool>>>()?;

        let pad = if flags & 2 != 0 {
            Some( f.bytes( num_elems * data_type.size())?.to_vec())
        } else {
            None
        };

        Ok( Vdr { is_z, next, data_type, max_rec, vxr_head, flags, num_elems, num, cpr_offset, name, dim_sizes, dim_varys, pad } )
    }

    pub fn is_record_variant (&self) -> bool { self.flags & 1 != 0 }

    pub fn is_compressed (&self) -> bool { self.flags & 4 != 0 }
}

#[derive(Debug)]
pub struct VxrEntry {
    pub first: i32,
    pub last: i32,
    pub offset: u64,
}

#[derive(Debug)]
pub struct Vxr {
    pub next: u64,
    pub entries: Vec<VxrEntry>,
}

impl Vxr {
    pub fn parse (data: &[u8], offset: u64) -> Result<Vxr> {
        let (_,mut f) = expect_record( data, offset, &[VXR])?;
        let next = f.offset()?;
        let n_entries = f.count()?;
        let n_used = f.count()?.min(n_entries);

        let firsts = (0..n_entries).map(|_| f.i32()).collect::<Result<Vec<i32>>>()?;
        let lasts = (0..n_entries).map(|_| f.i32()).collect::<Result<Vec<i32>>>()?;
        let offsets = (0..n_entries).map(|_| f.offset()).collect::<Result<Vec<u64>>>()?;

        let entries = (0..n_used).map(|i| VxrEntry { first: firsts[i], last: lasts[i], offset: offsets[i] }).collect();
        Ok( Vxr { next, entries } )
    }
}

#[derive(Debug)]
pub struct Adr {
    pub next: u64,
    pub agr_edr_head: u64,
    pub scope: i32,
    pub num: usize,
    pub az_edr_head: u64,
    pub name: String,
}

impl Adr {
    pub fn parse (data: &[u8], offset: u64) -> Result<Adr> {
        let (_,mut f) = expect_record( data, offset, &[ADR])?;
        let next = f.offset()?;
        let agr_edr_head = f.offset()?;
        let scope = f.i32()?;
        let num = f.count()?;
        f.skip(12)?; // NgrEntries, MAXgrEntry, rfuA
        let az_edr_head = f.offset()?;
        f.skip(12)?; // NzEntries, MAXzEntry, rfuE
        let name = f.name()?;

        Ok( Adr { next, agr_edr_head, scope, num, az_edr_head, name } )
    }

    /// scopes 1 (global) and 3 (global assumed)
    pub fn is_global (&self) -> bool { self.scope == 1 || self.scope == 3 }
}

/// AgrEDR or AzEDR
#[derive(Debug)]
pub struct Aedr<'a> {
    pub next: u64,
    pub data_type: DataType,
    pub num: usize,
    pub num_elems: usize,
    pub value: &'a [u8],
}

impl<'a> Aedr<'a> {
    pub fn parse (data: &'a [u8], offset: u64) -> Result<Aedr<'a>> {
        let (_,mut f) = expect_record( data, offset, &[AGREDR,AZEDR])?;
        let next = f.offset()?;
        let _attr_num = f.i32()?;
        let data_type = DataType::from_code( f.i32()?)?;
        let num = f.count()?;
        let num_elems = f.count()?;
        f.skip(20)?; // NumStrings, rfuB, rfuC, rfuD, rfuE
        let value = f.bytes( num_elems * data_type.size())?;

        Ok( Aedr { next, data_type, num, num_elems, value } )
    }
}

#[derive(Debug)]
pub struct Cpr {
    pub c_type: i32,
    pub parms: Vec<i32>,
}

impl Cpr {
    pub fn parse (data: &[u8], offset: u64) -> Result<Cpr> {
        let (_,mut f) = expect_record( data, offset, &[CPR])?;
        let c_type = f.i32()?;
        let _rfu_a = f.i32()?;
        let p_count = f.count()?;
        let parms = (0..p_count).map(|_| f.i32()).collect::<Result<Vec<i32>>>()?;
        Ok( Cpr { c_type, parms } )
    }
}

/// compressed CDF (whole file) record
#[derive(Debug)]
pub struct Ccr<'a> {
    pub cpr_offset: u64,
    pub u_size: u64,
    pub data: &'a [u8],
}

impl<'a> Ccr<'a> {
    pub fn parse (data: &'a [u8], offset: u64) -> Result<Ccr<'a>> {
        let (_,mut f) = expect_record( data, offset, &[CCR])?;
        let cpr_offset = f.offset()?;
        let u_size = f.offset()?;
        let _rfu_a = f.i32()?;
        Ok( Ccr { cpr_offset, u_size, data: f.rest() } )
    }
}

/// compressed variable values record
pub fn cvvr_data<'a> (mut f: Fields<'a>) -> Result<&'a [u8]> {
    let _rfu_a = f.i32()?;
    let c_size = f.count_i64()?;
    f.bytes(c_size)
}

/* #endregion record types */
