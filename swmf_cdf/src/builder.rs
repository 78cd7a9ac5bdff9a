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


//! a minimal writer for single-file CDF version 3 files with zVariables. This is not a
//! general purpose CDF writer - it produces the small, well-formed files that are needed to
//! exercise readers without access to the real archive

use std::{io::Write, path::Path};
use bytes::BufMut;
use chrono::NaiveDateTime;
use flate2::{Compression as GzLevel, write::GzEncoder};

use crate::epoch::{datetime_to_epoch, datetime_to_tt2000};
use crate::errors::Result;
use crate::records::*;
use crate::types::{ByteOrder, DataType, Encoding};

const CDR_LEN: usize = 312;
const GDR_LEN: usize = 84;
const ADR_LEN: usize = 324;
const AEDR_HEADER_LEN: usize = 56;
const VXR_LEN: usize = 44; // one entry
const CPR_LEN: usize = 28; // one parameter
const CVVR_HEADER_LEN: usize = 24;
const GZIP: i32 = 5;

struct BuilderVar {
    name: String,
    data_type: DataType,
    dims: Vec<usize>,
    n_records: usize,
    /// values in file encoding, record order, each record in file majority
    data: Vec<u8>,
    attrs: Vec<(String,String)>,
}

impl BuilderVar {
    fn vdr_len (&self) -> usize { 340 + 4 + 8 * self.dims.len() }
}

/// what gets written where
struct Layout {
    vdr: Vec<usize>,
    adr: Vec<usize>,
    aedr: Vec<Vec<usize>>,
    var_data: Vec<(usize,usize,usize,Vec<u8>)>, // (cpr, vxr, vvr/cvvr, stored bytes)
    eof: usize,
}

pub struct CdfBuilder {
    encoding: Encoding,
    row_major: bool,
    gzip_file: bool,
    gzip_variables: bool,
    global_attrs: Vec<(String,String)>,
    vars: Vec<BuilderVar>,
}

impl CdfBuilder {
    pub fn new (encoding: Encoding) -> Self {
        CdfBuilder { encoding, row_major: true, gzip_file: false, gzip_variables: false, global_attrs: Vec::new(), vars: Vec::new() }
    }

    /// store multi-dimensional records in column-major order (values are still passed in row-major order)
    pub fn column_major (mut self) -> Self { self.row_major = false; self }

    /// GZIP compress the whole file (CCR/CPR)
    pub fn gzip_file (mut self) -> Self { self.gzip_file = true; self }

    /// GZIP compress the values of each variable (CVVR)
    pub fn gzip_variables (mut self) -> Self { self.gzip_variables = true; self }

    pub fn global_attribute (mut self, name: &str, value: &str) -> Self {
        self.global_attrs.push( (name.to_string(), value.to_string()));
        self
    }

    /// add a CDF_REAL8 zVariable. `values` are in row-major order and hold a whole number of records
    pub fn real8_variable (mut self, name: &str, dims: &[usize], values: &[f64]) -> Self {
        let per_rec: usize = dims.iter().product();
        let n_records = if per_rec > 0 { values.len() / per_rec } else { 0 };
        let order = self.encoding.byte_order();

        let mut data = Vec::with_capacity( values.len() * 8);
        for rec in values.chunks_exact(per_rec.max(1)).take(n_records) {
            let rec = if self.row_major { rec.to_vec() } else { to_column_major( rec, dims) };
            for v in rec {
                match order { ByteOrder::Big => data.put_f64(v), ByteOrder::Little => data.put_f64_le(v) }
            }
        }

        self.vars.push( BuilderVar { name: name.to_string(), data_type: DataType::Real8, dims: dims.to_vec(), n_records, data, attrs: Vec::new() });
        self
    }

    pub fn epoch_variable (mut self, name: &str, times: &[NaiveDateTime]) -> Self {
        let order = self.encoding.byte_order();
        let mut data = Vec::with_capacity( times.len() * 8);
        for t in times {
            let v = datetime_to_epoch(t);
            match order { ByteOrder::Big => data.put_f64(v), ByteOrder::Little => data.put_f64_le(v) }
        }

        self.vars.push( BuilderVar { name: name.to_string(), data_type: DataType::Epoch, dims: Vec::new(), n_records: times.len(), data, attrs: Vec::new() });
        self
    }

    pub fn tt2000_variable (mut self, name: &str, times: &[NaiveDateTime]) -> Self {
        let order = self.encoding.byte_order();
        let mut data = Vec::with_capacity( times.len() * 8);
        for t in times {
            let v = datetime_to_tt2000(t);
            match order { ByteOrder::Big => data.put_i64(v), ByteOrder::Little => data.put_i64_le(v) }
        }

        self.vars.push( BuilderVar { name: name.to_string(), data_type: DataType::TimeTt2000, dims: Vec::new(), n_records: times.len(), data, attrs: Vec::new() });
        self
    }

    /// add a CDF_CHAR variable attribute entry to the most recently added variable
    pub fn attr (mut self, name: &str, value: &str) -> Self {
        if let Some(var) = self.vars.last_mut() {
            var.attrs.push( (name.to_string(), value.to_string()));
        }
        self
    }

    pub fn write (&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write( path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes (&self) -> Result<Vec<u8>> {
        let bytes = self.uncompressed_bytes()?;
        if self.gzip_file { compress_file( &bytes) } else { Ok(bytes) }
    }

    /// variable scope attribute names in order of first use
    fn var_attr_names (&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for var in &self.vars {
            for (name,_) in &var.attrs {
                if !names.contains( &name.as_str()) { names.push( name.as_str()) }
            }
        }
        names
    }

    fn layout (&self) -> Result<Layout> {
        let mut off = 8 + CDR_LEN + GDR_LEN;

        let mut vdr = Vec::new();
        for var in &self.vars {
            vdr.push(off);
            off += var.vdr_len();
        }

        let mut adr = Vec::new();
        let mut aedr = Vec::new();
        for (_,value) in &self.global_attrs {
            adr.push(off);
            off += ADR_LEN;
            aedr.push( vec![off]);
            off += AEDR_HEADER_LEN + value.len();
        }
        for name in self.var_attr_names() {
            adr.push(off);
            off += ADR_LEN;
            let mut entries = Vec::new();
            for var in &self.vars {
                if let Some((_,value)) = var.attrs.iter().find(|(n,_)| n == name) {
                    entries.push(off);
                    off += AEDR_HEADER_LEN + value.len();
                }
            }
            aedr.push(entries);
        }

        let mut var_data = Vec::new();
        for var in &self.vars {
            let stored = if self.gzip_variables { gzip( &var.data)? } else { var.data.clone() };
            let cpr = if self.gzip_variables { let o = off; off += CPR_LEN; o } else { 0 };
            let vxr = off;
            off += VXR_LEN;
            let vvr = off;
            off += if self.gzip_variables { CVVR_HEADER_LEN } else { RECORD_HEADER_LEN } + stored.len();
            var_data.push( (cpr, vxr, vvr, stored));
        }

        Ok( Layout { vdr, adr, aedr, var_data, eof: off } )
    }

    fn uncompressed_bytes (&self) -> Result<Vec<u8>> {
        let layout = self.layout()?;
        let order_flags = if self.row_major { 3 } else { 2 }; // single file + majority
        let var_attr_names = self.var_attr_names();
        let n_attrs = self.global_attrs.len() + var_attr_names.len();

        let mut buf: Vec<u8> = Vec::with_capacity( layout.eof);
        buf.put_u32( MAGIC_V3);
        buf.put_u32( MAGIC_UNCOMPRESSED);

        //--- CDR
        header( &mut buf, CDR_LEN, CDR);
        buf.put_i64( (8 + CDR_LEN) as i64);
        buf.put_i32(3); // version
        buf.put_i32(9); // release
        buf.put_i32( self.encoding.code());
        buf.put_i32( order_flags);
        buf.put_i32(0);
        buf.put_i32(0);
        buf.put_i32(0); // increment
        buf.put_i32(3); // identifier
        buf.put_i32(-1);
        put_name( &mut buf, "Common Data Format (CDF)");

        //--- GDR
        header( &mut buf, GDR_LEN, GDR);
        buf.put_i64(0); // rVDRhead
        buf.put_i64( head_or_zero( &layout.vdr));
        buf.put_i64( head_or_zero( &layout.adr));
        buf.put_i64( layout.eof as i64);
        buf.put_i32(0); // NrVars
        buf.put_i32( n_attrs as i32);
        buf.put_i32(-1); // rMaxRec
        buf.put_i32(0); // rNumDims
        buf.put_i32( self.vars.len() as i32);
        buf.put_i64(0); // UIRhead
        buf.put_i32(0);
        buf.put_i32(-1);
        buf.put_i32(-1);

        //--- zVDRs
        for (i,var) in self.vars.iter().enumerate() {
            let (cpr, vxr, _, _) = &layout.var_data[i];
            let has_data = var.n_records > 0;

            header( &mut buf, var.vdr_len(), ZVDR);
            buf.put_i64( next_or_zero( &layout.vdr, i));
            buf.put_i32( var.data_type.code());
            buf.put_i32( var.n_records as i32 - 1);
            buf.put_i64( if has_data { *vxr as i64 } else { 0 });
            buf.put_i64( if has_data { *vxr as i64 } else { 0 });
            buf.put_i32( if self.gzip_variables { 5 } else { 1 }); // record variance (+ compression)
            buf.put_i32(0); // SRecords
            buf.put_i32(0);
            buf.put_i32(-1);
            buf.put_i32(-1);
            buf.put_i32(1); // NumElems
            buf.put_i32( i as i32);
            buf.put_i64( if self.gzip_variables { *cpr as i64 } else { -1 });
            buf.put_i32(0); // BlockingFactor
            put_name( &mut buf, &var.name);
            buf.put_i32( var.dims.len() as i32);
            for d in &var.dims { buf.put_i32( *d as i32) }
            for _ in &var.dims { buf.put_i32(-1) } // all dimensions vary
        }

        //--- ADRs and AEDRs
        let attrs: Vec<(&str,bool)> = self.global_attrs.iter().map(|(n,_)| (n.as_str(),true))
            .chain( var_attr_names.iter().map(|n| (*n,false)))
            .collect();

        for (a,(name,global)) in attrs.iter().enumerate() {
            let entries = &layout.aedr[a];
            header( &mut buf, ADR_LEN, ADR);
            buf.put_i64( next_or_zero( &layout.adr, a));
            buf.put_i64( if *global { entries[0] as i64 } else { 0 });
            buf.put_i32( if *global { 1 } else { 2 });
            buf.put_i32( a as i32);
            buf.put_i32( if *global { 1 } else { 0 }); // NgrEntries
            buf.put_i32( if *global { 0 } else { -1 }); // MAXgrEntry
            buf.put_i32(0);
            buf.put_i64( if *global { 0 } else { head_or_zero(entries) });
            let z_nums: Vec<usize> = if *global { Vec::new() } else {
                self.vars.iter().enumerate().filter(|(_,v)| v.attrs.iter().any(|(n,_)| n == name)).map(|(i,_)| i).collect()
            };
            buf.put_i32( z_nums.len() as i32);
            buf.put_i32( z_nums.last().map(|n| *n as i32).unwrap_or(-1));
            buf.put_i32(-1);
            put_name( &mut buf, name);

            let values: Vec<(usize,&str)> = if *global {
                vec![ (0, self.global_attrs[a].1.as_str()) ]
            } else {
                z_nums.iter().filter_map( |i| {
                    self.vars[*i].attrs.iter().find(|(n,_)| n == name).map(|(_,v)| (*i, v.as_str()))
                }).collect()
            };

            for (e,(num,value)) in values.iter().enumerate() {
                header( &mut buf, AEDR_HEADER_LEN + value.len(), if *global { AGREDR } else { AZEDR });
                buf.put_i64( next_or_zero( entries, e));
                buf.put_i32( a as i32);
                buf.put_i32( DataType::Char.code());
                buf.put_i32( *num as i32);
                buf.put_i32( value.len() as i32);
                buf.put_i32(0); // NumStrings
                buf.put_i32(0);
                buf.put_i32(0);
                buf.put_i32(-1);
                buf.put_i32(-1);
                buf.put_slice( value.as_bytes());
            }
        }

        //--- CPR, VXR, VVR/CVVR per variable
        for (var,(_, _, vvr, stored)) in self.vars.iter().zip( layout.var_data.iter()) {
            if self.gzip_variables {
                put_cpr( &mut buf);
            }

            header( &mut buf, VXR_LEN, VXR);
            buf.put_i64(0);
            buf.put_i32(1);
            buf.put_i32( if var.n_records > 0 { 1 } else { 0 });
            buf.put_i32(0);
            buf.put_i32( var.n_records as i32 - 1);
            buf.put_i64( *vvr as i64);

            if self.gzip_variables {
                header( &mut buf, CVVR_HEADER_LEN + stored.len(), CVVR);
                buf.put_i32(0);
                buf.put_i64( stored.len() as i64);
            } else {
                header( &mut buf, RECORD_HEADER_LEN + stored.len(), VVR);
            }
            buf.put_slice( stored);
        }

        Ok(buf)
    }
}

fn header (buf: &mut Vec<u8>, size: usize, rec_type: i32) {
    buf.put_i64( size as i64);
    buf.put_i32( rec_type);
}

fn put_name (buf: &mut Vec<u8>, name: &str) {
    let bytes = name.as_bytes();
    let n = bytes.len().min(NAME_LEN);
    buf.put_slice( &bytes[..n]);
    buf.put_bytes( 0, NAME_LEN - n);
}

fn put_cpr (buf: &mut Vec<u8>) {
    header( buf, CPR_LEN, CPR);
    buf.put_i32( GZIP);
    buf.put_i32(0);
    buf.put_i32(1);
    buf.put_i32(6); // gzip level
}

fn head_or_zero (offsets: &[usize]) -> i64 {
    offsets.first().map(|o| *o as i64).unwrap_or(0)
}

fn next_or_zero (offsets: &[usize], i: usize) -> i64 {
    offsets.get(i+1).map(|o| *o as i64).unwrap_or(0)
}

fn gzip (data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new( Vec::new(), GzLevel::default());
    enc.write_all(data)?;
    Ok( enc.finish()?)
}

/// turn an uncompressed file image into a CCR/CPR compressed file
fn compress_file (bytes: &[u8]) -> Result<Vec<u8>> {
    let compressed = gzip( &bytes[8..])?;
    let ccr_len = RECORD_HEADER_LEN + 8 + 8 + 4 + compressed.len();
    let cpr_offset = 8 + ccr_len;

    let mut buf: Vec<u8> = Vec::with_capacity( cpr_offset + CPR_LEN);
    buf.put_u32( MAGIC_V3);
    buf.put_u32( MAGIC_COMPRESSED);
    header( &mut buf, ccr_len, CCR);
    buf.put_i64( cpr_offset as i64);
    buf.put_i64( (bytes.len() - 8) as i64);
    buf.put_i32(0);
    buf.put_slice( &compressed);
    put_cpr( &mut buf);
    Ok(buf)
}

/// reorder a row-major record of the given dims into column-major order
fn to_column_major (rec: &[f64], dims: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; rec.len()];
    let mut idx = vec![0usize; dims.len()];

    for v in rec {
        let mut pos = 0;
        let mut stride = 1;
        for (i,d) in idx.iter().zip( dims.iter()) {
            pos += i * stride;
            stride *= d;
        }
        out[pos] = *v;

        // advance row-major multi-index (last dimension fastest)
        for k in (0..dims.len()).rev() {
            idx[k] += 1;
            if idx[k] < dims[k] { break }
            idx[k] = 0;
        }
    }
    out
}
