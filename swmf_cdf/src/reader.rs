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


use std::{collections::{HashMap,HashSet}, io::Read, path::Path};
use bytes::Buf;
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use ndarray::{ArrayD,IxDyn};
use tracing::debug;

use crate::epoch::{epoch_to_datetime, epoch16_to_datetime, tt2000_to_datetime};
use crate::errors::{CdfError, Result, corrupt, unsupported};
use crate::records::*;
use crate::types::{ByteOrder, DataType, Encoding};

/// max nesting of VXR trees we follow
const MAX_VXR_DEPTH: usize = 16;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Compression {
    Rle,
    Gzip,
}

impl Compression {
    fn from_code (c_type: i32) -> Result<Option<Compression>> {
        match c_type {
            0 => Ok(None),
            1 => Ok(Some(Compression::Rle)),
            5 => Ok(Some(Compression::Gzip)),
            2 | 3 => Err( unsupported("Huffman compression")),
            other => Err( unsupported( format!("compression type {other}")))
        }
    }

    fn decompress (&self, input: &[u8], size_hint: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(size_hint);
        match self {
            Compression::Gzip => {
                GzDecoder::new(input).read_to_end(&mut out)
                    .map_err(|e| CdfError::DecompressionError(e.to_string()))?;
            }
            Compression::Rle => { // run-length encoding of zeros: 0x00 <n> means n+1 zero bytes
                let mut it = input.iter();
                while let Some(b) = it.next() {
                    if *b == 0 {
                        let n = *it.next().ok_or_else(|| CdfError::DecompressionError("truncated RLE run".into()))? as usize;
                        out.resize( out.len() + n + 1, 0);
                    } else {
                        out.push(*b);
                    }
                }
            }
        }
        Ok(out)
    }
}

/// descriptor of an r- or z-variable
#[derive(Debug,Clone)]
pub struct Variable {
    pub name: String,
    pub num: usize,
    pub is_z: bool,
    pub data_type: DataType,
    pub num_elems: usize,
    /// last written record number, -1 if there are none
    pub max_rec: i32,
    pub rec_vary: bool,
    pub dim_sizes: Vec<usize>,
    pub dim_varys: Vec<bool>,
    pub compression: Option<Compression>,
    vxr_head: u64,
    pad: Option<Vec<u8>>,
}

impl Variable {
    /// the physically stored dimensions (non-varying dimensions are stored only once and dropped)
    pub fn shape (&self) -> Vec<usize> {
        self.dim_sizes.iter().zip( self.dim_varys.iter())
            .filter_map( |(size,vary)| if *vary { Some(*size) } else { None })
            .collect()
    }

    pub fn num_records (&self) -> usize {
        if self.max_rec < 0 { 0 } else if self.rec_vary { self.max_rec as usize + 1 } else { 1 }
    }

    pub fn values_per_record (&self) -> usize {
        self.shape().iter().product()
    }

    pub fn value_size (&self) -> usize {
        self.num_elems * self.data_type.size()
    }

    pub fn record_size (&self) -> usize {
        self.values_per_record() * self.value_size()
    }
}

#[derive(Debug,Clone,PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(Vec<i64>),
    Real(Vec<f64>),
}

impl AttrValue {
    pub fn as_text (&self) -> Option<&str> {
        if let AttrValue::Text(s) = self { Some(s.as_str()) } else { None }
    }
}

#[derive(Debug,Clone)]
pub struct Attribute {
    pub name: String,
    pub num: usize,
    pub global: bool,
    /// global entries, or rVariable entries for variable scope attributes (keyed by entry number)
    pub gr_entries: HashMap<usize,AttrValue>,
    /// zVariable entries (keyed by zVariable number)
    pub z_entries: HashMap<usize,AttrValue>,
}

/// an in-memory, read-only CDF
pub struct Cdf {
    data: Vec<u8>,
    order: ByteOrder,
    row_major: bool,
    version: (i32,i32),
    variables: Vec<Variable>,
    attributes: Vec<Attribute>,
}

impl Cdf {
    pub fn open (path: impl AsRef<Path>) -> Result<Cdf> {
        let path = path.as_ref();
        debug!("reading CDF {path:?}");
        let data = std::fs::read(path)?;
        Cdf::from_bytes(data)
    }

    pub fn from_bytes (data: Vec<u8>) -> Result<Cdf> {
        if data.len() < 8 {
            return Err( CdfError::NotACdf( format!("only {} bytes", data.len())))
        }
        let mut magic = &data[0..8];
        let magic1 = magic.get_u32();
        let magic2 = magic.get_u32();

        match magic1 {
            MAGIC_V3 => {}
            MAGIC_V2 | MAGIC_V2_OLD => return Err( unsupported("CDF version 2 files")),
            other => return Err( CdfError::NotACdf( format!("magic number {other:#010x}")))
        }

        let data = match magic2 {
            MAGIC_UNCOMPRESSED => data,
            MAGIC_COMPRESSED => decompress_file( &data)?,
            other => return Err( CdfError::NotACdf( format!("compression magic {other:#010x}")))
        };

        let cdr = Cdr::parse( &data, 8)?;
        let order = Encoding::from_code( cdr.encoding)?.byte_order();
        let gdr = Gdr::parse( &data, cdr.gdr_offset)?;

        let mut variables = read_variables( &data, gdr.r_vdr_head, gdr.n_r_vars, &gdr.r_dim_sizes)?;
        variables.extend( read_variables( &data, gdr.z_vdr_head, gdr.n_z_vars, &gdr.r_dim_sizes)?);
        let attributes = read_attributes( &data, gdr.adr_head, gdr.num_attr, order)?;

        debug!("CDF {}.{}: {} variables, {} attributes", cdr.version, cdr.release, variables.len(), attributes.len());

        Ok( Cdf { row_major: cdr.is_row_major(), version: (cdr.version, cdr.release), data, order, variables, attributes } )
    }

    pub fn version (&self) -> (i32,i32) { self.version }

    pub fn byte_order (&self) -> ByteOrder { self.order }

    pub fn is_row_major (&self) -> bool { self.row_major }

    pub fn variables (&self) -> &[Variable] { &self.variables }

    pub fn variable (&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find( |v| v.name == name)
    }

    fn get_variable (&self, name: &str) -> Result<&Variable> {
        self.variable(name).ok_or_else(|| CdfError::NoSuchVariable(name.to_string()))
    }

    pub fn attributes (&self) -> &[Attribute] { &self.attributes }

    pub fn attribute (&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find( |a| a.name == name)
    }

    /// all entries of a global attribute, ordered by entry number
    pub fn global_attribute (&self, name: &str) -> Option<Vec<&AttrValue>> {
        self.attribute(name).filter(|a| a.global).map( |a| {
            let mut entries: Vec<(&usize,&AttrValue)> = a.gr_entries.iter().collect();
            entries.sort_by_key( |(n,_)| **n);
            entries.into_iter().map( |(_,v)| v).collect()
        })
    }

    pub fn variable_attribute (&self, var_name: &str, attr_name: &str) -> Option<&AttrValue> {
        let var = self.variable(var_name)?;
        let attr = self.attribute(attr_name).filter(|a| !a.global)?;
        if var.is_z { attr.z_entries.get(&var.num) } else { attr.gr_entries.get(&var.num) }
    }

    /// name of the variable that holds the time tags of `var_name` (ISTP convention)
    pub fn depend_0 (&self, var_name: &str) -> Option<&str> {
        self.variable_attribute( var_name, "DEPEND_0").and_then( |v| v.as_text())
    }

    /// the raw (file encoded) bytes of all records of a variable, in record order. Records that
    /// were never written are filled with the pad value or zeros
    pub fn read_raw (&self, name: &str) -> Result<Vec<u8>> {
        let var = self.get_variable(name)?;
        let n_values = var.values_per_record() * var.num_records();
        let mut out = match &var.pad {
            Some(pad) => pad.repeat( n_values),
            None => vec![0u8; n_values * var.value_size()]
        };

        if var.vxr_head != 0 && !out.is_empty() {
            self.fill_from_vxr( var, var.vxr_head, &mut out, 0)?;
        }
        Ok(out)
    }

    fn fill_from_vxr (&self, var: &Variable, head: u64, out: &mut [u8], depth: usize) -> Result<()> {
        if depth > MAX_VXR_DEPTH {
            return Err( corrupt( head, "VXR tree too deep"))
        }

        let rec_size = var.record_size();
        let n_recs = var.num_records();
        let mut visited: HashSet<u64> = HashSet::new();
        let mut next = head;

        while next != 0 {
            if !visited.insert(next) {
                return Err( corrupt( next, "cyclic VXR chain"))
            }
            let vxr = Vxr::parse( &self.data, next)?;

            for e in &vxr.entries {
                if e.first < 0 || e.last < e.first {
                    return Err( corrupt( next, format!("invalid VXR entry {}..{}", e.first, e.last)))
                }
                let first = e.first as usize;
                if first >= n_recs { continue } // allocated but never written

                let last = (e.last as usize).min( n_recs - 1);
                let len = (last - first + 1) * rec_size;
                let dest = first*rec_size .. first*rec_size + len;

                let (rec_type, fields) = expect_record( &self.data, e.offset, &[VXR,VVR,CVVR])?;
                match rec_type {
                    VXR => self.fill_from_vxr( var, e.offset, out, depth+1)?,
                    VVR => {
                        let src = fields.rest();
                        if src.len() < len { return Err( corrupt( e.offset, "VVR shorter than its records")) }
                        out[dest].copy_from_slice( &src[..len]);
                    }
                    _ => {
                        let compression = var.compression.ok_or_else(|| corrupt( e.offset, "CVVR for uncompressed variable"))?;
                        let src = compression.decompress( cvvr_data(fields)?, len)?;
                        if src.len() < len { return Err( corrupt( e.offset, "CVVR shorter than its records")) }
                        out[dest].copy_from_slice( &src[..len]);
                    }
                }
            }
            next = vxr.next;
        }
        Ok(())
    }

    /// numeric variable values as f64 array of shape `[records, dims..]` in row-major order
    pub fn read_f64 (&self, name: &str) -> Result<ArrayD<f64>> {
        let var = self.get_variable(name)?;
        if var.data_type.is_text() || var.data_type == DataType::Epoch16 || var.num_elems != 1 {
            return Err( CdfError::TypeMismatch( name.to_string(), var.data_type.to_string()))
        }

        let raw = self.read_raw(name)?;
        let values: Vec<f64> = raw.chunks_exact( var.data_type.size())
            .map( |chunk| decode_f64( var.data_type, self.order, chunk))
            .collect();

        let shape = var.shape();
        let n_recs = var.num_records();

        if self.row_major || shape.len() < 2 {
            let mut dims = vec![n_recs];
            dims.extend_from_slice( &shape);
            ArrayD::from_shape_vec( IxDyn(&dims), values).map_err(|e| corrupt(0, e.to_string()))

        } else { // column major records: store with reversed dims, then reverse the axes back
            let mut dims = vec![n_recs];
            dims.extend( shape.iter().rev());
            let arr = ArrayD::from_shape_vec( IxDyn(&dims), values).map_err(|e| corrupt(0, e.to_string()))?;

            let mut axes: Vec<usize> = vec![0];
            axes.extend( (1..dims.len()).rev());
            Ok( arr.permuted_axes( IxDyn(&axes)).as_standard_layout().into_owned())
        }
    }

    /// time tag values of a CDF_EPOCH, CDF_EPOCH16 or CDF_TIME_TT2000 variable, flattened in
    /// record order. Fill values are reported as errors
    pub fn read_times (&self, name: &str) -> Result<Vec<NaiveDateTime>> {
        let var = self.get_variable(name)?;
        if !var.data_type.is_time() || var.num_elems != 1 {
            return Err( CdfError::TypeMismatch( name.to_string(), var.data_type.to_string()))
        }

        let raw = self.read_raw(name)?;
        let order = self.order;

        raw.chunks_exact( var.data_type.size()).enumerate().map( |(i,mut chunk)| {
            let t = match var.data_type {
                DataType::Epoch => epoch_to_datetime( get_f64( &mut chunk, order)),
                DataType::Epoch16 => {
                    let secs = get_f64( &mut chunk, order);
                    let picos = get_f64( &mut chunk, order);
                    epoch16_to_datetime( secs, picos)
                }
                _ => tt2000_to_datetime( get_i64( &mut chunk, order)),
            };
            t.ok_or_else(|| CdfError::TypeMismatch( format!("{name}[{i}]"), "fill or invalid time value".to_string()))
        }).collect()
    }
}

fn decompress_file (data: &[u8]) -> Result<Vec<u8>> {
    let ccr = Ccr::parse( data, 8)?;
    let cpr = Cpr::parse( data, ccr.cpr_offset)?;
    let compression = Compression::from_code( cpr.c_type)?
        .ok_or_else(|| corrupt( 8, "compressed CDF without compression type"))?;

    let u_size = usize::try_from(ccr.u_size).map_err(|_| corrupt(8, "invalid uncompressed size"))?;
    let content = compression.decompress( ccr.data, u_size)?;
    if content.len() != u_size {
        return Err( CdfError::DecompressionError( format!("expected {} bytes, got {}", u_size, content.len())))
    }

    // offsets inside the uncompressed content are relative to the start of the uncompressed file
    let mut out = Vec::with_capacity( u_size + 8);
    out.extend_from_slice( &MAGIC_V3.to_be_bytes());
    out.extend_from_slice( &MAGIC_UNCOMPRESSED.to_be_bytes());
    out.extend_from_slice( &content);
    Ok(out)
}

fn read_variables (data: &[u8], head: u64, n_vars: usize, r_dim_sizes: &[usize]) -> Result<Vec<Variable>> {
    let mut vars = Vec::with_capacity(n_vars);
    let mut next = head;

    while next != 0 && vars.len() < n_vars {
        let vdr = Vdr::parse( data, next, r_dim_sizes)?;
        let compression = if vdr.is_compressed() && vdr.cpr_offset != 0 {
            Compression::from_code( Cpr::parse( data, vdr.cpr_offset)?.c_type)?
        } else {
            None
        };

        vars.push( Variable {
            rec_vary: vdr.is_record_variant(),
            compression,
            name: vdr.name,
            num: vdr.num,
            is_z: vdr.is_z,
            data_type: vdr.data_type,
            num_elems: vdr.num_elems,
            max_rec: vdr.max_rec,
            dim_sizes: vdr.dim_sizes,
            dim_varys: vdr.dim_varys,
            vxr_head: vdr.vxr_head,
            pad: vdr.pad,
        });
        next = vdr.next;
    }
    Ok(vars)
}

fn read_attributes (data: &[u8], head: u64, n_attrs: usize, order: ByteOrder) -> Result<Vec<Attribute>> {
    let mut attrs = Vec::with_capacity(n_attrs);
    let mut next = head;

    while next != 0 && attrs.len() < n_attrs {
        let adr = Adr::parse( data, next)?;
        attrs.push( Attribute {
            name: adr.name.clone(),
            num: adr.num,
            global: adr.is_global(),
            gr_entries: read_entries( data, adr.agr_edr_head, order)?,
            z_entries: read_entries( data, adr.az_edr_head, order)?,
        });
        next = adr.next;
    }
    Ok(attrs)
}

fn read_entries (data: &[u8], head: u64, order: ByteOrder) -> Result<HashMap<usize,AttrValue>> {
    let mut entries = HashMap::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut next = head;

    while next != 0 {
        if !visited.insert(next) {
            return Err( corrupt( next, "cyclic AEDR chain"))
        }
        let aedr = Aedr::parse( data, next)?;
        entries.insert( aedr.num, attr_value( &aedr, order));
        next = aedr.next;
    }
    Ok(entries)
}

fn attr_value (aedr: &Aedr, order: ByteOrder) -> AttrValue {
    use DataType::*;
    let size = aedr.data_type.size();
    let values = aedr.value.chunks_exact(size);

    match aedr.data_type {
        Char | UChar => AttrValue::Text( text_from_bytes( aedr.value)),
        Real4 | Float | Real8 | Double | Epoch => AttrValue::Real( values.map(|c| decode_f64( aedr.data_type, order, c)).collect()),
        Epoch16 => AttrValue::Real( values.map(|mut c| get_f64( &mut c, order)).collect()), // seconds part only
        _ => AttrValue::Int( values.map(|c| decode_f64( aedr.data_type, order, c) as i64).collect()),
    }
}

macro_rules! get_ordered {
    ($buf:expr, $order:expr, $be:ident, $le:ident) => {
        match $order { ByteOrder::Big => $buf.$be(), ByteOrder::Little => $buf.$le() }
    }
}

fn get_f64 (buf: &mut &[u8], order: ByteOrder) -> f64 { get_ordered!( buf, order, get_f64, get_f64_le) }

fn get_i64 (buf: &mut &[u8], order: ByteOrder) -> i64 { get_ordered!( buf, order, get_i64, get_i64_le) }

/// decode a single value of a numeric type. Callers guarantee `bytes` holds one element
fn decode_f64 (data_type: DataType, order: ByteOrder, mut bytes: &[u8]) -> f64 {
    use DataType::*;
    let b = &mut bytes;
    match data_type {
        Int1 | Byte => b.get_i8() as f64,
        UInt1 | Char | UChar => b.get_u8() as f64,
        Int2 => get_ordered!( b, order, get_i16, get_i16_le) as f64,
        UInt2 => get_ordered!( b, order, get_u16, get_u16_le) as f64,
        Int4 => get_ordered!( b, order, get_i32, get_i32_le) as f64,
        UInt4 => get_ordered!( b, order, get_u32, get_u32_le) as f64,
        Int8 | TimeTt2000 => get_ordered!( b, order, get_i64, get_i64_le) as f64,
        Real4 | Float => get_ordered!( b, order, get_f32, get_f32_le) as f64,
        Real8 | Double | Epoch | Epoch16 => get_ordered!( b, order, get_f64, get_f64_le),
    }
}
