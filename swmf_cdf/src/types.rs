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


use std::fmt;
use strum::{FromRepr,IntoStaticStr};
use crate::errors::{Result,unsupported};

/// CDF data types (the numeric values are the type codes stored in VDRs and AEDRs)
#[derive(Debug,Clone,Copy,PartialEq,Eq,FromRepr,IntoStaticStr)]
#[repr(i32)]
pub enum DataType {
    #[strum(serialize="CDF_INT1")] Int1 = 1,
    #[strum(serialize="CDF_INT2")] Int2 = 2,
    #[strum(serialize="CDF_INT4")] Int4 = 4,
    #[strum(serialize="CDF_INT8")] Int8 = 8,
    #[strum(serialize="CDF_UINT1")] UInt1 = 11,
    #[strum(serialize="CDF_UINT2")] UInt2 = 12,
    #[strum(serialize="CDF_UINT4")] UInt4 = 14,
    #[strum(serialize="CDF_REAL4")] Real4 = 21,
    #[strum(serialize="CDF_REAL8")] Real8 = 22,
    #[strum(serialize="CDF_EPOCH")] Epoch = 31,
    #[strum(serialize="CDF_EPOCH16")] Epoch16 = 32,
    #[strum(serialize="CDF_TIME_TT2000")] TimeTt2000 = 33,
    #[strum(serialize="CDF_BYTE")] Byte = 41,
    #[strum(serialize="CDF_FLOAT")] Float = 44,
    #[strum(serialize="CDF_DOUBLE")] Double = 45,
    #[strum(serialize="CDF_CHAR")] Char = 51,
    #[strum(serialize="CDF_UCHAR")] UChar = 52,
}

impl DataType {
    pub fn from_code (code: i32) -> Result<DataType> {
        DataType::from_repr(code).ok_or_else(|| unsupported(format!("data type {code}")))
    }

    pub fn code (&self) -> i32 { *self as i32 }

    /// size in bytes of a single element
    pub fn size (&self) -> usize {
        use DataType::*;
        match self {
            Int1 | UInt1 | Byte | Char | UChar => 1,
            Int2 | UInt2 => 2,
            Int4 | UInt4 | Real4 | Float => 4,
            Int8 | Real8 | Double | Epoch | TimeTt2000 => 8,
            Epoch16 => 16,
        }
    }

    pub fn is_text (&self) -> bool {
        matches!( self, DataType::Char | DataType::UChar)
    }

    pub fn is_time (&self) -> bool {
        matches!( self, DataType::Epoch | DataType::Epoch16 | DataType::TimeTt2000)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ByteOrder {
    Big,
    Little
}

/// CDF data encodings we can read. VAX and the ALPHAVMSd/g encodings use non-IEEE floats
#[derive(Debug,Clone,Copy,PartialEq,Eq,FromRepr,IntoStaticStr)]
#[repr(i32)]
pub enum Encoding {
    Network = 1,
    Sun = 2,
    DecStation = 4,
    Sgi = 5,
    IbmPc = 6,
    IbmRs = 7,
    Ppc = 9,
    Hp = 11,
    NeXT = 12,
    AlphaOsf1 = 13,
    AlphaVmsI = 16,
    ArmLittle = 17,
    ArmBig = 18,
}

impl Encoding {
    pub fn from_code (code: i32) -> Result<Encoding> {
        Encoding::from_repr(code).ok_or_else(|| unsupported(format!("data encoding {code}")))
    }

    pub fn code (&self) -> i32 { *self as i32 }

    pub fn byte_order (&self) -> ByteOrder {
        use Encoding::*;
        match self {
            DecStation | IbmPc | AlphaOsf1 | AlphaVmsI | ArmLittle => ByteOrder::Little,
            Network | Sun | Sgi | IbmRs | Ppc | Hp | NeXT | ArmBig => ByteOrder::Big,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes() {
        assert_eq!( DataType::from_code(22).unwrap(), DataType::Real8);
        assert_eq!( DataType::from_code(33).unwrap().size(), 8);
        assert_eq!( DataType::Epoch16.size(), 16);
        assert_eq!( DataType::TimeTt2000.to_string(), "CDF_TIME_TT2000");
        assert!( DataType::from_code(3).is_err());
    }

    #[test]
    fn test_encodings() {
        assert_eq!( Encoding::from_code(6).unwrap().byte_order(), ByteOrder::Little);
        assert_eq!( Encoding::from_code(1).unwrap().byte_order(), ByteOrder::Big);
        assert!( Encoding::from_code(3).is_err()); // VAX
    }
}
