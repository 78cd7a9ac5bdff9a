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


use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::macros::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!(ErrorKind::PermissionDenied, "output_dir {:?} not writable", &path))
        } else {
            Ok(())
        }

    } else {
        fs::create_dir_all(path)
    }
}

/// join a plain filename (no directory components) to a dir, rejecting names that would escape it
pub fn file_in_dir (dir: impl AsRef<Path>, fname: &str) -> Result<PathBuf> {
    if fname.is_empty() || fname == "." || fname == ".." || fname.contains(['/','\\']) {
        Err(io_error!(ErrorKind::InvalidInput, "not a plain filename {fname:?}"))
    } else {
        Ok( dir.as_ref().join(fname))
    }
}

/// remove file, returning `false` if there was none
pub fn remove_file_if_exists (path: impl AsRef<Path>) -> Result<bool> {
    match fs::remove_file( path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e)
    }
}
