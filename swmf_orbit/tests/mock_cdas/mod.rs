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


//! a local stand-in for the CDAS REST service. Requests under `/dataviews/` get the
//! configured XML reply (with `{base}` replaced by the server root URL), requests under
//! `/tmp/` get the configured file bytes. Both are counted

#![allow(unused)]

use std::sync::{Arc, Mutex, atomic::{AtomicUsize, Ordering}};
use axum::{Router, extract::State, http::{StatusCode, Uri, header::CONTENT_TYPE}, response::{IntoResponse, Response}};
use swmf_orbit::CdawebConfig;

pub struct MockCdas {
    pub base: String,
    query_status: StatusCode,
    query_body: String,
    file_body: Vec<u8>,
    queries: AtomicUsize,
    downloads: AtomicUsize,
    uris: Mutex<Vec<String>>,
}

impl MockCdas {
    pub fn num_queries (&self) -> usize { self.queries.load( Ordering::SeqCst) }

    pub fn num_downloads (&self) -> usize { self.downloads.load( Ordering::SeqCst) }

    pub fn requested_uris (&self) -> Vec<String> { self.uris.lock().unwrap().clone() }

    /// archive config pointing to this server, with the default satellite table
    pub fn config (&self) -> CdawebConfig {
        CdawebConfig { base_url: format!("{}/dataviews", self.base), ..CdawebConfig::default() }
    }
}

pub async fn start_mock (query_status: StatusCode, query_body: &str, file_body: Vec<u8>) -> Arc<MockCdas> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let mock = Arc::new( MockCdas {
        base,
        query_status,
        query_body: query_body.to_string(),
        file_body,
        queries: AtomicUsize::new(0),
        downloads: AtomicUsize::new(0),
        uris: Mutex::new( Vec::new()),
    });

    let router = Router::new().fallback( handle_request).with_state( mock.clone());
    tokio::spawn( async move {
        axum::serve( listener, router).await.unwrap();
    });

    mock
}

async fn handle_request (State(mock): State<Arc<MockCdas>>, uri: Uri) -> Response {
    mock.uris.lock().unwrap().push( uri.to_string());
    let path = uri.path();

    if path.starts_with("/dataviews/") {
        mock.queries.fetch_add( 1, Ordering::SeqCst);
        let body = mock.query_body.replace( "{base}", &mock.base);
        (mock.query_status, [(CONTENT_TYPE, "application/xml")], body).into_response()
    } else if path.starts_with("/tmp/") {
        mock.downloads.fetch_add( 1, Ordering::SeqCst);
        (StatusCode::OK, [(CONTENT_TYPE, "application/x-cdf")], mock.file_body.clone()).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

pub const CDF_FILE_NAME: &str = "c1_cp_aux_posgse_1m_00000000_v01.cdf";

pub fn file_reply () -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<DataResult xmlns="http://cdaweb.gsfc.nasa.gov/schema">
    <FileDescription>
        <Name>{{base}}/tmp/wsIv0e/{CDF_FILE_NAME}</Name>
        <MimeType>application/x-cdf</MimeType>
        <StartTime>2023-01-01T00:00:00.000Z</StartTime>
        <EndTime>2023-01-02T00:00:00.000Z</EndTime>
    </FileDescription>
</DataResult>"#)
}

pub fn error_reply (msg: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<DataResult xmlns="http://cdaweb.gsfc.nasa.gov/schema">
    <Message>Internal Error</Message>
    <Warning>some of the requested data may not be available</Warning>
    <Error>{msg}</Error>
</DataResult>"#)
}
