// ESDR client module: a small blocking HTTP client for the handful of ESDR
// calls the uploader needs (OAuth login, product/device/feed lookups and
// creation, and the final data upload).

use std::fs::File;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{Feed, NewFeed};

/// ESDR product name all Flamingo devices are registered under.
pub const FLAMINGO_PRODUCT_NAME: &str = "flamingo_v1";

/// Holds a reqwest blocking client, the ESDR URLs and client credentials,
/// and the OAuth access token once logged in.
#[derive(Clone)]
pub struct EsdrClient {
    client: Client,
    root_url: String,
    api_root_url: String,
    client_name: String,
    client_secret: String,
    token: Option<String>,
}

/// OAuth password-grant request.
#[derive(Serialize, Debug)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    username: &'a str,
    password: &'a str,
}

/// Response of `/oauth/token`. Only the access token is needed.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Every ESDR API response wraps its payload in `data`.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize, Debug)]
struct IdOnly {
    id: i64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Rows<T> {
    #[serde(default)]
    total_count: Option<u64>,
    rows: Vec<T>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NewDevice<'a> {
    name: String,
    serial_number: &'a str,
}

impl EsdrClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(EsdrClient {
            client,
            root_url: config.esdr.root_url.trim_end_matches('/').to_string(),
            api_root_url: config.esdr.api_root_url.trim_end_matches('/').to_string(),
            client_name: config.client.name.clone(),
            client_secret: config.client.secret.clone(),
            token: None,
        })
    }

    /// Store the OAuth access token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = format!("Bearer {}", t);
            let val = HeaderValue::from_str(&val)
                .map_err(|e| Error::Config(format!("invalid access token: {}", e)))?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_root_url, path)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response> {
        let res = req.headers(self.auth_headers()?).send()?;
        check_status(res)
    }

    fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.api_url(path);
        debug!("GET {}", url);
        let res = self.send(self.client.get(&url))?;
        let envelope: Envelope<T> = res.json()?;
        Ok(envelope.data)
    }

    fn post_data<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.api_url(path);
        debug!("POST {}", url);
        let res = self.send(self.client.post(&url).json(body))?;
        let envelope: Envelope<T> = res.json()?;
        Ok(envelope.data)
    }

    /// Log in with the OAuth password grant.
    ///
    /// Returns `Ok(None)` when ESDR rejects the credentials (401/403) so the
    /// caller can ask again; any other failure is an error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<TokenResponse>> {
        let url = format!("{}/oauth/token", self.root_url);
        debug!("POST {}", url);
        let req = TokenRequest {
            grant_type: "password",
            client_id: &self.client_name,
            client_secret: &self.client_secret,
            username,
            password,
        };
        let res = self.client.post(&url).json(&req).send()?;
        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Ok(Some(check_status(res)?.json()?)),
        }
    }

    pub fn product_id(&self, product_name: &str) -> Result<i64> {
        let product: IdOnly = self.get_data(&format!("/products/{}?fields=id", product_name))?;
        Ok(product.id)
    }

    /// Id of the device with this serial number, if it is registered to
    /// the logged-in user.
    pub fn find_device(&self, serial_number: &str) -> Result<Option<i64>> {
        let devices: Rows<IdOnly> =
            self.get_data(&format!("/devices?where=serialNumber={}", serial_number))?;
        if devices.total_count.unwrap_or(devices.rows.len() as u64) < 1 {
            return Ok(None);
        }
        Ok(devices.rows.first().map(|d| d.id))
    }

    /// Register a device under the Flamingo product and return its id.
    pub fn register_device(&self, product_id: i64, serial_number: &str) -> Result<i64> {
        let body = NewDevice {
            name: device_name(serial_number),
            serial_number,
        };
        let device: IdOnly = self.post_data(&format!("/products/{}/devices", product_id), &body)?;
        Ok(device.id)
    }

    pub fn feeds_for_device(&self, device_id: i64) -> Result<Vec<Feed>> {
        let feeds: Rows<Feed> = self.get_data(&format!("/feeds?where=deviceId={}", device_id))?;
        Ok(feeds.rows)
    }

    pub fn create_feed(&self, device_id: i64, feed: &NewFeed) -> Result<Feed> {
        let mut created: Feed = self.post_data(&format!("/devices/{}/feeds", device_id), feed)?;
        if created.name.is_empty() {
            created.name = feed.name.clone();
        }
        if !created.is_public {
            created.is_public = feed.is_public;
        }
        Ok(created)
    }

    /// Upload a converted JSON document to the feed with `api_key`. The file
    /// is streamed as the request body.
    pub fn upload(&self, api_key: &str, body: File) -> Result<()> {
        let url = self.api_url(&format!("/feeds/{}", api_key));
        debug!("PUT {}", url);
        self.client
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(Error::from)
            .and_then(check_status)?;
        Ok(())
    }
}

fn check_status(res: Response) -> Result<Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().unwrap_or_default();
    Err(Error::Api { status, body })
}

/// Display name for a newly registered device: `Flamingo (<serial[..8]>)`.
pub fn device_name(serial_number: &str) -> String {
    let short: String = serial_number.chars().take(8).collect();
    format!("Flamingo ({})", short)
}
