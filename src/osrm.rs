//! OSRM HTTP adapter for travel-time matrices.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::MatrixError;
use crate::model::TravelTimeMatrix;
use crate::traits::TravelTimeProvider;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsrmConfig {
    pub base_url: String,
    /// Routing profile, e.g. `car` or `foot`.
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "foot".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, MatrixError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn table_url(&self, locations: &[(f64, f64)]) -> String {
        // OSRM wants lon,lat
        let coords = locations
            .iter()
            .map(|(lat, lon)| format!("{:.6},{:.6}", lon, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl TravelTimeProvider for OsrmClient {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<TravelTimeMatrix, MatrixError> {
        if locations.is_empty() {
            return Ok(TravelTimeMatrix::unavailable());
        }

        let url = self.table_url(locations);
        debug!(locations = locations.len(), "requesting OSRM table");

        self.client
            .get(url)
            .send()
            .map_err(MatrixError::from)
            .and_then(|resp| decode_table(resp, locations.len()))
            .inspect_err(|err| warn!(error = %err, "OSRM table request failed"))
    }
}

/// OSRM reports bad queries as HTTP 400 with a JSON `code` and `message`,
/// so the body is read before the status is turned into an error.
fn decode_table(
    resp: reqwest::blocking::Response,
    expected: usize,
) -> Result<TravelTimeMatrix, MatrixError> {
    let status_err = resp.error_for_status_ref().err();
    match (resp.json::<OsrmTableResponse>(), status_err) {
        (Ok(body), None) => body.into_matrix(expected),
        (Ok(body), Some(_)) if body.code != "Ok" => body.into_matrix(expected),
        (_, Some(err)) | (Err(err), None) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmTableResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    /// Seconds; `null` where no route exists.
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    pub(crate) fn into_matrix(self, expected: usize) -> Result<TravelTimeMatrix, MatrixError> {
        if self.code != "Ok" {
            return Err(MatrixError::Upstream {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        let durations = self.durations.unwrap_or_default();
        let rows = durations.len();
        let cols = durations.first().map_or(0, Vec::len);
        if rows != expected || durations.iter().any(|row| row.len() != expected) {
            return Err(MatrixError::Shape {
                expected,
                rows,
                cols,
            });
        }

        Ok(TravelTimeMatrix::new(
            durations
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|value| value.map(|seconds| seconds.max(0.0).round() as u32))
                        .collect()
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serve one canned HTTP response on a local port.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        (base_url, handle)
    }

    fn client_for(base_url: String) -> OsrmClient {
        OsrmClient::new(OsrmConfig {
            base_url,
            ..Default::default()
        })
        .unwrap()
    }

    fn parse(json: &str) -> OsrmTableResponse {
        serde_json::from_str(json).expect("valid OSRM body")
    }

    #[test]
    fn test_table_url_uses_lon_lat_order() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://osrm.local/".to_string(),
            profile: "foot".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        let url = client.table_url(&[(48.8584, 2.2945), (48.8606, 2.3376)]);
        assert_eq!(
            url,
            "http://osrm.local/table/v1/foot/2.294500,48.858400;2.337600,48.860600?annotations=duration"
        );
    }

    #[test]
    fn test_null_durations_become_absent() {
        let body = parse(r#"{"code":"Ok","durations":[[0,612.4],[null,0]]}"#);
        let matrix = body.into_matrix(2).unwrap();
        assert_eq!(matrix.get(0, 1), Some(612));
        assert_eq!(matrix.get(1, 0), None);
        assert_eq!(matrix.get(1, 1), Some(0));
    }

    #[test]
    fn test_error_code_is_upstream_error() {
        let body = parse(r#"{"code":"InvalidQuery","message":"Query string malformed"}"#);
        match body.into_matrix(2) {
            Err(MatrixError::Upstream { code, message }) => {
                assert_eq!(code, "InvalidQuery");
                assert_eq!(message, "Query string malformed");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let body = parse(r#"{"code":"Ok","durations":[[0,1]]}"#);
        assert!(matches!(
            body.into_matrix(2),
            Err(MatrixError::Shape {
                expected: 2,
                rows: 1,
                cols: 2
            })
        ));
    }

    #[test]
    fn test_bad_request_body_becomes_upstream_error() {
        let (base_url, server) = serve_once(
            "400 Bad Request",
            r#"{"code":"NoSegment","message":"Could not find a matching segment for coordinate 1"}"#,
        );
        let err = client_for(base_url)
            .matrix_for(&[(48.8584, 2.2945), (0.0, 0.0)])
            .unwrap_err();
        server.join().unwrap();

        match err {
            MatrixError::Upstream { code, message } => {
                assert_eq!(code, "NoSegment");
                assert!(message.contains("coordinate 1"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_error_status_stays_http() {
        let (base_url, server) = serve_once("502 Bad Gateway", "upstream unavailable");
        let err = client_for(base_url)
            .matrix_for(&[(48.8584, 2.2945), (48.8606, 2.3376)])
            .unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, MatrixError::Http(_)));
    }

    #[test]
    fn test_ok_response_parses_matrix() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"code":"Ok","durations":[[0,300.2],[295.7,0]]}"#,
        );
        let matrix = client_for(base_url)
            .matrix_for(&[(48.8584, 2.2945), (48.8606, 2.3376)])
            .unwrap();
        server.join().unwrap();
        assert_eq!(matrix.get(0, 1), Some(300));
        assert_eq!(matrix.get(1, 0), Some(296));
    }

    #[test]
    fn test_empty_locations_skip_request() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();
        let matrix = client.matrix_for(&[]).unwrap();
        assert_eq!(matrix.size(), 0);
    }
}
