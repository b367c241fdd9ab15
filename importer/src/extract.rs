use std::fmt;

use reqwest::blocking::Client;
use serde::Deserialize;

use mapgeom::Layer;

/// Something that can pull OSM features for an area. The real one talks to the ohsome API; tests
/// substitute their own.
pub trait ExtractionClient {
    /// Returns every feature matching `filter` inside `boundary`, which must be in EPSG:4326. An
    /// empty layer is a valid answer.
    fn extract(
        &self,
        filter: &str,
        time: Option<&str>,
        boundary: &Layer,
    ) -> Result<Layer, ExtractionError>;
}

pub enum ExtractionError {
    /// The request never got a response.
    Request(reqwest::Error),
    /// The API refused the request, usually because of a malformed filter or time.
    Status { status: u16, message: String },
    /// The response wasn't a feature collection.
    Decode(anyhow::Error),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtractionError::Request(err) => write!(f, "the ohsome request failed: {}", err),
            ExtractionError::Status { status, message } => {
                write!(f, "the ohsome API answered {}: {}", status, message)
            }
            ExtractionError::Decode(err) => write!(
                f,
                "the ohsome request did not work. Check input for correct spelling and logic: {:#}",
                err
            ),
        }
    }
}

impl fmt::Debug for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Request(err) => Some(err),
            ExtractionError::Status { .. } => None,
            ExtractionError::Decode(err) => Some(&**err),
        }
    }
}

/// Calls `POST /elements/geometry` on an ohsome API instance.
pub struct OhsomeClient {
    client: Client,
    base_url: String,
}

impl OhsomeClient {
    pub fn new(client: Client, base_url: &str) -> OhsomeClient {
        OhsomeClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/elements/geometry", self.base_url)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

impl ExtractionClient for OhsomeClient {
    fn extract(
        &self,
        filter: &str,
        time: Option<&str>,
        boundary: &Layer,
    ) -> Result<Layer, ExtractionError> {
        let bpolys = serde_json::to_string(&boundary.to_feature_collection())
            .map_err(|err| ExtractionError::Decode(err.into()))?;
        let form = request_form(&bpolys, filter, time);
        let url = self.endpoint();
        debug!("POST {} with filter {}", url, filter);

        let resp = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .map_err(ExtractionError::Request)?;
        let status = resp.status();
        let body = resp.text().map_err(ExtractionError::Request)?;
        if !status.is_success() {
            // The API explains itself in a JSON body; fall back to the raw text
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|err| err.message)
                .unwrap_or(body);
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Layer::from_geojson_str(&body).map_err(ExtractionError::Decode)
    }
}

fn request_form<'a>(
    bpolys: &'a str,
    filter: &'a str,
    time: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut form = vec![("bpolys", bpolys), ("filter", filter)];
    if let Some(time) = time {
        form.push(("time", time));
    }
    form.push(("properties", "tags"));
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_form() {
        assert_eq!(
            vec![
                ("bpolys", "{}"),
                ("filter", "building=*"),
                ("properties", "tags")
            ],
            request_form("{}", "building=*", None)
        );
        assert_eq!(
            vec![
                ("bpolys", "{}"),
                ("filter", "building=*"),
                ("time", "2021-01-01"),
                ("properties", "tags")
            ],
            request_form("{}", "building=*", Some("2021-01-01"))
        );
    }

    #[test]
    fn test_endpoint() {
        let client = OhsomeClient::new(Client::new(), "https://api.ohsome.org/v1/");
        assert_eq!(
            "https://api.ohsome.org/v1/elements/geometry",
            client.endpoint()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ExtractionError::Status {
            status: 400,
            message: "The provided filter is invalid".to_string(),
        };
        assert_eq!(
            "the ohsome API answered 400: The provided filter is invalid",
            err.to_string()
        );
        let err = ExtractionError::Decode(anyhow!("expected a FeatureCollection"));
        assert!(err.to_string().ends_with("expected a FeatureCollection"));
    }
}
