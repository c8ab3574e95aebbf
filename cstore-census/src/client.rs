//! The ACS client: transport, retry policy, and response validation.

use std::time::Duration;

use cstore_result::{Error, Result};
use serde_json::Value;

use crate::profile::GeographyProfile;
use crate::variables::AcsVariable;

const DEFAULT_BASE_URL: &str = "https://api.census.gov/data";
const DEFAULT_DATASET: &str = "2022/acs/acs5";
/// URL path segment for ZIP code tabulation areas.
const ZCTA_GEOGRAPHY: &str = "zip%20code%20tabulation%20area";
/// ACS publishes jam values (large negative sentinels) for suppressed cells.
const SENTINEL_FLOOR: f64 = -111_111_111.0;

/// Client configuration. The API key is required; everything else has a
/// working default.
#[derive(Clone, Debug)]
pub struct CensusConfig {
    pub api_key: String,
    pub base_url: String,
    pub dataset: String,
    pub timeout: Duration,
    /// Retries after the first attempt, on transport errors and 5xx only.
    pub max_retries: u32,
    /// First retry delay; doubles per attempt.
    pub backoff: Duration,
}

impl CensusConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            dataset: DEFAULT_DATASET.into(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// One transport-level response; status plus raw body.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Seam between the client and the network, so tests can script responses.
pub trait CensusTransport {
    fn get(&self, url: &str) -> Result<TransportResponse>;
}

/// Production transport over a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl CensusTransport for HttpTransport {
    fn get(&self, url: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::ExternalService(format!("census request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::ExternalService(format!("census response unreadable: {e}")))?;
        Ok(TransportResponse { status, body })
    }
}

/// ACS client with bounded timeout and retry/backoff.
pub struct CensusClient<T: CensusTransport> {
    config: CensusConfig,
    transport: T,
}

impl CensusClient<HttpTransport> {
    pub fn new(config: CensusConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self { config, transport })
    }
}

impl<T: CensusTransport> CensusClient<T> {
    pub fn with_transport(config: CensusConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Fetch variable profiles for a set of ZCTAs.
    pub fn fetch_zcta_profiles(
        &self,
        zctas: &[String],
        variables: &[AcsVariable],
    ) -> Result<Vec<GeographyProfile>> {
        if zctas.is_empty() {
            return Err(Error::InvalidArgumentError(
                "no ZCTAs to fetch profiles for".into(),
            ));
        }
        let geography = format!("{ZCTA_GEOGRAPHY}:{}", zctas.join(","));
        let body = self.get_with_retry(&self.build_url(variables, &geography))?;
        parse_acs_response(&body, variables)
    }

    /// Fetch the state-level profile the local values compare against.
    pub fn fetch_state_profile(
        &self,
        state_fips: &str,
        variables: &[AcsVariable],
    ) -> Result<GeographyProfile> {
        let geography = format!("state:{state_fips}");
        let body = self.get_with_retry(&self.build_url(variables, &geography))?;
        parse_acs_response(&body, variables)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::ExternalService(format!("census returned no rows for state {state_fips}"))
            })
    }

    fn build_url(&self, variables: &[AcsVariable], geography: &str) -> String {
        let codes: Vec<&str> = variables.iter().map(|v| v.code).collect();
        format!(
            "{}/{}?get=NAME,{}&for={}&key={}",
            self.config.base_url,
            self.config.dataset,
            codes.join(","),
            geography,
            self.config.api_key
        )
    }

    fn get_with_retry(&self, url: &str) -> Result<String> {
        let mut backoff = self.config.backoff;
        let mut last_failure = String::new();
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            match self.transport.get(url) {
                Ok(response) if response.status == 200 => return Ok(response.body),
                Ok(response) if response.status == 401 || response.status == 403 => {
                    return Err(Error::Config(format!(
                        "census rejected the API key (HTTP {})",
                        response.status
                    )));
                }
                Ok(response) if response.status < 500 => {
                    return Err(Error::ExternalService(format!(
                        "census returned HTTP {}: {}",
                        response.status,
                        truncate(&response.body)
                    )));
                }
                Ok(response) => {
                    last_failure = format!("HTTP {}", response.status);
                    tracing::warn!(attempt, status = response.status, "census request failed");
                }
                Err(e) => {
                    last_failure = e.to_string();
                    tracing::warn!(attempt, error = %last_failure, "census request failed");
                }
            }
        }
        Err(Error::ExternalService(format!(
            "census unreachable after {} retries: {last_failure}",
            self.config.max_retries
        )))
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= 200 {
        body
    } else {
        body.get(..200).unwrap_or(body)
    }
}

/// Validate and decode the ACS array-of-arrays payload.
///
/// The first row is a header naming each column; data rows must match its
/// arity. `"-"` and jam values decode to `None`.
pub fn parse_acs_response(
    body: &str,
    variables: &[AcsVariable],
) -> Result<Vec<GeographyProfile>> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| Error::ExternalService(format!("census payload is not JSON: {e}")))?;
    let rows = parsed
        .as_array()
        .ok_or_else(|| Error::ExternalService("census payload is not a JSON array".into()))?;
    if rows.len() < 2 {
        return Err(Error::ExternalService(
            "census payload has a header but no data rows".into(),
        ));
    }

    let header: Vec<&str> = rows[0]
        .as_array()
        .ok_or_else(|| Error::ExternalService("census header row is not an array".into()))?
        .iter()
        .map(|cell| cell.as_str().unwrap_or(""))
        .collect();

    let name_idx = header
        .iter()
        .position(|h| *h == "NAME")
        .ok_or_else(|| Error::ExternalService("census header is missing NAME".into()))?;
    // The geography identifier is the trailing column (`state`, `zip code
    // tabulation area`, ...).
    let geo_idx = header.len() - 1;

    let mut variable_indices = Vec::with_capacity(variables.len());
    for variable in variables {
        let idx = header.iter().position(|h| *h == variable.code).ok_or_else(|| {
            Error::ExternalService(format!(
                "census header is missing requested variable {}",
                variable.code
            ))
        })?;
        variable_indices.push(idx);
    }

    let mut profiles = Vec::with_capacity(rows.len() - 1);
    for row in &rows[1..] {
        let cells = row
            .as_array()
            .ok_or_else(|| Error::ExternalService("census data row is not an array".into()))?;
        if cells.len() != header.len() {
            return Err(Error::ExternalService(format!(
                "census row arity {} does not match header arity {}",
                cells.len(),
                header.len()
            )));
        }
        let values = variable_indices
            .iter()
            .map(|&idx| decode_cell(&cells[idx]))
            .collect();
        profiles.push(GeographyProfile {
            geo_id: cells[geo_idx].as_str().unwrap_or_default().to_string(),
            name: cells[name_idx].as_str().unwrap_or_default().to_string(),
            values,
        });
    }
    Ok(profiles)
}

fn decode_cell(cell: &Value) -> Option<f64> {
    let parsed = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s != "-" => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| *v > SENTINEL_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedTransport {
        responses: RefCell<Vec<Result<TransportResponse>>>,
        calls: RefCell<usize>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<TransportResponse>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl CensusTransport for &ScriptedTransport {
        fn get(&self, _url: &str) -> Result<TransportResponse> {
            *self.calls.borrow_mut() += 1;
            self.responses.borrow_mut().remove(0)
        }
    }

    fn test_config() -> CensusConfig {
        let mut config = CensusConfig::new("test-key");
        config.backoff = Duration::ZERO;
        config
    }

    const VARS: &[AcsVariable] = &[
        AcsVariable {
            code: "B01001_001E",
            label: "Total Population",
        },
        AcsVariable {
            code: "B19013_001E",
            label: "Median Household Income",
        },
    ];

    fn ok(body: &str) -> Result<TransportResponse> {
        Ok(TransportResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    const ZCTA_BODY: &str = r#"[
        ["NAME","B01001_001E","B19013_001E","zip code tabulation area"],
        ["ZCTA5 83442","4421","58125","83442"],
        ["ZCTA5 83440","35000","-","83440"]
    ]"#;

    #[test]
    fn parses_and_validates_zcta_rows() {
        let transport = ScriptedTransport::new(vec![ok(ZCTA_BODY)]);
        let client = CensusClient::with_transport(test_config(), &transport);
        let profiles = client
            .fetch_zcta_profiles(&["83442".into(), "83440".into()], VARS)
            .unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].geo_id, "83442");
        assert_eq!(profiles[0].value(VARS, "B01001_001E"), Some(4421.0));
        // "-" decodes to a withheld value, not zero.
        assert_eq!(profiles[1].value(VARS, "B19013_001E"), None);
    }

    #[test]
    fn jam_values_decode_to_none() {
        let body = r#"[
            ["NAME","B01001_001E","B19013_001E","state"],
            ["Idaho","1939033","-666666666","16"]
        ]"#;
        let transport = ScriptedTransport::new(vec![ok(body)]);
        let client = CensusClient::with_transport(test_config(), &transport);
        let state = client.fetch_state_profile("16", VARS).unwrap();
        assert_eq!(state.value(VARS, "B01001_001E"), Some(1_939_033.0));
        assert_eq!(state.value(VARS, "B19013_001E"), None);
    }

    #[test]
    fn retries_on_5xx_then_succeeds() {
        let transport = ScriptedTransport::new(vec![
            Ok(TransportResponse {
                status: 503,
                body: String::new(),
            }),
            ok(ZCTA_BODY),
        ]);
        let client = CensusClient::with_transport(test_config(), &transport);
        let profiles = client
            .fetch_zcta_profiles(&["83442".into()], VARS)
            .unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn exhausted_retries_surface_external_service() {
        let failure = || -> Result<TransportResponse> {
            Err(Error::ExternalService("connect timeout".into()))
        };
        let transport =
            ScriptedTransport::new(vec![failure(), failure(), failure(), failure()]);
        let client = CensusClient::with_transport(test_config(), &transport);
        let err = client
            .fetch_zcta_profiles(&["83442".into()], VARS)
            .unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
        // One initial attempt plus max_retries.
        assert_eq!(transport.calls(), 4);
    }

    #[test]
    fn rejected_key_is_a_config_error_and_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse {
            status: 401,
            body: String::new(),
        })]);
        let client = CensusClient::with_transport(test_config(), &transport);
        let err = client
            .fetch_zcta_profiles(&["83442".into()], VARS)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn mismatched_row_arity_is_rejected() {
        let body = r#"[
            ["NAME","B01001_001E","B19013_001E","state"],
            ["Idaho","1939033"]
        ]"#;
        let err = parse_acs_response(body, VARS).unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }
}
