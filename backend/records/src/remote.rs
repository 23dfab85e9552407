use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::{HealthSample, RecordError, RecordStore, UserRecord, check_key};

const USERS: &str = "users";
const HEALTH_DATA: &str = "HealthData";

/// REST client for the hosted realtime database.
///
/// Every node is addressed as `<endpoint>/<path>.json`, optionally authorised
/// with an `auth` query parameter.
pub struct RealtimeDatabase {
    client: Client,
    endpoint: Url,
    auth: Option<String>,
}

impl RealtimeDatabase {
    pub fn new(client: Client, endpoint: &str, auth: Option<String>) -> Result<Self, RecordError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RecordError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        if endpoint.cannot_be_a_base() {
            return Err(RecordError::InvalidEndpoint(endpoint.to_string()));
        }

        Ok(Self {
            client,
            endpoint,
            auth,
        })
    }

    pub fn user_url(&self, prn: &str) -> Result<Url, RecordError> {
        check_key(prn)?;

        self.node_url(&[USERS, prn])
    }

    pub fn sample_url(&self, prn: &str, date: &str) -> Result<Url, RecordError> {
        check_key(prn)?;
        check_key(date)?;

        self.node_url(&[USERS, prn, HEALTH_DATA, date])
    }

    fn node_url(&self, path: &[&str]) -> Result<Url, RecordError> {
        let mut url = self.endpoint.clone();

        if let Some((last, parents)) = path.split_last() {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RecordError::InvalidEndpoint(self.endpoint.to_string()))?;

            segments.pop_if_empty().extend(parents);
            segments.push(&format!("{last}.json"));
        }

        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }

        Ok(url)
    }
}

async fn check_status(response: Response) -> Result<Response, RecordError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RecordError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RecordStore for RealtimeDatabase {
    async fn write(&self, prn: &str, record: &UserRecord) -> Result<(), RecordError> {
        let url = self.user_url(prn)?;
        debug!(prn, "Writing user record");

        let response = self.client.put(url).json(record).send().await?;
        check_status(response).await?;

        Ok(())
    }

    async fn read(&self, prn: &str) -> Result<Option<UserRecord>, RecordError> {
        let url = self.user_url(prn)?;
        debug!(prn, "Reading user record");

        let response = check_status(self.client.get(url).send().await?).await?;
        let bytes = response.bytes().await?;

        // Absent nodes come back as a literal `null`.
        Ok(serde_json::from_slice::<Option<UserRecord>>(&bytes)?)
    }

    async fn write_sample(
        &self,
        prn: &str,
        date: &str,
        sample: &HealthSample,
    ) -> Result<(), RecordError> {
        let url = self.sample_url(prn, date)?;
        debug!(prn, date, "Writing health sample");

        let response = self.client.put(url).json(sample).send().await?;
        check_status(response).await?;

        Ok(())
    }
}
