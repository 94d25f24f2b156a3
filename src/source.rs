use crate::config::Config;
use crate::error::{FeedError, FeedResult};
use crate::timefmt::format_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

/// Where a feed gets its response bodies from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Full snapshot of the sensor's readings.
    async fn fetch_initial(&self) -> FeedResult<String>;

    /// Readings recorded after `since`.
    async fn fetch_since(&self, since: DateTime<Utc>) -> FeedResult<String>;

    async fn list_sensors(&self) -> FeedResult<Vec<String>>;
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    sensor_id: String,
}

impl HttpSource {
    pub fn new(
        base_url: impl Into<String>,
        sensor_id: impl Into<String>,
        timeout: Duration,
    ) -> FeedResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            sensor_id: sensor_id.into().trim().to_string(),
        })
    }

    pub fn from_config(config: &Config) -> FeedResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.sensor_id.clone(),
            config.request_timeout(),
        )
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn initial_url(&self) -> String {
        format!("{}/api/get/id/{}", self.base_url, self.sensor_id)
    }

    pub fn since_url(&self, since: &DateTime<Utc>) -> String {
        format!("{}/{}", self.initial_url(), format_timestamp(since))
    }

    pub fn sensors_url(&self) -> String {
        format!("{}/api/get/sensors", self.base_url)
    }

    async fn get_text(&self, url: String) -> FeedResult<String> {
        tracing::trace!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedSource for HttpSource {
    async fn fetch_initial(&self) -> FeedResult<String> {
        self.get_text(self.initial_url()).await
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> FeedResult<String> {
        self.get_text(self.since_url(&since)).await
    }

    async fn list_sensors(&self) -> FeedResult<Vec<String>> {
        let body = self.get_text(self.sensors_url()).await?;
        Ok(body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::HttpSource;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn builds_endpoint_urls() {
        let source =
            HttpSource::new("http://pi.local:8000/", "0", Duration::from_secs(1)).expect("source");
        assert_eq!(source.initial_url(), "http://pi.local:8000/api/get/id/0");
        assert_eq!(source.sensors_url(), "http://pi.local:8000/api/get/sensors");

        let since = Utc
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 3)
            .single()
            .expect("since");
        assert_eq!(
            source.since_url(&since),
            "http://pi.local:8000/api/get/id/0/2024-03-05T09:07:03Z"
        );
    }
}
