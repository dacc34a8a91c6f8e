//! Thin historical-weather lookup. Only the input/output contract matters
//! here; a missing or failed lookup degrades to "no weather data".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub date: String,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub max_wind_gust_kmh: Option<f64>,
}

impl WeatherSummary {
    /// One-line summary suitable for inclusion in a section prompt.
    pub fn narrative(&self) -> String {
        let mut parts = vec![format!("On {}", self.date)];
        if let (Some(max), Some(min)) = (self.max_temp_c, self.min_temp_c) {
            parts.push(format!("temperatures ranged {min:.1}°C to {max:.1}°C"));
        }
        if let Some(p) = self.precipitation_mm {
            parts.push(format!("total precipitation was {p:.1} mm"));
        }
        if let Some(g) = self.max_wind_gust_kmh {
            parts.push(format!("peak wind gusts reached {g:.1} km/h"));
        }
        parts.join(", ")
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Daily conditions for a site on a given date (YYYY-MM-DD).
    async fn historical(
        &self,
        latitude: f64,
        longitude: f64,
        date: &str,
    ) -> anyhow::Result<WeatherSummary>;
}

/// Open-Meteo archive client; the historical endpoint needs no API key.
pub struct OpenMeteoClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self::with_base_url("https://archive-api.open-meteo.com".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn historical(
        &self,
        latitude: f64,
        longitude: f64,
        date: &str,
    ) -> anyhow::Result<WeatherSummary> {
        let url = format!("{}/v1/archive", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", date.to_string()),
                ("end_date", date.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_gusts_10m_max"
                        .to_string(),
                ),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let json: serde_json::Value = resp.json().await?;

        let daily = |field: &str| {
            json.pointer(&format!("/daily/{field}/0"))
                .and_then(|v| v.as_f64())
        };

        Ok(WeatherSummary {
            date: date.to_string(),
            max_temp_c: daily("temperature_2m_max"),
            min_temp_c: daily("temperature_2m_min"),
            precipitation_mm: daily("precipitation_sum"),
            max_wind_gust_kmh: daily("wind_gusts_10m_max"),
        })
    }
}
