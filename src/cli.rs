use crate::config::Config;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "measurement-feed",
    version,
    about = "Tail timestamped sensor readings from a measurement server"
)]
pub struct Args {
    /// Server root, e.g. http://127.0.0.1:8000 (overrides FEED_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,
    /// Sensor id to follow (overrides FEED_SENSOR_ID)
    #[arg(long)]
    pub sensor: Option<String>,
    /// Print the server's sensor ids and exit
    #[arg(long, default_value_t = false)]
    pub list_sensors: bool,
    /// Print readings as JSON lines instead of logging them
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Args {
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = self.base_url.as_deref().map(str::trim) {
            config.base_url = url.to_string();
        }
        if let Some(sensor) = self.sensor.as_deref().map(str::trim) {
            config.sensor_id = sensor.to_string();
        }
    }
}
