use chrono_tz::Tz;
use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    /// Serial device the sensor is attached to.
    #[arg(long, env = "SERIAL_PORT", required_unless_present = "list_ports")]
    pub port: Option<String>,

    #[arg(long, env = "BAUD_RATE", default_value_t = 115_200)]
    pub baud_rate: u32,

    /// Endpoint every reading is POSTed to.
    #[arg(long, env = "SINK_URL", default_value = "http://localhost:8000/api/readings")]
    pub sink_url: String,

    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,

    #[arg(long, default_value_t = 1000)]
    pub read_timeout_ms: u64,

    #[arg(long, default_value_t = 3)]
    pub connect_attempts: u32,

    #[arg(long, default_value_t = 2000)]
    pub retry_delay_ms: u64,

    #[arg(long, default_value_t = 5000)]
    pub forward_timeout_ms: u64,

    #[arg(long, default_value_t = 16 * 1024)]
    pub max_buffer_bytes: usize,

    /// Print the serial ports visible to this host and exit.
    #[arg(long)]
    pub list_ports: bool,
}
