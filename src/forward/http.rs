use std::time::Duration;

use crate::forward::{ForwardError, Sink};
use crate::reading::Reading;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts each reading as a JSON body to one URL.
pub struct HttpSink {
    url: String,
    agent: ureq::Agent,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ForwardError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ForwardError::InvalidUrl(url));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("air-quality/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self { url, agent })
    }
}

impl Sink for HttpSink {
    fn submit(&self, reading: &Reading) -> Result<(), ForwardError> {
        match self.agent.post(&self.url).send_json(reading) {
            Ok(resp) if (200..300).contains(&resp.status()) => Ok(()),
            Ok(resp) => Err(ForwardError::Status {
                code: resp.status(),
            }),
            Err(ureq::Error::Status(code, _)) => Err(ForwardError::Status { code }),
            Err(ureq::Error::Transport(t)) => Err(ForwardError::Transport(t.to_string())),
        }
    }
}
