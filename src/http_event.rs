use crate::entry::{Entry, CLIENT_IP_KEY, ERROR_KEY, MESSAGE_KEY, REQUEST_METHOD_KEY, REQUEST_URL_KEY, STATUS_CODE_KEY};
use crate::error::HookError;
use crate::level::Level;
use crate::logger::Logger;
use crate::structured_error::StructuredError;
use chrono::{DateTime, Utc};
use http::header::{HeaderName, REFERER, USER_AGENT};

/// One served HTTP request, ready to be logged.
#[derive(Debug, Clone)]
pub struct HttpEvent {
    pub method: String,
    pub url: String,
    pub client_ip: String,
    pub referer: String,
    pub user_agent: String,
    pub status: u16,
    pub message: String,
    pub error: Option<StructuredError>,
    pub request_time: DateTime<Utc>,
    pub response_time: DateTime<Utc>,
}

impl HttpEvent {
    /// Read method, URL, referer and user agent from `req`.
    ///
    /// `client_ip` is the peer address as seen by the server; the request
    /// itself does not carry it.
    pub fn from_request<B>(req: &http::Request<B>, client_ip: impl Into<String>, status: u16) -> Self {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().to_string());
        let now = Utc::now();

        HttpEvent {
            method: req.method().to_string(),
            url,
            client_ip: client_ip.into(),
            referer: header(REFERER),
            user_agent: header(USER_AGENT),
            status,
            message: String::new(),
            error: None,
            request_time: now,
            response_time: now,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_error(mut self, err: StructuredError) -> Self {
        self.error = Some(err);
        self
    }

    pub fn with_times(mut self, request_time: DateTime<Utc>, response_time: DateTime<Utc>) -> Self {
        self.request_time = request_time;
        self.response_time = response_time;
        self
    }

    /// Info for 2xx responses, error for everything else.
    pub fn level(&self) -> Level {
        if (200..300).contains(&self.status) {
            Level::Info
        } else {
            Level::Error
        }
    }

    /// Build the entry, measuring latency from the request time until now.
    pub fn into_entry(self) -> Entry {
        let level = self.level();
        let latency = (Utc::now() - self.request_time).to_std().unwrap_or_default();

        let mut entry = Entry::new(level, String::new())
            .with_data(STATUS_CODE_KEY, self.status)
            .with_data("latency_time", latency)
            .with_data(CLIENT_IP_KEY, self.client_ip)
            .with_data(REQUEST_METHOD_KEY, self.method)
            .with_data(REQUEST_URL_KEY, self.url)
            .with_data("referer", self.referer)
            .with_data("user_agent", self.user_agent)
            .with_data("request_time", self.request_time)
            .with_data("response_time", self.response_time)
            .with_data("duration", latency.as_nanos() as f64 / 1000.0)
            .with_data(MESSAGE_KEY, self.message);
        if let Some(err) = self.error {
            entry = entry.with_data(ERROR_KEY, err);
        }
        entry
    }
}

impl Logger {
    /// Log a served request at the level chosen by its status.
    pub fn fire_http(&self, event: HttpEvent) -> Result<(), HookError> {
        self.log(event.into_entry())
    }
}
