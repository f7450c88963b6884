#[derive(Clone, Debug)]
pub struct FirestoreClientOptions {
    pub host: String,
    /// Connect over TLS. Only a local emulator should ever be reached without it.
    pub tls: bool,
}

impl Default for FirestoreClientOptions {
    fn default() -> Self {
        Self {
            host: "firestore.googleapis.com".to_string(),
            tls: true,
        }
    }
}

impl FirestoreClientOptions {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub(crate) fn endpoint_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}", self.host)
    }
}
