/// External service announcement hook.
///
/// Called once per service at registration time, before the service is
/// installed into the dispatch registry. A typical implementation announces
/// the service to a discovery backend. Registration is all-or-nothing: if
/// the hook fails, the service is not installed.
pub trait Registrar: Send + Sync {
    fn register(
        &self,
        service_name: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
