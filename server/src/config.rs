use clap::Parser;
use joblib::CoordinatorConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Run shell commands as jobs over HTTP
#[derive(Debug, Clone, Parser)]
#[clap(name = "job-server")]
pub struct ServerConfig {
    /// Address to listen on
    #[clap(long, env = "JOB_SERVER_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// Timeout, in seconds, for jobs created without one
    #[clap(
        long,
        env = "JOB_TIMEOUT_SECS",
        default_value = "30",
        parse(try_from_str = positive_secs)
    )]
    pub job_timeout_secs: u64,

    /// How long, in seconds, shutdown waits for running jobs to be killed
    #[clap(
        long,
        env = "JOB_SHUTDOWN_GRACE_SECS",
        default_value = "45",
        parse(try_from_str = positive_secs)
    )]
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default().with_default_timeout(Duration::from_secs(self.job_timeout_secs))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// try_from_str parse function for durations that must not be zero
fn positive_secs(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(secs) => Ok(secs),
        Err(err) => Err(err.to_string()),
    }
}
